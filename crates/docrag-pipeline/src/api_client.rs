//! Client for the query service's `/llm_calls` endpoint.

use serde::Deserialize;

use docrag_core::types::{QueryRequest, QueryResponse};
use docrag_core::{Error, Result};

#[derive(Deserialize)]
struct ErrorPayload {
    error: String,
}

pub struct QueryClient {
    client: reqwest::Client,
    url: String,
}

impl QueryClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn ask(&self, query: &str) -> Result<QueryResponse> {
        let resp = self
            .client
            .post(&self.url)
            .json(&QueryRequest { query: query.to_string() })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} unreachable: {}", self.url, e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            let body = serde_json::from_str::<ErrorPayload>(&text).map_or(text, |p| p.error);
            return Err(Error::Upstream { status: status.as_u16(), body });
        }
        serde_json::from_str(&text).map_err(|e| Error::MalformedResponse(format!("query response: {e}")))
    }
}
