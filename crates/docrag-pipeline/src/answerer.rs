//! Query path: embed, search, build the grounded prompt, generate once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use docrag_core::config::{Settings, TimeoutSettings};
use docrag_core::traits::{embedder_key, ChatModel, Embedder, VectorStore};
use docrag_core::types::{GenerationParams, QueryResponse, RetrievedDocument};
use docrag_core::{Error, Result};

use crate::prompt::{build_context, build_messages};

#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub embed: Duration,
    pub search: Duration,
    pub generate: Duration,
}

impl From<&TimeoutSettings> for StageTimeouts {
    fn from(t: &TimeoutSettings) -> Self {
        Self {
            embed: Duration::from_secs(t.embed_secs),
            search: Duration::from_secs(t.search_secs),
            generate: Duration::from_secs(t.generate_secs),
        }
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self::from(&TimeoutSettings::default())
    }
}

async fn bounded<T>(stage: &'static str, limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout { stage, secs: limit.as_secs() })?
}

pub struct Answerer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
    collection: String,
    top_k: usize,
    params: GenerationParams,
    timeouts: StageTimeouts,
}

impl Answerer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
            collection: collection.into(),
            top_k: 10,
            params: GenerationParams::default(),
            timeouts: StageTimeouts::default(),
        }
    }

    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        Self::new(embedder, store, chat, settings.store.collection.clone())
            .with_top_k(settings.retrieval.top_k)
            .with_params(settings.llm.params())
            .with_timeouts(StageTimeouts::from(&settings.timeouts))
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Top-k passages for `query`, ids assigned 0.. in rank order.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        let physical = bounded("search", self.timeouts.search, self.resolve_collection()).await?;
        let vector = bounded("embedding", self.timeouts.embed, self.embed_query(query)).await?;
        let hits = bounded(
            "search",
            self.timeouts.search,
            self.store.similarity_search(&physical, &vector, self.top_k),
        )
        .await?;

        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(id, hit)| RetrievedDocument { id, path: hit.metadata.path, content: hit.content })
            .collect())
    }

    pub async fn answer(&self, query: &str) -> Result<QueryResponse> {
        let context = self.retrieve(query).await?;
        tracing::debug!(query, hits = context.len(), "retrieved context");

        let messages = build_messages(&build_context(&context), query);
        let answer = bounded("generation", self.timeouts.generate, self.chat.complete(&messages, &self.params)).await?;
        Ok(QueryResponse { context, answer })
    }

    /// Physical collection behind the configured name, checked against our embedder.
    async fn resolve_collection(&self) -> Result<String> {
        let physical = self
            .store
            .resolve_alias(&self.collection)
            .await?
            .ok_or_else(|| Error::NotFound(format!("collection '{}'", self.collection)))?;

        if let Some(indexed_with) = self.store.get_meta(&embedder_key(&physical)).await? {
            if indexed_with != self.embedder.embedder_id() {
                return Err(Error::EmbedderMismatch {
                    expected: indexed_with,
                    actual: self.embedder.embedder_id().to_string(),
                });
            }
        }
        Ok(physical)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = vec![query.to_string()];
        let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&text))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
            .map_err(|e| Error::Embedding(e.to_string()))?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedder returned no vector".into()))
    }
}
