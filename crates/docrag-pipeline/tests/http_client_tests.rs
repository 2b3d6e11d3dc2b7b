use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use docrag_core::traits::ChatModel;
use docrag_core::types::{ChatMessage, GenerationParams};
use docrag_core::Error;
use docrag_pipeline::{OpenAiChatModel, QueryClient};

type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn completions(status: StatusCode, body: &'static str) -> (Router, Captured) {
    let captured: Captured = Arc::default();
    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(move |State(seen): State<Captured>, headers: HeaderMap, Json(req): Json<Value>| async move {
                let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
                seen.lock().unwrap().push((auth, req));
                (status, [("content-type", "application/json")], body).into_response()
            }),
        )
        .with_state(captured.clone());
    (router, captured)
}

#[tokio::test]
async fn completion_sends_bearer_and_params_and_reads_first_choice() {
    let (router, captured) = completions(
        StatusCode::OK,
        r#"{"choices":[{"message":{"role":"assistant","content":"It is [1]."}},{"message":{"content":"ignored"}}]}"#,
    );
    let base = serve(router).await;
    let model = OpenAiChatModel::new(&format!("{base}/v1/"), "secret", "meta/llama3-70b-instruct");

    let answer = model
        .complete(&[ChatMessage::system("sys"), ChatMessage::user("hi")], &GenerationParams::default())
        .await
        .unwrap();

    assert_eq!(answer, "It is [1].");
    let seen = captured.lock().unwrap();
    let (auth, req) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer secret"));
    assert_eq!(req["model"], "meta/llama3-70b-instruct");
    assert_eq!(req["temperature"], 0.5);
    assert_eq!(req["top_p"], 1.0);
    assert_eq!(req["max_tokens"], 1024);
    assert_eq!(req["stream"], false);
    assert_eq!(req["messages"][0], json!({"role": "system", "content": "sys"}));
    assert_eq!(req["messages"][1]["role"], "user");
}

#[tokio::test]
async fn non_success_status_is_upstream_error() {
    let (router, _) = completions(StatusCode::TOO_MANY_REQUESTS, r#"{"detail":"slow down"}"#);
    let base = serve(router).await;
    let model = OpenAiChatModel::new(&format!("{base}/v1"), "k", "m");

    match model.complete(&[ChatMessage::user("q")], &GenerationParams::default()).await {
        Err(Error::Upstream { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("slow down"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let (router, _) = completions(StatusCode::OK, r#"{"choices":[]}"#);
    let base = serve(router).await;
    let model = OpenAiChatModel::new(&format!("{base}/v1"), "k", "m");
    let result = model.complete(&[ChatMessage::user("q")], &GenerationParams::default()).await;
    assert!(matches!(result, Err(Error::MalformedResponse(_))));

    let (router, _) = completions(StatusCode::OK, "not json");
    let base = serve(router).await;
    let model = OpenAiChatModel::new(&format!("{base}/v1"), "k", "m");
    let result = model.complete(&[ChatMessage::user("q")], &GenerationParams::default()).await;
    assert!(matches!(result, Err(Error::MalformedResponse(_))));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let model = OpenAiChatModel::new(&format!("http://{addr}/v1"), "k", "m");
    let result = model.complete(&[ChatMessage::user("q")], &GenerationParams::default()).await;
    assert!(matches!(result, Err(Error::Transport(_))));

    let client = QueryClient::new(format!("http://{addr}/llm_calls"));
    assert!(matches!(client.ask("q").await, Err(Error::Transport(_))));
}

#[tokio::test]
async fn query_client_decodes_answer_and_error_payloads() {
    let router = Router::new().route(
        "/llm_calls",
        post(|Json(req): Json<Value>| async move {
            if req["query"] == "boom" {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Internal API error: down"})))
            } else {
                let context = json!([{"id": 0, "path": "data/a.txt", "content": "alpha"}]);
                (StatusCode::OK, Json(json!({"context": context, "answer": format!("re: {}", req["query"].as_str().unwrap_or(""))})))
            }
        }),
    );
    let base = serve(router).await;
    let client = QueryClient::new(format!("{base}/llm_calls"));

    let ok = client.ask("hello").await.unwrap();
    assert_eq!(ok.answer, "re: hello");
    assert_eq!(ok.context[0].path, "data/a.txt");

    match client.ask("boom").await {
        Err(Error::Upstream { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal API error: down");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}
