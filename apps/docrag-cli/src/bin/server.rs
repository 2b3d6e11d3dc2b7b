use anyhow::Context;

use docrag_embed::get_default_embedder;
use docrag_pipeline::{chat_model_from_settings, Answerer};
use docrag_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docrag_cli::init_tracing();
    let settings = docrag_cli::load_settings()?;

    let store = docrag_cli::open_store(&settings).await?;
    let embedder = get_default_embedder(&settings)?;
    let chat = chat_model_from_settings(&settings.llm);
    let answerer = Answerer::from_settings(&settings, embedder, store, chat);
    let app = build_router(AppState::new(answerer, settings.data_root()));

    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, collection = %settings.store.collection, "query service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
