//! Shared start-up for the docrag binaries.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use docrag_core::config::{Config, Settings};
use docrag_vector::LanceStore;

/// `RUST_LOG` if set, otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    Ok(config.settings()?)
}

pub async fn open_store(settings: &Settings) -> anyhow::Result<Arc<LanceStore>> {
    let uri = settings.store_uri();
    let store = LanceStore::open_path(&uri)
        .await
        .with_context(|| format!("opening vector store at {}", uri.display()))?;
    Ok(Arc::new(store))
}
