//! Chunking and embedding: token-window chunker over a Hugging Face
//! tokenizer, a candle BERT sentence embedder and a hash-based fake.

pub mod chunker;
pub mod device;
pub mod fake;
pub mod model;
pub mod pool;
pub mod tokenize;

use anyhow::Result;
use std::sync::Arc;
use tokenizers::Tokenizer;

use docrag_core::config::{EmbeddingProvider, Settings};
use docrag_core::traits::Embedder;

pub use chunker::{window_ranges, TokenChunker};
pub use fake::FakeEmbedder;
pub use model::LocalEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::{load_tokenizer, whitespace_tokenizer};

fn fake_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// The configured embedder. `APP_USE_FAKE_EMBEDDINGS=1` forces the fake one,
/// sized to the collection dimension.
pub fn get_default_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    if fake_forced() || settings.embedding.provider == EmbeddingProvider::Fake {
        tracing::warn!(dim = settings.store.dimension, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.store.dimension)));
    }
    let model_dir = settings.embedding_model_dir();
    Ok(Arc::new(LocalEmbedder::load(&model_dir, settings.embedding.max_len)?))
}

/// Tokenizer for chunking. With the fake embedder and no tokenizer file on
/// disk, falls back to [`whitespace_tokenizer`].
pub fn get_chunking_tokenizer(settings: &Settings) -> Result<Tokenizer> {
    let path = settings.tokenizer_path();
    let fake = fake_forced() || settings.embedding.provider == EmbeddingProvider::Fake;
    if fake && !path.exists() {
        tracing::warn!(path = %path.display(), "tokenizer not found, chunking on whitespace words");
        return whitespace_tokenizer();
    }
    load_tokenizer(&path)
}

/// Chunker built from the `chunking` settings.
pub fn chunker_from_settings(settings: &Settings) -> Result<TokenChunker> {
    let tokenizer = get_chunking_tokenizer(settings)?;
    Ok(TokenChunker::new(tokenizer, settings.chunking.chunk_size, settings.chunking.overlap)?)
}
