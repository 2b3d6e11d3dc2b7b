#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use docrag_core::config::ReindexStrategy;
use docrag_core::traits::{ChatModel, Embedder, VectorStore};
use docrag_core::types::{ChatMessage, ChunkMetadata, DistanceMetric, GenerationParams, SearchHit};
use docrag_core::{Error, Result};
use docrag_embed::{whitespace_tokenizer, FakeEmbedder, TokenChunker};
use docrag_pipeline::{IndexOptions, Indexer};
use docrag_vector::LanceStore;

pub const DIM: usize = 768;

pub async fn lance_store(root: &Path) -> Arc<LanceStore> {
    Arc::new(LanceStore::open_path(&root.join("lancedb")).await.expect("open store"))
}

pub fn options(collection: &str, strategy: ReindexStrategy) -> IndexOptions {
    IndexOptions {
        collection: collection.to_string(),
        dimension: DIM,
        metric: DistanceMetric::Dot,
        strategy,
        batch_size: 8,
        max_file_bytes: 1024 * 1024,
        show_progress: false,
    }
}

pub fn indexer(store: Arc<LanceStore>, options: IndexOptions) -> Indexer {
    indexer_on(store, options)
}

pub fn indexer_on(store: Arc<dyn VectorStore>, options: IndexOptions) -> Indexer {
    let chunker = TokenChunker::new(whitespace_tokenizer().expect("tokenizer"), 500, 50).expect("chunker");
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(options.dimension));
    Indexer::new(embedder, store, chunker, options)
}

/// `n` distinct whitespace-separated words.
pub fn words(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
}

/// Chat model that records prompts and replies with a fixed answer.
pub struct ScriptedChat {
    pub reply: String,
    pub delay: Option<Duration>,
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), delay: None, seen: Mutex::new(Vec::new()) }
    }

    pub fn slow(reply: &str, delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::new(reply) }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
        self.seen.lock().unwrap().push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }
}

/// Lance store whose inserts can be made to fail and whose metadata reads
/// can be slowed down.
pub struct FlakyStore {
    pub inner: Arc<LanceStore>,
    pub fail_inserts: AtomicBool,
    pub meta_delay: Option<Duration>,
}

impl FlakyStore {
    pub fn new(inner: Arc<LanceStore>) -> Self {
        Self { inner, fail_inserts: AtomicBool::new(false), meta_delay: None }
    }

    pub fn slow_meta(inner: Arc<LanceStore>, delay: Duration) -> Self {
        Self { meta_delay: Some(delay), ..Self::new(inner) }
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl VectorStore for FlakyStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn create_collection(&self, name: &str, dim: usize, metric: DistanceMetric) -> Result<()> {
        self.inner.create_collection(name, dim, metric).await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.inner.list_collections().await
    }

    async fn count(&self, name: &str) -> Result<usize> {
        self.inner.count(name).await
    }

    async fn add_texts(
        &self,
        name: &str,
        texts: &[String],
        metadatas: &[ChunkMetadata],
        vectors: &[Vec<f32>],
    ) -> Result<usize> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(Error::Store(format!("insert into {name} rejected")));
        }
        self.inner.add_texts(name, texts, metadatas, vectors).await
    }

    async fn similarity_search(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.inner.similarity_search(name, vector, k).await
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set_meta(key, value).await
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        if let Some(delay) = self.meta_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get_meta(key).await
    }
}
