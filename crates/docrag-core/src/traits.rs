use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatMessage, ChunkMetadata, DistanceMetric, GenerationParams, SearchHit};

/// Maps text to fixed-size vectors. Implementations must return vectors of
/// `dim()` length, normalized the same way for indexing and querying.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `local:bge-base-en:d768`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Vector database operations the pipeline relies on.
///
/// Collections are addressed by physical name. Aliases and small metadata
/// values live in a key/value side table so a collection can be rebuilt
/// under a new name and swapped in.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool>;
    async fn delete_collection(&self, name: &str) -> Result<()>;
    async fn create_collection(&self, name: &str, dim: usize, metric: DistanceMetric) -> Result<()>;
    async fn list_collections(&self) -> Result<Vec<String>>;
    async fn count(&self, name: &str) -> Result<usize>;

    /// Insert texts with their metadata and vectors; all slices are parallel.
    async fn add_texts(
        &self,
        name: &str,
        texts: &[String],
        metadatas: &[ChunkMetadata],
        vectors: &[Vec<f32>],
    ) -> Result<usize>;

    /// Top-`k` rows, closest first.
    async fn similarity_search(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    async fn set_meta(&self, key: &str, value: &str) -> Result<()>;
    async fn get_meta(&self, key: &str) -> Result<Option<String>>;

    async fn set_alias(&self, alias: &str, collection: &str) -> Result<()> {
        self.set_meta(&alias_key(alias), collection).await
    }

    /// Physical collection behind `alias`. Falls back to a collection that is
    /// literally named `alias` so stores built without aliases still resolve.
    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>> {
        if let Some(target) = self.get_meta(&alias_key(alias)).await? {
            if self.collection_exists(&target).await? {
                return Ok(Some(target));
            }
        }
        if self.collection_exists(alias).await? {
            return Ok(Some(alias.to_string()));
        }
        Ok(None)
    }
}

/// Chat-completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String>;
}

pub fn alias_key(alias: &str) -> String {
    format!("alias:{alias}")
}

pub fn embedder_key(collection: &str) -> String {
    format!("embedder_id:{collection}")
}

pub fn metric_key(collection: &str) -> String {
    format!("metric:{collection}")
}
