//! Full rebuild of a collection from a directory tree.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

use docrag_core::config::{ReindexStrategy, Settings};
use docrag_core::data_processor::{discover_files, FileOutcome, IngestReport};
use docrag_core::traits::{embedder_key, Embedder, VectorStore};
use docrag_core::types::{ChunkMetadata, DistanceMetric, Document, DocumentChunk};
use docrag_core::Error;
use docrag_embed::TokenChunker;

#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Logical collection name readers resolve.
    pub collection: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub strategy: ReindexStrategy,
    pub batch_size: usize,
    pub max_file_bytes: u64,
    pub show_progress: bool,
}

impl IndexOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            collection: settings.store.collection.clone(),
            dimension: settings.store.dimension,
            metric: settings.store.metric,
            strategy: settings.store.reindex_strategy,
            batch_size: settings.embedding.batch_size,
            max_file_bytes: settings.extract.max_file_bytes,
            show_progress: true,
        }
    }
}

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunker: TokenChunker,
    options: IndexOptions,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, chunker: TokenChunker, options: IndexOptions) -> Self {
        Self { embedder, store, chunker, options }
    }

    /// Replace the collection's contents with everything under `root`.
    ///
    /// Per-file failures end up in the report. Store failures abort the run;
    /// with `shadow_swap` the live collection is untouched in that case.
    pub async fn rebuild(&self, root: &Path) -> Result<IngestReport> {
        let opts = &self.options;
        if self.embedder.dim() != opts.dimension {
            return Err(Error::InvalidConfig(format!(
                "embedder '{}' produces {}-d vectors but the collection dimension is {}",
                self.embedder.embedder_id(),
                self.embedder.dim(),
                opts.dimension
            ))
            .into());
        }

        let discovery = discover_files(root)?;
        let physical = self.prepare_collection().await?;
        tracing::info!(
            root = %root.display(),
            files = discovery.files.len(),
            collection = %opts.collection,
            physical = %physical,
            "indexing documents"
        );

        let mut report = IngestReport::new(&physical);
        report.outcomes.extend(discovery.errors.iter().cloned());

        let pb = if opts.show_progress {
            let pb = ProgressBar::new(discovery.files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        for path in &discovery.files {
            pb.set_message(path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default());
            let outcome = match Document::from_path(path) {
                None => {
                    tracing::debug!(path = %path.display(), "unsupported format, skipping");
                    FileOutcome::skipped(path, "unsupported format")
                }
                Some(document) => match self.index_document(&document, &physical).await {
                    Ok(chunks) => {
                        tracing::info!(path = %path.display(), chunks, "indexed");
                        FileOutcome::indexed(path, chunks)
                    }
                    Err(DocumentError::Skip(err)) => {
                        tracing::error!(path = %path.display(), error = %err, "failed to index file");
                        FileOutcome::failed(path, err)
                    }
                    Err(DocumentError::Fatal(err)) => {
                        pb.abandon_with_message("aborted");
                        self.discard_shadow(&physical).await;
                        return Err(anyhow::Error::new(err).context(format!("storing chunks of {}", path.display())));
                    }
                },
            };
            report.push(outcome);
            pb.inc(1);
        }
        pb.finish_with_message("done");

        self.store
            .set_meta(&embedder_key(&physical), self.embedder.embedder_id())
            .await
            .context("recording embedder id")?;
        self.store
            .set_alias(&opts.collection, &physical)
            .await
            .context("publishing collection alias")?;
        self.drop_stale(&physical).await?;

        tracing::info!(summary = %report, "indexing finished");
        Ok(report)
    }

    /// The physical collection this run writes into, created empty.
    async fn prepare_collection(&self) -> Result<String> {
        let opts = &self.options;
        let physical = match opts.strategy {
            ReindexStrategy::Recreate => {
                if self.store.collection_exists(&opts.collection).await? {
                    self.store.delete_collection(&opts.collection).await?;
                }
                opts.collection.clone()
            }
            ReindexStrategy::ShadowSwap => {
                let mut stamp = chrono::Utc::now().timestamp_millis();
                loop {
                    let candidate = shadow_name(&opts.collection, stamp);
                    if !self.store.collection_exists(&candidate).await? {
                        break candidate;
                    }
                    stamp += 1;
                }
            }
        };
        self.store.create_collection(&physical, opts.dimension, opts.metric).await?;
        Ok(physical)
    }

    async fn index_document(&self, document: &Document, physical: &str) -> std::result::Result<usize, DocumentError> {
        let owned = document.clone();
        let max_bytes = self.options.max_file_bytes;
        let text = tokio::task::spawn_blocking(move || docrag_extract::extract(&owned, max_bytes))
            .await
            .map_err(|e| DocumentError::Skip(Error::extraction(document.path_str(), e)))?
            .map_err(DocumentError::Skip)?;

        let chunks = self
            .chunker
            .chunk_document(&document.path_str(), &text)
            .map_err(|e| DocumentError::Skip(Error::extraction(document.path_str(), format!("chunking failed: {e}"))))?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let vectors = self.embed_chunks(&chunks).await.map_err(DocumentError::Skip)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let metadatas: Vec<ChunkMetadata> = chunks.iter().map(DocumentChunk::metadata).collect();
        self.store
            .add_texts(physical, &texts, &metadatas, &vectors)
            .await
            .map_err(DocumentError::Fatal)
    }

    async fn embed_chunks(&self, chunks: &[DocumentChunk]) -> docrag_core::Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.options.batch_size.max(1)) {
            let embedder = Arc::clone(&self.embedder);
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embedded = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
                .await
                .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
                .map_err(|e| Error::Embedding(e.to_string()))?;
            if embedded.len() != batch.len() {
                return Err(Error::Embedding(format!("expected {} vectors, got {}", batch.len(), embedded.len())));
            }
            vectors.extend(embedded);
        }
        Ok(vectors)
    }

    async fn discard_shadow(&self, physical: &str) {
        if self.options.strategy != ReindexStrategy::ShadowSwap {
            return;
        }
        if let Err(err) = self.store.delete_collection(physical).await {
            tracing::warn!(collection = physical, error = %err, "failed to drop partial collection");
        }
    }

    /// Drop every physical collection of this logical name except `keep`.
    async fn drop_stale(&self, keep: &str) -> Result<()> {
        let name = &self.options.collection;
        let prefix = format!("{name}__");
        let stale: Vec<String> = self
            .store
            .list_collections()
            .await?
            .into_iter()
            .filter(|c| c != keep && (c == name || c.starts_with(&prefix)))
            .collect();
        for collection in stale {
            self.store.delete_collection(&collection).await?;
            tracing::info!(collection = %collection, "dropped previous collection");
        }
        Ok(())
    }
}

fn shadow_name(collection: &str, stamp: i64) -> String {
    format!("{collection}__{stamp}")
}

enum DocumentError {
    /// Recorded in the report; the run continues.
    Skip(Error),
    /// Aborts the run.
    Fatal(Error),
}
