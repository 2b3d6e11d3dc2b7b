//! LanceDB-backed vector store.
//!
//! Each collection is a LanceDB table. A side table holds small key/value
//! records: collection aliases, the metric a collection was created with and
//! the embedder that filled it.

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use arrow_array::RecordBatchIterator;
use std::path::Path;

use docrag_core::traits::{embedder_key, metric_key, VectorStore};
use docrag_core::types::{ChunkMetadata, DistanceMetric, SearchHit};
use docrag_core::{Error, Result};

use crate::schema::{collection_schema, vector_dim};
use crate::search::{hits_from_batch, sort_by_distance};
use crate::writer::records_to_batch;

pub const META_TABLE: &str = "_docrag_meta";

pub struct LanceStore {
    conn: Connection,
    meta_table: String,
}

impl LanceStore {
    pub async fn open(uri: &str) -> anyhow::Result<Self> {
        let conn = table::open_db(uri).await?;
        Ok(Self { conn, meta_table: META_TABLE.to_string() })
    }

    pub async fn open_path(path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path)?;
        Self::open(path.to_string_lossy().as_ref()).await
    }

    async fn open_collection(&self, name: &str) -> Result<lancedb::Table> {
        if !self.collection_exists(name).await? {
            return Err(Error::NotFound(format!("collection '{name}'")));
        }
        self.conn.open_table(name).execute().await.map_err(Error::store)
    }

    async fn collection_dim(&self, table: &lancedb::Table) -> Result<usize> {
        let schema = table.schema().await.map_err(Error::store)?;
        vector_dim(&schema).ok_or_else(|| Error::Store(format!("table '{}' has no vector column", table.name())))
    }

    async fn collection_metric(&self, name: &str) -> Result<DistanceMetric> {
        match self.get_meta(&metric_key(name)).await? {
            Some(raw) => raw.parse(),
            None => Ok(DistanceMetric::default()),
        }
    }
}

fn distance_type(metric: DistanceMetric) -> DistanceType {
    match metric {
        DistanceMetric::Dot => DistanceType::Dot,
        DistanceMetric::Cosine => DistanceType::Cosine,
        DistanceMetric::L2 => DistanceType::L2,
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        table::table_exists(&self.conn, name).await.map_err(Error::store)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.collection_exists(name).await? {
            return Ok(());
        }
        table::drop_table(&self.conn, name).await.map_err(Error::store)?;
        for key in [metric_key(name), embedder_key(name)] {
            table::delete_meta(&self.conn, &self.meta_table, &key).await.map_err(Error::store)?;
        }
        tracing::info!(collection = name, "dropped collection");
        Ok(())
    }

    async fn create_collection(&self, name: &str, dim: usize, metric: DistanceMetric) -> Result<()> {
        let dim_i32 = i32::try_from(dim).map_err(|_| Error::InvalidConfig(format!("dimension {dim} is too large")))?;
        if dim == 0 {
            return Err(Error::InvalidConfig("dimension must be > 0".into()));
        }
        let created = table::ensure_table(&self.conn, name, collection_schema(dim_i32))
            .await
            .map_err(Error::store)?;
        if !created {
            return Err(Error::Store(format!("collection '{name}' already exists")));
        }
        self.set_meta(&metric_key(name), &metric.to_string()).await?;
        tracing::info!(collection = name, dim, %metric, "created collection");
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let names = self.conn.table_names().execute().await.map_err(Error::store)?;
        Ok(names.into_iter().filter(|n| *n != self.meta_table).collect())
    }

    async fn count(&self, name: &str) -> Result<usize> {
        let table = self.open_collection(name).await?;
        table.count_rows(None).await.map_err(Error::store)
    }

    async fn add_texts(
        &self,
        name: &str,
        texts: &[String],
        metadatas: &[ChunkMetadata],
        vectors: &[Vec<f32>],
    ) -> Result<usize> {
        if texts.is_empty() {
            return Ok(0);
        }
        let table = self.open_collection(name).await?;
        let dim = self.collection_dim(&table).await?;
        let batch = records_to_batch(texts, metadatas, vectors, dim).map_err(Error::store)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        table.add(reader).execute().await.map_err(Error::store)?;
        Ok(texts.len())
    }

    async fn similarity_search(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let table = self.open_collection(name).await?;
        if k == 0 || table.count_rows(None).await.map_err(Error::store)? == 0 {
            return Ok(Vec::new());
        }
        let dim = self.collection_dim(&table).await?;
        if vector.len() != dim {
            return Err(Error::Store(format!(
                "query vector has dimension {}, collection '{name}' expects {dim}",
                vector.len()
            )));
        }
        let metric = self.collection_metric(name).await?;

        let mut stream = table
            .vector_search(vector.to_vec())
            .map_err(Error::store)?
            .distance_type(distance_type(metric))
            .limit(k)
            .execute()
            .await
            .map_err(Error::store)?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
            hits.extend(hits_from_batch(&batch).map_err(Error::store)?);
        }
        sort_by_distance(&mut hits);
        hits.truncate(k);
        Ok(hits)
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        table::set_meta(&self.conn, &self.meta_table, key, value).await.map_err(Error::store)
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        table::get_meta(&self.conn, &self.meta_table, key).await.map_err(Error::store)
    }
}
