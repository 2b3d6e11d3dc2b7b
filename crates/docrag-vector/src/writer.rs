use anyhow::{ensure, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, StringArray};
use std::sync::Arc;

use docrag_core::types::ChunkMetadata;

use crate::schema::collection_schema;

/// One record batch from parallel slices of texts, metadata and vectors.
pub fn records_to_batch(texts: &[String], metadatas: &[ChunkMetadata], vectors: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
    ensure!(
        texts.len() == metadatas.len() && texts.len() == vectors.len(),
        "texts ({}), metadatas ({}) and vectors ({}) must have the same length",
        texts.len(),
        metadatas.len(),
        vectors.len()
    );
    if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dim) {
        anyhow::bail!("vector {} has dimension {}, collection expects {}", i, v.len(), dim);
    }
    let dim_i32 = i32::try_from(dim)?;

    let paths: Vec<&str> = metadatas.iter().map(|m| m.path.as_str()).collect();
    let contents: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));

    Ok(RecordBatch::try_new(
        collection_schema(dim_i32),
        vec![
            Arc::new(StringArray::from(paths)),
            Arc::new(StringArray::from(contents)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim_i32)),
        ],
    )?)
}
