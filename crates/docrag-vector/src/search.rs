use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};

use docrag_core::types::{ChunkMetadata, SearchHit};

use crate::schema::{CONTENT_COLUMN, DISTANCE_COLUMN, PATH_COLUMN};

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("result batch has no string column '{}'", name))
}

/// Rows of one vector-search result batch.
pub fn hits_from_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let paths = string_column(batch, PATH_COLUMN)?;
    let contents = string_column(batch, CONTENT_COLUMN)?;
    let distances = batch
        .column_by_name(DISTANCE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    Ok((0..batch.num_rows())
        .map(|i| SearchHit {
            content: contents.value(i).to_string(),
            metadata: ChunkMetadata { path: paths.value(i).to_string() },
            distance: distances.filter(|d| d.is_valid(i)).map_or(0.0, |d| d.value(i)),
        })
        .collect())
}

/// Closest first; ties keep engine order.
pub fn sort_by_distance(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
}
