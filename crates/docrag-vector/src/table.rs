//! Table lifecycle on a LanceDB connection, plus the key/value side table
//! holding collection aliases, metrics and embedder ids.

use anyhow::{anyhow, Result};
use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use arrow_schema::Schema;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use std::sync::Arc;

use crate::schema::{meta_schema, META_KEY, META_VALUE};

pub async fn open_db(uri: &str) -> Result<Connection> {
    let conn = lancedb::connect(uri).execute().await?;
    tracing::debug!(uri, "opened lancedb");
    Ok(conn)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Create an empty `name` unless it exists. Returns whether it was created.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<bool> {
    if table_exists(conn, name).await? {
        return Ok(false);
    }
    let empty = RecordBatchIterator::new(Vec::new().into_iter(), Arc::clone(&schema));
    conn.create_table(name, Box::new(empty)).execute().await?;
    Ok(true)
}

pub async fn drop_table(conn: &Connection, name: &str) -> Result<()> {
    conn.drop_table(name, &[]).await?;
    Ok(())
}

fn key_filter(key: &str) -> String {
    format!("{META_KEY} = '{}'", key.replace('\'', "''"))
}

fn meta_record(key: &str, value: &str) -> Result<RecordBatch> {
    Ok(RecordBatch::try_new(
        meta_schema(),
        vec![
            Arc::new(StringArray::from(vec![key])),
            Arc::new(StringArray::from(vec![value])),
            Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
        ],
    )?)
}

/// The side table, or `None` if nothing was ever written to it.
async fn open_meta(conn: &Connection, table: &str) -> Result<Option<Table>> {
    if !table_exists(conn, table).await? {
        return Ok(None);
    }
    Ok(Some(conn.open_table(table).execute().await?))
}

/// Upsert on `key`.
pub async fn set_meta(conn: &Connection, table: &str, key: &str, value: &str) -> Result<()> {
    ensure_table(conn, table, meta_schema()).await?;
    let meta = conn.open_table(table).execute().await?;
    let record = meta_record(key, value)?;
    let rows = Box::new(RecordBatchIterator::new(vec![Ok(record)].into_iter(), meta_schema()));

    let mut upsert = meta.merge_insert(&[META_KEY]);
    upsert.when_matched_update_all(None).when_not_matched_insert_all();
    upsert.execute(rows).await?;
    Ok(())
}

pub async fn get_meta(conn: &Connection, table: &str, key: &str) -> Result<Option<String>> {
    let Some(meta) = open_meta(conn, table).await? else {
        return Ok(None);
    };
    let mut stream = meta.query().only_if(key_filter(key)).limit(1).execute().await?;
    while let Some(batch) = stream.try_next().await? {
        if batch.num_rows() == 0 {
            continue;
        }
        let values = batch
            .column_by_name(META_VALUE)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| anyhow!("{table}.{META_VALUE} column missing"))?;
        return Ok(Some(values.value(0).to_string()));
    }
    Ok(None)
}

pub async fn delete_meta(conn: &Connection, table: &str, key: &str) -> Result<()> {
    if let Some(meta) = open_meta(conn, table).await? {
        meta.delete(&key_filter(key)).await?;
    }
    Ok(())
}
