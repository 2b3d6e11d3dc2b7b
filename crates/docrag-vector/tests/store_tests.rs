use docrag_core::traits::{Embedder, VectorStore};
use docrag_core::types::{ChunkMetadata, DistanceMetric};
use docrag_core::Error;
use docrag_embed::FakeEmbedder;
use docrag_vector::LanceStore;

async fn store(tmp: &tempfile::TempDir) -> LanceStore {
    LanceStore::open_path(&tmp.path().join("lancedb")).await.expect("open store")
}

fn meta(path: &str) -> ChunkMetadata {
    ChunkMetadata { path: path.to_string() }
}

#[tokio::test]
async fn create_add_and_search_ranks_closest_first() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = store(&tmp).await;
    let embedder = FakeEmbedder::new(64);

    store.create_collection("docs", 64, DistanceMetric::Dot).await?;
    assert!(store.collection_exists("docs").await?);

    let texts = vec![
        "goats need fresh hay every morning".to_string(),
        "rainwater barrels overflow in spring".to_string(),
        "solar panel wiring for the workshop".to_string(),
    ];
    let metadatas = vec![meta("data/goats.txt"), meta("data/water.txt"), meta("data/solar.pdf")];
    let vectors = embedder.embed_batch(&texts)?;
    assert_eq!(store.add_texts("docs", &texts, &metadatas, &vectors).await?, 3);
    assert_eq!(store.count("docs").await?, 3);

    let query = embedder.embed_batch(&["solar panel wiring for the workshop".to_string()])?.remove(0);
    let hits = store.similarity_search("docs", &query, 2).await?;

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].metadata.path, "data/solar.pdf");
    assert_eq!(hits[0].content, texts[2]);
    assert!(hits[0].distance <= hits[1].distance);
    Ok(())
}

#[tokio::test]
async fn empty_collection_returns_no_hits() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = store(&tmp).await;
    store.create_collection("empty", 8, DistanceMetric::Cosine).await?;

    let hits = store.similarity_search("empty", &[0.5; 8], 10).await?;
    assert!(hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn delete_then_recreate_starts_empty() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = store(&tmp).await;
    store.create_collection("vdb-study", 4, DistanceMetric::Dot).await?;
    store
        .add_texts("vdb-study", &["a".to_string()], &[meta("a.txt")], &[vec![1.0, 0.0, 0.0, 0.0]])
        .await?;

    store.delete_collection("vdb-study").await?;
    assert!(!store.collection_exists("vdb-study").await?);
    store.delete_collection("vdb-study").await?;

    store.create_collection("vdb-study", 4, DistanceMetric::Dot).await?;
    assert_eq!(store.count("vdb-study").await?, 0);
    Ok(())
}

#[tokio::test]
async fn creating_existing_collection_is_store_error() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = store(&tmp).await;
    store.create_collection("dup", 4, DistanceMetric::Dot).await?;

    let err = store.create_collection("dup", 4, DistanceMetric::Dot).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    Ok(())
}

#[tokio::test]
async fn wrong_dimension_is_rejected() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = store(&tmp).await;
    store.create_collection("dims", 4, DistanceMetric::Dot).await?;

    let add = store.add_texts("dims", &["x".to_string()], &[meta("x.txt")], &[vec![1.0, 2.0]]).await;
    assert!(matches!(add, Err(Error::Store(_))));
    let search = store.similarity_search("dims", &[1.0, 2.0], 3).await;
    assert!(search.is_ok(), "empty collections short-circuit before the dimension check");
    Ok(())
}

#[tokio::test]
async fn missing_collection_is_not_found() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = store(&tmp).await;

    assert!(matches!(store.count("nope").await, Err(Error::NotFound(_))));
    assert!(matches!(store.similarity_search("nope", &[0.0; 4], 1).await, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn meta_upserts_and_aliases_resolve() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = store(&tmp).await;

    assert_eq!(store.get_meta("missing").await?, None);
    store.set_meta("embedder_id:x", "fake:xxh64:d4").await?;
    store.set_meta("embedder_id:x", "fake:xxh64:d8").await?;
    assert_eq!(store.get_meta("embedder_id:x").await?.as_deref(), Some("fake:xxh64:d8"));

    store.create_collection("kb__1", 4, DistanceMetric::Dot).await?;
    store.set_alias("kb", "kb__1").await?;
    assert_eq!(store.resolve_alias("kb").await?.as_deref(), Some("kb__1"));
    assert_eq!(store.resolve_alias("kb__1").await?.as_deref(), Some("kb__1"));
    assert_eq!(store.resolve_alias("other").await?, None);

    let collections = store.list_collections().await?;
    assert_eq!(collections, vec!["kb__1".to_string()]);
    Ok(())
}
