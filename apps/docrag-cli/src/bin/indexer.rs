use std::env;
use std::path::PathBuf;

use docrag_core::data_processor::FileStatus;
use docrag_embed::{chunker_from_settings, get_default_embedder};
use docrag_pipeline::{IndexOptions, Indexer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(root) = args.get(1).map(PathBuf::from) else {
        println!("Usage: {} <root_dir>", args.first().map_or("docrag-indexer", String::as_str));
        println!("Rebuilds the vector collection from every PDF, DOCX, PPTX and TXT file under <root_dir>.");
        return Ok(());
    };

    docrag_cli::init_tracing();
    let settings = docrag_cli::load_settings()?;

    println!("docrag indexer\n==============");
    println!("Data directory: {}", root.display());
    println!("Collection: {} ({:?})", settings.store.collection, settings.store.reindex_strategy);

    let store = docrag_cli::open_store(&settings).await?;
    let embedder = get_default_embedder(&settings)?;
    let chunker = chunker_from_settings(&settings)?;
    let indexer = Indexer::new(embedder, store, chunker, IndexOptions::from_settings(&settings));

    let report = indexer.rebuild(&root).await?;

    for outcome in &report.outcomes {
        match &outcome.status {
            FileStatus::Failed { error } => println!("  ✗ {}: {}", outcome.path.display(), error),
            FileStatus::Skipped { reason } => println!("  - {}: {}", outcome.path.display(), reason),
            FileStatus::Indexed { .. } => {}
        }
    }
    println!("\n✅ {report}");
    Ok(())
}
