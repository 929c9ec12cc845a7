//! Index command implementation

use crate::config::Config;
use crate::documents::DocumentBuilder;
use crate::embed::Embedder;
use crate::error::Result;
use crate::loader::load_letterboxd;
use crate::retrieval::Retriever;
use crate::store::MovieStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Index statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub folder: String,
    pub records_loaded: usize,
    pub documents_indexed: usize,
    pub augmented: bool,
    pub embedding_model: String,
}

/// Load an export folder and rebuild the collection from it
pub async fn cmd_index(
    config: &Config,
    embedder: &dyn Embedder,
    store: &dyn MovieStore,
    folder: &Path,
    show_progress: bool,
) -> Result<IndexStats> {
    info!("Indexing {}", folder.display());

    let records = load_letterboxd(folder)?;
    let augmented = config.augmentation.documents;
    let documents = DocumentBuilder::new(augmented).build(&records);

    let retriever = Retriever::new(embedder, store)
        .with_batch_size(config.embedding.batch_size)
        .with_progress(show_progress);
    let documents_indexed = retriever.index(documents).await?;

    Ok(IndexStats {
        folder: folder.display().to_string(),
        records_loaded: records.len(),
        documents_indexed,
        augmented,
        embedding_model: embedder.model_name().to_string(),
    })
}

/// Print index stats to console
pub fn print_index_stats(stats: &IndexStats) {
    println!("\n🎬 Index Complete\n");
    println!("Folder: {}", stats.folder);
    println!("Movies loaded: {}", stats.records_loaded);
    println!(
        "Documents indexed: {}{}",
        stats.documents_indexed,
        if stats.augmented { " (with paraphrases)" } else { "" }
    );
    println!("Embedding model: {}", stats.embedding_model);
}
