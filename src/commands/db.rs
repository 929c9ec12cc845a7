//! Collection management commands

use crate::error::Result;
use crate::store::{MovieStore, QdrantStore};
use serde::Serialize;
use tracing::info;

/// Qdrant collection state
#[derive(Debug, Clone, Default, Serialize)]
pub struct DbStatus {
    pub collection: String,
    pub exists: bool,
    pub points_count: u64,
    pub indexed_vectors_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Inspect the collection
pub async fn cmd_db_status(store: &QdrantStore, collection: &str) -> Result<DbStatus> {
    Ok(match store.get_collection_info().await? {
        Some(info) => DbStatus {
            collection: collection.to_string(),
            exists: true,
            points_count: info.points_count,
            indexed_vectors_count: info.indexed_vectors_count,
            status: Some(info.status),
        },
        None => DbStatus {
            collection: collection.to_string(),
            ..DbStatus::default()
        },
    })
}

/// Drop and recreate the collection
pub async fn cmd_db_reset(store: &dyn MovieStore) -> Result<()> {
    store.reset_collection().await?;
    info!("Collection reset");
    Ok(())
}

/// Print collection status to console
pub fn print_db_status(status: &DbStatus) {
    if !status.exists {
        println!(
            "Collection '{}' does not exist. Run 'moviemind index' to create it.",
            status.collection
        );
        return;
    }

    println!("Qdrant Collection '{}':", status.collection);
    println!("  Status: {}", status.status.as_deref().unwrap_or("unknown"));
    println!("  Points: {}", status.points_count);
    println!("  Indexed Vectors: {}", status.indexed_vectors_count);
}
