//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::store::{MovieStore, QdrantStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub qdrant_url: String,
    pub collection_name: String,
    pub embedding_backend: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub generation_available: bool,
    pub qdrant_connected: bool,
    pub collection_exists: bool,
    pub qdrant_points: usize,
}

/// Get system status
pub async fn cmd_status(config: &Config, store: &QdrantStore) -> Result<StatusInfo> {
    info!("Getting status");

    let (qdrant_connected, collection_exists, qdrant_points) = match store.collection_exists().await
    {
        Ok(true) => match store.count().await {
            Ok(points) => (true, true, points),
            Err(e) => {
                debug!("Qdrant stats error: {:?}", e);
                (true, true, 0)
            }
        },
        Ok(false) => (true, false, 0),
        Err(e) => {
            debug!("Qdrant connection error: {:?}", e);
            (false, false, 0)
        }
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        qdrant_url: config.qdrant_url.clone(),
        collection_name: config.collection_name.clone(),
        embedding_backend: config.embedding.backend.clone(),
        embedding_model: config.embedding.model.clone(),
        generation_model: config.generation.model.clone(),
        generation_available: config.generation_api_key().is_some(),
        qdrant_connected,
        collection_exists,
        qdrant_points,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 moviemind Status\n");
    println!("Configuration: {}", status.config_path);
    println!("\nQdrant:");
    println!("  URL: {}", status.qdrant_url);
    println!("  Collection: {}", status.collection_name);

    let connection_status = if status.qdrant_connected {
        if status.collection_exists {
            "✓ Connected"
        } else {
            "⚠ Connected (collection not created - run 'moviemind index' to create)"
        }
    } else {
        "✗ Not connected"
    };
    println!("  Status: {}", connection_status);
    println!("  Points: {}", status.qdrant_points);
    println!(
        "\nEmbedding: {} ({})",
        status.embedding_model, status.embedding_backend
    );

    let generation = if status.generation_available {
        "✓ API key found"
    } else {
        "✗ No API key (recommend lists similar movies only)"
    };
    println!("Generation: {} {}", status.generation_model, generation);
}
