//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::QdrantStore;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of `moviemind init`
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub config_path: String,
    pub collection: String,
    /// Whether the Qdrant collection exists after init
    pub collection_ready: bool,
}

/// Write a default config file under `base_dir`
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.paths.config_file.exists() && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.config_file.display().to_string(),
        ));
    }

    std::fs::create_dir_all(&config.paths.base_dir)?;
    config.save()?;
    Ok(config)
}

/// Initialize moviemind configuration and the Qdrant collection
///
/// An unreachable Qdrant is not fatal; `index` creates the collection later.
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<InitReport> {
    let config = write_default_config(base_dir, force)?;
    info!("Wrote config to {}", config.paths.config_file.display());

    let collection_ready = match QdrantStore::connect(&config) {
        Ok(store) => match store.ensure_collection().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not create collection {}: {}", config.collection_name, e);
                false
            }
        },
        Err(e) => {
            warn!("Could not connect to Qdrant at {}: {}", config.qdrant_url, e);
            false
        }
    };

    Ok(InitReport {
        config_path: config.paths.config_file.display().to_string(),
        collection: config.collection_name,
        collection_ready,
    })
}

/// Print init outcome to console
pub fn print_init_report(report: &InitReport) {
    println!("✓ moviemind initialized successfully");
    println!("  Config: {}", report.config_path);
    if report.collection_ready {
        println!("  Collection: {} ✓", report.collection);
    } else {
        println!("  Collection: {} (not created, Qdrant unreachable)", report.collection);
    }
    println!("\nNext steps:");
    println!("  1. Put GEMINI_API_KEY in your environment or a .env file");
    println!("  2. Start Qdrant: docker run -p 6333:6333 -p 6334:6334 qdrant/qdrant");
    println!("  3. Index your export: moviemind index /path/to/letterboxd");
}
