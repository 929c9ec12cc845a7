//! FastEmbed implementation for local embeddings

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Local sentence-transformer embedder backed by fastembed
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
    batch_size: usize,
}

/// Map a configured model name onto a fastembed model
fn model_for_name(name: &str) -> EmbeddingModel {
    match name {
        "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2" => {
            EmbeddingModel::ParaphraseMLMiniLML12V2
        }
        "sentence-transformers/paraphrase-multilingual-mpnet-base-v2" => {
            EmbeddingModel::ParaphraseMLMpnetBaseV2
        }
        "sentence-transformers/all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
        "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "BAAI/bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "intfloat/multilingual-e5-small" => EmbeddingModel::MultilingualE5Small,
        _ => {
            debug!(
                "Unknown model '{}', using default ParaphraseMLMiniLML12V2",
                name
            );
            EmbeddingModel::ParaphraseMLMiniLML12V2
        }
    }
}

impl FastEmbedder {
    /// Load (downloading on first use) the configured model
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = model_for_name(&config.model);
        info!("Loading local embedding model {:?}", model);

        let text_embedding =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(true))
                .map_err(|e| Error::Embedding(format!("Cannot load {}: {}", config.model, e)))?;

        Ok(Self {
            model: Arc::new(Mutex::new(text_embedding)),
            model_name: config.model.clone(),
            dimension: config.resolved_dimension(),
            batch_size: config.batch_size.max(1),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding {} texts locally", texts.len());

        // fastembed runs inference synchronously
        let model = Arc::clone(&self.model);
        let batch_size = self.batch_size;
        tokio::task::spawn_blocking(move || model.blocking_lock().embed(texts, Some(batch_size)))
            .await
            .map_err(|e| Error::Embedding(format!("Embedding task panicked: {}", e)))?
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
