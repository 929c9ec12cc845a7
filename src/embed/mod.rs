//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - Local embedding support via fastembed
//! - An HTTP embedding backend
//! - Batch processing with a progress bar

#[cfg(feature = "local-embed")]
mod fastembed_impl;
mod http_backend;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;
pub use http_backend::*;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::progress::embedding_progress_bar;
use async_trait::async_trait;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per text
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.backend.as_str() {
        "http" => Ok(Box::new(HttpEmbedder::new(config)?)),
        #[cfg(feature = "local-embed")]
        "local" => Ok(Box::new(FastEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embed"))]
        "local" => Err(Error::Embedding(
            "Local embeddings unavailable. Enable the 'local-embed' feature or use backend = \"http\"."
                .to_string(),
        )),
        other => Err(Error::Config(format!(
            "Unsupported embedding backend '{}'",
            other
        ))),
    }
}

/// Helper to embed in batches with progress
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
    show_progress: bool,
) -> Result<Vec<Vec<f32>>> {
    let expected = texts.len();
    let mut all_embeddings = Vec::with_capacity(expected);
    let progress = show_progress.then(|| embedding_progress_bar(expected as u64));

    for chunk in texts.chunks(batch_size.max(1)) {
        let embeddings = embedder.embed(chunk.to_vec()).await?;
        if embeddings.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunk.len(),
                embeddings.len()
            )));
        }
        all_embeddings.extend(embeddings);
        if let Some(bar) = &progress {
            bar.inc(chunk.len() as u64);
        }
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    Ok(all_embeddings)
}
