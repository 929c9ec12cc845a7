//! Configuration management for moviemind
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Qdrant connection URL
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Environment variable name for Qdrant API key
    #[serde(default = "default_qdrant_api_key_env")]
    pub qdrant_api_key_env: String,

    /// Qdrant collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Paraphrase generation for documents and queries
    #[serde(default)]
    pub augmentation: AugmentationConfig,

    /// Generative service configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Recommendation composer configuration
    #[serde(default)]
    pub recommend: RecommendConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend kind: "local" (fastembed) or "http"
    #[serde(default = "default_embedding_backend")]
    pub backend: String,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Base URL of the HTTP embedding backend
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,
}

/// Lookup the expected embedding dimension for a known model
pub fn embedding_dimension_for_model(model: &str) -> Option<usize> {
    match model {
        "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2" => Some(384),
        "sentence-transformers/paraphrase-multilingual-mpnet-base-v2" => Some(768),
        "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        "BAAI/bge-small-en-v1.5" => Some(384),
        "BAAI/bge-base-en-v1.5" => Some(768),
        "intfloat/multilingual-e5-small" => Some(384),
        _ => None,
    }
}

impl EmbeddingConfig {
    /// Resolve the effective embedding dimension based on the configured model
    pub fn resolved_dimension(&self) -> usize {
        if let Some(expected) = embedding_dimension_for_model(&self.model) {
            if expected != self.dimension {
                warn!(
                    "Embedding dimension {} does not match model '{}' ({}); using {}",
                    self.dimension, self.model, expected, expected
                );
            }
            expected
        } else {
            self.dimension
        }
    }
}

/// Augmentation toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Index several paraphrased documents per watched movie
    #[serde(default = "default_augment_documents")]
    pub documents: bool,

    /// Search with several expanded variants of the query
    #[serde(default = "default_augment_queries")]
    pub queries: bool,
}

/// Generative service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Gemini model name
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_generation_api_key_env")]
    pub api_key_env: String,

    /// REST endpoint base URL
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
}

/// Recommendation composer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Candidates retrieved to build the taste profile
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,

    /// Similar movies listed when no generator is configured
    #[serde(default = "default_fallback_results")]
    pub fallback_results: usize,

    /// Qualifying watched movies kept when semantic search yields no profile
    #[serde(default = "default_fallback_scan_limit")]
    pub fallback_scan_limit: usize,

    /// Exemplars shown to the generator
    #[serde(default = "default_exemplar_count")]
    pub exemplar_count: usize,

    /// Default minimum rating filter
    #[serde(default = "default_min_rating")]
    pub min_rating: f32,

    /// Default earliest release year filter
    #[serde(default = "default_year_min")]
    pub year_min: i32,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for moviemind data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            qdrant_api_key_env: default_qdrant_api_key_env(),
            collection_name: default_collection_name(),
            embedding: EmbeddingConfig::default(),
            augmentation: AugmentationConfig::default(),
            generation: GenerationConfig::default(),
            recommend: RecommendConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
            backend_url: default_embedding_backend_url(),
        }
    }
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            documents: default_augment_documents(),
            queries: default_augment_queries(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            api_key_env: default_generation_api_key_env(),
            base_url: default_generation_base_url(),
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            candidate_pool: default_candidate_pool(),
            fallback_results: default_fallback_results(),
            fallback_scan_limit: default_fallback_scan_limit(),
            exemplar_count: default_exemplar_count(),
            min_rating: default_min_rating(),
            year_min: default_year_min(),
        }
    }
}

impl Config {
    /// Get the default base directory for moviemind (~/.moviemind)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".moviemind")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub(crate) fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.is_file() {
            return Err(Error::Config(format!(
                "No config at {} (run 'moviemind init')",
                config_path.display()
            )));
        }

        let base_dir = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::read_toml(PathsConfig {
            base_dir,
            config_file: config_path.to_path_buf(),
        })
    }

    /// Load `config.toml` from `base_dir` (default `~/.moviemind`), or defaults when absent
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if !config.paths.config_file.is_file() {
            debug!(
                "{} absent, running with defaults",
                config.paths.config_file.display()
            );
            config.validate()?;
            return Ok(config);
        }

        Self::read_toml(config.paths)
    }

    fn read_toml(paths: PathsConfig) -> Result<Self> {
        debug!("Reading config {}", paths.config_file.display());
        let mut config: Config = toml::from_str(&std::fs::read_to_string(&paths.config_file)?)?;
        config.paths = paths;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Get the Qdrant API key from environment
    pub fn qdrant_api_key(&self) -> Option<String> {
        if self.qdrant_api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.qdrant_api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Get the generative API key from environment
    pub fn generation_api_key(&self) -> Option<String> {
        std::env::var(&self.generation.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.embedding.backend.as_str() {
            "local" | "http" => {}
            other => {
                return Err(Error::Config(format!(
                    "embedding.backend must be 'local' or 'http', got '{}'",
                    other
                )));
            }
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be positive".to_string(),
            ));
        }

        if self.collection_name.trim().is_empty() {
            return Err(Error::Config("collection_name must not be empty".to_string()));
        }

        let recommend = &self.recommend;
        if recommend.candidate_pool == 0
            || recommend.fallback_results == 0
            || recommend.exemplar_count == 0
        {
            return Err(Error::Config(
                "recommend.candidate_pool, fallback_results and exemplar_count must be positive"
                    .to_string(),
            ));
        }

        if recommend.min_rating < 0.0 {
            return Err(Error::Config(
                "recommend.min_rating must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
