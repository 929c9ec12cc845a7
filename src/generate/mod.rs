//! Text generation
//!
//! A [`Generator`] turns a prompt into free text. [`GeminiGenerator`] calls
//! the Gemini `generateContent` REST endpoint once per prompt.

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

/// Trait for generative text services
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Gemini REST client
pub struct GeminiGenerator {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(base_url: &str, model: &str, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = Url::parse(base_url)?
            .join(&format!("/v1beta/models/{}:generateContent", model))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key: api_key.into(),
            model: model.to_string(),
        })
    }

    /// Build a generator when the API key variable is set, `None` otherwise
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        match config.generation_api_key() {
            Some(key) => Ok(Some(Self::new(
                &config.generation.base_url,
                &config.generation.model,
                key,
            )?)),
            None => {
                debug!(
                    "{} not set, generation disabled",
                    config.generation.api_key_env
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "generating content");

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, %status, "generation request failed");
            return Err(Error::Generation(format!("{}: {}", status, body.trim())));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?
            .into_text()
            .ok_or_else(|| Error::Generation("response contained no text".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
