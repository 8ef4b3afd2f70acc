//! Google Generative Language embeddings.
//!
//! Calls `POST {url}/models/{model}:embedContent` once per text. Chunks are
//! embedded with task type `RETRIEVAL_DOCUMENT` and search queries with
//! `RETRIEVAL_QUERY`, which the service uses to produce asymmetric vectors.
//!
//! Requires the `GEMINI_API_KEY` environment variable. Requests are spaced
//! one second apart unless `embedding.request_interval_ms` says otherwise.

use anyhow::Result;
use async_trait::async_trait;

use passage_core::embedding::{EmbedPurpose, Embedder};

use super::{check_dims, http_client, json_vector, post_json, service_error, throttle_for, Throttle};
use crate::config::EmbeddingConfig;

pub const DEFAULT_MODEL: &str = "text-embedding-004";
pub const DEFAULT_DIMS: usize = 768;
const DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_INTERVAL_MS: u64 = 1000;

pub struct GeminiEmbedder {
    model: String,
    dims: usize,
    url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
    throttle: Throttle,
}

impl GeminiEmbedder {
    /// # Errors
    ///
    /// Returns an error if `GEMINI_API_KEY` is not in the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let model = model.trim_start_matches("models/").to_string();

        Ok(Self {
            model,
            dims: config.dims.unwrap_or(DEFAULT_DIMS),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            api_key,
            max_retries: config.max_retries,
            client: http_client(config)?,
            throttle: throttle_for(config, DEFAULT_INTERVAL_MS),
        })
    }

    async fn request(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>> {
        let json = post_json(
            &self.client,
            "Gemini",
            &format!("{}/models/{}:embedContent", self.url, self.model),
            &[("x-goog-api-key", self.api_key.as_str())],
            &request_body(&self.model, text, purpose),
            self.max_retries,
        )
        .await?;
        parse_gemini_response(&json)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> passage_core::Result<Vec<f32>> {
        self.throttle.wait().await;
        let vector = self.request(text, purpose).await.map_err(service_error)?;
        check_dims("Gemini", vector, self.dims)
    }
}

fn task_type(purpose: EmbedPurpose) -> &'static str {
    match purpose {
        EmbedPurpose::Document => "RETRIEVAL_DOCUMENT",
        EmbedPurpose::Query => "RETRIEVAL_QUERY",
    }
}

fn request_body(model: &str, text: &str, purpose: EmbedPurpose) -> serde_json::Value {
    serde_json::json!({
        "model": format!("models/{}", model),
        "content": { "parts": [{ "text": text }] },
        "taskType": task_type(purpose),
    })
}

/// Extract `embedding.values` from an `embedContent` response.
fn parse_gemini_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let values = json
        .get("embedding")
        .and_then(|e| e.get("values"))
        .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: missing embedding.values"))?;
    json_vector(values, "Gemini")
}
