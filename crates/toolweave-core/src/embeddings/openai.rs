//! Embeddings through an OpenAI-compatible `/embeddings` endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::CancellationToken;

use super::error::{EmbeddingError, EmbeddingResult};
use super::traits::EmbeddingGenerator;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Configuration for [`OpenAiEmbeddingGenerator`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiEmbeddingConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL; Azure, Ollama and other compatible servers go here
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

impl OpenAiEmbeddingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_model(),
            api_base: None,
            dimensions: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    fn endpoint(&self) -> String {
        let base = self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        format!("{}/embeddings", base.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Order vectors by their `index` field and check the count
fn into_vectors(response: EmbeddingResponse, expected: usize) -> EmbeddingResult<Vec<Vec<f32>>> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: data.len(),
        });
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

pub struct OpenAiEmbeddingGenerator {
    config: OpenAiEmbeddingConfig,
    http: reqwest::Client,
}

impl OpenAiEmbeddingGenerator {
    pub fn new(config: OpenAiEmbeddingConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn request(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self.config.dimensions,
        };

        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::api_error("openai", status.as_u16(), message));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        into_vectors(parsed, texts.len())
    }
}

#[async_trait]
impl EmbeddingGenerator for OpenAiEmbeddingGenerator {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, texts: &[String], cancel: &CancellationToken) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        cancel
            .run_until_cancelled(self.request(texts))
            .await
            .unwrap_or(Err(EmbeddingError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = OpenAiEmbeddingConfig::new("sk-test");
        assert_eq!(config.endpoint(), "https://api.openai.com/v1/embeddings");

        let config = config.with_api_base("http://localhost:11434/v1/");
        assert_eq!(config.endpoint(), "http://localhost:11434/v1/embeddings");
    }

    #[test]
    fn test_request_body() {
        let input = vec!["create ticket".to_string()];
        let body = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
            dimensions: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input"][0], "create ticket");
        assert!(json.get("dimensions").is_none());
    }

    #[test]
    fn test_response_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        )
        .unwrap();
        let vectors = into_vectors(response, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
    }

    #[test]
    fn test_response_count_mismatch() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#).unwrap();
        let err = into_vectors(response, 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::CountMismatch { expected: 2, actual: 1 }));
    }

    #[tokio::test]
    async fn test_empty_input_skips_request() {
        let generator = OpenAiEmbeddingGenerator::new(OpenAiEmbeddingConfig::new("sk-test"));
        let vectors = generator.embed(&[], &CancellationToken::new()).await.unwrap();
        assert!(vectors.is_empty());
    }
}
