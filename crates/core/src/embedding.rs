use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1_024;

pub const DEFAULT_VOYAGE_ENDPOINT: &str = "https://api.voyageai.com";

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Deterministic stand-in for a real embedding model: identical text always
/// yields the identical vector, at the cost of carrying no semantic meaning.
#[derive(Debug, Clone, Copy)]
pub struct CharCodeEmbedder {
    pub dimensions: usize,
}

impl Default for CharCodeEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

#[async_trait]
impl Embedder for CharCodeEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0f32; self.dimensions.max(1)];

        for (index, ch) in text.chars().enumerate() {
            let bucket = index % vector.len();
            vector[bucket] += ch as u32 as f32 / 1_000.0;
        }

        Ok(vector)
    }
}

pub struct VoyageEmbedder {
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    client: Client,
}

impl VoyageEmbedder {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.model.trim().is_empty()
    }
}

#[async_trait]
impl Embedder for VoyageEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if !self.is_configured() {
            return Err(PipelineError::EmbeddingUnavailable(
                "embedding provider is not configured (missing api key or model)".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint))
            .bearer_auth(self.api_key.trim())
            .json(&json!({
                "model": self.model,
                "input": [text],
            }))
            .send()
            .await
            .map_err(|error| PipelineError::EmbeddingUnavailable(error.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::EmbeddingUnavailable(format!(
                "embedding request returned {}",
                response.status()
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|error| PipelineError::EmbeddingUnavailable(error.to_string()))?;

        let values = parsed
            .pointer("/data/0/embedding")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PipelineError::EmbeddingUnavailable(
                    "embedding response had no vector".to_string(),
                )
            })?;

        let vector: Vec<f32> = values
            .iter()
            .filter_map(Value::as_f64)
            .map(|value| value as f32)
            .collect();

        if vector.len() != self.dimensions {
            return Err(PipelineError::EmbeddingUnavailable(format!(
                "embedding dimension {} does not match configured {}",
                vector.len(),
                self.dimensions
            )));
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::{CharCodeEmbedder, Embedder, VoyageEmbedder};
    use crate::error::PipelineError;

    #[tokio::test]
    async fn embedder_is_deterministic() {
        let embedder = CharCodeEmbedder::default();
        let first = embedder.embed("lockout tagout procedure").await.unwrap();
        let second = embedder.embed("lockout tagout procedure").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn embedder_outputs_expected_length() {
        let embedder = CharCodeEmbedder { dimensions: 32 };
        let vector = embedder.embed("abc").await.unwrap();
        assert_eq!(vector.len(), 32);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_a_zero_vector() {
        let embedder = CharCodeEmbedder { dimensions: 8 };
        let vector = embedder.embed("").await.unwrap();
        assert!(vector.iter().all(|value| *value == 0.0));
    }

    #[tokio::test]
    async fn character_positions_wrap_at_the_dimension() {
        let embedder = CharCodeEmbedder { dimensions: 4 };
        let vector = embedder.embed("aaaaa").await.unwrap();

        let unit = 'a' as u32 as f32 / 1_000.0;
        assert_eq!(vector, vec![unit + unit, unit, unit, unit]);
    }

    #[tokio::test]
    async fn unconfigured_remote_embedder_fails_fast() {
        let embedder = VoyageEmbedder::new("http://localhost:1", "", "voyage-2", 8);
        let result = embedder.embed("anything").await;
        match result {
            Err(PipelineError::EmbeddingUnavailable(reason)) => {
                assert!(reason.contains("not configured"));
            }
            other => panic!("expected EmbeddingUnavailable, got {other:?}"),
        }
    }
}
