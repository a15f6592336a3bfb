use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";

pub const DEFAULT_GENERATION_MODEL: &str = "claude-3-haiku-20240307";

const MAX_GENERATION_TOKENS: u32 = 800;
const GENERATION_TEMPERATURE: f32 = 0.2;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct AnthropicGenerator {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl AnthropicGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.is_configured() {
            return Err(PipelineError::GenerationUnavailable(
                "generation provider is not configured (missing api key)".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("x-api-key", self.api_key.trim())
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": MAX_GENERATION_TOKENS,
                "temperature": GENERATION_TEMPERATURE,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await
            .map_err(|error| PipelineError::GenerationUnavailable(error.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::GenerationUnavailable(format!(
                "generation request returned {}",
                response.status()
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|error| PipelineError::GenerationUnavailable(error.to_string()))?;

        parsed
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::GenerationUnavailable(
                    "generation response had no text block".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{AnthropicGenerator, TextGenerator, DEFAULT_GENERATION_MODEL};
    use crate::error::PipelineError;

    #[tokio::test]
    async fn unconfigured_generator_fails_fast() {
        let generator =
            AnthropicGenerator::new("http://localhost:1", "", DEFAULT_GENERATION_MODEL);

        match generator.generate("anything").await {
            Err(PipelineError::GenerationUnavailable(reason)) => {
                assert!(reason.contains("not configured"));
            }
            other => panic!("expected GenerationUnavailable, got {other:?}"),
        }
    }
}
