use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client for the Ollama embeddings endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("failed to send embedding request")?;

        if !response.status().is_success() {
            anyhow::bail!("embedding request failed: {}", response.status());
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("failed to parse embedding response")?;

        Ok(parsed.embedding)
    }

    /// Embedding dimension, probed with a throwaway input.
    pub async fn dimension(&self) -> Result<usize> {
        Ok(self.embed("dimension probe").await?.len())
    }
}
