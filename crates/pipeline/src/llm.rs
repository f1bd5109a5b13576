use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client for the answer-generating model (Ollama generate endpoint).
#[derive(Clone)]
pub struct AnswerClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl AnswerClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Sends the prompt and returns the model's response text verbatim.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("failed to send generate request")?;

        if !response.status().is_success() {
            anyhow::bail!("generate request failed: {}", response.status());
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("failed to parse generate response")?;

        Ok(parsed.response)
    }
}
