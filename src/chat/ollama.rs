//! Generation backend speaking the Ollama HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::generator::{
    GeneratedText, GenerationError, GenerationOptions, GeneratorLoader, LoadError, TextGenerator,
};

#[derive(Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    /// The prompt is already templated; skip the server-side chat template
    raw: bool,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
}

impl From<&GenerationOptions> for SamplingOptions {
    fn from(opts: &GenerationOptions) -> Self {
        SamplingOptions {
            num_predict: opts.max_new_tokens,
            temperature: opts.temperature,
            top_p: opts.top_p,
            repeat_penalty: opts.repetition_penalty,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Loads a model from a local Ollama server by checking that it exists
#[derive(Debug, Clone)]
pub struct OllamaLoader {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaLoader {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        OllamaLoader {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GeneratorLoader for OllamaLoader {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn load(&self) -> Result<Box<dyn TextGenerator>, LoadError> {
        let url = format!("{}/api/show", self.endpoint);
        log::debug!("checking model {} at {}", self.model, url);
        let resp = self
            .client
            .post(&url)
            .json(&ShowRequest { model: &self.model })
            .send()
            .await
            .map_err(|e| LoadError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LoadError::ModelUnavailable(format!(
                "{} ({}): {}",
                self.model, status, text
            )));
        }

        Ok(Box::new(OllamaGenerator {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            client: self.client.clone(),
        }))
    }
}

/// A model confirmed present on an Ollama server
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<GeneratedText>, GenerationError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream: false,
            options: options.into(),
        };

        let resp = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        Ok(vec![GeneratedText::new(parsed.response)])
    }
}
