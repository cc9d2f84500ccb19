//! The generation capability the chat bridge drives.
//!
//! A [`GeneratorLoader`] produces a [`TextGenerator`]; the generator is then
//! called as `generate(prompt, options) -> [GeneratedText]`. Backends are
//! opaque to the rest of the crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::config::ChatConfig;

/// Sampling parameters passed with every generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for GenerationOptions {
    fn from(config: &ChatConfig) -> Self {
        GenerationOptions {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            repetition_penalty: config.repetition_penalty,
        }
    }
}

/// One candidate returned by a generator. May start with the echoed prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

impl GeneratedText {
    pub fn new(text: impl Into<String>) -> Self {
        GeneratedText {
            generated_text: text.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    Malformed(String),
    #[error("generator returned no candidates")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("generation backend unreachable: {0}")]
    Unreachable(String),
    #[error("model not available: {0}")]
    ModelUnavailable(String),
    #[error("model loading disabled (offline mode)")]
    Offline,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable name of the loaded model
    fn name(&self) -> &str;

    /// True for the canned responder used when no real model could load
    fn is_fallback(&self) -> bool {
        false
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<GeneratedText>, GenerationError>;
}

#[async_trait]
pub trait GeneratorLoader: Send + Sync {
    /// Name of the model this loader will try to load
    fn model_name(&self) -> &str;

    async fn load(&self) -> Result<Box<dyn TextGenerator>, LoadError>;
}

/// Loader that never succeeds, forcing the fallback responder.
#[derive(Debug, Clone, Default)]
pub struct OfflineLoader;

#[async_trait]
impl GeneratorLoader for OfflineLoader {
    fn model_name(&self) -> &str {
        "offline"
    }

    async fn load(&self) -> Result<Box<dyn TextGenerator>, LoadError> {
        Err(LoadError::Offline)
    }
}
