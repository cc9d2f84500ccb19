use serde::{Deserialize, Serialize};

/// Configuration from trellis.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chat: ChatConfig,
}

/// How conversation turns are laid out in the prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// `<|system|>` / `<|user|>` / `<|assistant|>` markup closed by `</s>`
    #[default]
    Zephyr,
    /// `User:` / `Assistant:` transcript
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model name passed to the generation backend
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the Ollama-compatible backend
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// After this many seconds a load is reported as taking long (it is not cancelled)
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
    /// Interval between load progress ticks
    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
    /// Number of prior messages serialized into each prompt
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default)]
    pub prompt_style: PromptStyle,
    /// Overrides the built-in assistant instruction
    #[serde(default)]
    pub instruction: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            model: default_model(),
            endpoint: default_endpoint(),
            load_timeout_secs: default_load_timeout_secs(),
            progress_tick_ms: default_progress_tick_ms(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
            max_history: default_max_history(),
            prompt_style: PromptStyle::default(),
            instruction: None,
        }
    }
}

fn default_model() -> String {
    "tinyllama".to_string()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_load_timeout_secs() -> u64 {
    15
}

fn default_progress_tick_ms() -> u64 {
    300
}

fn default_max_new_tokens() -> u32 {
    128
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.95
}

fn default_repetition_penalty() -> f32 {
    1.2
}

fn default_max_history() -> usize {
    10
}
