//! Project-management assistant: generator loading, prompt building, and
//! reply post-processing.

pub mod bridge;
pub mod fallback;
pub mod generator;
pub mod ollama;
pub mod postprocess;
pub mod prompt;

pub use bridge::{APOLOGY, ChatBridge, ChatError, GREETING, LoadOutcome, LoadPhase, LoadStatus};
pub use fallback::FallbackResponder;
pub use generator::{
    GeneratedText, GenerationError, GenerationOptions, GeneratorLoader, LoadError, OfflineLoader,
    TextGenerator,
};
pub use ollama::OllamaLoader;
