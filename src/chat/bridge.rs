use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, interval_at};

use super::fallback::FallbackResponder;
use super::generator::{GenerationOptions, GeneratorLoader, TextGenerator};
use super::postprocess::postprocess;
use super::prompt::{DEFAULT_INSTRUCTION, PromptTemplate};
use crate::model::chat::{ChatMessage, Conversation};
use crate::model::config::ChatConfig;

/// Returned in place of a reply whenever generation fails
pub const APOLOGY: &str = "Sorry, I encountered an error generating a response.";

/// First assistant message once the bridge is ready
pub const GREETING: &str = "Hello, I'm your project management assistant. I can help you \
     track project progress, manage tasks, or answer questions about your projects. \
     What can I help you with?";

/// Load progress never passes this until the load actually completes
const MAX_PENDING_PROGRESS: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Initializing,
    Ready { fallback: bool },
}

/// Snapshot of the loading state, published on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStatus {
    pub phase: LoadPhase,
    /// Estimated load progress, 0..=100
    pub progress: u8,
    /// Set once the load has run past the configured timeout. Display only.
    pub taking_long: bool,
}

impl LoadStatus {
    fn initializing() -> Self {
        LoadStatus {
            phase: LoadPhase::Initializing,
            progress: 0,
            taking_long: false,
        }
    }
}

/// What a finished load produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub model: String,
    pub fallback: bool,
    /// Why the real model could not be used, when it could not
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("assistant is not ready yet")]
    NotReady,
}

/// Connects user input to a loaded text generator and keeps the
/// conversation log.
///
/// [`ChatBridge::send`] takes `&mut self`, so only one generation call can
/// be in flight at a time.
pub struct ChatBridge {
    generator: Option<Box<dyn TextGenerator>>,
    conversation: Conversation,
    template: PromptTemplate,
    options: GenerationOptions,
    load_timeout: Duration,
    progress_tick: Duration,
    status: watch::Sender<LoadStatus>,
}

impl ChatBridge {
    pub fn new(config: &ChatConfig) -> Self {
        let template = PromptTemplate {
            instruction: config
                .instruction
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
            style: config.prompt_style,
            max_history: config.max_history,
        };
        let (status, _) = watch::channel(LoadStatus::initializing());
        ChatBridge {
            generator: None,
            conversation: Conversation::new(),
            template,
            options: GenerationOptions::from(config),
            load_timeout: Duration::from_secs(config.load_timeout_secs),
            progress_tick: Duration::from_millis(config.progress_tick_ms.max(1)),
            status,
        }
    }

    /// Watch load status changes
    pub fn subscribe(&self) -> watch::Receiver<LoadStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> LoadStatus {
        *self.status.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.generator.is_some()
    }

    /// Name of the loaded model, once ready
    pub fn model_name(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.name())
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Load a generator, substituting the fallback responder if the loader
    /// fails. Progress ticks up while the load runs and `taking_long` flips
    /// after the timeout; neither interrupts the load.
    pub async fn load(&mut self, loader: &dyn GeneratorLoader) -> LoadOutcome {
        self.generator = None;
        self.status.send_replace(LoadStatus::initializing());
        log::info!("loading model {}", loader.model_name());

        let load = loader.load();
        tokio::pin!(load);
        let mut ticker = interval_at(Instant::now() + self.progress_tick, self.progress_tick);
        let deadline = tokio::time::sleep(self.load_timeout);
        tokio::pin!(deadline);
        let mut timed_out = false;

        let result = loop {
            tokio::select! {
                res = &mut load => break res,
                _ = ticker.tick() => {
                    self.status.send_modify(|s| {
                        s.progress = (s.progress + 1).min(MAX_PENDING_PROGRESS);
                    });
                }
                _ = &mut deadline, if !timed_out => {
                    timed_out = true;
                    log::warn!(
                        "model {} still loading after {}s",
                        loader.model_name(),
                        self.load_timeout.as_secs()
                    );
                    self.status.send_modify(|s| s.taking_long = true);
                }
            }
        };

        let (generator, error): (Box<dyn TextGenerator>, Option<String>) = match result {
            Ok(generator) => (generator, None),
            Err(e) => {
                log::warn!("failed to load model {}: {}; using fallback", loader.model_name(), e);
                (Box::new(FallbackResponder), Some(e.to_string()))
            }
        };
        let fallback = generator.is_fallback();
        let model = generator.name().to_string();
        self.generator = Some(generator);
        self.status.send_modify(|s| {
            s.phase = LoadPhase::Ready { fallback };
            s.progress = 100;
        });
        if self.conversation.is_empty() {
            self.conversation.push(ChatMessage::assistant(GREETING));
        }
        log::info!("assistant ready (model: {}, fallback: {})", model, fallback);

        LoadOutcome {
            model,
            fallback,
            error,
        }
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// Generation failures are answered with [`APOLOGY`]; only blank input
    /// and an unloaded bridge are reported as errors.
    pub async fn send(&mut self, text: &str) -> Result<&ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let Some(generator) = self.generator.as_deref() else {
            return Err(ChatError::NotReady);
        };

        let prompt = self.template.build(self.conversation.messages(), text);
        self.conversation.push(ChatMessage::user(text));

        let reply = match generator.generate(&prompt, &self.options).await {
            Ok(candidates) => match candidates.first() {
                Some(candidate) => postprocess(&candidate.generated_text, &prompt, text),
                None => {
                    log::warn!("generator {} returned no candidates", generator.name());
                    APOLOGY.to_string()
                }
            },
            Err(e) => {
                log::warn!("generation failed: {}", e);
                APOLOGY.to_string()
            }
        };

        Ok(self.conversation.push(ChatMessage::assistant(reply)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::generator::{GeneratedText, GenerationError, LoadError, OfflineLoader};
    use crate::model::chat::Role;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Echoes the prompt followed by a fixed reply and records every prompt
    struct ScriptedGenerator {
        reply: &'static str,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Vec<GeneratedText>, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(vec![GeneratedText::new(format!("{}{}", prompt, self.reply))])
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Vec<GeneratedText>, GenerationError> {
            Err(GenerationError::Request("connection reset".into()))
        }
    }

    struct SilentGenerator;

    #[async_trait]
    impl TextGenerator for SilentGenerator {
        fn name(&self) -> &str {
            "silent"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Vec<GeneratedText>, GenerationError> {
            Ok(Vec::new())
        }
    }

    /// Waits `delay`, then hands out the generator built by `make`
    struct DelayedLoader<F> {
        delay: Duration,
        make: F,
    }

    #[async_trait]
    impl<F> GeneratorLoader for DelayedLoader<F>
    where
        F: Fn() -> Result<Box<dyn TextGenerator>, LoadError> + Send + Sync,
    {
        fn model_name(&self) -> &str {
            "test-model"
        }

        async fn load(&self) -> Result<Box<dyn TextGenerator>, LoadError> {
            tokio::time::sleep(self.delay).await;
            (self.make)()
        }
    }

    fn scripted(reply: &'static str) -> (Arc<Mutex<Vec<String>>>, impl GeneratorLoader) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let shared = prompts.clone();
        let loader = DelayedLoader {
            delay: Duration::ZERO,
            make: move || -> Result<Box<dyn TextGenerator>, LoadError> {
                Ok(Box::new(ScriptedGenerator {
                    reply,
                    prompts: shared.clone(),
                }))
            },
        };
        (prompts, loader)
    }

    fn bridge() -> ChatBridge {
        ChatBridge::new(&ChatConfig::default())
    }

    // --- Loading ---

    #[tokio::test]
    async fn starts_initializing_and_not_ready() {
        let mut b = bridge();
        assert_eq!(b.status().phase, LoadPhase::Initializing);
        assert!(!b.is_ready());
        assert_eq!(b.send("hello").await.unwrap_err(), ChatError::NotReady);
        assert!(b.conversation().is_empty());
    }

    #[tokio::test]
    async fn successful_load_greets_and_is_ready() {
        let mut b = bridge();
        let (_, loader) = scripted("ok");
        let outcome = b.load(&loader).await;
        assert_eq!(
            outcome,
            LoadOutcome {
                model: "scripted".into(),
                fallback: false,
                error: None
            }
        );
        let status = b.status();
        assert_eq!(status.phase, LoadPhase::Ready { fallback: false });
        assert_eq!(status.progress, 100);
        assert!(!status.taking_long);
        assert_eq!(b.model_name(), Some("scripted"));
        assert_eq!(b.conversation().len(), 1);
        assert_eq!(b.conversation().messages()[0].content, GREETING);
    }

    #[tokio::test]
    async fn failed_load_substitutes_fallback() {
        let mut b = bridge();
        let outcome = b.load(&OfflineLoader).await;
        assert!(outcome.fallback);
        assert!(outcome.error.is_some());
        assert_eq!(b.status().phase, LoadPhase::Ready { fallback: true });
        assert!(b.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_flags_taking_long_without_cancelling() {
        let mut b = bridge();
        let rx = b.subscribe();
        let (prompts, _) = scripted("unused");
        let loader = DelayedLoader {
            delay: Duration::from_secs(20),
            make: move || -> Result<Box<dyn TextGenerator>, LoadError> {
                Ok(Box::new(ScriptedGenerator {
                    reply: "late",
                    prompts: prompts.clone(),
                }))
            },
        };
        let outcome = b.load(&loader).await;
        assert!(!outcome.fallback);
        let status = *rx.borrow();
        assert!(status.taking_long);
        assert_eq!(status.progress, 100);
        assert_eq!(status.phase, LoadPhase::Ready { fallback: false });
    }

    #[tokio::test(start_paused = true)]
    async fn pending_progress_is_capped_below_hundred() {
        let mut b = bridge();
        let mut rx = b.subscribe();
        let observer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                seen.push(*rx.borrow_and_update());
            }
            seen
        });

        let loader = DelayedLoader {
            delay: Duration::from_secs(60),
            make: || -> Result<Box<dyn TextGenerator>, LoadError> {
                Err(LoadError::Unreachable("no server".into()))
            },
        };
        b.load(&loader).await;
        drop(b);

        let seen = observer.await.unwrap();
        assert!(!seen.is_empty());
        for s in seen.iter().filter(|s| s.phase == LoadPhase::Initializing) {
            assert!(s.progress <= MAX_PENDING_PROGRESS);
        }
        let last = seen.last().unwrap();
        assert_eq!(last.phase, LoadPhase::Ready { fallback: true });
        assert_eq!(last.progress, 100);
    }

    #[tokio::test]
    async fn reload_keeps_conversation() {
        let mut b = bridge();
        b.load(&OfflineLoader).await;
        b.send("hello").await.unwrap();
        let (_, loader) = scripted("ok");
        b.load(&loader).await;
        assert_eq!(b.conversation().len(), 3);
        assert_eq!(b.model_name(), Some("scripted"));
    }

    // --- Sending ---

    #[tokio::test]
    async fn send_builds_prompt_from_prior_turns() {
        let mut b = bridge();
        let (prompts, loader) = scripted("Focus on the remaining tasks.");
        b.load(&loader).await;

        let reply = b.send("  What should I do next?  ").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Focus on the remaining tasks.");

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(GREETING));
        assert!(prompts[0].ends_with("<|user|>\nWhat should I do next?</s>\n<|assistant|>\n"));

        let log = b.conversation().messages();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], ChatMessage::user("What should I do next?"));
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_logging() {
        let mut b = bridge();
        b.load(&OfflineLoader).await;
        assert_eq!(b.send(" \n ").await.unwrap_err(), ChatError::EmptyMessage);
        assert_eq!(b.conversation().len(), 1);
    }

    #[tokio::test]
    async fn generation_error_becomes_apology() {
        let mut b = bridge();
        let loader = DelayedLoader {
            delay: Duration::ZERO,
            make: || -> Result<Box<dyn TextGenerator>, LoadError> { Ok(Box::new(FailingGenerator)) },
        };
        b.load(&loader).await;
        let reply = b.send("status?").await.unwrap();
        assert_eq!(reply.content, APOLOGY);
        // conversation continues
        assert_eq!(b.conversation().len(), 3);
        assert_eq!(b.send("again").await.unwrap().content, APOLOGY);
    }

    #[tokio::test]
    async fn no_candidates_becomes_apology() {
        let mut b = bridge();
        let loader = DelayedLoader {
            delay: Duration::ZERO,
            make: || -> Result<Box<dyn TextGenerator>, LoadError> { Ok(Box::new(SilentGenerator)) },
        };
        b.load(&loader).await;
        assert_eq!(b.send("hi").await.unwrap().content, APOLOGY);
    }

    #[tokio::test]
    async fn fallback_always_answers_with_text() {
        let mut b = bridge();
        b.load(&OfflineLoader).await;
        for question in ["hello", "how is my progress", "asdf qwerty", "?", "When is it due"] {
            let reply = b.send(question).await.unwrap();
            assert_eq!(reply.role, Role::Assistant);
            assert!(!reply.content.trim().is_empty(), "empty reply for {:?}", question);
            assert_ne!(reply.content, APOLOGY);
        }
    }

    #[tokio::test]
    async fn conversation_only_grows() {
        let mut b = bridge();
        b.load(&OfflineLoader).await;
        let mut last_len = b.conversation().len();
        for q in ["a task", "", "priority?", "   "] {
            let _ = b.send(q).await;
            assert!(b.conversation().len() >= last_len);
            last_len = b.conversation().len();
        }
        assert_eq!(last_len, 5);
    }
}
