use crate::model::chat::{ChatMessage, Role};
use crate::model::config::PromptStyle;

pub const DEFAULT_INSTRUCTION: &str = "You are a helpful project management assistant. \
     You help users track project progress, manage and prioritize tasks, plan deadlines, \
     and answer questions about their projects. Keep answers short, practical, and \
     focused on project management.";

const ZEPHYR_SYSTEM: &str = "<|system|>";
const ZEPHYR_USER: &str = "<|user|>";
const ZEPHYR_ASSISTANT: &str = "<|assistant|>";
const ZEPHYR_EOS: &str = "</s>";

const PLAIN_USER: &str = "User:";
const PLAIN_ASSISTANT: &str = "Assistant:";

/// Builds the single-string prompt sent to the generator
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub instruction: String,
    pub style: PromptStyle,
    /// Only the most recent `max_history` prior messages are serialized
    pub max_history: usize,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        PromptTemplate {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            style: PromptStyle::default(),
            max_history: 10,
        }
    }
}

impl PromptTemplate {
    /// Instruction, prior turns, the new user turn, then an open assistant turn.
    pub fn build(&self, history: &[ChatMessage], user_message: &str) -> String {
        let start = history.len().saturating_sub(self.max_history);
        let recent = &history[start..];
        let mut prompt = String::new();
        match self.style {
            PromptStyle::Zephyr => {
                push_zephyr_turn(&mut prompt, ZEPHYR_SYSTEM, &self.instruction);
                for msg in recent {
                    push_zephyr_turn(&mut prompt, zephyr_marker(msg.role), &msg.content);
                }
                push_zephyr_turn(&mut prompt, ZEPHYR_USER, user_message);
                prompt.push_str(ZEPHYR_ASSISTANT);
                prompt.push('\n');
            }
            PromptStyle::Plain => {
                prompt.push_str(&self.instruction);
                prompt.push_str("\n\n");
                for msg in recent {
                    prompt.push_str(plain_marker(msg.role));
                    prompt.push(' ');
                    prompt.push_str(&msg.content);
                    prompt.push('\n');
                }
                prompt.push_str(PLAIN_USER);
                prompt.push(' ');
                prompt.push_str(user_message);
                prompt.push('\n');
                prompt.push_str(PLAIN_ASSISTANT);
            }
        }
        prompt
    }
}

fn push_zephyr_turn(prompt: &mut String, marker: &str, content: &str) {
    prompt.push_str(marker);
    prompt.push('\n');
    prompt.push_str(content);
    prompt.push_str(ZEPHYR_EOS);
    prompt.push('\n');
}

fn zephyr_marker(role: Role) -> &'static str {
    match role {
        Role::User => ZEPHYR_USER,
        Role::Assistant => ZEPHYR_ASSISTANT,
    }
}

fn plain_marker(role: Role) -> &'static str {
    match role {
        Role::User => PLAIN_USER,
        Role::Assistant => PLAIN_ASSISTANT,
    }
}

/// Text of the final user turn in a prompt built by [`PromptTemplate`].
/// Returns the whole prompt, trimmed, when no user marker is present.
pub fn last_user_turn(prompt: &str) -> &str {
    let zephyr = prompt.rfind(ZEPHYR_USER).map(|i| i + ZEPHYR_USER.len());
    let plain = prompt.rfind(PLAIN_USER).map(|i| i + PLAIN_USER.len());
    let Some(start) = zephyr.max(plain) else {
        return prompt.trim();
    };
    let rest = &prompt[start..];
    let end = [ZEPHYR_EOS, ZEPHYR_ASSISTANT, PLAIN_ASSISTANT]
        .iter()
        .filter_map(|m| rest.find(m))
        .min()
        .unwrap_or(rest.len());
    rest[..end].trim()
}
