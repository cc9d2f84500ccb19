use async_trait::async_trait;

use super::generator::{GeneratedText, GenerationError, GenerationOptions, TextGenerator};
use super::prompt::last_user_turn;

const FALLBACK_NAME: &str = "basic responder";

/// Keyword groups and the canned reply each one triggers, checked in order
const CANNED_REPLIES: &[(&[&str], &str)] = &[
    (
        &["progress", "status", "percent", "how far", "complete"],
        "Project progress is the share of completed tasks. Open a project with \
         `project show <id>` to see its completion percentage and how many tasks remain.",
    ),
    (
        &["deadline", "due", "schedule", "late", "overdue", "timeline"],
        "To stay on schedule, break the remaining work into small tasks, mark the \
         urgent ones as high priority, and review what is still open every day.",
    ),
    (
        &["priority", "priorit", "urgent", "important", "first"],
        "Work on high-priority tasks first. You can set a priority when adding a \
         task: `task add <project> <title> --priority high`.",
    ),
    (
        &["task", "todo", "to-do", "add", "create"],
        "You can add a task with `task add <project> <title>`, mark it done with \
         `task done <project> <task>`, and list open work with `tasks <project> --filter active`.",
    ),
    (
        &["project", "plan", "organize", "organise"],
        "Create a project with `project new <title>`, then add tasks to it. Progress \
         updates automatically as tasks are completed.",
    ),
    (
        &["hello", "hi", "hey", "thanks", "thank you"],
        "Hello! I'm your project management assistant. Ask me about projects, tasks, \
         priorities, or progress.",
    ),
];

const DEFAULT_REPLY: &str = "I'm running in basic mode, so my answers are limited. \
     I can help with projects, tasks, priorities, deadlines, and progress tracking.";

/// Canned responder used when no real model could be loaded.
///
/// Echoes the prompt ahead of its reply, like pipeline backends do, and
/// never fails.
#[derive(Debug, Clone, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    /// Pick the canned reply for a question. Never empty.
    pub fn respond(question: &str) -> &'static str {
        let lower = question.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| !w.is_empty())
            .collect();
        for (keywords, reply) in CANNED_REPLIES {
            let hit = keywords.iter().any(|k| {
                if k.contains(' ') {
                    lower.contains(k)
                } else {
                    words.iter().any(|w| w.starts_with(k))
                }
            });
            if hit {
                return reply;
            }
        }
        DEFAULT_REPLY
    }
}

#[async_trait]
impl TextGenerator for FallbackResponder {
    fn name(&self) -> &str {
        FALLBACK_NAME
    }

    fn is_fallback(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<Vec<GeneratedText>, GenerationError> {
        let reply = Self::respond(last_user_turn(prompt));
        Ok(vec![GeneratedText::new(format!("{}{}", prompt, reply))])
    }
}
