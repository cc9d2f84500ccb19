use std::sync::LazyLock;

use regex::Regex;

/// Shown when the model produced nothing usable
pub const EMPTY_REPLY: &str = "I'm not sure how to answer that. Could you rephrase your \
     question about your projects or tasks?";

/// Appended to replies that drift away from project management
pub const REDIRECT_NOTE: &str = "If you have questions about your projects or tasks, \
     I'm happy to help with those.";

/// Start of a turn the model invented for someone else
static TURN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(</s>|<\|(?:user|system|assistant|end)\|>|\n\s*(?:user|human|system|assistant)\s*:)")
        .expect("turn marker regex")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("word regex"));

const TOPIC_STEMS: &[&str] = &[
    "project", "task", "progress", "deadline", "due", "priorit", "milestone", "plan",
    "schedul", "team", "goal", "complet", "status", "work", "deliver", "estimat",
    "backlog", "sprint", "track", "organi", "focus", "risk", "budget", "assign",
];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "with", "this", "that",
    "what", "how", "can", "could", "would", "should", "have", "has", "was", "were",
    "will", "about", "from", "into", "there", "their", "they", "them", "then", "than",
    "which", "when", "where", "who", "why", "does", "did", "just", "some", "any",
    "all", "get", "its", "our", "out", "tell", "please", "me", "my", "is", "it", "a",
];

/// Turn raw generator output into the reply shown to the user.
pub fn postprocess(raw: &str, prompt: &str, question: &str) -> String {
    let stripped = strip_prompt_echo(raw, prompt);
    let truncated = truncate_at_turn_marker(stripped);
    let reply = truncated.trim();
    if reply.is_empty() {
        return EMPTY_REPLY.to_string();
    }
    keep_on_topic(reply, question)
}

/// Remove the first occurrence of the echoed prompt.
pub fn strip_prompt_echo<'a>(raw: &'a str, prompt: &str) -> std::borrow::Cow<'a, str> {
    if prompt.is_empty() {
        return raw.into();
    }
    if let Some(rest) = raw.strip_prefix(prompt) {
        return rest.into();
    }
    if raw.contains(prompt) {
        return raw.replacen(prompt, "", 1).into();
    }
    raw.into()
}

/// Cut the reply where the model starts writing another speaker's turn.
pub fn truncate_at_turn_marker(reply: impl AsRef<str>) -> String {
    let reply = reply.as_ref();
    match TURN_MARKER.find(reply) {
        Some(m) => reply[..m.start()].to_string(),
        None => reply.to_string(),
    }
}

/// Append a redirect when the reply neither uses project vocabulary nor
/// shares any content word with the question.
pub fn keep_on_topic(reply: &str, question: &str) -> String {
    if is_on_topic(reply, question) {
        reply.to_string()
    } else {
        format!("{}\n\n{}", reply, REDIRECT_NOTE)
    }
}

pub fn is_on_topic(reply: &str, question: &str) -> bool {
    let reply_words = content_words(reply);
    if reply_words
        .iter()
        .any(|w| TOPIC_STEMS.iter().any(|stem| w.starts_with(stem)))
    {
        return true;
    }
    let question_words = content_words(question);
    reply_words.iter().any(|w| question_words.contains(w))
}

fn content_words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "<|system|>\nBe brief.</s>\n<|user|>\nHow is it going?</s>\n<|assistant|>\n";

    #[test]
    fn strips_echoed_prefix() {
        let raw = format!("{}The project is 50% done.", PROMPT);
        assert_eq!(strip_prompt_echo(&raw, PROMPT), "The project is 50% done.");
    }

    #[test]
    fn strips_echo_not_at_start() {
        let raw = format!(" {}The task list is empty.", PROMPT);
        assert_eq!(strip_prompt_echo(&raw, PROMPT), " The task list is empty.");
    }

    #[test]
    fn leaves_output_without_echo_alone() {
        assert_eq!(strip_prompt_echo("Just the answer", PROMPT), "Just the answer");
        assert_eq!(strip_prompt_echo("Just the answer", ""), "Just the answer");
    }

    #[test]
    fn truncates_invented_turns() {
        assert_eq!(
            truncate_at_turn_marker("Finish the design first.</s>\n<|user|>\nthanks"),
            "Finish the design first."
        );
        assert_eq!(
            truncate_at_turn_marker("Finish the design first.\nUser: ok\nAssistant: great"),
            "Finish the design first."
        );
        assert_eq!(
            truncate_at_turn_marker("Ratio: 3 of 5 tasks"),
            "Ratio: 3 of 5 tasks"
        );
    }

    #[test]
    fn empty_output_becomes_clarification() {
        let raw = format!("{}   </s>", PROMPT);
        assert_eq!(postprocess(&raw, PROMPT, "How is it going?"), EMPTY_REPLY);
    }

    #[test]
    fn on_topic_reply_is_untouched() {
        let raw = format!("{}Focus on the high priority tasks.", PROMPT);
        assert_eq!(
            postprocess(&raw, PROMPT, "How is it going?"),
            "Focus on the high priority tasks."
        );
    }

    #[test]
    fn reply_sharing_question_words_is_on_topic() {
        assert!(is_on_topic("Bananas are yellow.", "Why are bananas yellow?"));
    }

    #[test]
    fn drifting_reply_gets_redirect() {
        let out = keep_on_topic("The weather is lovely today.", "Any news?");
        assert!(out.starts_with("The weather is lovely today."));
        assert!(out.ends_with(REDIRECT_NOTE));
    }
}
