//! Static option sets.
//!
//! The follow-up set is picked by the value token of the option that started
//! the turn. Unknown tokens (including `retry` and `restart`) fall back to
//! [`DEFAULT_SET`].

use super::types::FormOption;

/// First message of every conversation.
pub const GREETING: &str = "Hello! I'm your form-based chatbot. I'll ask you questions and you can click to choose your answers. Let's get started!";

/// Assistant message appended when a turn fails.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// `(id, label, value)`
type Entry = (&'static str, &'static str, &'static str);

const START_SET: [Entry; 3] = [
    ("start-1", "Tell me about yourself", "tell-about"),
    ("start-2", "How do you work?", "how-work"),
    ("start-3", "Ask me a question", "ask-question"),
];

const TELL_ABOUT_SET: [Entry; 3] = [
    ("follow-1", "What can you help me with?", "capabilities"),
    ("follow-2", "Tell me a fun fact", "fun-fact"),
    ("follow-3", "Ask me something", "ask-me"),
];

const HOW_WORK_SET: [Entry; 3] = [
    ("follow-4", "What AI model powers you?", "ai-model"),
    ("follow-5", "Can you learn from our conversation?", "learning"),
    ("follow-6", "Show me something cool", "demo"),
];

/// Follow-up set for any unrecognized value.
pub const DEFAULT_SET: [Entry; 3] = [
    ("gen-1", "Tell me more", "more-info"),
    ("gen-2", "Change topic", "new-topic"),
    ("gen-3", "Ask me a question", "reverse-q"),
];

const RECOVERY_SET: [Entry; 2] = [
    ("retry-1", "Try again", "retry"),
    ("restart-1", "Start over", "restart"),
];

fn build(entries: &[Entry]) -> Vec<FormOption> {
    entries
        .iter()
        .map(|(id, label, value)| FormOption::new(*id, *label, *value))
        .collect()
}

/// Options offered alongside the greeting.
pub fn start_options() -> Vec<FormOption> {
    build(&START_SET)
}

/// Options offered after a successful turn started by `previous_value`.
pub fn next_options(previous_value: &str) -> Vec<FormOption> {
    match previous_value {
        "tell-about" => build(&TELL_ABOUT_SET),
        "how-work" => build(&HOW_WORK_SET),
        _ => build(&DEFAULT_SET),
    }
}

/// Options offered after a failed turn.
pub fn recovery_options() -> Vec<FormOption> {
    build(&RECOVERY_SET)
}
