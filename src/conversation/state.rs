//! The conversation state container.
//!
//! All mutation goes through four entry points, mirroring one turn:
//! [`Conversation::begin_turn`], [`Conversation::append_fragment`], then
//! either [`Conversation::complete_turn`] or [`Conversation::fail_turn`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::options::{APOLOGY, GREETING, next_options, recovery_options, start_options};
use super::types::{ChatSession, FormOption, Message};
use crate::wire::ChatTurn;

/// Messages, offered options and the loading flag of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    messages: Vec<Message>,
    options: Vec<FormOption>,
    loading: bool,
    /// Index of the assistant message currently being streamed.
    pending: Option<usize>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh conversation: the greeting and the start options.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(vec![Message::assistant(GREETING)], start_options())
    }

    /// A conversation with the given history and offered options.
    #[must_use]
    pub fn from_parts(messages: Vec<Message>, options: Vec<FormOption>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            messages,
            options,
            loading: false,
            pending: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn options(&self) -> &[FormOption] {
        &self.options
    }

    /// Whether a turn is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The assistant message being streamed, if any.
    pub fn pending_message(&self) -> Option<&Message> {
        self.pending.and_then(|idx| self.messages.get(idx))
    }

    /// Look up a currently offered option.
    pub fn find_option(&self, id: &str) -> Option<&FormOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Record the user's choice and return the history to send.
    ///
    /// Appends exactly one user message, clears the options and sets the
    /// loading flag.
    pub fn begin_turn(&mut self, option: &FormOption) -> Vec<ChatTurn> {
        self.messages.push(Message::user(option.label.clone()));
        self.options.clear();
        self.loading = true;
        self.pending = None;
        self.touch();
        self.messages.iter().map(Message::to_turn).collect()
    }

    /// Append streamed text to the pending assistant message, creating it on
    /// the first non-empty fragment.
    pub fn append_fragment(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.pending.and_then(|idx| self.messages.get_mut(idx)) {
            Some(message) => message.content.push_str(text),
            None => {
                self.messages.push(Message::assistant(text));
                self.pending = Some(self.messages.len() - 1);
            }
        }
        self.touch();
    }

    /// Close the turn and offer the follow-ups for `previous_value`.
    pub fn complete_turn(&mut self, previous_value: &str) {
        self.pending = None;
        self.options = next_options(previous_value);
        self.loading = false;
        self.touch();
    }

    /// Close the turn with the apology and the recovery options.
    ///
    /// Text streamed before the failure is kept.
    pub fn fail_turn(&mut self) {
        self.pending = None;
        self.messages.push(Message::assistant(APOLOGY));
        self.options = recovery_options();
        self.loading = false;
        self.touch();
    }

    /// Export as a [`ChatSession`].
    pub fn to_session(&self) -> ChatSession {
        ChatSession {
            id: self.id.clone(),
            messages: self.messages.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::MessageRole;

    fn tell_about() -> FormOption {
        FormOption::new("start-1", "Tell me about yourself", "tell-about")
    }

    #[test]
    fn test_new_conversation() {
        let conv = Conversation::new();
        assert_eq!(conv.messages().len(), 1);
        assert_eq!(conv.messages()[0].content, GREETING);
        assert_eq!(conv.options().len(), 3);
        assert!(!conv.is_loading());
        assert!(conv.find_option("start-2").is_some());
    }

    #[test]
    fn test_begin_turn_appends_one_user_message() {
        let mut conv = Conversation::new();
        let history = conv.begin_turn(&tell_about());

        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[1].role, MessageRole::User);
        assert_eq!(conv.messages()[1].content, "Tell me about yourself");
        assert!(conv.options().is_empty());
        assert!(conv.is_loading());

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::Assistant);
        assert_eq!(history[1].content, "Tell me about yourself");
    }

    #[test]
    fn test_fragments_accumulate_into_one_message() {
        let mut conv = Conversation::new();
        conv.begin_turn(&tell_about());
        assert!(conv.pending_message().is_none());

        conv.append_fragment("");
        assert_eq!(conv.messages().len(), 2);

        for part in ["I am ", "a form-based ", "chatbot."] {
            conv.append_fragment(part);
        }
        assert_eq!(conv.messages().len(), 3);
        assert_eq!(
            conv.pending_message().map(|m| m.content.as_str()),
            Some("I am a form-based chatbot.")
        );
    }

    #[test]
    fn test_complete_turn_freezes_reply() {
        let mut conv = Conversation::new();
        conv.begin_turn(&tell_about());
        conv.append_fragment("done");
        conv.complete_turn("tell-about");

        assert!(conv.pending_message().is_none());
        assert!(!conv.is_loading());
        let values: Vec<_> = conv.options().iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["capabilities", "fun-fact", "ask-me"]);

        // A stray fragment after completion starts a new message.
        conv.append_fragment("late");
        assert_eq!(conv.messages()[2].content, "done");
        assert_eq!(conv.messages().len(), 4);
    }

    #[test]
    fn test_fail_turn_keeps_partial_text() {
        let mut conv = Conversation::new();
        conv.begin_turn(&tell_about());
        conv.append_fragment("partial");
        conv.fail_turn();

        let contents: Vec<_> = conv.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[2], "partial");
        assert_eq!(contents[3], APOLOGY);
        assert_eq!(conv.options().len(), 2);
        assert!(!conv.is_loading());
    }

    #[test]
    fn test_to_session() {
        let mut conv = Conversation::new();
        conv.begin_turn(&tell_about());
        let session = conv.to_session();
        assert_eq!(session.id, conv.id());
        assert_eq!(session.messages.len(), 2);
        assert!(session.updated_at >= session.created_at);
    }
}
