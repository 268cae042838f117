//! Conversation fragment.

use std::fmt::Write as _;

use super::escape;
use crate::conversation::{Conversation, FormOption, Message};
use crate::wire::MessageRole;

/// Render the whole conversation panel.
///
/// The options panel is only shown when options are offered and no turn is
/// in flight.
pub fn conversation_fragment(conv: &Conversation) -> String {
    let mut html = String::from(
        r#"<div id="messages" class="flex-1 overflow-y-auto p-6 space-y-4">"#,
    );
    for message in conv.messages() {
        html.push_str(&message_bubble(message));
    }
    if conv.is_loading() && conv.pending_message().is_none() {
        html.push_str(LOADING);
    }
    html.push_str("</div>");

    if !conv.options().is_empty() && !conv.is_loading() {
        html.push_str(&option_panel(conv.options()));
    }
    html
}

fn message_bubble(message: &Message) -> String {
    let (row, bubble, time) = match message.role {
        MessageRole::User => (
            "flex justify-end",
            "bg-blue-600 text-white",
            "text-blue-100",
        ),
        MessageRole::Assistant => (
            "flex justify-start",
            "bg-gray-100 dark:bg-gray-700 text-gray-900 dark:text-gray-100",
            "text-gray-500 dark:text-gray-400",
        ),
    };

    format!(
        r#"<div class="{row}" id="msg-{id}" data-role="{role}"><div class="max-w-[80%] rounded-2xl px-4 py-3 shadow-sm {bubble}"><p class="whitespace-pre-wrap break-words">{content}</p><p class="text-xs mt-1 {time}">{at}</p></div></div>"#,
        id = escape(&message.id),
        role = message.role.as_str(),
        content = escape(&message.content),
        at = message.display_time(),
    )
}

fn option_panel(options: &[FormOption]) -> String {
    let mut html = String::from(
        r#"<div id="options" class="border-t border-gray-200 dark:border-gray-700 p-4 bg-gray-50 dark:bg-gray-900"><p class="text-sm text-gray-600 dark:text-gray-400 mb-3">Choose an option to continue:</p><div class="flex flex-col gap-2">"#,
    );
    for option in options {
        let _ = write!(
            html,
            r#"<button type="button" class="w-full text-left px-4 py-3 bg-white dark:bg-gray-800 border-2 border-blue-500 hover:bg-blue-50 dark:hover:bg-gray-700 rounded-xl transition-all duration-200 font-medium shadow-sm hover:shadow-md" hx-post="/ui/options/{id}" hx-swap="none" data-value="{value}">{label}</button>"#,
            id = escape(&option.id),
            value = escape(&option.value),
            label = escape(&option.label),
        );
    }
    html.push_str("</div></div>");
    html
}

const LOADING: &str = r#"<div id="loading" class="flex justify-start" aria-label="Assistant is typing"><div class="bg-gray-100 dark:bg-gray-700 rounded-2xl px-4 py-3 flex gap-1"><span class="w-2 h-2 bg-gray-400 rounded-full animate-bounce"></span><span class="w-2 h-2 bg-gray-400 rounded-full animate-bounce [animation-delay:0.15s]"></span><span class="w-2 h-2 bg-gray-400 rounded-full animate-bounce [animation-delay:0.3s]"></span></div></div>"#;
