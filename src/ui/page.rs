//! Document shell and the chat page.

use super::render::conversation_fragment;
use crate::conversation::Conversation;

/// Generate the HTML shell for the application.
fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="AI-powered conversational chatbot with interactive form questions">
    <title>{title}</title>
    <script src="https://unpkg.com/htmx.org@2.0.4"></script>
    <script src="https://unpkg.com/htmx-ext-sse@2.2.2/sse.js"></script>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="antialiased">
    <main class="flex min-h-screen flex-col items-center justify-center p-4 bg-gradient-to-br from-blue-50 to-indigo-100 dark:from-gray-900 dark:to-gray-800">
        {content}
    </main>
</body>
</html>"#
    )
}

/// The chat page, pre-rendered with the current conversation.
pub fn index_page(conv: &Conversation) -> String {
    let panel = conversation_fragment(conv);
    let content = format!(
        r#"<div class="w-full max-w-4xl">
            <div class="text-center mb-6">
                <h1 class="text-4xl font-bold text-gray-900 dark:text-white mb-2">Form-Based Chatbot</h1>
                <p class="text-gray-600 dark:text-gray-300">Click on options to have a conversation - no typing required!</p>
            </div>
            <div id="conversation"
                 class="bg-white dark:bg-gray-800 rounded-2xl shadow-2xl overflow-hidden flex flex-col h-[600px]"
                 hx-ext="sse"
                 sse-connect="/ui/events"
                 sse-swap="conversation"
                 hx-swap="innerHTML"
                 hx-on::after-settle="const m = document.getElementById('messages'); if (m) m.scrollTop = m.scrollHeight;">{panel}</div>
        </div>"#
    );
    html_shell("Form-Based Chatbot", &content)
}
