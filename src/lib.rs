//! Form-based chatbot
//!
//! A chat UI where the user never types: every turn starts by clicking one of
//! a few offered options, the model's reply streams in over server-sent
//! events, and the next option set is chosen from a static table keyed by the
//! previous choice.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server; `POST /api/chat` relays Gemini output as SSE
//! - **LLM**: streaming driver for the Gemini `streamGenerateContent` API
//! - **Conversation**: state container and controller that consume the stream
//! - **UI**: server-rendered HTML + HTMX, refreshed from an SSE feed
//!
//! # Modules
//!
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`conversation`]: messages, option sets and the turn controller
//! - [`llm`]: upstream model driver
//! - [`server`]: router and HTTP handlers
//! - [`ui`]: HTML rendering
//! - [`wire`]: request body and stream frame format

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod conversation;
pub mod llm;
pub mod server;
pub mod ui;
pub mod wire;

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::config::AppConfig;
use crate::conversation::{ChatTransport, Conversation, ConversationController};
use crate::llm::LlmDriver;

/// The controller behind the browser UI.
pub type UiController = ConversationController<Arc<dyn ChatTransport>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream model driver used by the chat proxy.
    pub driver: Arc<dyn LlmDriver>,
    /// The single UI conversation; locked for the duration of a turn.
    pub conversation: Arc<Mutex<UiController>>,
    /// Snapshots of the UI conversation, readable while a turn runs.
    pub updates: watch::Receiver<Conversation>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the state around a fresh UI conversation.
    pub fn new(
        config: Arc<AppConfig>,
        driver: Arc<dyn LlmDriver>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let controller = ConversationController::new(transport);
        let updates = controller.subscribe();
        Self {
            driver,
            conversation: Arc::new(Mutex::new(controller)),
            updates,
            config,
        }
    }
}
