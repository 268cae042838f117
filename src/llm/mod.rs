//! Upstream model driver.
//!
//! The proxy hands the conversation history to an [`LlmDriver`] and relays
//! the text fragments it yields. [`GeminiDriver`] is the production
//! implementation; tests plug in scripted drivers.
//!
//! # Example
//!
//! ```rust,ignore
//! use form_chat::llm::{GeminiDriver, LlmDriver, LlmSettings};
//! use form_chat::wire::{ChatTurn, MessageRole};
//!
//! let driver = GeminiDriver::new(LlmSettings {
//!     base_url: "https://generativelanguage.googleapis.com".to_string(),
//!     api_key: "...".to_string(),
//!     model: "gemini-2.5-flash".to_string(),
//!     max_output_tokens: 1000,
//!     temperature: 0.7,
//! });
//! let fragments = driver
//!     .stream(vec![ChatTurn::new(MessageRole::User, "Hello")])
//!     .await?;
//! ```

pub mod gemini;

pub use gemini::GeminiDriver;

use std::pin::Pin;

use futures::Stream;

use crate::wire::ChatTurn;

/// Upstream connection and generation settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// API root, without the version segment.
    pub base_url: String,
    /// Secret credential sent with every request.
    pub api_key: String,
    /// Model identifier (e.g. `gemini-2.5-flash`).
    pub model: String,
    /// Upper bound on generated tokens per reply.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Errors raised while talking to the upstream model.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Nothing to send.
    #[error("conversation history is empty")]
    EmptyHistory,
    /// Connection or body read failure.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
    /// An upstream event could not be parsed.
    #[error("malformed upstream event: {0}")]
    Decode(#[from] serde_json::Error),
    /// Upstream reported an error inside the stream.
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// Stream of text fragments produced by a driver.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, DriverError>> + Send>>;

/// Streaming access to a chat model.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Send `history` (the last turn is the new message) and stream the
    /// reply as text fragments, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be started; failures after that
    /// point surface as items of the stream.
    async fn stream(&self, history: Vec<ChatTurn>) -> Result<FragmentStream, DriverError>;
}
