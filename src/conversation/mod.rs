//! Option-driven conversation.
//!
//! The user never types: each turn starts when an offered [`FormOption`] is
//! selected. The [`ConversationController`] appends the option's label as a
//! user message, posts the full history through a [`ChatTransport`], streams
//! the reply into a single pending assistant message and finally offers the
//! follow-up set keyed by the option's value.
//!
//! # Architecture
//!
//! - [`types`]: messages, options and the exported [`ChatSession`]
//! - [`options`]: the static option table
//! - [`state`]: [`Conversation`], the state container
//! - [`transport`]: [`ChatTransport`] and its HTTP implementation
//! - [`controller`]: [`ConversationController`], which runs turns
//!
//! # Example
//!
//! ```rust
//! use form_chat::conversation::Conversation;
//!
//! let conversation = Conversation::new();
//! assert_eq!(conversation.messages().len(), 1);
//! assert_eq!(conversation.options().len(), 3);
//! ```

pub mod controller;
pub mod options;
pub mod state;
pub mod transport;
pub mod types;

pub use controller::{ControllerError, ConversationController, TurnOutcome};
pub use state::Conversation;
pub use transport::{ChatTransport, ChunkStream, HttpTransport, TransportError};
pub use types::{ChatSession, FormOption, Message};
