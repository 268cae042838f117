//! Drives one turn per option selection.

use futures::StreamExt;
use tokio::sync::watch;

use super::state::Conversation;
use super::transport::{ChatTransport, TransportError};
use super::types::{ChatSession, FormOption};
use crate::wire::{ChatTurn, FrameDecoder, StreamFrame};

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply streamed to completion; follow-up options are offered.
    Completed,
    /// The request or stream failed; the apology and recovery options are shown.
    Failed,
}

/// Rejected selections.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The id is not in the currently offered option set.
    #[error("option `{0}` is not currently offered")]
    UnknownOption(String),
}

/// Owns a [`Conversation`] and runs turns against a [`ChatTransport`].
///
/// Every state change is published on a watch channel, so renderers can
/// follow a turn while it streams.
pub struct ConversationController<T> {
    state: Conversation,
    transport: T,
    updates: watch::Sender<Conversation>,
}

impl<T> std::fmt::Debug for ConversationController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: ChatTransport> ConversationController<T> {
    /// Start a fresh conversation.
    pub fn new(transport: T) -> Self {
        Self::with_state(transport, Conversation::new())
    }

    /// Resume from an existing state.
    pub fn with_state(transport: T, state: Conversation) -> Self {
        let (updates, _) = watch::channel(state.clone());
        Self {
            state,
            transport,
            updates,
        }
    }

    pub fn state(&self) -> &Conversation {
        &self.state
    }

    /// Receiver of state snapshots, starting from the current state.
    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.updates.subscribe()
    }

    pub fn session(&self) -> ChatSession {
        self.state.to_session()
    }

    /// Select one of the currently offered options by id.
    pub async fn select_by_id(&mut self, id: &str) -> Result<TurnOutcome, ControllerError> {
        let option = self
            .state
            .find_option(id)
            .cloned()
            .ok_or_else(|| ControllerError::UnknownOption(id.to_string()))?;
        Ok(self.select(option).await)
    }

    /// Run one turn for `option`.
    pub async fn select(&mut self, option: FormOption) -> TurnOutcome {
        let history = self.state.begin_turn(&option);
        self.publish();

        tracing::info!(
            name: "conversation.turn.started",
            conversation_id = %self.state.id(),
            option = %option.value,
            history_len = history.len(),
            "Turn started"
        );

        let outcome = match self.stream_reply(history).await {
            Ok(()) => {
                self.state.complete_turn(&option.value);
                tracing::info!(
                    name: "conversation.turn.completed",
                    conversation_id = %self.state.id(),
                    option = %option.value,
                    "Turn completed"
                );
                TurnOutcome::Completed
            }
            Err(e) => {
                tracing::error!(
                    name: "conversation.turn.failed",
                    conversation_id = %self.state.id(),
                    option = %option.value,
                    error = %e,
                    "Turn failed"
                );
                self.state.fail_turn();
                TurnOutcome::Failed
            }
        };

        self.publish();
        outcome
    }

    async fn stream_reply(&mut self, history: Vec<ChatTurn>) -> Result<(), TransportError> {
        let mut chunks = self.transport.open(history).await?;
        let mut decoder = FrameDecoder::default();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            for frame in decoder.push(&chunk) {
                if self.apply(frame) {
                    return Ok(());
                }
            }
        }

        // Body ended without the sentinel; treat what arrived as the reply.
        for frame in decoder.finish() {
            if self.apply(frame) {
                break;
            }
        }
        Ok(())
    }

    /// Returns `true` once the stream is complete.
    fn apply(&mut self, frame: StreamFrame) -> bool {
        match frame {
            StreamFrame::Content(text) => {
                self.state.append_fragment(&text);
                self.publish();
                false
            }
            StreamFrame::Done => true,
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }
}
