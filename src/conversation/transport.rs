//! Client side of `POST /api/chat`.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use url::Url;

use crate::wire::{ChatRequest, ChatTurn};

/// Errors raised while opening or reading the chat stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection or body read failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The endpoint answered with a non-success status.
    #[error("chat endpoint returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        message: String,
    },
    /// Any other failure of a custom transport.
    #[error("{0}")]
    Other(String),
}

/// Raw body chunks of the chat stream.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Opens one chat stream per turn.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the full history and return the response body as raw chunks.
    async fn open(&self, history: Vec<ChatTurn>) -> Result<ChunkStream, TransportError>;
}

#[async_trait::async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn open(&self, history: Vec<ChatTurn>) -> Result<ChunkStream, TransportError> {
        (**self).open(history).await
    }
}

/// [`ChatTransport`] over HTTP.
///
/// # Example
///
/// ```rust,no_run
/// use form_chat::conversation::{ConversationController, HttpTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new("http://localhost:3000")?;
/// let mut controller = ConversationController::new(transport);
/// controller.select_by_id("start-1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, TransportError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a transport with a custom reqwest client.
    ///
    /// A path prefix on `base_url` is kept, so `http://host/app` posts to
    /// `http://host/app/api/chat`.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, TransportError> {
        let mut base = Url::parse(base_url.as_ref())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("api/chat")?;
        Ok(Self { endpoint, http })
    }

    /// The full URL of the chat endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, history: Vec<ChatTurn>) -> Result<ChunkStream, TransportError> {
        let req = ChatRequest { messages: history };
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(TransportError::from));
        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_api_path() {
        let transport = HttpTransport::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://127.0.0.1:3000/api/chat");

        let root = HttpTransport::new("http://127.0.0.1:3000/").unwrap();
        assert_eq!(root.endpoint().as_str(), "http://127.0.0.1:3000/api/chat");
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let nested = HttpTransport::new("http://example.com/app/").unwrap();
        assert_eq!(nested.endpoint().as_str(), "http://example.com/app/api/chat");

        let no_slash = HttpTransport::new("http://example.com/app").unwrap();
        assert_eq!(no_slash.endpoint().as_str(), "http://example.com/app/api/chat");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
