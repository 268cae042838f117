//! Gemini `streamGenerateContent` driver.
//!
//! Prior turns are sent as chat history and the trailing turn as the new
//! user message. The upstream SSE stream (`alt=sse`) carries one
//! `GenerateContentResponse` per event; the text parts of its first candidate
//! become one fragment.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::wire::{ChatTurn, LineBuffer, MessageRole, data_payload};

use super::{DriverError, FragmentStream, LlmDriver, LlmSettings};

/// Driver for the Gemini generative-language API.
#[derive(Clone)]
pub struct GeminiDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for GeminiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: String,
}

impl GeminiDriver {
    /// Create a driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    /// Create a driver sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, settings: LlmSettings) -> Self {
        Self { http, settings }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

/// Map the wire history onto Gemini's vocabulary.
pub(crate) fn build_request(
    history: &[ChatTurn],
    settings: &LlmSettings,
) -> Result<GenerateContentRequest, DriverError> {
    let Some((last, prior)) = history.split_last() else {
        return Err(DriverError::EmptyHistory);
    };

    // The new turn is always sent as the user's message.
    let contents = prior
        .iter()
        .map(|turn| text_content(gemini_role(turn.role), &turn.content))
        .chain(std::iter::once(text_content("user", &last.content)))
        .collect();

    Ok(GenerateContentRequest {
        contents,
        generation_config: GenerationConfig {
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
        },
    })
}

fn gemini_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::Assistant => "model",
        MessageRole::User => "user",
    }
}

fn text_content(role: &str, text: &str) -> Content {
    Content {
        role: Some(role.to_string()),
        parts: vec![Part {
            text: Some(text.to_string()),
        }],
    }
}

/// Decode one upstream event into the text it carries.
fn event_text(data: &str) -> Result<String, DriverError> {
    let resp: GenerateContentResponse = serde_json::from_str(data)?;
    if let Some(err) = resp.error {
        return Err(DriverError::Upstream(err.message));
    }

    Ok(resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

fn fragments<S, B>(byte_stream: S) -> impl Stream<Item = Result<String, DriverError>>
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
{
    async_stream::try_stream! {
        let mut lines = LineBuffer::default();

        futures::pin_mut!(byte_stream);
        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(DriverError::from)?;
            for line in lines.push(chunk.as_ref()) {
                let Some(data) = data_payload(&line) else {
                    continue;
                };
                let text = event_text(data)?;
                if !text.is_empty() {
                    yield text;
                }
            }
        }

        if let Some(line) = lines.finish() {
            if let Some(data) = data_payload(&line) {
                let text = event_text(data)?;
                if !text.is_empty() {
                    yield text;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl LlmDriver for GeminiDriver {
    async fn stream(&self, history: Vec<ChatTurn>) -> Result<FragmentStream, DriverError> {
        let body = build_request(&history, &self.settings)?;
        let url = self.stream_url();

        tracing::debug!(
            model = %self.settings.model,
            contents = body.contents.len(),
            "Sending streamGenerateContent request"
        );

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DriverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Box::pin(fragments(resp.bytes_stream())))
    }
}
