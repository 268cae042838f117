use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderName, StatusCode, header},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::conversation::{ChatSession, ChatTransport, HttpTransport};
use crate::llm::{DriverError, GeminiDriver, LlmDriver};
use crate::ui::{conversation_fragment, index_page};
use crate::wire::{ChatRequest, StreamFrame, sse_frame};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let settings = config.llm_settings();
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        max_output_tokens = settings.max_output_tokens,
        temperature = settings.temperature,
        "LLM configuration loaded"
    );

    let driver: Arc<dyn LlmDriver> = Arc::new(GeminiDriver::new(settings));
    let transport: Arc<dyn ChatTransport> =
        Arc::new(HttpTransport::new(config.ui_api_base_url())?);

    let state = AppState::new(Arc::clone(&config), driver, transport);
    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        ui_api_base_url = %config.ui_api_base_url(),
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(index_handler))
        .route("/ui/conversation", get(ui_conversation))
        .route("/ui/events", get(ui_events))
        .route("/ui/options/{id}", post(ui_select_option))
        // API routes
        .route("/api/chat", post(api_chat))
        .route("/api/session", get(api_session))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failures of `POST /api/chat` that happen before streaming starts.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The request carried no messages.
    #[error("messages must not be empty")]
    EmptyHistory,
    /// The upstream call could not be started.
    #[error(transparent)]
    Upstream(#[from] DriverError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::EmptyHistory | Self::Upstream(DriverError::EmptyHistory) => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/chat - Relay the model's reply as SSE frames.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ProxyError> {
    if req.messages.is_empty() {
        return Err(ProxyError::EmptyHistory);
    }

    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        name: "chat.request.received",
        request_id = %request_id,
        message_count = req.messages.len(),
        "Received chat request"
    );

    let fragments = state.driver.stream(req.messages).await.map_err(|e| {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            "Failed to start upstream stream"
        );
        ProxyError::from(e)
    })?;

    let sse_stream = async_stream::stream! {
        let mut fragments = fragments;
        let mut relayed = 0usize;

        while let Some(item) = fragments.next().await {
            match item {
                Ok(text) => {
                    relayed += 1;
                    tracing::trace!(request_id = %request_id, delta_length = text.len(), "Message delta");
                    yield Ok::<String, DriverError>(sse_frame(&StreamFrame::Content(text)));
                }
                Err(e) => {
                    // Aborting the body is how the client learns about it.
                    tracing::error!(
                        request_id = %request_id,
                        error = %e,
                        fragments = relayed,
                        "Upstream stream failed"
                    );
                    yield Err(e);
                    return;
                }
            }
        }

        tracing::info!(
            name: "chat.stream.completed",
            request_id = %request_id,
            fragments = relayed,
            "Stream complete"
        );
        yield Ok(sse_frame(&StreamFrame::Done));
    };

    Ok(build_sse_response(Body::from_stream(sse_stream)))
}

/// GET /api/session - Snapshot of the UI conversation.
async fn api_session(State(state): State<AppState>) -> Json<ChatSession> {
    Json(state.updates.borrow().to_session())
}

/// GET /health - Liveness probe.
async fn health() -> &'static str {
    "ok"
}

// ─────────────────────────────────────────────────────────────────────────────
// UI Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Index page handler.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let conv = state.updates.borrow().clone();
    Html(index_page(&conv))
}

/// GET /ui/conversation - The conversation panel as an HTML fragment.
async fn ui_conversation(State(state): State<AppState>) -> Html<String> {
    let conv = state.updates.borrow().clone();
    Html(conversation_fragment(&conv))
}

/// GET /ui/events - Re-rendered conversation panel on every change.
async fn ui_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.updates.clone()).map(|conv| {
        Ok::<_, Infallible>(
            Event::default()
                .event("conversation")
                .data(conversation_fragment(&conv)),
        )
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// POST /ui/options/:id - Start a turn for an offered option.
async fn ui_select_option(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let Ok(mut controller) = Arc::clone(&state.conversation).try_lock_owned() else {
        tracing::debug!(option = %id, "Selection rejected, turn in progress");
        return StatusCode::CONFLICT;
    };

    if controller.state().find_option(&id).is_none() {
        tracing::debug!(option = %id, "Selection rejected, option not offered");
        return StatusCode::NOT_FOUND;
    }

    tokio::spawn(async move {
        if let Err(e) = controller.select_by_id(&id).await {
            tracing::warn!(option = %id, error = %e, "Selection rejected");
        }
    });

    StatusCode::ACCEPTED
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn build_sse_response(body: Body) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    )
        .into_response()
}
