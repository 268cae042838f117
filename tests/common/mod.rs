//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use form_chat::AppState;
use form_chat::config::{AppConfig, LlmConfig, LogConfig, ServerConfig, UiConfig};
use form_chat::conversation::{ChatTransport, HttpTransport};
use form_chat::llm::{DriverError, FragmentStream, LlmDriver};
use form_chat::server::router;
use form_chat::wire::ChatTurn;
use futures::stream;

/// What a [`ScriptedDriver`] does with each request.
#[derive(Debug, Clone)]
pub enum Script {
    /// Yield these fragments, then end.
    Fragments(Vec<&'static str>),
    /// Refuse to start the stream.
    FailOpen,
    /// Yield these fragments, then fail.
    FailAfter(Vec<&'static str>),
}

/// Driver that replays a fixed script and records every history it receives.
#[derive(Debug)]
pub struct ScriptedDriver {
    script: Script,
    pub seen: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedDriver {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Vec<ChatTurn>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmDriver for ScriptedDriver {
    async fn stream(&self, history: Vec<ChatTurn>) -> Result<FragmentStream, DriverError> {
        self.seen.lock().unwrap().push(history);

        let items: Vec<Result<String, DriverError>> = match &self.script {
            Script::FailOpen => {
                return Err(DriverError::Status {
                    status: 503,
                    body: "model overloaded".to_string(),
                });
            }
            Script::Fragments(parts) => parts.iter().map(|p| Ok((*p).to_string())).collect(),
            Script::FailAfter(parts) => parts
                .iter()
                .map(|p| Ok((*p).to_string()))
                .chain(std::iter::once(Err(DriverError::Upstream(
                    "connection reset".to_string(),
                ))))
                .collect(),
        };
        Ok(Box::pin(stream::iter(items)))
    }
}

/// A complete configuration that needs no environment.
pub fn test_config(port: u16) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port,
            host: "127.0.0.1".to_string(),
        },
        llm: LlmConfig {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gemini-2.5-flash".to_string(),
            max_output_tokens: 1000,
            temperature: 0.7,
        },
        ui: UiConfig::default(),
        log: LogConfig::default(),
    }
}

/// State whose UI transport points at `port` on loopback.
pub fn test_state(driver: Arc<dyn LlmDriver>, port: u16) -> AppState {
    let config = Arc::new(test_config(port));
    let transport: Arc<dyn ChatTransport> =
        Arc::new(HttpTransport::new(config.ui_api_base_url()).unwrap());
    AppState::new(config, driver, transport)
}

/// Serve the full app on an ephemeral loopback port.
pub async fn spawn_app(driver: Arc<dyn LlmDriver>) -> (SocketAddr, AppState) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = test_state(driver, addr.port());
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}
