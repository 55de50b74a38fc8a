// Mock warmup target for integration tests
#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Behaviour of the mock target
#[derive(Clone, Debug)]
pub struct MockTargetConfig {
    pub status: u16,
    pub response_delay_ms: u64,
}

impl Default for MockTargetConfig {
    fn default() -> Self {
        Self {
            status: 200,
            response_delay_ms: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub user_agent: Option<String>,
    pub warmup_header: Option<String>,
}

struct TargetState {
    config: MockTargetConfig,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockTarget {
    state: Arc<TargetState>,
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockTarget {
    pub async fn start(config: MockTargetConfig) -> Self {
        let state = Arc::new(TargetState {
            config,
            requests: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock target");
        let port = listener.local_addr().expect("local addr").port();

        let app = Router::new().fallback(handler).with_state(state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                eprintln!("Mock target error: {}", e);
            }
        });

        Self {
            state,
            port,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for MockTarget {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn handler(State(state): State<Arc<TargetState>>, uri: Uri, headers: HeaderMap) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        user_agent: header("user-agent"),
        warmup_header: header("x-warmup-request"),
    });

    if state.config.response_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.config.response_delay_ms)).await;
    }

    let status =
        StatusCode::from_u16(state.config.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "warm").into_response()
}

/// A localhost port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
