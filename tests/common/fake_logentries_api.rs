//! Fake LogEntries pull API for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves `GET /{key}/hosts/{*path}`, answering with the
//! configured status and body and remembering every request it saw.
//!
//! # Example
//!
//! ```rust,ignore
//! let api = FakeLogEntriesApi::start().await.unwrap();
//! api.set_body("2015-06-12T00:11:22Z app a=1\n").await;
//!
//! // Point the source at api.base_url()
//! let source = LogEntriesSource::new(api.base_url());
//! ```

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// One request as the server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub key: String,
    pub path: String,
    pub query: String,
}

struct ApiState {
    status: StatusCode,
    body: String,
    requests: Vec<SeenRequest>,
}

/// Handle to the running fake API server.
pub struct FakeLogEntriesApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeLogEntriesApi {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState {
            status: StatusCode::OK,
            body: String::new(),
            requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/{key}/hosts/{*path}", get(pull_logs))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn set_body(&self, body: impl Into<String>) {
        self.state.lock().await.body = body.into();
    }

    pub async fn set_status(&self, status: u16) {
        self.state.lock().await.status =
            StatusCode::from_u16(status).expect("valid HTTP status");
    }

    pub async fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().await.requests.clone()
    }
}

async fn pull_logs(
    State(state): State<Arc<Mutex<ApiState>>>,
    Path((key, path)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let mut state = state.lock().await;
    state.requests.push(SeenRequest {
        key,
        path,
        query: query.unwrap_or_default(),
    });
    (state.status, state.body.clone())
}
