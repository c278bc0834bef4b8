//! Axum-based HTTP boundary for the shake table.
//!
//! Provides:
//! - GET `/` - Control page (serves index.html)
//! - POST `/run_sine` - Accept sine parameters and echo them back
//!
//! The endpoint validates and acknowledges requests; it does not drive the
//! table.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::config::{Config, WebConfig};
use crate::messages::{parse_sine_request, ErrorResponse, RunSineResponse};

// ============================================================================
// Shared State
// ============================================================================

/// State shared by the route handlers.
#[derive(Debug)]
pub struct WebState {
    sampling_rate_hz: u32,
    accepted: AtomicU64,
}

impl WebState {
    /// Validate requests against the given sampling rate.
    pub fn new(sampling_rate_hz: u32) -> Self {
        Self {
            sampling_rate_hz,
            accepted: AtomicU64::new(0),
        }
    }

    /// Build from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.waveform.sampling_rate_hz)
    }

    /// Number of sine requests accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

impl Default for WebState {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

fn bad_request(error: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error))).into_response()
}

/// POST /run_sine - Accept sine parameters
///
/// Accepts JSON: `{"amplitude": 250, "frequency": 5.0, "duration": 3.0}`,
/// every field optional.
async fn run_sine(State(state): State<Arc<WebState>>, body: Bytes) -> Response {
    let Some(req) = parse_sine_request(&body) else {
        debug!(len = body.len(), "unparseable run_sine body");
        return bad_request("Invalid run_sine request");
    };

    if let Err(e) = req.to_sine_params(state.sampling_rate_hz).validate() {
        return bad_request(e.to_string());
    }

    state.accepted.fetch_add(1, Ordering::Relaxed);
    info!(
        amplitude = req.amplitude,
        frequency = req.frequency,
        duration = req.duration,
        "sine request accepted"
    );
    Json(RunSineResponse::from(req)).into_response()
}

/// GET / - Serve the control page
async fn index() -> impl IntoResponse {
    Html(include_str!("../../www/index.html"))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router(state: Arc<WebState>, config: &WebServerConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/run_sine", post(run_sine))
        .fallback(not_found)
        .with_state(state);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server
///
/// This function blocks until the server is shut down.
pub async fn run_server(state: Arc<WebState>, config: WebServerConfig) -> Result<(), std::io::Error> {
    let router = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "web server listening");

    axum::serve(listener, router).await
}
