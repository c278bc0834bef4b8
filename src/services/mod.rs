//! Network services (feature-gated).
//!
//! - `web` feature: Axum-based HTTP boundary with the `/run_sine` endpoint
//!
//! ```ignore
//! use std::sync::Arc;
//! use shake_table::config::Config;
//! use shake_table::services::{run_server, WebServerConfig, WebState};
//!
//! let config = Config::default();
//! let state = Arc::new(WebState::from_config(&config));
//! run_server(state, WebServerConfig::from_config(&config.web)).await?;
//! ```

#[cfg(feature = "web")]
pub mod web;

#[cfg(feature = "web")]
pub use web::*;
