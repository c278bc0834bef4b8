//! Desktop web server for the shake table control page.
//!
//! Serves the page at `/` and acknowledges `POST /run_sine` requests,
//! echoing the accepted parameters.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example web_server --features web
//!
//! # Port 80 needs privileges; pick another one
//! PORT=8080 cargo run --example web_server --features web
//! ```

use std::sync::Arc;

use shake_table::services::{run_server, WebServerConfig, WebState};
use shake_table::{Config, WebConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut web = WebConfig::default();
    if let Ok(port) = std::env::var("PORT") {
        web = web.with_port(port.parse()?);
    }
    let config = Config::default().with_web(web);
    info!(device = %config.device.name, port = config.web.port, "starting web server");

    let state = Arc::new(WebState::from_config(&config));
    run_server(state, WebServerConfig::from_config(&config.web)).await?;
    Ok(())
}
