//! google-automation-mcp bridge
//!
//! A thin stdio process that finds a way to launch the google-automation-mcp
//! server, then proxies MCP traffic to it unchanged. If no launch strategy
//! works, the client still receives a JSON-RPC error response.

pub mod backend;
pub mod config;
pub mod jsonrpc;
pub mod session;
pub mod signals;

mod error;

pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use session::{BridgeSession, SessionState};

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::backend::BridgeIo;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "GOOGLE_AUTOMATION_MCP_BRIDGE_LOG";

/// Logs go to stderr only; stdout carries the protocol.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("mcp_bridge_lib=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Run one bridge session over the process's stdio and return its exit code
pub async fn run() -> i32 {
    init_tracing();

    tracing::info!("Starting google-automation-mcp bridge v{}", env!("CARGO_PKG_VERSION"));

    let config = BridgeConfig::load();

    let mut signals = match signals::listen() {
        Ok(rx) => rx,
        Err(e) => {
            tracing::warn!("Signal forwarding unavailable: {}", e);
            mpsc::channel(1).1
        }
    };

    let mut io = BridgeIo::stdio();
    let mut session = BridgeSession::new(config);
    session.run(&mut io, &mut signals).await
}
