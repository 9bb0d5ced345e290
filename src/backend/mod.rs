//! Backend server management
//!
//! This module locates the MCP server that does the real work, starts it,
//! and relays the bridge's stdio to it byte for byte.

pub mod candidates;
pub mod locator;
pub mod supervisor;

pub use candidates::{default_candidates, CandidateStrategy};
pub use locator::{locate, BackendProcess};
pub use supervisor::{supervise, BridgeIo};
