//! Bridge session state machine
//!
//! One session per bridge invocation: locate a backend, relay until it
//! exits, then terminate with the exit code the client should see.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::backend::{locator, supervisor, BridgeIo};
use crate::config::BridgeConfig;
use crate::jsonrpc::ErrorResponse;
use crate::signals::ForwardSignal;
use crate::Error;

/// Exit code for sessions that end without a usable backend
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Where a session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Locating,
    Relaying { pid: u32 },
    Terminating { exit_code: i32 },
}

/// The single top-level context of a bridge invocation
pub struct BridgeSession {
    config: BridgeConfig,
    state: SessionState,
}

impl BridgeSession {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            state: SessionState::Locating,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the session to completion and return the bridge's exit code
    pub async fn run<I, O, E>(
        &mut self,
        io: &mut BridgeIo<I, O, E>,
        signals: &mut mpsc::Receiver<ForwardSignal>,
    ) -> i32
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let Some(backend) = locator::locate(&self.config) else {
            let response = ErrorResponse::backend_unavailable(&self.config.install_hint);
            return self.fail(response, &mut io.output).await;
        };

        self.transition(SessionState::Relaying { pid: backend.pid });

        match supervisor::supervise(backend, io, signals).await {
            Ok(status) => {
                let exit_code = supervisor::exit_code(&status);
                self.transition(SessionState::Terminating { exit_code });
                exit_code
            }
            Err(e) => {
                tracing::error!("Backend failed after start: {}", e);
                let response = match e {
                    // Client sees the OS error text, not our wrapper
                    Error::Io(e) => ErrorResponse::server_error(e),
                    other => ErrorResponse::server_error(other),
                };
                self.fail(response, &mut io.output).await
            }
        }
    }

    /// Report a fatal condition in protocol and terminate with failure
    async fn fail<O>(&mut self, response: ErrorResponse, output: &mut O) -> i32
    where
        O: AsyncWrite + Unpin,
    {
        if let Err(e) = response.write_to(output).await {
            tracing::error!("Failed to write error response: {}", e);
        }

        self.transition(SessionState::Terminating {
            exit_code: FAILURE_EXIT_CODE,
        });
        FAILURE_EXIT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::candidates::CandidateStrategy;

    fn session_for(candidates: Vec<CandidateStrategy>) -> BridgeSession {
        let mut config = BridgeConfig::with_candidates(candidates);
        config.use_shell = false;
        BridgeSession::new(config)
    }

    fn io_with_input(input: &[u8]) -> BridgeIo<&[u8], Vec<u8>, Vec<u8>> {
        BridgeIo {
            input,
            output: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_no_backend_emits_single_error() {
        let mut session = session_for(vec![
            CandidateStrategy::new("mcp-bridge-test-missing-a", Vec::<String>::new()),
            CandidateStrategy::new("mcp-bridge-test-missing-b", ["-m", "missing"]),
        ]);
        let mut io = io_with_input(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");
        let (_tx, mut rx) = mpsc::channel(1);

        let code = session.run(&mut io, &mut rx).await;

        assert_eq!(code, 1);
        assert_eq!(
            session.state(),
            SessionState::Terminating { exit_code: 1 }
        );
        assert_eq!(
            String::from_utf8(io.output).unwrap(),
            "{\"jsonrpc\":\"2.0\",\"error\":{\"code\":-32603,\"message\":\"Failed to start google-automation-mcp server. Please install it with: pip install google-automation-mcp\"},\"id\":null}\n"
        );
        assert!(io.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_runtime_failure_emits_server_error() {
        let mut session = session_for(vec![]);
        let mut out: Vec<u8> = Vec::new();

        let code = session
            .fail(
                ErrorResponse::server_error(std::io::Error::other("boom")),
                &mut out,
            )
            .await;

        assert_eq!(code, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"jsonrpc\":\"2.0\",\"error\":{\"code\":-32603,\"message\":\"Server error: boom\"},\"id\":null}\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_first_available_candidate_relays() {
        let mut session = session_for(vec![
            CandidateStrategy::new("mcp-bridge-test-missing", Vec::<String>::new()),
            CandidateStrategy::new("cat", Vec::<String>::new()),
        ]);
        let mut io = io_with_input(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n");
        let (_tx, mut rx) = mpsc::channel(1);

        let code = session.run(&mut io, &mut rx).await;

        assert_eq!(code, 0);
        assert_eq!(
            session.state(),
            SessionState::Terminating { exit_code: 0 }
        );
        assert_eq!(
            io.output,
            b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n".to_vec()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_backend_exit_code_mirrored() {
        let mut session = session_for(vec![CandidateStrategy::new("sh", ["-c", "exit 7"])]);
        let mut io = io_with_input(b"");
        let (_tx, mut rx) = mpsc::channel(1);

        let code = session.run(&mut io, &mut rx).await;

        assert_eq!(code, 7);
        assert!(io.output.is_empty());
    }
}
