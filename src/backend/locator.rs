//! Backend process discovery
//!
//! Tries each candidate strategy in order and keeps the first process that
//! actually started.

use std::process::Stdio;

use tokio::process::{Child, Command};

use super::candidates::CandidateStrategy;
use crate::config::BridgeConfig;

/// A started backend, owned exclusively by whoever holds it
#[derive(Debug)]
pub struct BackendProcess {
    /// The child process with all three standard streams piped
    pub child: Child,

    /// Strategy that produced this process
    pub strategy: CandidateStrategy,

    /// OS process identifier
    pub pid: u32,
}

/// Build the launch command for a candidate
pub fn build_command(strategy: &CandidateStrategy, config: &BridgeConfig) -> Command {
    let mut command = if config.use_shell {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(&strategy.program).args(&strategy.args);
        command
    } else {
        let mut command = Command::new(&strategy.program);
        command.args(&strategy.args);
        command
    };

    command
        .envs(config.env_overrides.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    command
}

/// Start the first candidate that launches, or `None` if every one fails
///
/// Only immediate spawn failures are detected here. A process that starts
/// and then dies is left to the supervisor.
pub fn locate(config: &BridgeConfig) -> Option<BackendProcess> {
    for strategy in &config.candidates {
        match which::which(&strategy.program) {
            Ok(path) => tracing::debug!("Candidate `{}` resolves to {:?}", strategy, path),
            Err(_) => tracing::debug!("Candidate `{}` not found on PATH", strategy),
        }

        let mut child = match build_command(strategy, config).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("Failed to start `{}`: {}", strategy, e);
                continue;
            }
        };

        match child.id() {
            Some(pid) => {
                tracing::info!("Started backend `{}` (pid {})", strategy, pid);
                return Some(BackendProcess {
                    child,
                    strategy: strategy.clone(),
                    pid,
                });
            }
            None => {
                tracing::debug!("Candidate `{}` reported no pid, discarding", strategy);
                let _ = child.start_kill();
            }
        }
    }

    tracing::warn!(
        "No backend could be started ({} candidates tried)",
        config.candidates.len()
    );
    None
}
