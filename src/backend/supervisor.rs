//! Stream relay and lifecycle supervision for a started backend
//!
//! Bridge stdin is copied to backend stdin, backend stdout to bridge stdout
//! and backend stderr to bridge stderr. Bytes are never inspected. The
//! relay ends when the backend exits.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use super::locator::BackendProcess;
use crate::signals::{forward, ForwardSignal};
use crate::{Error, Result};

/// How long to wait for trailing backend output after it exits
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

const CHUNK_SIZE: usize = 8 * 1024;

/// The bridge's own standard streams
pub struct BridgeIo<I, O, E> {
    /// Protocol input from the client
    pub input: I,

    /// Protocol output to the client
    pub output: O,

    /// Diagnostics channel, never mixed into `output`
    pub diagnostics: E,
}

impl BridgeIo<tokio::io::Stdin, tokio::io::Stdout, tokio::io::Stderr> {
    /// The process's real stdin, stdout and stderr
    pub fn stdio() -> Self {
        Self {
            input: tokio::io::stdin(),
            output: tokio::io::stdout(),
            diagnostics: tokio::io::stderr(),
        }
    }
}

/// Copy bytes until EOF, flushing after every chunk
///
/// The writer is shut down on EOF so the far side observes end of stream.
pub async fn pump<R, W>(mut reader: R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        total += n as u64;
    }

    writer.shutdown().await?;
    Ok(total)
}

/// Exit code the bridge should mirror for a backend status
///
/// A backend killed by a signal has no code; the bridge then exits 0.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(0)
}

/// Relay streams until the backend exits and return its status
///
/// Signals arriving on `signals` are forwarded to the backend while it is
/// still running. Failure to wait on the backend is returned as an error.
pub async fn supervise<I, O, E>(
    mut backend: BackendProcess,
    io: &mut BridgeIo<I, O, E>,
    signals: &mut mpsc::Receiver<ForwardSignal>,
) -> Result<ExitStatus>
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let child_stdin = backend
        .child
        .stdin
        .take()
        .ok_or_else(|| Error::Backend("Failed to capture stdin".to_string()))?;

    let child_stdout = backend
        .child
        .stdout
        .take()
        .ok_or_else(|| Error::Backend("Failed to capture stdout".to_string()))?;

    let child_stderr = backend
        .child
        .stderr
        .take()
        .ok_or_else(|| Error::Backend("Failed to capture stderr".to_string()))?;

    let BridgeIo {
        input,
        output,
        diagnostics,
    } = io;

    let inbound = pump(input, child_stdin);
    let outbound = pump(child_stdout, output);
    let errors = pump(child_stderr, diagnostics);
    tokio::pin!(inbound, outbound, errors);

    let mut inbound_done = false;
    let mut outbound_done = false;
    let mut errors_done = false;

    let status = loop {
        let signal = tokio::select! {
            biased;
            status = backend.child.wait() => break status,
            Some(signal) = signals.recv() => signal,
            result = &mut inbound, if !inbound_done => {
                inbound_done = true;
                match result {
                    Ok(bytes) => tracing::debug!("Client input closed after {} bytes", bytes),
                    Err(e) => tracing::warn!("Relay to backend stdin stopped: {}", e),
                }
                continue;
            }
            result = &mut outbound, if !outbound_done => {
                outbound_done = true;
                log_outbound(result);
                continue;
            }
            result = &mut errors, if !errors_done => {
                errors_done = true;
                log_errors(result);
                continue;
            }
        };

        forward(&mut backend.child, signal);
    };

    // Backend output written just before exit must still reach the client.
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        if !outbound_done {
            log_outbound((&mut outbound).await);
        }
        if !errors_done {
            log_errors((&mut errors).await);
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!("Backend output still open {:?} after exit", DRAIN_TIMEOUT);
    }

    let status = status?;
    tracing::info!("Backend `{}` exited with {}", backend.strategy, status);
    Ok(status)
}

fn log_outbound(result: std::io::Result<u64>) {
    match result {
        Ok(bytes) => tracing::debug!("Backend stdout closed after {} bytes", bytes),
        Err(e) => tracing::warn!("Relay to bridge stdout stopped: {}", e),
    }
}

fn log_errors(result: std::io::Result<u64>) {
    if let Err(e) = result {
        tracing::debug!("Relay of backend stderr stopped: {}", e);
    }
}
