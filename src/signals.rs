//! Termination signals received by the bridge and forwarded to the backend

use tokio::process::Child;
use tokio::sync::mpsc;

/// A signal the bridge relays to its backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardSignal {
    Interrupt,
    Terminate,
}

#[cfg(unix)]
impl From<ForwardSignal> for nix::sys::signal::Signal {
    fn from(signal: ForwardSignal) -> Self {
        match signal {
            ForwardSignal::Interrupt => nix::sys::signal::Signal::SIGINT,
            ForwardSignal::Terminate => nix::sys::signal::Signal::SIGTERM,
        }
    }
}

/// Install interrupt/terminate handlers and report them on a channel
///
/// Once installed, these signals no longer terminate the bridge directly;
/// the bridge exits when the backend does.
pub fn listen() -> std::io::Result<mpsc::Receiver<ForwardSignal>> {
    let (tx, rx) = mpsc::channel(8);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    Some(()) = interrupt.recv() => ForwardSignal::Interrupt,
                    Some(()) = terminate.recv() => ForwardSignal::Terminate,
                    else => break,
                };

                tracing::debug!("Bridge received {:?}", received);
                if tx.send(received).await.is_err() {
                    break;
                }
            }
        });
    }

    #[cfg(windows)]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Bridge received Ctrl-C");
                if tx.send(ForwardSignal::Interrupt).await.is_err() {
                    break;
                }
            }
        });
    }

    Ok(rx)
}

/// Deliver a signal to a backend that has not been reaped yet
pub fn forward(child: &mut Child, signal: ForwardSignal) {
    let Some(pid) = child.id() else {
        tracing::debug!("Backend already exited, not forwarding {:?}", signal);
        return;
    };

    #[cfg(unix)]
    {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), nix::sys::signal::Signal::from(signal)) {
            Ok(()) => tracing::info!("Forwarded {:?} to backend (pid {})", signal, pid),
            Err(e) => tracing::warn!("Failed to forward {:?} to pid {}: {}", signal, pid, e),
        }
    }

    #[cfg(not(unix))]
    {
        // No per-signal delivery to a child here; stop it outright.
        match child.start_kill() {
            Ok(()) => tracing::info!("Stopped backend (pid {}) on {:?}", pid, signal),
            Err(e) => tracing::warn!("Failed to stop backend (pid {}): {}", pid, e),
        }
    }
}
