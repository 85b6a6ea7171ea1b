//! Unix signal handling for the daemon.
//!
//! A dedicated thread turns incoming signals into [`SignalMessage`]s on an
//! mpsc channel. The main loop waits on that channel between ticks, so a
//! signal wakes it immediately instead of at the next poll.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender},
    thread,
};

/// Messages delivered to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Stop the daemon (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
    /// Reload the configuration and rebuild the schedule (SIGUSR2)
    Resync,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared once a shutdown has been requested
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Kept so the channel stays open and tests can inject messages
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// State with no OS handlers attached, driven only through `signal_sender`.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = std::sync::mpsc::channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Register handlers and spawn the signal thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGUSR2 => {
                    log_pipe!();
                    log_info!("Received resync signal");
                    if sender.send(SignalMessage::Resync).is_err() {
                        break;
                    }
                }
                SIGINT | SIGTERM | SIGHUP => {
                    log_pipe!();
                    match (sig, debug_enabled) {
                        (SIGINT, true) => {
                            log_info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...")
                        }
                        (SIGHUP, _) => {
                            log_info!("Received hangup signal, initiating graceful shutdown...")
                        }
                        (SIGTERM, _) => log_info!(
                            "Received termination request, initiating graceful shutdown..."
                        ),
                        _ => log_info!("Received interrupt signal, initiating graceful shutdown..."),
                    }

                    if let Err(e) = sender.send(SignalMessage::Shutdown) {
                        log_warning!("Failed to send shutdown message: {e}");
                    }
                    running.store(false, Ordering::SeqCst);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_state_delivers_messages() {
        let state = SignalState::detached();
        assert!(state.is_running());

        state.signal_sender.send(SignalMessage::Resync).unwrap();
        state.signal_sender.send(SignalMessage::Shutdown).unwrap();

        assert_eq!(state.signal_receiver.recv().unwrap(), SignalMessage::Resync);
        assert_eq!(state.signal_receiver.recv().unwrap(), SignalMessage::Shutdown);
    }
}
