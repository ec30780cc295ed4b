//! Shutdown signal handling for long-running commands

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Why a long-running command should stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

/// SIGINT/SIGTERM listener.
///
/// `recv` resolves on the first signal received after construction.
pub struct ShutdownSignal {
    receiver: mpsc::Receiver<ShutdownReason>,
}

impl ShutdownSignal {
    /// Start listening for SIGINT and SIGTERM
    pub fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(2);

        let tx_int = tx.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            sigint.recv().await;
            eprintln!("{} Received SIGINT (shutdown)", "↓".cyan());
            let _ = tx_int.send(ShutdownReason::Interrupt).await;
        });

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            sigterm.recv().await;
            eprintln!("{} Received SIGTERM (shutdown)", "↓".cyan());
            let _ = tx.send(ShutdownReason::Terminate).await;
        });

        Ok(Self { receiver: rx })
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<ShutdownReason> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn installs_handlers() {
        assert!(ShutdownSignal::new().is_ok());
    }

    #[test]
    fn reasons_are_distinct() {
        assert_ne!(ShutdownReason::Interrupt, ShutdownReason::Terminate);
    }
}
