//! Cooperative cancellation primitives
//!
//! A batch run holds a receiver and polls it at chunk boundaries;
//! `stop_suite` fires the paired token. Requests already in flight are
//! not interrupted.

use tokio::sync::watch;

/// Sender half of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: watch::Sender<bool>,
}

impl CancellationToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Signals cancellation to all receivers.
    pub fn cancel(&self) {
        // Send errors only when every receiver is gone, which is fine.
        let _ = self.sender.send(true);
    }

    /// Returns true once `cancel` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Creates a receiver observing this token.
    #[must_use]
    pub fn receiver(&self) -> CancellationReceiver {
        CancellationReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver half of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationReceiver {
    /// Returns true once the paired token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Waits until the paired token is cancelled.
    pub async fn cancelled(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                // Token dropped without cancelling; treat as never-cancelled
                // and park forever so select! arms do not spuriously fire.
                std::future::pending::<()>().await;
            }
        }
    }
}
