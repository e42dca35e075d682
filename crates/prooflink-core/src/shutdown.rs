//! Process-wide shutdown capability.
//!
//! Created once at start-up and cloned into every task that needs to observe
//! or request shutdown. Triggering is one-way and sticky: late subscribers see
//! the triggered state immediately.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Cloneable handle to the process shutdown state.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create an untriggered shutdown capability.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown.
    ///
    /// Returns true for the caller that actually flipped the state.
    pub fn trigger(&self) -> bool {
        let was_triggered = self.tx.send_replace(true);
        if !was_triggered {
            debug!("Shutdown triggered");
        }
        !was_triggered
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until shutdown is requested.
    ///
    /// Returns immediately if it already was.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this can't observe a closed channel.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
