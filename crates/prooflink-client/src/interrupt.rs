//! Interrupt watcher.
//!
//! Runs for the life of the process, starting before the channel is open. On
//! Ctrl+C it triggers the shutdown capability and releases the channel if one
//! has been opened; the main flow then observes a shutdown outcome wherever it
//! is suspended.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use prooflink_core::{Channel, Shutdown};

/// Channel the watcher releases on interrupt, filled once it is open.
#[derive(Debug, Clone, Default)]
pub struct ChannelSlot(Arc<OnceCell<Channel>>);

impl ChannelSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the opened channel. Later calls are ignored.
    pub fn fill(&self, channel: Channel) {
        if self.0.set(channel).is_err() {
            debug!("Channel slot already filled");
        }
    }

    /// The channel, if it has been opened.
    pub fn get(&self) -> Option<&Channel> {
        self.0.get()
    }
}

impl From<Channel> for ChannelSlot {
    fn from(channel: Channel) -> Self {
        Self(Arc::new(OnceCell::new_with(Some(channel))))
    }
}

/// Spawn the watcher for `signal`, normally [`tokio::signal::ctrl_c`].
pub fn spawn_interrupt_watcher<F>(
    signal: F,
    shutdown: Shutdown,
    slot: ChannelSlot,
) -> JoinHandle<()>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(watch_interrupt(signal, shutdown, slot))
}

/// Wait for `signal`, then shut down and close the channel in `slot`.
///
/// Returns early without closing anything if shutdown is triggered elsewhere.
pub async fn watch_interrupt<F>(signal: F, shutdown: Shutdown, slot: ChannelSlot)
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = signal => match result {
            Ok(()) => {
                info!("Interrupt received, shutting down.");
                shutdown.trigger();
                if let Some(channel) = slot.get() {
                    channel.close().await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for interrupt signal");
            }
        },
        _ = shutdown.wait() => {
            debug!("Interrupt watcher stopping");
        }
    }
}
