//! Request channel to a single remote endpoint.
//!
//! The [`Channel`] wraps a [`RequestTransport`] and enforces the REQ
//! discipline: one outstanding request, strict send-then-receive alternation.
//! Sending and receiving are separate awaitable steps so callers can bound
//! each one independently.
//!
//! A channel may be closed from any clone, any number of times. The first
//! close wins; it wakes any in-flight send or receive with
//! [`Error::ConnectionClosed`] and then releases the transport.

mod zmq;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{watch, Mutex, MutexGuard, OnceCell};
use tracing::{debug, info};

use crate::config::Endpoint;
use crate::error::{Error, Result};

pub use zmq::ZmqTransport;

/// A connect-and-request transport carrying opaque frames.
#[async_trait]
pub trait RequestTransport: Send {
    /// Hand one request frame to the transport.
    async fn send(&mut self, payload: Bytes) -> Result<()>;

    /// Wait for the reply to the last request.
    async fn recv(&mut self) -> Result<Bytes>;

    /// Release transport resources.
    async fn close(&mut self);
}

// =============================================================================
// Channel - shared handle
// =============================================================================

/// Cloneable handle to the channel; all clones refer to the same transport.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    /// Endpoint label for logging.
    endpoint: String,
    /// The transport, `None` once released.
    transport: Mutex<Option<Box<dyn RequestTransport>>>,
    /// A request was accepted and its reply not yet received.
    awaiting_reply: AtomicBool,
    /// Set by the first close.
    closed: AtomicBool,
    /// Completed once the transport has been released.
    released: OnceCell<()>,
    /// Wakes in-flight operations on close.
    closed_tx: watch::Sender<bool>,
}

impl Channel {
    /// Open a ZeroMQ REQ channel to `endpoint`.
    ///
    /// Fails with [`Error::Connection`] if the transport can't be set up
    /// within `connect_timeout`.
    pub async fn open(endpoint: &Endpoint, connect_timeout: Duration) -> Result<Self> {
        debug!(endpoint = %endpoint, "Opening channel");
        let transport = ZmqTransport::connect(endpoint, connect_timeout).await?;
        info!(endpoint = %endpoint, "Channel open");
        Ok(Self::with_transport(endpoint.to_string(), transport))
    }

    /// Wrap an already-connected transport.
    pub fn with_transport(
        endpoint: impl Into<String>,
        transport: impl RequestTransport + 'static,
    ) -> Self {
        let (closed_tx, _closed_rx) = watch::channel(false);
        Self {
            inner: Arc::new(ChannelInner {
                endpoint: endpoint.into(),
                transport: Mutex::new(Some(Box::new(transport))),
                awaiting_reply: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                released: OnceCell::new(),
                closed_tx,
            }),
        }
    }

    /// Endpoint this channel talks to.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Send one request frame.
    ///
    /// Completes once the transport has accepted the payload. Rejected with
    /// [`Error::Protocol`] while a reply is still outstanding.
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        let mut closed_rx = self.inner.closed_tx.subscribe();
        let mut guard = self.lock_transport(&mut closed_rx).await?;
        let transport = guard.as_mut().ok_or(Error::ConnectionClosed)?;

        if self.inner.awaiting_reply.load(Ordering::SeqCst) {
            return Err(Error::Protocol {
                message: "send while a reply is outstanding".to_string(),
            });
        }

        let len = payload.len();
        tokio::select! {
            result = transport.send(payload) => {
                result?;
                self.inner.awaiting_reply.store(true, Ordering::SeqCst);
                debug!(endpoint = %self.inner.endpoint, len, "Request accepted");
                Ok(())
            }
            _ = wait_closed(&mut closed_rx) => Err(Error::ConnectionClosed),
        }
    }

    /// Receive the reply to the last request.
    ///
    /// Rejected with [`Error::Protocol`] if no request is outstanding.
    pub async fn receive(&self) -> Result<Bytes> {
        let mut closed_rx = self.inner.closed_tx.subscribe();
        let mut guard = self.lock_transport(&mut closed_rx).await?;
        let transport = guard.as_mut().ok_or(Error::ConnectionClosed)?;

        if !self.inner.awaiting_reply.load(Ordering::SeqCst) {
            return Err(Error::Protocol {
                message: "receive without an outstanding request".to_string(),
            });
        }

        tokio::select! {
            result = transport.recv() => {
                let reply = result?;
                self.inner.awaiting_reply.store(false, Ordering::SeqCst);
                debug!(endpoint = %self.inner.endpoint, len = reply.len(), "Reply received");
                Ok(reply)
            }
            _ = wait_closed(&mut closed_rx) => Err(Error::ConnectionClosed),
        }
    }

    /// Release the transport. Safe to call repeatedly and concurrently.
    ///
    /// Every call returns only after the transport is released. If the call
    /// doing the release is cancelled, the next caller finishes it.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!(endpoint = %self.inner.endpoint, "Channel already closed");
        } else {
            // Wake in-flight operations so they drop the transport lock
            self.inner.closed_tx.send_replace(true);
        }

        self.inner
            .released
            .get_or_init(|| async {
                if let Some(mut transport) = self.inner.transport.lock().await.take() {
                    transport.close().await;
                }
                info!(endpoint = %self.inner.endpoint, "Channel closed");
            })
            .await;
    }

    /// Check if the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Check if a reply is outstanding.
    pub fn is_awaiting_reply(&self) -> bool {
        self.inner.awaiting_reply.load(Ordering::SeqCst)
    }

    async fn lock_transport(
        &self,
        closed_rx: &mut watch::Receiver<bool>,
    ) -> Result<MutexGuard<'_, Option<Box<dyn RequestTransport>>>> {
        if *closed_rx.borrow() {
            return Err(Error::ConnectionClosed);
        }
        tokio::select! {
            guard = self.inner.transport.lock() => Ok(guard),
            _ = wait_closed(closed_rx) => Err(Error::ConnectionClosed),
        }
    }
}

/// Resolve once the channel is marked closed.
async fn wait_closed(closed_rx: &mut watch::Receiver<bool>) {
    // The sender lives as long as the channel, so a receive error can't happen
    // while anyone is waiting.
    let _ = closed_rx.wait_for(|closed| *closed).await;
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("endpoint", &self.inner.endpoint)
            .field("closed", &self.is_closed())
            .field("awaiting_reply", &self.is_awaiting_reply())
            .finish()
    }
}
