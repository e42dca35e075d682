//! Mock request transport for testing without a real socket.
//!
//! The transport is scripted up front: how long a send takes to be accepted
//! (or whether it ever is) and what the reply is. A [`MockTransportHandle`]
//! shared with the test records every call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use prooflink_core::error::{Error, Result};
use prooflink_core::RequestTransport;

/// How the mock handles a send.
#[derive(Debug, Clone)]
pub enum SendBehavior {
    /// Accept immediately.
    Accept,
    /// Accept after a delay.
    Delay(Duration),
    /// Never accept.
    Hang,
    /// Fail with a transport error.
    Fail(String),
}

/// How the mock handles a receive.
#[derive(Debug, Clone)]
pub enum ReplyBehavior {
    /// Reply with these bytes.
    Reply(Bytes),
    /// Reply with these bytes after a delay.
    Delayed(Duration, Bytes),
    /// Never reply.
    Silent,
    /// Fail with a transport error.
    Fail(String),
}

#[derive(Debug, Default)]
struct Calls {
    sends: AtomicUsize,
    recvs: AtomicUsize,
    closes: AtomicUsize,
    sent: Mutex<Vec<Bytes>>,
}

/// Shared view of the calls a [`MockTransport`] received.
#[derive(Debug, Clone, Default)]
pub struct MockTransportHandle {
    calls: Arc<Calls>,
}

impl MockTransportHandle {
    /// Number of send attempts.
    pub fn send_count(&self) -> usize {
        self.calls.sends.load(Ordering::SeqCst)
    }

    /// Number of receive attempts.
    pub fn recv_count(&self) -> usize {
        self.calls.recvs.load(Ordering::SeqCst)
    }

    /// Number of times the transport was closed.
    pub fn close_count(&self) -> usize {
        self.calls.closes.load(Ordering::SeqCst)
    }

    /// Payloads the transport accepted, in order.
    pub fn sent(&self) -> Vec<Bytes> {
        self.calls
            .sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

/// A scripted request transport.
#[derive(Debug)]
pub struct MockTransport {
    send: SendBehavior,
    reply: ReplyBehavior,
    handle: MockTransportHandle,
}

impl MockTransport {
    /// A transport that accepts sends and replies with `reply`.
    pub fn replying(reply: impl Into<Bytes>) -> Self {
        Self {
            send: SendBehavior::Accept,
            reply: ReplyBehavior::Reply(reply.into()),
            handle: MockTransportHandle::default(),
        }
    }

    /// Override send handling.
    pub fn with_send(mut self, send: SendBehavior) -> Self {
        self.send = send;
        self
    }

    /// Override reply handling.
    pub fn with_reply(mut self, reply: ReplyBehavior) -> Self {
        self.reply = reply;
        self
    }

    /// Handle for inspecting calls after the transport is moved into a channel.
    pub fn handle(&self) -> MockTransportHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl RequestTransport for MockTransport {
    async fn send(&mut self, payload: Bytes) -> Result<()> {
        self.handle.calls.sends.fetch_add(1, Ordering::SeqCst);

        match &self.send {
            SendBehavior::Accept => {}
            SendBehavior::Delay(delay) => tokio::time::sleep(*delay).await,
            SendBehavior::Hang => std::future::pending::<()>().await,
            SendBehavior::Fail(message) => {
                return Err(Error::Transport {
                    message: message.clone(),
                })
            }
        }

        if let Ok(mut sent) = self.handle.calls.sent.lock() {
            sent.push(payload);
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Bytes> {
        self.handle.calls.recvs.fetch_add(1, Ordering::SeqCst);

        match &self.reply {
            ReplyBehavior::Reply(bytes) => Ok(bytes.clone()),
            ReplyBehavior::Delayed(delay, bytes) => {
                tokio::time::sleep(*delay).await;
                Ok(bytes.clone())
            }
            ReplyBehavior::Silent => std::future::pending().await,
            ReplyBehavior::Fail(message) => Err(Error::Transport {
                message: message.clone(),
            }),
        }
    }

    async fn close(&mut self) {
        self.handle.calls.closes.fetch_add(1, Ordering::SeqCst);
    }
}
