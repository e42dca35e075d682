//! ZeroMQ REQ transport.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use super::RequestTransport;
use crate::config::Endpoint;
use crate::error::{Error, Result};

/// A connected ZeroMQ REQ socket.
pub struct ZmqTransport {
    /// The socket, `None` once closed.
    socket: Option<ReqSocket>,
}

impl ZmqTransport {
    /// Connect a REQ socket to `endpoint`, bounded by `connect_timeout`.
    pub async fn connect(endpoint: &Endpoint, connect_timeout: Duration) -> Result<Self> {
        let address = endpoint.to_string();
        let mut socket = ReqSocket::new();

        let connect_error = |message: String| Error::Connection {
            endpoint: address.clone(),
            message,
        };

        match tokio::time::timeout(connect_timeout, socket.connect(&address)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(connect_error(e.to_string())),
            Err(_) => {
                return Err(connect_error(format!(
                    "no connection within {:?}",
                    connect_timeout
                )))
            }
        }

        debug!(endpoint = %address, "REQ socket connected");
        Ok(Self {
            socket: Some(socket),
        })
    }

    fn socket_mut(&mut self) -> Result<&mut ReqSocket> {
        self.socket.as_mut().ok_or(Error::ConnectionClosed)
    }
}

#[async_trait]
impl RequestTransport for ZmqTransport {
    async fn send(&mut self, payload: Bytes) -> Result<()> {
        let socket = self.socket_mut()?;
        socket.send(ZmqMessage::from(payload)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Bytes> {
        let socket = self.socket_mut()?;
        let reply = socket.recv().await?;
        Ok(join_frames(reply.into_vec()))
    }

    async fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            for err in socket.close().await {
                warn!(error = %err, "Error while closing REQ socket");
            }
        }
    }
}

/// Flatten a multi-frame reply into one opaque byte string.
fn join_frames(frames: Vec<Bytes>) -> Bytes {
    match frames.len() {
        0 => Bytes::new(),
        1 => frames.into_iter().next().unwrap_or_default(),
        _ => {
            let total = frames.iter().map(Bytes::len).sum();
            let mut buf = BytesMut::with_capacity(total);
            for frame in &frames {
                buf.extend_from_slice(frame);
            }
            buf.freeze()
        }
    }
}
