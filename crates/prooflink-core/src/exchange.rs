//! Exchange coordinator: one send-then-await-reply cycle.
//!
//! ```text
//! Idle -> Sending -> SendTimedOut
//!                 -> AwaitingReply -> Replied
//!                                  -> ReplyTimedOut
//! (any non-terminal state) -> ShutdownRequested | Fatal
//! ```
//!
//! The send step races the transport's acceptance against the send timeout.
//! The reply wait is unbounded unless a reply timeout is configured. Shutdown
//! preempts either wait. Nothing is retried.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::channel::Channel;
use crate::constants::{DEFAULT_SEND_TIMEOUT, MAX_REPLY_LOG_BYTES};
use crate::error::Error;
use crate::proof::Proof;
use crate::shutdown::Shutdown;

/// Terminal classification of an exchange.
#[derive(Debug)]
pub enum Outcome {
    /// The remote replied; bytes are exactly what the transport delivered.
    Replied(Bytes),
    /// The transport didn't accept the proof within the send timeout.
    SendTimedOut,
    /// No reply within the configured reply timeout.
    ReplyTimedOut,
    /// Shutdown preempted the exchange or the channel was closed under it.
    ShutdownRequested,
    /// Unrecoverable error.
    Fatal(Error),
}

impl Outcome {
    /// Terminal state corresponding to this outcome.
    pub fn state(&self) -> ExchangeState {
        match self {
            Outcome::Replied(_) => ExchangeState::Replied,
            Outcome::SendTimedOut => ExchangeState::SendTimedOut,
            Outcome::ReplyTimedOut => ExchangeState::ReplyTimedOut,
            Outcome::ShutdownRequested => ExchangeState::ShutdownRequested,
            Outcome::Fatal(_) => ExchangeState::Fatal,
        }
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Fatal(_) => 1,
            _ => 0,
        }
    }
}

/// Exchange lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Not started.
    Idle,
    /// Proof handed to the channel, waiting for acceptance.
    Sending,
    /// Proof accepted, waiting for the reply.
    AwaitingReply,
    /// Reply received.
    Replied,
    /// Transport did not accept the proof in time.
    SendTimedOut,
    /// No reply within the reply bound.
    ReplyTimedOut,
    /// Ended by shutdown.
    ShutdownRequested,
    /// Ended by an unrecoverable error.
    Fatal,
}

impl ExchangeState {
    /// Check if no further transitions can happen.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ExchangeState::Idle | ExchangeState::Sending | ExchangeState::AwaitingReply
        )
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangeState::Idle => "idle",
            ExchangeState::Sending => "sending",
            ExchangeState::AwaitingReply => "awaiting-reply",
            ExchangeState::Replied => "replied",
            ExchangeState::SendTimedOut => "send-timed-out",
            ExchangeState::ReplyTimedOut => "reply-timed-out",
            ExchangeState::ShutdownRequested => "shutdown-requested",
            ExchangeState::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Timing policy for an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Window for the transport to accept the proof.
    pub send_timeout: Duration,
    /// Bound on the reply wait; `None` waits until a reply or shutdown.
    pub reply_timeout: Option<Duration>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            reply_timeout: None,
        }
    }
}

/// Drives a single exchange over a channel.
#[derive(Debug)]
pub struct Exchange {
    channel: Channel,
    shutdown: Shutdown,
    config: ExchangeConfig,
    state: ExchangeState,
}

impl Exchange {
    /// Create an idle exchange over `channel`.
    pub fn new(channel: Channel, shutdown: Shutdown, config: ExchangeConfig) -> Self {
        Self {
            channel,
            shutdown,
            config,
            state: ExchangeState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Run the exchange for `proof` and classify how it ended.
    ///
    /// An exchange runs once; calling this again returns a fatal outcome.
    pub async fn run(&mut self, proof: &Proof) -> Outcome {
        if self.state != ExchangeState::Idle {
            return Outcome::Fatal(Error::Protocol {
                message: format!("exchange already {}", self.state),
            });
        }

        let outcome = self.drive(proof).await;
        self.transition(outcome.state());
        log_outcome(&outcome, &self.config);
        outcome
    }

    async fn drive(&mut self, proof: &Proof) -> Outcome {
        let payload = match proof.to_json() {
            Ok(payload) => payload,
            Err(e) => return Outcome::Fatal(e),
        };

        if self.shutdown.is_triggered() {
            return Outcome::ShutdownRequested;
        }

        let channel = self.channel.clone();
        let shutdown = self.shutdown.clone();

        self.transition(ExchangeState::Sending);
        let send = tokio::time::timeout(self.config.send_timeout, channel.send(payload.clone()));
        let sent = tokio::select! {
            _ = shutdown.wait() => return Outcome::ShutdownRequested,
            result = send => result,
        };
        match sent {
            Err(_elapsed) => return Outcome::SendTimedOut,
            Ok(Err(e)) => return classify(e),
            Ok(Ok(())) => {
                info!(proof = %String::from_utf8_lossy(&payload), "Proof sent");
            }
        }

        self.transition(ExchangeState::AwaitingReply);
        let reply_timeout = self.config.reply_timeout;
        let reply = async {
            match reply_timeout {
                Some(limit) => tokio::time::timeout(limit, channel.receive()).await.ok(),
                None => Some(channel.receive().await),
            }
        };
        let received = tokio::select! {
            _ = shutdown.wait() => return Outcome::ShutdownRequested,
            result = reply => result,
        };
        match received {
            None => Outcome::ReplyTimedOut,
            Some(Ok(bytes)) => Outcome::Replied(bytes),
            Some(Err(e)) => classify(e),
        }
    }

    fn transition(&mut self, next: ExchangeState) {
        debug!(
            from = %self.state,
            to = %next,
            terminal = next.is_terminal(),
            "Exchange state"
        );
        self.state = next;
    }
}

/// Run one exchange of `proof` over `channel`.
pub async fn run_exchange(
    channel: &Channel,
    shutdown: &Shutdown,
    config: ExchangeConfig,
    proof: &Proof,
) -> Outcome {
    Exchange::new(channel.clone(), shutdown.clone(), config)
        .run(proof)
        .await
}

/// A closed channel means someone tore it down for shutdown.
fn classify(err: Error) -> Outcome {
    match err {
        Error::ConnectionClosed => Outcome::ShutdownRequested,
        other => Outcome::Fatal(other),
    }
}

fn log_outcome(outcome: &Outcome, config: &ExchangeConfig) {
    match outcome {
        Outcome::Replied(bytes) => {
            info!(response = %render_reply(bytes), "Response received");
        }
        Outcome::SendTimedOut => {
            warn!(timeout = ?config.send_timeout, "Timed out while trying to send proof");
        }
        Outcome::ReplyTimedOut => {
            warn!(timeout = ?config.reply_timeout, "Timed out while waiting for response");
        }
        Outcome::ShutdownRequested => {
            info!("Exchange interrupted by shutdown");
        }
        Outcome::Fatal(e) => {
            error!(error = %e, "Exchange failed");
        }
    }
}

/// Render reply bytes for logging, lossily and truncated.
pub fn render_reply(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_REPLY_LOG_BYTES {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        format!(
            "{}... ({} bytes total)",
            String::from_utf8_lossy(&bytes[..MAX_REPLY_LOG_BYTES]),
            bytes.len()
        )
    }
}
