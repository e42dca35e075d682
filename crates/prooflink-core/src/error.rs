//! Error types for prooflink-core.

use thiserror::Error;

/// Main error type for prooflink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from underlying system calls.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel to the remote endpoint could not be opened.
    #[error("failed to connect to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// The endpoint address is malformed or uses an unsupported scheme.
    #[error("invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// Reading the proof data failed.
    #[error("failed to read input: {message}")]
    Input { message: String },

    /// Proof could not be encoded as (or decoded from) JSON.
    #[error("failed to encode proof as JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Send/receive alternation was violated.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// Transport layer error during the exchange.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The channel was closed.
    #[error("channel closed")]
    ConnectionClosed,
}

impl Error {
    /// Returns true if this error must terminate the process.
    ///
    /// Fatal errors happen during setup (opening the channel, reading input,
    /// encoding the proof) or indicate a programming fault.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. }
                | Error::InvalidEndpoint { .. }
                | Error::Input { .. }
                | Error::Serialization(_)
                | Error::Protocol { .. }
        )
    }
}

impl From<zeromq::ZmqError> for Error {
    fn from(err: zeromq::ZmqError) -> Self {
        Error::Transport {
            message: err.to_string(),
        }
    }
}

/// Convenience result type for prooflink operations.
pub type Result<T> = std::result::Result<T, Error>;
