//! prooflink-core: Proof model and request/reply plumbing for prooflink.
//!
//! This crate provides:
//! - The `Proof` payload and its JSON wire form
//! - Endpoint configuration
//! - The request channel (transport trait, ZeroMQ REQ transport, idempotent close)
//! - The process-wide shutdown capability
//! - The exchange coordinator driving one send-then-await-reply cycle
//! - Logging setup

pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod proof;
pub mod shutdown;

pub use channel::{Channel, RequestTransport, ZmqTransport};
pub use config::{Endpoint, EndpointScheme};
pub use error::{Error, Result};
pub use exchange::{run_exchange, Exchange, ExchangeConfig, ExchangeState, Outcome};
pub use logging::{init_logging, LogFormat};
pub use proof::Proof;
pub use shutdown::Shutdown;
