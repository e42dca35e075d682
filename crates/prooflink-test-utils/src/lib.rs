//! prooflink-test-utils: Test infrastructure for prooflink.
//!
//! Provides:
//! - MockTransport: scriptable in-memory request transport
//! - MockTransportHandle: inspection of what the transport saw

mod mock_transport;

pub use mock_transport::{MockTransport, MockTransportHandle, ReplyBehavior, SendBehavior};
