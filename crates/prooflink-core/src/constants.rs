//! Protocol and configuration constants for prooflink.

use std::time::Duration;

// =============================================================================
// Proof Constants
// =============================================================================

/// Record kind tag carried by every proof.
pub const PROOF_TYPE: &str = "proofblock";

/// Data value used when the caller supplies no proof data.
pub const PLACEHOLDER_DATA: &str = "0x0000000000000000000";

// =============================================================================
// Endpoint Constants
// =============================================================================

/// Environment variable holding the endpoint address.
pub const ENDPOINT_ENV: &str = "PROOF_ENDPOINT";

/// Endpoint used when `PROOF_ENDPOINT` is unset or empty.
pub const DEFAULT_ENDPOINT: &str = "tcp://34.71.52.251:40000";

// =============================================================================
// Timing Constants
// =============================================================================

/// Window in which the transport must accept the proof.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on opening the channel.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Logging Constants
// =============================================================================

/// Replies longer than this are truncated when logged.
pub const MAX_REPLY_LOG_BYTES: usize = 4096;
