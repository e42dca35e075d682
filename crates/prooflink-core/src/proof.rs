//! The proof payload and its JSON wire form.
//!
//! A proof is built once from the caller's input, encoded, sent, and dropped.
//! There are exactly two construction paths:
//!
//! - caller-supplied data, no timestamp
//! - placeholder data, with a creation timestamp

use bytes::Bytes;
use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

use crate::constants::{PLACEHOLDER_DATA, PROOF_TYPE};
use crate::error::Result;

/// Attestation record submitted to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Record kind, always [`PROOF_TYPE`].
    #[serde(rename = "type")]
    kind: String,
    /// Creation time, only on placeholder proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    /// Proof data.
    data: String,
}

impl Proof {
    /// Build a proof from one line of caller input.
    ///
    /// Surrounding whitespace is trimmed; empty input yields a placeholder
    /// proof stamped with the current local time.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            Self::placeholder(Local::now())
        } else {
            Self::with_data(trimmed)
        }
    }

    /// Proof carrying caller-supplied data.
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            kind: PROOF_TYPE.to_string(),
            timestamp: None,
            data: data.into(),
        }
    }

    /// Placeholder proof created at `now`.
    pub fn placeholder<Tz>(now: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            kind: PROOF_TYPE.to_string(),
            timestamp: Some(now.to_rfc3339_opts(SecondsFormat::Nanos, false)),
            data: PLACEHOLDER_DATA.to_string(),
        }
    }

    /// Record kind tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Creation timestamp, present only on placeholder proofs.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Proof data.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Whether this proof was built from the placeholder path.
    pub fn is_placeholder(&self) -> bool {
        self.timestamp.is_some()
    }

    /// Encode to the single-frame JSON wire form.
    pub fn to_json(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Decode from the JSON wire form.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
