//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use prooflink_core::constants::{DEFAULT_CONNECT_TIMEOUT, ENDPOINT_ENV};
use prooflink_core::{Endpoint, ExchangeConfig, Result};

/// Log output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliLogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

impl From<CliLogFormat> for prooflink_core::LogFormat {
    fn from(fmt: CliLogFormat) -> Self {
        match fmt {
            CliLogFormat::Text => prooflink_core::LogFormat::Text,
            CliLogFormat::Json => prooflink_core::LogFormat::Json,
        }
    }
}

/// Submit a single proof to a remote service and wait for its acknowledgement.
#[derive(Debug, Parser)]
#[command(
    name = "prooflink",
    version,
    about = "Submit a single proof to a remote service and wait for its acknowledgement"
)]
pub struct Cli {
    /// Remote endpoint (scheme://host:port); falls back to $PROOF_ENDPOINT, then the built-in default
    #[arg(
        short = 'e',
        long = "endpoint",
        value_name = "URL",
        value_parser = parse_endpoint
    )]
    pub endpoint: Option<Endpoint>,

    /// Proof data (skips the interactive prompt)
    #[arg(short = 'd', long = "data", value_name = "DATA")]
    pub data: Option<String>,

    /// Seconds to wait for the transport to accept the proof
    #[arg(
        long = "send-timeout",
        default_value = "5",
        value_name = "SECONDS",
        env = "PROOF_SEND_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub send_timeout_secs: u64,

    /// Seconds to wait for the reply (default: wait until interrupted)
    #[arg(
        long = "reply-timeout",
        value_name = "SECONDS",
        env = "PROOF_REPLY_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub reply_timeout_secs: Option<u64>,

    /// Seconds to wait for the channel to open
    #[arg(
        long = "connect-timeout",
        default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs(),
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub connect_timeout_secs: u64,

    /// Increase verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Log to file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", default_value = "text")]
    pub log_format: CliLogFormat,
}

impl Cli {
    /// Endpoint from `--endpoint`, else `PROOF_ENDPOINT`, else the default.
    ///
    /// An empty or blank `PROOF_ENDPOINT` counts as unset.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let env_value = std::env::var(ENDPOINT_ENV).ok();
        self.endpoint_with_env(env_value.as_deref())
    }

    fn endpoint_with_env(&self, env_value: Option<&str>) -> Result<Endpoint> {
        match &self.endpoint {
            Some(endpoint) => Ok(endpoint.clone()),
            None => Endpoint::from_env_value(env_value),
        }
    }

    /// Logging verbosity; outcome lines are logged at info, so that's the floor.
    pub fn log_verbosity(&self) -> u8 {
        self.verbose.saturating_add(2)
    }

    /// Send acceptance window.
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Reply wait bound, if any.
    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_secs.map(Duration::from_secs)
    }

    /// Channel open bound.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Timing policy for the exchange.
    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            send_timeout: self.send_timeout(),
            reply_timeout: self.reply_timeout(),
        }
    }
}

fn parse_endpoint(s: &str) -> std::result::Result<Endpoint, String> {
    s.parse().map_err(|e: prooflink_core::Error| e.to_string())
}
