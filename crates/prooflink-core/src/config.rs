//! Endpoint configuration.
//!
//! Endpoints use the `scheme://address` form understood by the request
//! transport. Only `tcp://host:port` and `ipc://path` are accepted.

use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_ENDPOINT;
use crate::error::{Error, Result};

/// Transport scheme of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointScheme {
    /// TCP, address is `host:port`.
    Tcp,
    /// Unix domain socket, address is a filesystem path.
    Ipc,
}

impl EndpointScheme {
    fn as_str(&self) -> &'static str {
        match self {
            EndpointScheme::Tcp => "tcp",
            EndpointScheme::Ipc => "ipc",
        }
    }
}

/// A validated remote endpoint address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: EndpointScheme,
    address: String,
}

impl Endpoint {
    /// Resolve from an already-read `PROOF_ENDPOINT` value, falling back to
    /// the default when the variable is unset or blank.
    pub fn from_env_value(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.parse(),
            _ => DEFAULT_ENDPOINT.parse(),
        }
    }

    /// The transport scheme.
    pub fn scheme(&self) -> EndpointScheme {
        self.scheme
    }

    /// The address part after `://`.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            scheme: EndpointScheme::Tcp,
            address: DEFAULT_ENDPOINT
                .trim_start_matches("tcp://")
                .to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.address)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidEndpoint {
            endpoint: s.to_string(),
            message: message.to_string(),
        };

        let (scheme, address) = s
            .split_once("://")
            .ok_or_else(|| invalid("expected scheme://address"))?;

        let scheme = match scheme.to_ascii_lowercase().as_str() {
            "tcp" => EndpointScheme::Tcp,
            "ipc" => EndpointScheme::Ipc,
            other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
        };

        if address.is_empty() {
            return Err(invalid("missing address"));
        }

        if scheme == EndpointScheme::Tcp {
            let (host, port) = address
                .rsplit_once(':')
                .ok_or_else(|| invalid("tcp endpoints need host:port"))?;
            if host.is_empty() {
                return Err(invalid("missing host"));
            }
            let port: u16 = port
                .parse()
                .map_err(|e| invalid(&format!("invalid port: {}", e)))?;
            if port == 0 {
                return Err(invalid("port must be greater than 0"));
            }
        }

        Ok(Self {
            scheme,
            address: address.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tcp_endpoint() {
        let ep: Endpoint = "tcp://127.0.0.1:40000".parse().unwrap();
        assert_eq!(ep.scheme(), EndpointScheme::Tcp);
        assert_eq!(ep.address(), "127.0.0.1:40000");
        assert_eq!(ep.to_string(), "tcp://127.0.0.1:40000");
    }

    #[test]
    fn parse_tcp_hostname() {
        let ep: Endpoint = "tcp://proofs.example.com:5555".parse().unwrap();
        assert_eq!(ep.address(), "proofs.example.com:5555");
    }

    #[test]
    fn parse_ipc_endpoint() {
        let ep: Endpoint = "ipc:///tmp/proofs.sock".parse().unwrap();
        assert_eq!(ep.scheme(), EndpointScheme::Ipc);
        assert_eq!(ep.address(), "/tmp/proofs.sock");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let ep: Endpoint = "TCP://localhost:1".parse().unwrap();
        assert_eq!(ep.to_string(), "tcp://localhost:1");
    }

    #[test]
    fn reject_malformed_endpoints() {
        for bad in [
            "127.0.0.1:40000",
            "udp://127.0.0.1:40000",
            "tcp://",
            "tcp://127.0.0.1",
            "tcp://:40000",
            "tcp://127.0.0.1:0",
            "tcp://127.0.0.1:70000",
            "tcp://127.0.0.1:port",
        ] {
            let err = bad.parse::<Endpoint>().unwrap_err();
            assert!(
                matches!(err, Error::InvalidEndpoint { .. }),
                "{} should be rejected",
                bad
            );
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn env_value_fallback() {
        let default: Endpoint = DEFAULT_ENDPOINT.parse().unwrap();
        assert_eq!(Endpoint::from_env_value(None).unwrap(), default);
        assert_eq!(Endpoint::from_env_value(Some("")).unwrap(), default);
        assert_eq!(Endpoint::from_env_value(Some("   ")).unwrap(), default);
        assert_eq!(
            Endpoint::from_env_value(Some("tcp://10.0.0.1:9000"))
                .unwrap()
                .to_string(),
            "tcp://10.0.0.1:9000"
        );
    }

    #[test]
    fn default_matches_constant() {
        assert_eq!(Endpoint::default().to_string(), DEFAULT_ENDPOINT);
    }
}
