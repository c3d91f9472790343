use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "repgen=info".to_string()
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Endpoint must look like tcp://host:port or udp://host:port, got: {0}")]
    MalformedEndpoint(String),

    #[error("Unsupported transport scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),
}

/// Wire protocol for CoT delivery. Exactly TCP or UDP, nothing layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// A TAK server endpoint: (host, port, protocol).
/// Parsed from the `tcp://192.168.1.194:8087` style URL operators configure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakEndpoint {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl TakEndpoint {
    pub fn new(host: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
        }
    }

    /// Host:port pair for socket address resolution.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromStr for TakEndpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ConfigError::MalformedEndpoint(s.to_string()))?;

        let protocol = match scheme.to_ascii_lowercase().as_str() {
            "tcp" => Protocol::Tcp,
            "udp" => Protocol::Udp,
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };

        let (host, port_str) = rest
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::MalformedEndpoint(s.to_string()))?;

        if host.is_empty() {
            return Err(ConfigError::MalformedEndpoint(s.to_string()));
        }

        let port: u16 = port_str
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_str.to_string()))?;
        if port == 0 {
            return Err(ConfigError::InvalidPort(port_str.to_string()));
        }

        // Dotted-quad hosts get octet validation; hostnames pass through
        // and fail later at DNS resolution if bogus.
        if looks_like_ipv4(host) && !valid_ipv4(host) {
            return Err(ConfigError::InvalidAddress(host.to_string()));
        }

        Ok(TakEndpoint {
            host: host.to_string(),
            port,
            protocol,
        })
    }
}

fn looks_like_ipv4(host: &str) -> bool {
    !host.is_empty() && host.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn valid_ipv4(host: &str) -> bool {
    let octets: Vec<&str> = host.split('.').collect();
    octets.len() == 4
        && octets
            .iter()
            .all(|o| !o.is_empty() && o.parse::<u16>().map(|n| n <= 255).unwrap_or(false))
}
