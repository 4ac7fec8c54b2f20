//! # Check Configuration
//!
//! Server address resolution and the immutable settings for one check run.

use crate::constants::system;
use crate::error::{CheckError, CheckResult};
use crate::selection::SelectorToken;
use crate::threshold::ThresholdSpec;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where the queue server listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "transport", content = "target", rename_all = "snake_case")]
pub enum ServerAddress {
    /// `host:port`
    Tcp(String),
    /// Local socket path
    Unix(PathBuf),
}

impl ServerAddress {
    /// Build the address from `--hostname` and `--port`
    ///
    /// An absolute path selects a unix socket and ignores the port. Otherwise
    /// an explicit port replaces any port embedded in the hostname, and the
    /// default port is used when neither supplies one.
    pub fn resolve(hostname: &str, port: Option<u16>) -> CheckResult<Self> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(CheckError::configuration("hostname is empty"));
        }

        if hostname.starts_with('/') {
            return Ok(ServerAddress::Unix(PathBuf::from(hostname)));
        }

        let (host, embedded_port) = split_host_port(hostname)?;
        if host.is_empty() {
            return Err(CheckError::configuration(format!(
                "hostname {hostname:?} has no host part"
            )));
        }
        let port = port.or(embedded_port).unwrap_or(system::DEFAULT_PORT);

        Ok(ServerAddress::Tcp(format!("{host}:{port}")))
    }
}

/// Split `host[:port]`, keeping IPv6 literals bracketed
fn split_host_port(hostname: &str) -> CheckResult<(String, Option<u16>)> {
    let parse_port = |raw: &str| {
        raw.parse::<u16>().map_err(|_| {
            CheckError::configuration(format!("invalid port {raw:?} in hostname {hostname:?}"))
        })
    };

    if let Some(rest) = hostname.strip_prefix('[') {
        let (literal, tail) = rest.split_once(']').ok_or_else(|| {
            CheckError::configuration(format!("unterminated IPv6 literal in {hostname:?}"))
        })?;
        let port = match tail.strip_prefix(':') {
            Some(raw) => Some(parse_port(raw)?),
            None if tail.is_empty() => None,
            None => {
                return Err(CheckError::configuration(format!(
                    "unexpected text after IPv6 literal in {hostname:?}"
                )))
            }
        };
        return Ok((format!("[{literal}]"), port));
    }

    match hostname.matches(':').count() {
        0 => Ok((hostname.to_string(), None)),
        1 => {
            let (host, raw) = hostname.split_once(':').unwrap_or((hostname, ""));
            Ok((host.to_string(), Some(parse_port(raw)?)))
        }
        // Bare IPv6 literal without a port
        _ => Ok((format!("[{hostname}]"), None)),
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerAddress::Tcp(addr) => f.write_str(addr),
            ServerAddress::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Settings for one check run
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub address: ServerAddress,
    pub selectors: Vec<SelectorToken>,
    pub thresholds: ThresholdSpec,
    pub max_attempts: u32,
    pub connect_timeout: Duration,
}

impl CheckConfig {
    /// Create a configuration with defaults for everything but the address
    pub fn new(address: ServerAddress) -> Self {
        Self {
            address,
            selectors: Vec::new(),
            thresholds: ThresholdSpec::default(),
            max_attempts: system::DEFAULT_MAX_ATTEMPTS,
            connect_timeout: system::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Append a selector; order matters
    pub fn with_selector(mut self, selector: SelectorToken) -> Self {
        self.selectors.push(selector);
        self
    }

    /// Append several selectors in order
    pub fn with_selectors<I>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = SelectorToken>,
    {
        self.selectors.extend(selectors);
        self
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdSpec) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> CheckResult<()> {
        if self.max_attempts == 0 {
            return Err(CheckError::configuration("max_attempts must be at least 1"));
        }

        if self.connect_timeout.is_zero() {
            return Err(CheckError::configuration(
                "connect timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    /// JSON view of the settings for debug logging
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "address": self.address,
            "selectors": self.selectors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "thresholds": self.thresholds,
            "max_attempts": self.max_attempts,
            "connect_timeout_seconds": self.connect_timeout.as_secs_f64(),
        })
    }
}
