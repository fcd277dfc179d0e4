//! # Gateway Configuration
//!
//! Built from environment variables, then validated before anything binds.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TQ_ADDR` (fallback `ADDR`) | `0.0.0.0:8080` |
//! | `TQ_WS_PATH` | `/v1/ws` |
//! | `TQ_WS_BUFFER` | `64` |
//! | `TQ_BROKER_CAPACITY` | `1024` |
//! | `TQ_SEARCH_LIMIT` | `20` |
//! | `TQ_IDENTITIES_FILE` | unset |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tq_01_name_index::DEFAULT_SEARCH_LIMIT;
use tq_02_queue_notifier::DEFAULT_WS_BUFFER;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Default WebSocket upgrade path.
pub const DEFAULT_WS_PATH: &str = "/v1/ws";

/// Default broker buffer, in deliveries.
pub const DEFAULT_BROKER_CAPACITY: usize = 1024;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable could not be parsed.
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// A size or limit was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// The WebSocket path is not an absolute URL path.
    #[error("WebSocket path {0:?} must start with '/'")]
    InvalidWsPath(String),
}

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// WebSocket listen address.
    pub addr: SocketAddr,
    /// Upgrade path.
    pub ws_path: String,
    /// Per-connection outbound frame buffer.
    pub ws_buffer: usize,
    /// In-memory broker delivery buffer.
    pub broker_capacity: usize,
    /// Default autocomplete result count.
    pub search_limit: usize,
    /// Optional JSON file seeding the identity store.
    pub identities_file: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ws_path: DEFAULT_WS_PATH.to_string(),
            ws_buffer: DEFAULT_WS_BUFFER,
            broker_capacity: DEFAULT_BROKER_CAPACITY,
            search_limit: DEFAULT_SEARCH_LIMIT,
            identities_file: None,
        }
    }
}

impl GatewayConfig {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load and validate configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let addr = match lookup("TQ_ADDR").or_else(|| lookup("ADDR")) {
            Some(value) => parse_addr(&value)?,
            None => defaults.addr,
        };

        let config = Self {
            addr,
            ws_path: lookup("TQ_WS_PATH").unwrap_or(defaults.ws_path),
            ws_buffer: parse_var(&lookup, "TQ_WS_BUFFER", defaults.ws_buffer)?,
            broker_capacity: parse_var(&lookup, "TQ_BROKER_CAPACITY", defaults.broker_capacity)?,
            search_limit: parse_var(&lookup, "TQ_SEARCH_LIMIT", defaults.search_limit)?,
            identities_file: lookup("TQ_IDENTITIES_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero sizes and malformed paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ws_buffer == 0 {
            return Err(ConfigError::Zero("TQ_WS_BUFFER"));
        }
        if self.broker_capacity == 0 {
            return Err(ConfigError::Zero("TQ_BROKER_CAPACITY"));
        }
        if self.search_limit == 0 {
            return Err(ConfigError::Zero("TQ_SEARCH_LIMIT"));
        }
        if !self.ws_path.starts_with('/') || self.ws_path.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidWsPath(self.ws_path.clone()));
        }
        Ok(())
    }
}

/// Accepts `host:port` or a bare `:port` (listen on all interfaces).
fn parse_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    let candidate = match value.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => value.to_string(),
    };
    candidate.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
        var: "TQ_ADDR",
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}
