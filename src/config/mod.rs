//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::util::time::SIMULATION_TPS;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Simulation ticks per second for every room
    pub tick_rate: u32,
    /// Allowed client origins for CORS, comma-separated. `None` allows any.
    pub client_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match (lookup("PORT"), lookup("SERVER_ADDR")) {
            (Some(port), _) => {
                let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
                format!("{}:{}", host, port)
            }
            (None, Some(addr)) => addr,
            (None, None) => "0.0.0.0:3001".to_string(),
        };

        let tick_rate = match lookup("TICK_RATE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(rate) if rate > 0 => rate,
                _ => return Err(ConfigError::InvalidTickRate(raw)),
            },
            None => SIMULATION_TPS,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr))?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            tick_rate,
            client_origin: lookup("CLIENT_ORIGIN").filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format: {0}")]
    InvalidAddress(String),

    #[error("TICK_RATE must be a positive integer, got {0:?}")]
    InvalidTickRate(String),
}
