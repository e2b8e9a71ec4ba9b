//! Configuration loading and representation.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime settings, read from the environment.
///
/// | variable | default |
/// |---|---|
/// | `STOCKROOM_BIND_ADDR` | `0.0.0.0:8080` |
/// | `DATABASE_URL` | unset: in-memory store |
/// | `STOCKROOM_DB_MAX_CONNECTIONS` | `5` |
/// | `STOCKROOM_SEED` | `false` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub seed: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("STOCKROOM_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "STOCKROOM_BIND_ADDR",
                reason: e.to_string(),
            })?;

        let db_max_connections = match var("STOCKROOM_DB_MAX_CONNECTIONS") {
            None => DEFAULT_DB_MAX_CONNECTIONS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: "STOCKROOM_DB_MAX_CONNECTIONS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "STOCKROOM_DB_MAX_CONNECTIONS",
                        reason: e.to_string(),
                    });
                }
            },
        };

        let seed = match var("STOCKROOM_SEED").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("0" | "false" | "no") => false,
            Some("1" | "true" | "yes") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "STOCKROOM_SEED",
                    reason: format!("expected true/false, got '{other}'"),
                });
            }
        };

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            db_max_connections,
            seed,
        })
    }
}
