//! Process configuration from the environment.
//!
//! Values come from real environment variables, optionally seeded from a
//! `.env` file in the working directory. Variables already set in the
//! environment win over the file.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which `DocumentStore` the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err("expected `redis` or `memory`".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    pub store_backend: StoreBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            store_backend: StoreBackend::default(),
        }
    }
}

impl Config {
    /// Read `HOST`, `PORT`, `REDIS_URL` and `STORE_BACKEND`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or blank keys fall back to
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|e| {
                ConfigError::Invalid {
                    key: "PORT",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => defaults.port,
        };

        let store_backend = match get("STORE_BACKEND") {
            Some(value) => value
                .trim()
                .parse::<StoreBackend>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value,
                    reason,
                })?,
            None => defaults.store_backend,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            redis_url: get("REDIS_URL").unwrap_or(defaults.redis_url),
            store_backend,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Outcome of looking for a `.env` file.
#[derive(Debug)]
pub enum DotenvOutcome {
    Loaded(PathBuf),
    Missing,
    Failed(dotenvy::Error),
}

/// Load `.env` if there is one. Call before logging is set up so `RUST_LOG`
/// can come from the file; report the outcome once it is.
pub fn load_dotenv() -> DotenvOutcome {
    match dotenvy::dotenv() {
        Ok(path) => DotenvOutcome::Loaded(path),
        Err(e) if e.not_found() => DotenvOutcome::Missing,
        Err(e) => DotenvOutcome::Failed(e),
    }
}
