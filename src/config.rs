// ABOUTME: Process configuration read once from the environment at start-up
// ABOUTME: Holds the optional bearer secret, listen port and extractor settings

use std::env;
use std::time::Duration;

use crate::extractor::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT};

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared bearer secret. `None` disables authorization entirely.
    pub api_key: Option<String>,
    pub port: u16,
    /// Extraction binary, looked up on PATH unless given as a path
    pub extractor_bin: String,
    pub extractor_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("RESOLVER_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let port = lookup("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let extractor_bin = lookup("EXTRACTOR_BIN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());

        let extractor_timeout = lookup("EXTRACTOR_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            api_key,
            port,
            extractor_bin,
            extractor_timeout,
        }
    }
}
