//! Console configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base URL every endpoint path is appended to.
    pub api_base: String,
    /// Directory holding the persisted credential.
    pub token_dir: PathBuf,
    pub timeout: Duration,
    /// When set, JSON logs are also written to a daily rolling file here.
    pub log_dir: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Config {
    /// Reads configuration from the environment (after loading `.env`).
    ///
    /// | Variable                   | Default                          |
    /// |----------------------------|----------------------------------|
    /// | `RAG_CONSOLE_API_BASE`     | `http://localhost:8000/api`      |
    /// | `RAG_CONSOLE_TOKEN_DIR`    | `<config dir>/rag-console`       |
    /// | `RAG_CONSOLE_TIMEOUT_SECS` | `120`                            |
    /// | `RAG_CONSOLE_LOG_DIR`      | unset                            |
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base = lookup("RAG_CONSOLE_API_BASE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let token_dir = lookup("RAG_CONSOLE_TOKEN_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_token_dir);

        let timeout_secs = match lookup("RAG_CONSOLE_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("RAG_CONSOLE_TIMEOUT_SECS={:?}: {}", raw, e))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let log_dir = lookup("RAG_CONSOLE_LOG_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_base,
            token_dir,
            timeout: Duration::from_secs(timeout_secs),
            log_dir,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        })
    }
}

fn default_token_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("rag-console"))
        .unwrap_or_else(|| PathBuf::from("."))
}
