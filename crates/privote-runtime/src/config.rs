//! Runtime configuration
//!
//! `LedgerConfig` is read from `PRIVOTE_MODE`, `PRIVOTE_NETWORK` and
//! `PRIVOTE_CONTRACT_ADDRESS`. `ProverConfig` sizes the circuit and locates
//! the parameter cache.

use crate::error::{Result, VoteError};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};
use tracing::warn;

pub const MODE_VAR: &str = "PRIVOTE_MODE";
pub const NETWORK_VAR: &str = "PRIVOTE_NETWORK";
pub const CONTRACT_ADDRESS_VAR: &str = "PRIVOTE_CONTRACT_ADDRESS";

pub const DEFAULT_NETWORK: &str = "testnet";
pub const DEFAULT_K: u32 = 9;
pub const DEFAULT_CACHE_DIR: &str = ".privote_cache";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Label reported to clients: `"demo"` or `"production"`.
    pub fn wire_label(self) -> &'static str {
        match self {
            Self::Development => "demo",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Mode {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "demo" | "test" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(VoteError::validation(format!("unknown mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub mode: Mode,
    pub network: String,
    pub contract_address: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            network: DEFAULT_NETWORK.to_string(),
            contract_address: None,
        }
    }
}

impl LedgerConfig {
    pub fn development() -> Self {
        Self::default()
    }

    pub fn production() -> Self {
        Self { mode: Mode::Production, ..Self::default() }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup(MODE_VAR) {
            Some(value) => value.parse()?,
            None => Mode::default(),
        };
        let network = lookup(NETWORK_VAR).unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let contract_address = lookup(CONTRACT_ADDRESS_VAR).filter(|addr| !addr.trim().is_empty());

        if mode.is_production() && contract_address.is_none() {
            warn!("{} not set while running in production mode", CONTRACT_ADDRESS_VAR);
        }

        Ok(Self { mode, network, contract_address })
    }
}

/// Prover parameters: circuit size `2^k` and the key cache location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    k: u32,
    cache_dir: PathBuf,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self { k: DEFAULT_K, cache_dir: PathBuf::from(DEFAULT_CACHE_DIR) }
    }
}

impl ProverConfig {
    pub fn new(k: u32, cache_dir: impl Into<PathBuf>) -> Self {
        Self { k, cache_dir: cache_dir.into() }
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }
}
