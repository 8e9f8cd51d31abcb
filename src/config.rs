//! Configuration for the simulated ledger and its collaborators
//!
//! Every section has defaults matching a local development network, so an
//! empty (or missing) configuration file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "ledger-testkit.toml";

/// Round the ledger starts at, and returns to on reset
pub const DEFAULT_INITIAL_ROUND: u64 = 1_000;
/// Nominal latency between rounds, in milliseconds
pub const DEFAULT_ROUND_LATENCY_MS: u64 = 4_500;
/// Fee applied by the transaction builder when none is given
pub const DEFAULT_FEE: u64 = 1_000;
/// Width of the validity window applied by the transaction builder
pub const DEFAULT_VALID_ROUNDS: u64 = 1_000;
/// Network identifier stamped on every transaction
pub const DEFAULT_GENESIS_ID: &str = "testnet-v1.0";
/// Funding for accounts created without an explicit amount (10 units of 10^6)
pub const DEFAULT_FUNDING: u64 = 10_000_000;
/// Minimum balance an account should hold
pub const DEFAULT_MINIMUM_BALANCE: u64 = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TestkitConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub transactions: TransactionDefaults,
    #[serde(default)]
    pub accounts: AccountConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
}

impl TestkitConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file, falling back to defaults if it does not exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load [`DEFAULT_CONFIG_FILE`] from the working directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Starting round and reset baseline
    pub initial_round: u64,
    /// Reported by the node status as the time since the last round
    pub round_latency_ms: u64,
}

impl LedgerConfig {
    pub fn round_latency(&self) -> Duration {
        Duration::from_millis(self.round_latency_ms)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_round: DEFAULT_INITIAL_ROUND,
            round_latency_ms: DEFAULT_ROUND_LATENCY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionDefaults {
    pub fee: u64,
    pub valid_rounds: u64,
    pub genesis_id: String,
}

impl Default for TransactionDefaults {
    fn default() -> Self {
        Self {
            fee: DEFAULT_FEE,
            valid_rounds: DEFAULT_VALID_ROUNDS,
            genesis_id: DEFAULT_GENESIS_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub default_funding: u64,
    /// Balance an account must keep after paying a transaction
    pub minimum_balance: u64,
    /// Number of accounts an [`AccountPool`](crate::ledger::AccountPool) pre-creates
    pub pool_size: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            default_funding: DEFAULT_FUNDING,
            minimum_balance: DEFAULT_MINIMUM_BALANCE,
            pool_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub algod_port: u16,
    pub indexer_port: u16,
    pub api_token: String,
    pub startup_delay_ms: u64,
    pub shutdown_delay_ms: u64,
    pub reset_delay_ms: u64,
    /// Interval between readiness checks in `wait_for_ready`
    pub poll_interval_ms: u64,
}

impl SandboxConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn shutdown_delay(&self) -> Duration {
        Duration::from_millis(self.shutdown_delay_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            algod_port: 4001,
            indexer_port: 8980,
            api_token: "a".repeat(64),
            startup_delay_ms: 100,
            shutdown_delay_ms: 100,
            reset_delay_ms: 50,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Maximum number of history entries kept by a snapshot store, unbounded if `None`
    pub max_history: Option<usize>,
}
