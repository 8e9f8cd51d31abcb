//! Core types and data structures for the simulated ledger

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Identifier of a secondary asset held by an account
pub type AssetId = u64;

/// Account state as reported by the simulated node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account address (opaque to the ledger)
    pub address: String,
    /// Native balance in base units
    pub balance: u64,
    /// Round at which this record was last written
    pub round: u64,
    /// Secondary asset balances keyed by asset id
    pub assets: BTreeMap<AssetId, u64>,
}

impl AccountInfo {
    /// Create a new account record with no asset holdings
    pub fn new(address: impl Into<String>, balance: u64) -> Self {
        Self {
            address: address.into(),
            balance,
            round: crate::config::DEFAULT_INITIAL_ROUND,
            assets: BTreeMap::new(),
        }
    }

    /// Set the last-updated round
    pub fn at_round(mut self, round: u64) -> Self {
        self.round = round;
        self
    }

    /// Add (or replace) a secondary asset holding
    pub fn with_asset(mut self, asset_id: AssetId, amount: u64) -> Self {
        self.assets.insert(asset_id, amount);
        self
    }

    /// Amount held of a given asset, zero when not opted in
    pub fn asset_amount(&self, asset_id: AssetId) -> u64 {
        self.assets.get(&asset_id).copied().unwrap_or(0)
    }
}

/// Immutable payment transaction consumed by the ledger and the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sending address
    pub sender: String,
    /// Receiving address
    pub receiver: String,
    /// Principal amount moved from sender to receiver
    pub amount: u64,
    /// Fee burned from the sender
    pub fee: u64,
    /// Optional opaque note payload
    pub note: Option<Vec<u8>>,
    /// First round in which the transaction is valid
    pub first_valid: u64,
    /// Last round in which the transaction is valid
    pub last_valid: u64,
    /// Network identifier
    pub genesis_id: String,
    /// Network genesis hash
    pub genesis_hash: [u8; 32],
}

impl Transaction {
    /// Amount plus fee, or `None` if the sum does not fit in a `u64`
    pub fn total_cost(&self) -> Option<u64> {
        self.amount.checked_add(self.fee)
    }

    /// Whether the address is the sender or the receiver
    pub fn involves(&self, address: &str) -> bool {
        self.sender == address || self.receiver == address
    }

    /// Note decoded as UTF-8, if present and valid
    pub fn note_text(&self) -> Option<&str> {
        self.note
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

/// Confirmation record for a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Transaction identifier
    pub tx_id: String,
    /// Round the transaction was confirmed in, `None` while pending
    pub confirmed_round: Option<u64>,
}

impl TransactionResponse {
    /// A response confirmed at the given round
    pub fn confirmed(tx_id: impl Into<String>, round: u64) -> Self {
        Self {
            tx_id: tx_id.into(),
            confirmed_round: Some(round),
        }
    }

    /// A response that has not been confirmed yet
    pub fn pending(tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            confirmed_round: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.is_some()
    }
}

/// Block metadata served by the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block round
    pub round: u64,
    /// Block timestamp
    pub timestamp: NaiveDateTime,
    /// Number of transactions in the block
    pub transaction_count: usize,
}

impl Block {
    /// Create an empty block at the given round, timestamped now
    pub fn new(round: u64) -> Self {
        Self {
            round,
            timestamp: chrono::Utc::now().naive_utc(),
            transaction_count: 0,
        }
    }

    pub fn with_transaction_count(mut self, count: usize) -> Self {
        self.transaction_count = count;
        self
    }
}

/// Read-only health descriptor of the simulated node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Latest round
    pub last_round: u64,
    /// Nominal latency between rounds
    pub time_since_last_round: Duration,
}

/// Kind of identifier carried by [`LedgerError::NotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Account,
    Transaction,
    Block,
    Snapshot,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Account => "Account",
            Entity::Transaction => "Transaction",
            Entity::Block => "Block",
            Entity::Snapshot => "Snapshot",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in the simulated ledger, snapshot store and index
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },
    #[error("Snapshot comparison failed: '{expected}' and '{actual}' differ for {differing:?}")]
    ComparisonMismatch {
        expected: String,
        actual: String,
        /// Addresses whose account state differs between the two snapshots
        differing: Vec<String>,
    },
    #[error("Balance overflow: crediting {amount} to {address} with balance {balance}")]
    BalanceOverflow {
        address: String,
        balance: u64,
        amount: u64,
    },
}

impl LedgerError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn account_not_found(address: impl Into<String>) -> Self {
        Self::not_found(Entity::Account, address)
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_cost_overflow() {
        let tx = Transaction {
            sender: "A".to_string(),
            receiver: "B".to_string(),
            amount: u64::MAX,
            fee: 1,
            note: None,
            first_valid: 1,
            last_valid: 2,
            genesis_id: "testnet-v1.0".to_string(),
            genesis_hash: [0; 32],
        };
        assert_eq!(tx.total_cost(), None);
        assert!(tx.involves("A"));
        assert!(!tx.involves("C"));
    }

    #[test]
    fn test_error_messages_carry_values() {
        let err = LedgerError::InsufficientBalance {
            required: 1_001_000,
            available: 500_000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: required 1001000, available 500000"
        );

        let err = LedgerError::not_found(Entity::Snapshot, "before");
        assert_eq!(err.to_string(), "Snapshot not found: before");
    }

    #[test]
    fn test_account_info_serialization() {
        let info = AccountInfo::new("ADDR1", 5_000_000).with_asset(31566704, 250);
        let json = serde_json::to_string(&info).unwrap();
        let back: AccountInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
        assert_eq!(back.asset_amount(31566704), 250);
        assert_eq!(back.asset_amount(1), 0);
    }
}
