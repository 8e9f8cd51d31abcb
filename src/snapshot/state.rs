//! Immutable state snapshots and the differences between them

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{AccountInfo, AssetId};

/// Balances of one account at capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub address: String,
    pub balance: u64,
    pub assets: BTreeMap<AssetId, u64>,
}

impl AccountState {
    pub fn new(address: impl Into<String>, balance: u64) -> Self {
        Self {
            address: address.into(),
            balance,
            assets: BTreeMap::new(),
        }
    }

    pub fn with_asset(mut self, asset_id: AssetId, amount: u64) -> Self {
        self.assets.insert(asset_id, amount);
        self
    }
}

impl From<AccountInfo> for AccountState {
    fn from(info: AccountInfo) -> Self {
        Self {
            address: info.address,
            balance: info.balance,
            assets: info.assets,
        }
    }
}

/// Free-form description attached to a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub label: Option<String>,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
}

impl SnapshotMetadata {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}

/// Ledger state of a set of accounts at a given round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// When the snapshot was captured
    pub captured_at: NaiveDateTime,
    /// Ledger round at capture time
    pub round: u64,
    /// Account states keyed by address
    pub accounts: BTreeMap<String, AccountState>,
    pub metadata: SnapshotMetadata,
}

impl StateSnapshot {
    /// Build a snapshot captured now
    pub fn new(round: u64, accounts: impl IntoIterator<Item = AccountState>) -> Self {
        Self {
            captured_at: chrono::Utc::now().naive_utc(),
            round,
            accounts: accounts
                .into_iter()
                .map(|state| (state.address.clone(), state))
                .collect(),
            metadata: SnapshotMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: SnapshotMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the capture timestamp
    pub fn captured_at(mut self, timestamp: NaiveDateTime) -> Self {
        self.captured_at = timestamp;
        self
    }

    pub fn account_state(&self, address: &str) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    /// Balance of `address`, zero if it was not captured
    pub fn balance(&self, address: &str) -> u64 {
        self.accounts.get(address).map_or(0, |state| state.balance)
    }

    /// Differences from an earlier snapshot to this one
    pub fn diff_from(&self, earlier: &StateSnapshot) -> SnapshotDiff {
        diff(earlier, self)
    }

    /// Addresses whose full state (balance or assets) differs from `other`
    pub fn differing_accounts(&self, other: &StateSnapshot) -> Vec<String> {
        let addresses: BTreeSet<&String> = self.accounts.keys().chain(other.accounts.keys()).collect();
        addresses
            .into_iter()
            .filter(|address| self.accounts.get(*address) != other.accounts.get(*address))
            .cloned()
            .collect()
    }
}

/// Balance movement of one account between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub previous: u64,
    pub current: u64,
    /// `current - previous`
    pub delta: i128,
}

impl BalanceChange {
    pub fn new(previous: u64, current: u64) -> Self {
        Self {
            previous,
            current,
            delta: i128::from(current) - i128::from(previous),
        }
    }

    pub fn increased(&self) -> bool {
        self.delta > 0
    }

    pub fn decreased(&self) -> bool {
        self.delta < 0
    }
}

/// Per-account balance changes between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub from_round: u64,
    pub to_round: u64,
    /// Only accounts whose balance changed
    pub balance_changes: BTreeMap<String, BalanceChange>,
}

impl SnapshotDiff {
    pub fn has_changes(&self) -> bool {
        !self.balance_changes.is_empty()
    }

    /// Delta for `address`, zero if it did not change
    pub fn delta(&self, address: &str) -> i128 {
        self.balance_changes.get(address).map_or(0, |c| c.delta)
    }

    /// Sum of all deltas
    pub fn net_change(&self) -> i128 {
        self.balance_changes.values().map(|c| c.delta).sum()
    }
}

/// Compute balance changes from `from` to `to`.
///
/// Accounts missing on one side count as balance zero there. Only accounts
/// whose balance differs appear in the result; asset holdings are ignored.
pub fn diff(from: &StateSnapshot, to: &StateSnapshot) -> SnapshotDiff {
    let addresses: BTreeSet<&String> = from.accounts.keys().chain(to.accounts.keys()).collect();

    let balance_changes = addresses
        .into_iter()
        .filter_map(|address| {
            let previous = from.balance(address);
            let current = to.balance(address);
            (previous != current).then(|| (address.clone(), BalanceChange::new(previous, current)))
        })
        .collect();

    SnapshotDiff {
        from_round: from.round,
        to_round: to.round,
        balance_changes,
    }
}
