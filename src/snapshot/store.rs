//! Named snapshot storage with comparison helpers

use chrono::NaiveDateTime;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::SnapshotConfig;
use crate::snapshot::{diff, SnapshotDiff, StateSnapshot};
use crate::types::*;

#[derive(Debug, Clone)]
struct HistoryEntry {
    id: String,
    stored_at: NaiveDateTime,
    snapshot: StateSnapshot,
}

#[derive(Debug, Default)]
struct StoreState {
    snapshots: HashMap<String, StateSnapshot>,
    history: VecDeque<HistoryEntry>,
}

/// Stores snapshots under caller-chosen ids and keeps a chronological history
///
/// Storing under an existing id replaces the snapshot but still appends a
/// history entry. With a history limit, the oldest entries are evicted first;
/// eviction never removes the current snapshot for an id.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    state: RwLock<StoreState>,
    max_history: Option<usize>,
}

impl SnapshotStore {
    /// Create a store with unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &SnapshotConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            max_history: config.max_history,
        }
    }

    /// Create a store keeping at most `limit` history entries
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            max_history: Some(limit),
        }
    }

    /// Store a snapshot, replacing any previous snapshot with the same id
    pub async fn store(&self, id: impl Into<String>, snapshot: StateSnapshot) {
        let id = id.into();
        let mut state = self.state.write().await;

        state.snapshots.insert(id.clone(), snapshot.clone());
        state.history.push_back(HistoryEntry {
            id: id.clone(),
            stored_at: chrono::Utc::now().naive_utc(),
            snapshot,
        });
        if let Some(limit) = self.max_history {
            while state.history.len() > limit {
                state.history.pop_front();
            }
        }
        debug!(id = %id, history = state.history.len(), "stored snapshot");
    }

    /// Retrieve a stored snapshot
    pub async fn retrieve(&self, id: &str) -> LedgerResult<StateSnapshot> {
        self.state
            .read()
            .await
            .snapshots
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Entity::Snapshot, id))
    }

    /// Balance changes from the snapshot `from_id` to the snapshot `to_id`
    pub async fn compare(&self, from_id: &str, to_id: &str) -> LedgerResult<SnapshotDiff> {
        let (from, to) = self.pair(from_id, to_id).await?;
        Ok(diff(&from, &to))
    }

    /// Fail with `ComparisonMismatch` unless both snapshots hold identical
    /// account states, assets included
    pub async fn assert_equal(&self, id1: &str, id2: &str) -> LedgerResult<()> {
        let (first, second) = self.pair(id1, id2).await?;
        if first.accounts == second.accounts {
            return Ok(());
        }

        Err(LedgerError::ComparisonMismatch {
            expected: id1.to_string(),
            actual: id2.to_string(),
            differing: first.differing_accounts(&second),
        })
    }

    async fn pair(&self, first: &str, second: &str) -> LedgerResult<(StateSnapshot, StateSnapshot)> {
        let state = self.state.read().await;
        let lookup = |id: &str| {
            state
                .snapshots
                .get(id)
                .cloned()
                .ok_or_else(|| LedgerError::not_found(Entity::Snapshot, id))
        };
        Ok((lookup(first)?, lookup(second)?))
    }

    /// Ids in history order; an id stored twice appears twice
    pub async fn snapshot_ids(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .history
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Number of distinct stored ids
    pub async fn len(&self) -> usize {
        self.state.read().await.snapshots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.snapshots.is_empty()
    }

    /// Remove a snapshot and all of its history entries
    pub async fn remove(&self, id: &str) {
        let mut state = self.state.write().await;
        state.snapshots.remove(id);
        state.history.retain(|entry| entry.id != id);
    }

    /// Remove everything
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.snapshots.clear();
        state.history.clear();
    }

    /// History snapshots captured within `[start, end]`, oldest stored first
    pub async fn snapshots_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Vec<StateSnapshot> {
        self.state
            .read()
            .await
            .history
            .iter()
            .filter(|entry| entry.snapshot.captured_at >= start && entry.snapshot.captured_at <= end)
            .map(|entry| entry.snapshot.clone())
            .collect()
    }

    /// Time the most recent history entry for `id` was stored
    pub async fn stored_at(&self, id: &str) -> Option<NaiveDateTime> {
        self.state
            .read()
            .await
            .history
            .iter()
            .rev()
            .find(|entry| entry.id == id)
            .map(|entry| entry.stored_at)
    }
}
