//! Capturing snapshots from a running simulated ledger

use std::future::Future;
use tracing::debug;

use crate::ledger::SimulatedLedger;
use crate::snapshot::{AccountState, SnapshotMetadata, StateSnapshot};
use crate::traits::LedgerStorage;
use crate::types::*;

/// Snapshots taken before and after an operation, plus its result
#[derive(Debug, Clone)]
pub struct CapturedOperation<T> {
    pub before: StateSnapshot,
    pub after: StateSnapshot,
    pub result: T,
}

impl<T> CapturedOperation<T> {
    /// Balance changes caused by the operation
    pub fn diff(&self) -> crate::snapshot::SnapshotDiff {
        self.after.diff_from(&self.before)
    }
}

/// Reads snapshots out of a [`SimulatedLedger`]
///
/// Every capture reads all requested accounts and the round in a single
/// storage call, so a snapshot never mixes states from before and after a
/// concurrent submission.
#[derive(Debug, Clone)]
pub struct SnapshotCapture<S: LedgerStorage> {
    ledger: SimulatedLedger<S>,
}

impl<S: LedgerStorage + Clone> SnapshotCapture<S> {
    pub fn new(ledger: SimulatedLedger<S>) -> Self {
        Self { ledger }
    }

    /// Capture the given accounts. Fails with `NotFound` if any of them is
    /// not registered; no partial snapshot is produced.
    pub async fn capture(
        &self,
        addresses: &[String],
        label: Option<&str>,
        description: Option<&str>,
    ) -> LedgerResult<StateSnapshot> {
        let (round, accounts) = self.ledger.read_accounts(addresses).await?;
        let metadata = SnapshotMetadata {
            label: label.map(str::to_string),
            description: description.map(str::to_string),
            ..SnapshotMetadata::default()
        };
        Ok(Self::assemble(round, accounts, metadata))
    }

    /// Capture every registered account
    pub async fn capture_all(&self, label: Option<&str>) -> LedgerResult<StateSnapshot> {
        let (round, accounts) = self.ledger.read_all().await?;
        let metadata = SnapshotMetadata {
            label: label.map(str::to_string),
            ..SnapshotMetadata::default()
        };
        Ok(Self::assemble(round, accounts, metadata))
    }

    /// Capture `addresses`, run `operation`, capture them again.
    ///
    /// The operation's error type only needs to absorb [`LedgerError`], so
    /// callers can run builder or assertion code inside it.
    pub async fn capture_around<F, Fut, T, E>(
        &self,
        addresses: &[String],
        operation: F,
    ) -> Result<CapturedOperation<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LedgerError>,
    {
        let before = self
            .capture(addresses, Some("Before operation"), None)
            .await?;
        let result = operation().await?;
        let after = self
            .capture(addresses, Some("After operation"), None)
            .await?;

        Ok(CapturedOperation {
            before,
            after,
            result,
        })
    }

    fn assemble(round: u64, accounts: Vec<AccountInfo>, metadata: SnapshotMetadata) -> StateSnapshot {
        debug!(round, accounts = accounts.len(), label = ?metadata.label, "captured snapshot");
        StateSnapshot::new(round, accounts.into_iter().map(AccountState::from)).with_metadata(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::patterns;

    fn addresses(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn test_capture_accounts() {
        let ledger = SimulatedLedger::in_memory();
        ledger
            .register(AccountInfo::new("ADDR1", 10_000_000).with_asset(5, 20))
            .await
            .unwrap();
        let capture = SnapshotCapture::new(ledger);

        let snapshot = capture
            .capture(&addresses(&["ADDR1"]), Some("Test snapshot"), Some("one account"))
            .await
            .unwrap();

        assert_eq!(snapshot.round, 1_000);
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.balance("ADDR1"), 10_000_000);
        assert_eq!(snapshot.accounts["ADDR1"].assets.get(&5), Some(&20));
        assert_eq!(snapshot.metadata.label.as_deref(), Some("Test snapshot"));
        assert_eq!(snapshot.metadata.description.as_deref(), Some("one account"));
    }

    #[tokio::test]
    async fn test_capture_fails_without_partial_snapshot() {
        let ledger = SimulatedLedger::in_memory();
        ledger.register(AccountInfo::new("ADDR1", 1)).await.unwrap();
        let capture = SnapshotCapture::new(ledger);

        let err = capture
            .capture(&addresses(&["ADDR1", "MISSING"]), None, None)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::account_not_found("MISSING"));
    }

    #[tokio::test]
    async fn test_capture_all() {
        let ledger = SimulatedLedger::in_memory();
        ledger
            .register_all(vec![
                AccountInfo::new("ADDR1", 5_000_000),
                AccountInfo::new("ADDR2", 7_000_000),
            ])
            .await
            .unwrap();
        let capture = SnapshotCapture::new(ledger);

        let snapshot = capture.capture_all(Some("everything")).await.unwrap();
        assert_eq!(snapshot.accounts.len(), 2);
        assert_eq!(snapshot.balance("ADDR2"), 7_000_000);
    }

    #[tokio::test]
    async fn test_capture_around_operation() {
        let ledger = SimulatedLedger::in_memory();
        ledger
            .register_all(vec![
                AccountInfo::new("S", 10_000_000),
                AccountInfo::new("R", 1_000_000),
            ])
            .await
            .unwrap();
        let capture = SnapshotCapture::new(ledger.clone());

        let tx = patterns::simple_payment("S", "R", 1_000_000).unwrap();
        let captured = capture
            .capture_around(&addresses(&["S", "R"]), || async {
                ledger.submit_transaction(&tx).await
            })
            .await
            .unwrap();

        assert!(!captured.result.is_empty());
        assert_eq!(captured.before.metadata.label.as_deref(), Some("Before operation"));
        assert_eq!(captured.after.metadata.label.as_deref(), Some("After operation"));

        let diff = captured.diff();
        assert_eq!(diff.delta("S"), -1_001_000);
        assert_eq!(diff.delta("R"), 1_000_000);
    }

    #[tokio::test]
    async fn test_capture_around_propagates_operation_error() {
        let ledger = SimulatedLedger::in_memory();
        ledger.register(AccountInfo::new("S", 10)).await.unwrap();
        let capture = SnapshotCapture::new(ledger.clone());

        let tx = patterns::simple_payment("S", "R", 1_000).unwrap();
        let err = capture
            .capture_around(&addresses(&["S"]), || async {
                ledger.submit_transaction(&tx).await
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }
}
