//! Traits for storage abstraction and the sandbox lifecycle

use async_trait::async_trait;
use std::time::Duration;

use crate::sandbox::{SandboxError, SandboxState};
use crate::types::*;

/// Storage abstraction for the simulated ledger
///
/// Implementations own the ledger state and must serialize mutation: every
/// method is observed as if it ran alone. In particular
/// [`apply_payment`](LedgerStorage::apply_payment) performs its balance check
/// and its writes as one step, and
/// [`read_accounts`](LedgerStorage::read_accounts) returns a view taken at a
/// single instant.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Insert or overwrite an account
    async fn save_account(&self, account: AccountInfo) -> LedgerResult<()>;

    /// Get an account by address
    async fn get_account(&self, address: &str) -> LedgerResult<Option<AccountInfo>>;

    /// List all registered accounts
    async fn list_accounts(&self) -> LedgerResult<Vec<AccountInfo>>;

    /// Read a set of accounts together with the current round, atomically.
    /// Fails with `NotFound` if any address is unknown.
    async fn read_accounts(&self, addresses: &[String]) -> LedgerResult<(u64, Vec<AccountInfo>)>;

    /// Read every registered account together with the current round, atomically
    async fn read_all(&self) -> LedgerResult<(u64, Vec<AccountInfo>)>;

    /// Current round
    async fn current_round(&self) -> LedgerResult<u64>;

    /// Advance the round counter, returning the new round
    async fn advance_round(&self, rounds: u64) -> LedgerResult<u64>;

    /// Validate and apply a payment under the given transaction id
    async fn apply_payment(
        &self,
        tx_id: &str,
        transaction: &Transaction,
    ) -> LedgerResult<TransactionResponse>;

    /// Save a transaction response under an id
    async fn save_response(&self, tx_id: &str, response: TransactionResponse) -> LedgerResult<()>;

    /// Get a transaction response by id
    async fn get_response(&self, tx_id: &str) -> LedgerResult<Option<TransactionResponse>>;

    /// Cumulative fees burned by applied payments
    async fn fees_burned(&self) -> LedgerResult<u128>;

    /// Sum of all registered balances
    async fn total_balance(&self) -> LedgerResult<u128>;

    /// Remove all state and rewind to `baseline_round`
    async fn clear(&self, baseline_round: u64) -> LedgerResult<()>;
}

/// Lifecycle of an external node process used by integration tests
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Current lifecycle state
    async fn state(&self) -> SandboxState;

    /// Base URL of the node API, only available while running
    async fn algod_url(&self) -> Result<String, SandboxError>;

    /// Base URL of the indexer API, only available while running
    async fn indexer_url(&self) -> Result<String, SandboxError>;

    /// API token, only available while running
    async fn api_token(&self) -> Result<String, SandboxError>;

    /// Start the sandbox; it must be stopped
    async fn start(&self) -> Result<(), SandboxError>;

    /// Stop the sandbox; it must be running
    async fn stop(&self) -> Result<(), SandboxError>;

    /// Reset to a clean state, restarting if it was running
    async fn reset(&self) -> Result<(), SandboxError>;

    /// Wait until the sandbox is running or `timeout` elapses
    async fn wait_for_ready(&self, timeout: Duration) -> Result<(), SandboxError>;

    /// Start the sandbox unless it is already running
    async fn ensure_running(&self) -> Result<(), SandboxError> {
        if self.state().await.is_running() {
            return Ok(());
        }
        self.start().await
    }
}
