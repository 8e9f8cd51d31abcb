//! In-memory storage implementation backing the simulated ledger

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ledger::LedgerState;
use crate::traits::*;
use crate::types::*;

/// In-memory ledger storage
///
/// Clones share the same state, so a cloned storage (or a cloned
/// [`SimulatedLedger`](crate::SimulatedLedger)) can be handed to other tasks.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryStorage {
    /// Create a new memory storage starting at the default round
    pub fn new() -> Self {
        Self::with_initial_round(crate::config::DEFAULT_INITIAL_ROUND)
    }

    /// Create a new memory storage starting at `round`
    pub fn with_initial_round(round: u64) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::new(round))),
        }
    }

    /// Copy of the whole state (useful for byte-level comparisons in tests)
    pub async fn state(&self) -> LedgerState {
        self.state.read().await.clone()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_account(&self, account: AccountInfo) -> LedgerResult<()> {
        self.state.write().await.register(account);
        Ok(())
    }

    async fn get_account(&self, address: &str) -> LedgerResult<Option<AccountInfo>> {
        Ok(self.state.read().await.account(address).cloned())
    }

    async fn list_accounts(&self) -> LedgerResult<Vec<AccountInfo>> {
        Ok(self.state.read().await.accounts().cloned().collect())
    }

    async fn read_accounts(&self, addresses: &[String]) -> LedgerResult<(u64, Vec<AccountInfo>)> {
        let state = self.state.read().await;
        let accounts = state.read_accounts(addresses)?;
        Ok((state.round(), accounts))
    }

    async fn read_all(&self) -> LedgerResult<(u64, Vec<AccountInfo>)> {
        let state = self.state.read().await;
        Ok((state.round(), state.accounts().cloned().collect()))
    }

    async fn current_round(&self) -> LedgerResult<u64> {
        Ok(self.state.read().await.round())
    }

    async fn advance_round(&self, rounds: u64) -> LedgerResult<u64> {
        Ok(self.state.write().await.advance(rounds))
    }

    async fn apply_payment(
        &self,
        tx_id: &str,
        transaction: &Transaction,
    ) -> LedgerResult<TransactionResponse> {
        self.state.write().await.apply_payment(tx_id, transaction)
    }

    async fn save_response(&self, tx_id: &str, response: TransactionResponse) -> LedgerResult<()> {
        self.state
            .write()
            .await
            .record_response(tx_id.to_string(), response);
        Ok(())
    }

    async fn get_response(&self, tx_id: &str) -> LedgerResult<Option<TransactionResponse>> {
        Ok(self.state.read().await.response(tx_id).cloned())
    }

    async fn fees_burned(&self) -> LedgerResult<u128> {
        Ok(self.state.read().await.fees_burned())
    }

    async fn total_balance(&self) -> LedgerResult<u128> {
        Ok(self.state.read().await.total_balance())
    }

    async fn clear(&self, baseline_round: u64) -> LedgerResult<()> {
        self.state.write().await.clear(baseline_round);
        Ok(())
    }
}
