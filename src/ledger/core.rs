//! Simulated ledger node that accepts and applies payment transactions

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::ledger::FundedAccount;
use crate::traits::*;
use crate::types::*;
use crate::utils::MemoryStorage;

/// Simulated ledger node
///
/// All state lives in the storage backend; the ledger itself only carries
/// configuration, so cloning it yields another handle onto the same ledger.
#[derive(Debug, Clone)]
pub struct SimulatedLedger<S: LedgerStorage> {
    storage: S,
    config: LedgerConfig,
}

impl SimulatedLedger<MemoryStorage> {
    /// Create an in-memory ledger with the default configuration
    pub fn in_memory() -> Self {
        Self::from_config(LedgerConfig::default())
    }

    /// Create an in-memory ledger starting at `config.initial_round`
    pub fn from_config(config: LedgerConfig) -> Self {
        let storage = MemoryStorage::with_initial_round(config.initial_round);
        Self::with_config(storage, config)
    }
}

impl Default for SimulatedLedger<MemoryStorage> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S: LedgerStorage + Clone> SimulatedLedger<S> {
    /// Create a ledger over the given storage backend with the default configuration
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, LedgerConfig::default())
    }

    /// Create a ledger over the given storage backend.
    ///
    /// `config.initial_round` is the baseline used by [`reset`](Self::reset);
    /// the storage keeps whatever round it was created with.
    pub fn with_config(storage: S, config: LedgerConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // Registration
    /// Register an account, overwriting any existing record with the same address
    pub async fn register(&self, account: AccountInfo) -> LedgerResult<()> {
        debug!(address = %account.address, balance = account.balance, "registering account");
        self.storage.save_account(account).await
    }

    /// Register several accounts
    pub async fn register_all(
        &self,
        accounts: impl IntoIterator<Item = AccountInfo>,
    ) -> LedgerResult<()> {
        for account in accounts {
            self.register(account).await?;
        }
        Ok(())
    }

    /// Register a funded test account with its initial balance at the current round
    pub async fn register_funded(&self, account: &FundedAccount) -> LedgerResult<AccountInfo> {
        let round = self.storage.current_round().await?;
        let info = account.to_account_info().at_round(round);
        self.register(info.clone()).await?;
        Ok(info)
    }

    /// Register a canned response for a transaction id
    pub async fn register_response(
        &self,
        tx_id: &str,
        response: TransactionResponse,
    ) -> LedgerResult<()> {
        self.storage.save_response(tx_id, response).await
    }

    // Rounds
    /// Advance the round counter by `rounds`, returning the new round
    pub async fn advance(&self, rounds: u64) -> LedgerResult<u64> {
        let round = self.storage.advance_round(rounds).await?;
        debug!(rounds, round, "advanced rounds");
        Ok(round)
    }

    pub async fn current_round(&self) -> LedgerResult<u64> {
        self.storage.current_round().await
    }

    // Queries
    /// Get account information, failing if the address was never registered
    pub async fn account_info(&self, address: &str) -> LedgerResult<AccountInfo> {
        self.storage
            .get_account(address)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(address))
    }

    /// Native balance of a registered account
    pub async fn balance(&self, address: &str) -> LedgerResult<u64> {
        Ok(self.account_info(address).await?.balance)
    }

    /// All registered accounts, in no particular order
    pub async fn registered_accounts(&self) -> LedgerResult<Vec<AccountInfo>> {
        self.storage.list_accounts().await
    }

    /// Confirmation for a transaction id
    pub async fn transaction(&self, tx_id: &str) -> LedgerResult<TransactionResponse> {
        self.storage
            .get_response(tx_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(Entity::Transaction, tx_id))
    }

    /// Node health descriptor
    pub async fn status(&self) -> LedgerResult<NodeStatus> {
        Ok(NodeStatus {
            last_round: self.storage.current_round().await?,
            time_since_last_round: self.config.round_latency(),
        })
    }

    /// Cumulative fees burned since creation or the last reset
    pub async fn fees_burned(&self) -> LedgerResult<u128> {
        self.storage.fees_burned().await
    }

    /// Sum of all registered balances
    pub async fn total_balance(&self) -> LedgerResult<u128> {
        self.storage.total_balance().await
    }

    // Submission
    /// Submit a payment and return its transaction id.
    ///
    /// The sender must be registered and hold `amount + fee`. The fee is
    /// burned. If the receiver is not registered the payment still succeeds
    /// and the amount leaves the ledger. Validity rounds are not enforced.
    pub async fn submit_transaction(&self, transaction: &Transaction) -> LedgerResult<String> {
        let tx_id = Uuid::new_v4().to_string();

        match self.storage.apply_payment(&tx_id, transaction).await {
            Ok(response) => {
                debug!(
                    tx_id = %tx_id,
                    sender = %transaction.sender,
                    receiver = %transaction.receiver,
                    amount = transaction.amount,
                    fee = transaction.fee,
                    round = ?response.confirmed_round,
                    "transaction confirmed"
                );
                Ok(tx_id)
            }
            Err(err) => {
                warn!(
                    sender = %transaction.sender,
                    amount = transaction.amount,
                    fee = transaction.fee,
                    error = %err,
                    "transaction rejected"
                );
                Err(err)
            }
        }
    }

    // State management
    /// Remove all accounts and confirmations and return to the configured initial round
    pub async fn reset(&self) -> LedgerResult<()> {
        self.storage.clear(self.config.initial_round).await?;
        info!(round = self.config.initial_round, "ledger reset");
        Ok(())
    }

    pub(crate) async fn read_accounts(
        &self,
        addresses: &[String],
    ) -> LedgerResult<(u64, Vec<AccountInfo>)> {
        self.storage.read_accounts(addresses).await
    }

    pub(crate) async fn read_all(&self) -> LedgerResult<(u64, Vec<AccountInfo>)> {
        self.storage.read_all().await
    }
}
