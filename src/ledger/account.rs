//! Synthetic funded accounts for tests

use chrono::NaiveDateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::assertions::{assert_keeps_minimum_balance, AssertionResult};
use crate::config::AccountConfig;
use crate::types::*;
use crate::utils::validation::{ADDRESS_ALPHABET, ADDRESS_LENGTH};

/// A test account with a mock key and the balance it was funded with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundedAccount {
    /// Account address in canonical form
    pub address: String,
    /// Mock secret key; never used for signing
    pub secret_key: [u8; 32],
    /// Funding amount in base units
    pub initial_balance: u64,
    /// Descriptive metadata
    pub metadata: AccountMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub created_at: NaiveDateTime,
    pub purpose: Option<String>,
    pub tags: BTreeSet<String>,
}

impl AccountMetadata {
    pub fn new(purpose: Option<String>, tags: BTreeSet<String>) -> Self {
        Self {
            created_at: chrono::Utc::now().naive_utc(),
            purpose,
            tags,
        }
    }
}

impl FundedAccount {
    /// Create an account with a random address and an all-zero key
    pub fn mock(balance: u64) -> Self {
        Self {
            address: generate_address(),
            secret_key: [0; 32],
            initial_balance: balance,
            metadata: AccountMetadata::new(None, BTreeSet::new()),
        }
    }

    /// Copy of this account with additional tags
    pub fn tagged<I, T>(&self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut account = self.clone();
        account
            .metadata
            .tags
            .extend(tags.into_iter().map(Into::into));
        account
    }

    /// Ledger record for this account holding its initial balance
    pub fn to_account_info(&self) -> AccountInfo {
        AccountInfo::new(self.address.clone(), self.initial_balance)
    }
}

/// Random address: [`ADDRESS_LENGTH`] symbols from [`ADDRESS_ALPHABET`]
pub fn generate_address() -> String {
    let mut rng = rand::thread_rng();
    (0..ADDRESS_LENGTH)
        .map(|_| ADDRESS_ALPHABET[rng.gen_range(0..ADDRESS_ALPHABET.len())] as char)
        .collect()
}

fn generate_secret_key() -> [u8; 32] {
    rand::thread_rng().gen()
}

/// Creates and tracks funded accounts
#[derive(Debug, Clone)]
pub struct AccountFactory {
    config: AccountConfig,
    created: Arc<Mutex<Vec<FundedAccount>>>,
}

impl AccountFactory {
    pub fn new() -> Self {
        Self::with_config(AccountConfig::default())
    }

    pub fn with_config(config: AccountConfig) -> Self {
        Self {
            config,
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Create an account funded with `amount`, or the configured default
    pub async fn create_account(
        &self,
        amount: Option<u64>,
        purpose: Option<String>,
        tags: BTreeSet<String>,
    ) -> FundedAccount {
        let account = FundedAccount {
            address: generate_address(),
            secret_key: generate_secret_key(),
            initial_balance: amount.unwrap_or(self.config.default_funding),
            metadata: AccountMetadata::new(purpose, tags),
        };
        debug!(address = %account.address, balance = account.initial_balance, "created account");

        self.created.lock().await.push(account.clone());
        account
    }

    /// Create `count` accounts with the same funding
    pub async fn create_accounts(&self, count: usize, amount: Option<u64>) -> Vec<FundedAccount> {
        let mut accounts = Vec::with_capacity(count);
        for index in 0..count {
            let purpose = format!("Batch account {}", index + 1);
            accounts.push(
                self.create_account(amount, Some(purpose), BTreeSet::new())
                    .await,
            );
        }
        accounts
    }

    /// Copy of `account` with `amount` added to its funding
    pub fn fund_account(&self, account: &FundedAccount, amount: u64) -> FundedAccount {
        let mut funded = account.clone();
        funded.initial_balance = account.initial_balance.saturating_add(amount);
        funded
    }

    /// `account` can pay `transaction` and still hold the configured minimum balance
    pub fn assert_keeps_minimum(
        &self,
        account: &FundedAccount,
        transaction: &Transaction,
    ) -> AssertionResult {
        assert_keeps_minimum_balance(account, transaction, self.config.minimum_balance)
    }

    /// All accounts created so far, in creation order
    pub async fn accounts(&self) -> Vec<FundedAccount> {
        self.created.lock().await.clone()
    }

    /// Forget all created accounts
    pub async fn reset(&self) {
        self.created.lock().await.clear();
    }
}

impl Default for AccountFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatistics {
    pub available: usize,
    pub in_use: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    available: VecDeque<FundedAccount>,
    in_use: HashSet<String>,
}

/// Reusable pool of funded accounts
///
/// When the pool runs dry, `acquire` creates a fresh account instead of waiting.
#[derive(Debug)]
pub struct AccountPool {
    factory: AccountFactory,
    pool_size: usize,
    state: Mutex<PoolState>,
}

impl AccountPool {
    pub fn new(factory: AccountFactory) -> Self {
        let pool_size = factory.config().pool_size;
        Self {
            factory,
            pool_size,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Pre-create the configured number of accounts; no-op if already filled
    pub async fn initialize(&self) {
        let mut state = self.state.lock().await;
        if !state.available.is_empty() {
            return;
        }
        state.available = self
            .factory
            .create_accounts(self.pool_size, None)
            .await
            .into();
    }

    /// Take an account out of the pool
    pub async fn acquire(&self) -> FundedAccount {
        let mut state = self.state.lock().await;
        let account = match state.available.pop_front() {
            Some(account) => account,
            None => self.factory.create_account(None, None, BTreeSet::new()).await,
        };
        state.in_use.insert(account.address.clone());
        account
    }

    /// Return an account to the pool; accounts not acquired from it are ignored
    pub async fn release(&self, account: FundedAccount) {
        let mut state = self.state.lock().await;
        if state.in_use.remove(&account.address) {
            state.available.push_back(account);
        }
    }

    /// Run `body` with a pooled account, releasing it afterwards
    pub async fn with_account<F, Fut, T>(&self, body: F) -> T
    where
        F: FnOnce(FundedAccount) -> Fut,
        Fut: Future<Output = T>,
    {
        let account = self.acquire().await;
        let result = body(account.clone()).await;
        self.release(account).await;
        result
    }

    pub async fn statistics(&self) -> PoolStatistics {
        let state = self.state.lock().await;
        PoolStatistics {
            available: state.available.len(),
            in_use: state.in_use.len(),
            total: state.available.len() + state.in_use.len(),
        }
    }

    /// Drop all pooled accounts and re-initialize
    pub async fn reset(&self) {
        {
            let mut state = self.state.lock().await;
            state.available.clear();
            state.in_use.clear();
        }
        self.initialize().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::validate_address;

    #[test]
    fn test_mock_account_has_canonical_address() {
        let account = FundedAccount::mock(1_000_000);
        assert!(validate_address(&account.address).is_ok());
        assert_eq!(account.to_account_info().balance, 1_000_000);
    }

    #[test]
    fn test_tagged_keeps_existing_tags() {
        let account = FundedAccount::mock(1).tagged(["sender"]).tagged(["vip", "sender"]);
        let tags: Vec<_> = account.metadata.tags.iter().cloned().collect();
        assert_eq!(tags, vec!["sender".to_string(), "vip".to_string()]);
    }

    #[tokio::test]
    async fn test_factory_uses_default_funding() {
        let factory = AccountFactory::new();
        let account = factory.create_account(None, None, BTreeSet::new()).await;
        assert_eq!(account.initial_balance, 10_000_000);

        let custom = factory
            .create_account(Some(5), Some("fees".to_string()), BTreeSet::new())
            .await;
        assert_eq!(custom.initial_balance, 5);
        assert_eq!(custom.metadata.purpose.as_deref(), Some("fees"));

        assert_eq!(factory.accounts().await.len(), 2);
        factory.reset().await;
        assert!(factory.accounts().await.is_empty());
    }

    #[tokio::test]
    async fn test_factory_batch_and_funding() {
        let factory = AccountFactory::new();
        let accounts = factory.create_accounts(3, Some(42)).await;
        assert_eq!(accounts.len(), 3);
        assert_eq!(
            accounts[2].metadata.purpose.as_deref(),
            Some("Batch account 3")
        );

        let funded = factory.fund_account(&accounts[0], 8);
        assert_eq!(funded.initial_balance, 50);
        assert_eq!(funded.address, accounts[0].address);
    }

    #[tokio::test]
    async fn test_pool_acquire_release() {
        let pool = AccountPool::new(AccountFactory::with_config(AccountConfig {
            pool_size: 2,
            ..AccountConfig::default()
        }));
        pool.initialize().await;
        assert_eq!(
            pool.statistics().await,
            PoolStatistics { available: 2, in_use: 0, total: 2 }
        );

        let a = pool.acquire().await;
        let b = pool.acquire().await;
        let c = pool.acquire().await;
        assert_eq!(pool.statistics().await.in_use, 3);

        pool.release(a).await;
        pool.release(FundedAccount::mock(1)).await;
        assert_eq!(
            pool.statistics().await,
            PoolStatistics { available: 1, in_use: 2, total: 3 }
        );

        pool.release(b).await;
        pool.release(c).await;
        pool.reset().await;
        assert_eq!(pool.statistics().await.total, 2);
    }

    #[tokio::test]
    async fn test_pool_with_account_releases() {
        let pool = AccountPool::new(AccountFactory::with_config(AccountConfig {
            pool_size: 1,
            ..AccountConfig::default()
        }));
        pool.initialize().await;

        let address = pool.with_account(|account| async move { account.address }).await;
        assert_eq!(address.len(), 58);

        let stats = pool.statistics().await;
        assert_eq!(stats.available, 1);
        assert_eq!(stats.in_use, 0);
    }

    #[tokio::test]
    async fn test_factory_enforces_configured_minimum() {
        let factory = AccountFactory::with_config(AccountConfig {
            default_funding: 1_000_000,
            minimum_balance: 200_000,
            ..AccountConfig::default()
        });
        let account = factory.create_account(None, None, BTreeSet::new()).await;

        let fits = crate::ledger::patterns::simple_payment(&account.address, "R", 799_000).unwrap();
        let dips = crate::ledger::patterns::simple_payment(&account.address, "R", 799_001).unwrap();
        assert!(factory.assert_keeps_minimum(&account, &fits).is_ok());
        assert!(factory.assert_keeps_minimum(&account, &dips).is_err());
    }
}
