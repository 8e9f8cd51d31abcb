//! Block-explorer style index of transactions and blocks
//!
//! The index is populated explicitly; it does not observe the simulated
//! ledger. Register the transactions a test cares about after submitting them.

use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::*;

/// Default page size for [`TransactionIndex::transactions_for`]
pub const DEFAULT_PAGE_LIMIT: usize = 100;

#[derive(Debug, Default)]
struct IndexState {
    transactions: HashMap<String, Transaction>,
    /// Transaction ids in first-registration order
    order: Vec<String>,
    account_transactions: HashMap<String, Vec<String>>,
    blocks: BTreeMap<u64, Block>,
}

/// Transactions indexed by id and by account, and blocks by round
#[derive(Debug, Default)]
pub struct TransactionIndex {
    state: RwLock<IndexState>,
}

impl TransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a transaction under `tx_id`.
    ///
    /// The id is appended to both the sender's and the receiver's list, so a
    /// self-payment appears twice in that account's list. Re-registering an
    /// id replaces the record and appends the id again.
    pub async fn register_transaction(&self, tx_id: impl Into<String>, transaction: Transaction) {
        let tx_id = tx_id.into();
        let mut state = self.state.write().await;

        for address in [&transaction.sender, &transaction.receiver] {
            state
                .account_transactions
                .entry(address.clone())
                .or_default()
                .push(tx_id.clone());
        }
        if state
            .transactions
            .insert(tx_id.clone(), transaction)
            .is_none()
        {
            state.order.push(tx_id.clone());
        }
        debug!(tx_id = %tx_id, "indexed transaction");
    }

    /// Store block metadata, replacing any block at the same round
    pub async fn register_block(&self, block: Block) {
        debug!(round = block.round, "indexed block");
        self.state.write().await.blocks.insert(block.round, block);
    }

    /// Up to `limit` transactions involving `address`, oldest first
    pub async fn transactions_for(&self, address: &str, limit: usize) -> Vec<Transaction> {
        let state = self.state.read().await;
        let Some(ids) = state.account_transactions.get(address) else {
            return Vec::new();
        };

        ids.iter()
            .filter_map(|id| state.transactions.get(id))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Look up a transaction by id
    pub async fn transaction(&self, tx_id: &str) -> LedgerResult<Transaction> {
        self.state
            .read()
            .await
            .transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Entity::Transaction, tx_id))
    }

    /// Look up a block by round
    pub async fn block(&self, round: u64) -> LedgerResult<Block> {
        self.state
            .read()
            .await
            .blocks
            .get(&round)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Entity::Block, round.to_string()))
    }

    /// Transactions whose whole validity window lies inside `[min_round, max_round]`
    pub async fn transactions_in_range(&self, min_round: u64, max_round: u64) -> Vec<Transaction> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.transactions.get(id))
            .filter(|tx| tx.first_valid >= min_round && tx.last_valid <= max_round)
            .cloned()
            .collect()
    }

    /// Number of index entries for `address`
    pub async fn transaction_count(&self, address: &str) -> usize {
        self.state
            .read()
            .await
            .account_transactions
            .get(address)
            .map_or(0, Vec::len)
    }

    /// Every indexed transaction in registration order
    pub async fn all_transactions(&self) -> Vec<Transaction> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.transactions.get(id))
            .cloned()
            .collect()
    }

    /// Remove all transactions and blocks
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = IndexState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{patterns, TransactionBuilder};

    fn windowed(first: u64, last: u64) -> Transaction {
        TransactionBuilder::payment("S")
            .to("R")
            .amount(first)
            .valid_rounds(first, last)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let index = TransactionIndex::new();
        let tx = patterns::simple_payment("S", "R", 1_000_000).unwrap();
        index.register_transaction("TX123", tx).await;

        assert_eq!(index.transaction("TX123").await.unwrap().amount, 1_000_000);
        assert_eq!(
            index.transaction("TX999").await.unwrap_err(),
            LedgerError::not_found(Entity::Transaction, "TX999")
        );
    }

    #[tokio::test]
    async fn test_account_pagination_is_oldest_first() {
        let index = TransactionIndex::new();
        for i in 0..5u64 {
            let tx = patterns::simple_payment("S", "R", i).unwrap();
            index.register_transaction(format!("TX{i}"), tx).await;
        }

        let page = index.transactions_for("S", 3).await;
        let amounts: Vec<u64> = page.iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![0, 1, 2]);

        assert_eq!(index.transactions_for("R", DEFAULT_PAGE_LIMIT).await.len(), 5);
        assert!(index.transactions_for("NOBODY", 10).await.is_empty());
        assert_eq!(index.transaction_count("S").await, 5);
    }

    #[tokio::test]
    async fn test_self_payment_indexed_twice() {
        let index = TransactionIndex::new();
        index
            .register_transaction("TX1", patterns::self_payment("S", 1).unwrap())
            .await;

        assert_eq!(index.transaction_count("S").await, 2);
        assert_eq!(index.transactions_for("S", 10).await.len(), 2);
        assert_eq!(index.all_transactions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_range_is_containment() {
        let index = TransactionIndex::new();
        index.register_transaction("inside", windowed(10, 20)).await;
        index.register_transaction("overlap_start", windowed(5, 15)).await;
        index.register_transaction("overlap_end", windowed(15, 25)).await;
        index.register_transaction("exact", windowed(10, 30)).await;

        let found = index.transactions_in_range(10, 30).await;
        let firsts: Vec<u64> = found.iter().map(|tx| tx.first_valid).collect();
        assert_eq!(firsts, vec![10, 15, 10]);

        let narrow = index.transactions_in_range(10, 20).await;
        assert_eq!(narrow.len(), 1);
    }

    #[tokio::test]
    async fn test_blocks() {
        let index = TransactionIndex::new();
        index
            .register_block(Block::new(1_000).with_transaction_count(3))
            .await;

        assert_eq!(index.block(1_000).await.unwrap().transaction_count, 3);
        assert_eq!(
            index.block(1_001).await.unwrap_err(),
            LedgerError::not_found(Entity::Block, "1001")
        );
    }

    #[tokio::test]
    async fn test_reset() {
        let index = TransactionIndex::new();
        index
            .register_transaction("TX1", patterns::simple_payment("S", "R", 1).unwrap())
            .await;
        index.register_block(Block::new(1)).await;

        index.reset().await;
        assert!(index.all_transactions().await.is_empty());
        assert_eq!(index.transaction_count("S").await, 0);
        assert!(index.block(1).await.is_err());
    }
}
