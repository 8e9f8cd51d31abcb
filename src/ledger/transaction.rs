//! Transaction construction with test-friendly defaults

use crate::config::{TransactionDefaults, DEFAULT_FEE, DEFAULT_GENESIS_ID, DEFAULT_VALID_ROUNDS};
use crate::types::*;

/// Errors raised when a transaction cannot be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Transaction build failed: receiver not specified")]
    MissingReceiver,
    #[error("Transaction build failed: amount not specified")]
    MissingAmount,
    #[error("Transaction build failed: first valid round {first} is after last valid round {last}")]
    InvalidValidityWindow { first: u64, last: u64 },
    #[error("Transaction build failed: need at least {required} accounts, got {actual}")]
    NotEnoughAccounts { required: usize, actual: usize },
}

/// Builder for payment transactions
///
/// Only the receiver and the amount are mandatory; the fee, validity window
/// and network fields default to [`TransactionDefaults`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: String,
    receiver: Option<String>,
    amount: Option<u64>,
    note: Option<Vec<u8>>,
    fee: u64,
    first_valid: u64,
    last_valid: u64,
    genesis_id: String,
    genesis_hash: [u8; 32],
}

impl TransactionBuilder {
    /// Start a payment from `sender` with the built-in defaults
    pub fn payment(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: None,
            amount: None,
            note: None,
            fee: DEFAULT_FEE,
            first_valid: 1,
            last_valid: 1 + DEFAULT_VALID_ROUNDS,
            genesis_id: DEFAULT_GENESIS_ID.to_string(),
            genesis_hash: [0; 32],
        }
    }

    /// Start a payment from `sender` using configured defaults
    pub fn payment_with(sender: impl Into<String>, defaults: &TransactionDefaults) -> Self {
        let mut builder = Self::payment(sender);
        builder.fee = defaults.fee;
        builder.last_valid = builder.first_valid.saturating_add(defaults.valid_rounds);
        builder.genesis_id = defaults.genesis_id.clone();
        builder
    }

    /// Set the receiver
    pub fn to(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    /// Set the principal amount
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Attach a note payload
    pub fn note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Set the validity window
    pub fn valid_rounds(mut self, first: u64, last: u64) -> Self {
        self.first_valid = first;
        self.last_valid = last;
        self
    }

    /// Build the transaction
    pub fn build(self) -> Result<Transaction, BuildError> {
        let receiver = self.receiver.ok_or(BuildError::MissingReceiver)?;
        let amount = self.amount.ok_or(BuildError::MissingAmount)?;

        if self.first_valid > self.last_valid {
            return Err(BuildError::InvalidValidityWindow {
                first: self.first_valid,
                last: self.last_valid,
            });
        }

        Ok(Transaction {
            sender: self.sender,
            receiver,
            amount,
            fee: self.fee,
            note: self.note,
            first_valid: self.first_valid,
            last_valid: self.last_valid,
            genesis_id: self.genesis_id,
            genesis_hash: self.genesis_hash,
        })
    }
}

/// Common payment scenarios
pub mod patterns {
    use super::*;

    /// Minimum payment amount (0.1 unit of 10^6)
    pub const MINIMUM_PAYMENT: u64 = 100_000;
    /// A payment far larger than default funding
    pub const LARGE_PAYMENT: u64 = 100_000_000_000;
    /// Fee used by [`high_fee_payment`] unless one is given
    pub const HIGH_FEE: u64 = 10_000;

    pub fn simple_payment(sender: &str, receiver: &str, amount: u64) -> Result<Transaction, BuildError> {
        TransactionBuilder::payment(sender)
            .to(receiver)
            .amount(amount)
            .build()
    }

    pub fn payment_with_note(
        sender: &str,
        receiver: &str,
        amount: u64,
        note: &str,
    ) -> Result<Transaction, BuildError> {
        TransactionBuilder::payment(sender)
            .to(receiver)
            .amount(amount)
            .note(note)
            .build()
    }

    pub fn minimum_payment(sender: &str, receiver: &str) -> Result<Transaction, BuildError> {
        simple_payment(sender, receiver, MINIMUM_PAYMENT)
    }

    pub fn large_payment(sender: &str, receiver: &str) -> Result<Transaction, BuildError> {
        simple_payment(sender, receiver, LARGE_PAYMENT)
    }

    /// A payment paying `fee`, or [`HIGH_FEE`], instead of the default fee
    pub fn high_fee_payment(
        sender: &str,
        receiver: &str,
        amount: u64,
        fee: Option<u64>,
    ) -> Result<Transaction, BuildError> {
        TransactionBuilder::payment(sender)
            .to(receiver)
            .amount(amount)
            .fee(fee.unwrap_or(HIGH_FEE))
            .build()
    }

    /// A note-only transaction that moves no principal
    pub fn zero_payment(sender: &str, receiver: &str, note: Option<&str>) -> Result<Transaction, BuildError> {
        let builder = TransactionBuilder::payment(sender).to(receiver).amount(0);
        match note {
            Some(note) => builder.note(note).build(),
            None => builder.build(),
        }
    }

    /// A payment back to the sender; only the fee leaves the account
    pub fn self_payment(account: &str, amount: u64) -> Result<Transaction, BuildError> {
        simple_payment(account, account, amount)
    }

    /// One payment of `amount` from `sender` to each receiver
    pub fn batch_payments(
        sender: &str,
        receivers: &[&str],
        amount: u64,
    ) -> Result<Vec<Transaction>, BuildError> {
        receivers
            .iter()
            .map(|receiver| simple_payment(sender, receiver, amount))
            .collect()
    }

    /// Each account pays the next one and the last pays the first (A -> B -> C -> A)
    pub fn circular_payments(accounts: &[&str], amount: u64) -> Result<Vec<Transaction>, BuildError> {
        if accounts.len() < 2 {
            return Err(BuildError::NotEnoughAccounts {
                required: 2,
                actual: accounts.len(),
            });
        }
        accounts
            .iter()
            .zip(accounts.iter().cycle().skip(1))
            .map(|(sender, receiver)| simple_payment(sender, receiver, amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tx = TransactionBuilder::payment("S").to("R").amount(1_000_000).build().unwrap();
        assert_eq!(tx.fee, 1_000);
        assert_eq!(tx.first_valid, 1);
        assert_eq!(tx.last_valid, 1_001);
        assert_eq!(tx.genesis_id, "testnet-v1.0");
        assert_eq!(tx.genesis_hash, [0; 32]);
        assert!(tx.note.is_none());
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            TransactionBuilder::payment("S").amount(1).build(),
            Err(BuildError::MissingReceiver)
        );
        assert_eq!(
            TransactionBuilder::payment("S").to("R").build(),
            Err(BuildError::MissingAmount)
        );
    }

    #[test]
    fn test_inverted_validity_window() {
        let err = TransactionBuilder::payment("S")
            .to("R")
            .amount(1)
            .valid_rounds(20, 10)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidValidityWindow { first: 20, last: 10 });
    }

    #[test]
    fn test_configured_defaults() {
        let defaults = TransactionDefaults {
            fee: 2_000,
            valid_rounds: 10,
            genesis_id: "devnet-v1".to_string(),
        };
        let tx = TransactionBuilder::payment_with("S", &defaults)
            .to("R")
            .amount(5)
            .build()
            .unwrap();
        assert_eq!(tx.fee, 2_000);
        assert_eq!(tx.last_valid, 11);
        assert_eq!(tx.genesis_id, "devnet-v1");
    }

    #[test]
    fn test_patterns() {
        let tx = patterns::payment_with_note("S", "R", 5, "hello").unwrap();
        assert_eq!(tx.note_text(), Some("hello"));

        assert_eq!(patterns::minimum_payment("S", "R").unwrap().amount, 100_000);
        assert_eq!(patterns::zero_payment("S", "R", None).unwrap().amount, 0);

        let self_tx = patterns::self_payment("S", 10).unwrap();
        assert_eq!(self_tx.sender, self_tx.receiver);

        let batch = patterns::batch_payments("S", &["A", "B", "C"], 7).unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|tx| tx.amount == 7 && tx.sender == "S"));
    }

    #[test]
    fn test_high_fee_payment() {
        let tx = patterns::high_fee_payment("S", "R", 5, None).unwrap();
        assert_eq!(tx.fee, patterns::HIGH_FEE);
        assert_eq!(patterns::high_fee_payment("S", "R", 5, Some(50_000)).unwrap().fee, 50_000);
    }

    #[test]
    fn test_circular_payments() {
        let circle = patterns::circular_payments(&["A", "B", "C"], 9).unwrap();
        let legs: Vec<_> = circle
            .iter()
            .map(|tx| (tx.sender.as_str(), tx.receiver.as_str()))
            .collect();
        assert_eq!(legs, vec![("A", "B"), ("B", "C"), ("C", "A")]);

        let pair = patterns::circular_payments(&["A", "B"], 9).unwrap();
        assert_eq!(pair[1].receiver, "A");

        assert_eq!(
            patterns::circular_payments(&["A"], 9),
            Err(BuildError::NotEnoughAccounts { required: 2, actual: 1 })
        );
    }
}
