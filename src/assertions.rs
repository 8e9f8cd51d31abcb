//! Read-only checks over accounts, transactions, assets and snapshot diffs
//!
//! Each helper returns `Err(AssertionError)` with a descriptive message instead
//! of panicking, so callers can use `?` in fallible tests or `unwrap()` to fail
//! loudly.

use std::ops::RangeInclusive;

use crate::ledger::FundedAccount;
use crate::snapshot::SnapshotDiff;
use crate::types::{AccountInfo, AssetId, Transaction};
use crate::utils::validation::validate_address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Assertion failed: {0}")]
pub struct AssertionError(pub String);

pub type AssertionResult = Result<(), AssertionError>;

/// Fees accepted by [`assert_transaction_fee_in_range`] for ordinary payments
pub const STANDARD_FEE_RANGE: RangeInclusive<u64> = 1_000..=100_000;

/// Largest number of decimals an asset may be configured with
pub const MAX_ASSET_DECIMALS: u8 = 19;

/// The account was funded with at least `required`
pub fn assert_sufficient_balance(account: &FundedAccount, required: u64) -> AssertionResult {
    if account.initial_balance < required {
        return Err(AssertionError(format!(
            "Insufficient balance: account {} has {} but needs {}",
            account.address, account.initial_balance, required
        )));
    }
    Ok(())
}

/// `min <= balance <= max`
pub fn assert_balance_in_range(balance: u64, min: u64, max: u64) -> AssertionResult {
    if balance < min {
        return Err(AssertionError(format!(
            "Balance {} is below minimum {}",
            balance, min
        )));
    }
    if balance > max {
        return Err(AssertionError(format!(
            "Balance {} exceeds maximum {}",
            balance, max
        )));
    }
    Ok(())
}

/// `balance` is within `tolerance` of `expected`
pub fn assert_balance_equals(balance: u64, expected: u64, tolerance: u64) -> AssertionResult {
    let difference = balance.abs_diff(expected);
    if difference > tolerance {
        return Err(AssertionError(format!(
            "Balance {} differs from expected {} by {} (tolerance {})",
            balance, expected, difference, tolerance
        )));
    }
    Ok(())
}

/// The account can cover the transaction's amount plus fee
pub fn assert_can_afford(account: &FundedAccount, transaction: &Transaction) -> AssertionResult {
    let Some(required) = transaction.total_cost() else {
        return Err(AssertionError(format!(
            "Transaction cost overflows: amount {} + fee {}",
            transaction.amount, transaction.fee
        )));
    };
    assert_sufficient_balance(account, required)
}

/// The diff records exactly `expected_delta` for `address`
pub fn assert_balance_change(
    diff: &SnapshotDiff,
    address: &str,
    expected_delta: i128,
) -> AssertionResult {
    let actual = diff.delta(address);
    if actual != expected_delta {
        return Err(AssertionError(format!(
            "Balance change for {} was {}, expected {}",
            address, actual, expected_delta
        )));
    }
    Ok(())
}

/// The diff records no change for `address`
pub fn assert_unchanged(diff: &SnapshotDiff, address: &str) -> AssertionResult {
    match diff.balance_changes.get(address) {
        None => Ok(()),
        Some(change) => Err(AssertionError(format!(
            "Expected {} unchanged, but balance went from {} to {}",
            address, change.previous, change.current
        ))),
    }
}

/// After paying `transaction`, the account still holds `minimum_balance`
pub fn assert_keeps_minimum_balance(
    account: &FundedAccount,
    transaction: &Transaction,
    minimum_balance: u64,
) -> AssertionResult {
    let required = transaction
        .total_cost()
        .and_then(|cost| cost.checked_add(minimum_balance))
        .ok_or_else(|| {
            AssertionError(format!(
                "Transaction cost overflows: amount {} + fee {} + minimum {}",
                transaction.amount, transaction.fee, minimum_balance
            ))
        })?;
    if account.initial_balance < required {
        return Err(AssertionError(format!(
            "Account {} with {} would drop below minimum balance {} after spending {}",
            account.address,
            account.initial_balance,
            minimum_balance,
            required - minimum_balance
        )));
    }
    Ok(())
}

// Transactions

pub fn assert_transaction_parties(
    transaction: &Transaction,
    sender: &str,
    receiver: &str,
) -> AssertionResult {
    if transaction.sender != sender {
        return Err(AssertionError(format!(
            "Transaction sender mismatch: {} != {}",
            transaction.sender, sender
        )));
    }
    if transaction.receiver != receiver {
        return Err(AssertionError(format!(
            "Transaction receiver mismatch: {} != {}",
            transaction.receiver, receiver
        )));
    }
    Ok(())
}

pub fn assert_transaction_amount(transaction: &Transaction, amount: u64) -> AssertionResult {
    if transaction.amount != amount {
        return Err(AssertionError(format!(
            "Transaction amount mismatch: {} != {}",
            transaction.amount, amount
        )));
    }
    Ok(())
}

/// The transaction carries `note` as its UTF-8 note
pub fn assert_transaction_note(transaction: &Transaction, note: &str) -> AssertionResult {
    if transaction.note.is_none() {
        return Err(AssertionError(format!(
            "Transaction has no note but expected '{}'",
            note
        )));
    }
    match transaction.note_text() {
        Some(actual) if actual == note => Ok(()),
        actual => Err(AssertionError(format!(
            "Transaction note mismatch: {:?} != '{}'",
            actual, note
        ))),
    }
}

/// The fee lies within `range`; see [`STANDARD_FEE_RANGE`]
pub fn assert_transaction_fee_in_range(
    transaction: &Transaction,
    range: RangeInclusive<u64>,
) -> AssertionResult {
    if transaction.fee < *range.start() {
        return Err(AssertionError(format!(
            "Transaction fee {} is below minimum {}",
            transaction.fee,
            range.start()
        )));
    }
    if transaction.fee > *range.end() {
        return Err(AssertionError(format!(
            "Transaction fee {} exceeds maximum {}",
            transaction.fee,
            range.end()
        )));
    }
    Ok(())
}

/// Every transaction in a non-empty batch has the first one's sender
pub fn assert_batch_same_sender(transactions: &[Transaction]) -> AssertionResult {
    let Some(first) = transactions.first() else {
        return Err(AssertionError("Empty transaction batch".to_string()));
    };
    match transactions
        .iter()
        .position(|tx| tx.sender != first.sender)
    {
        None => Ok(()),
        Some(index) => Err(AssertionError(format!(
            "Transaction {} has sender {}, expected {}",
            index, transactions[index].sender, first.sender
        ))),
    }
}

/// Both addresses are canonical, the fee is positive and the validity window
/// spans at least two rounds
pub fn assert_valid_transaction(transaction: &Transaction) -> AssertionResult {
    assert_valid_address(&transaction.sender)
        .map_err(|e| AssertionError(format!("Invalid sender address: {}", e.0)))?;
    assert_valid_address(&transaction.receiver)
        .map_err(|e| AssertionError(format!("Invalid receiver address: {}", e.0)))?;

    if transaction.fee == 0 {
        return Err(AssertionError("Transaction fee must be positive".to_string()));
    }
    if transaction.first_valid >= transaction.last_valid {
        return Err(AssertionError(format!(
            "First valid round {} must be before last valid round {}",
            transaction.first_valid, transaction.last_valid
        )));
    }
    Ok(())
}

pub fn assert_valid_address(address: &str) -> AssertionResult {
    validate_address(address)
}

// Assets

pub fn assert_valid_asset_id(asset_id: AssetId) -> AssertionResult {
    if asset_id == 0 {
        return Err(AssertionError("Asset ID must be positive".to_string()));
    }
    Ok(())
}

/// The account holds exactly `amount` of `asset_id`
pub fn assert_asset_holding(account: &AccountInfo, asset_id: AssetId, amount: u64) -> AssertionResult {
    assert_valid_asset_id(asset_id)?;
    let held = account.asset_amount(asset_id);
    if held != amount {
        return Err(AssertionError(format!(
            "Account {} holds {} of asset {}, expected {}",
            account.address, held, asset_id, amount
        )));
    }
    Ok(())
}

/// Asset parameters are acceptable: positive supply and at most
/// [`MAX_ASSET_DECIMALS`] decimals
pub fn assert_asset_config(asset_id: AssetId, total: u64, decimals: u8) -> AssertionResult {
    assert_valid_asset_id(asset_id)?;
    if total == 0 {
        return Err(AssertionError("Asset total supply must be positive".to_string()));
    }
    if decimals > MAX_ASSET_DECIMALS {
        return Err(AssertionError(format!(
            "Asset decimals {} exceed {}",
            decimals, MAX_ASSET_DECIMALS
        )));
    }
    Ok(())
}
