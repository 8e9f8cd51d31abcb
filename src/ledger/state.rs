//! Authoritative ledger state and the payment application rules
//!
//! `LedgerState` is a plain value; callers are responsible for serializing
//! access to it (see [`MemoryStorage`](crate::utils::MemoryStorage)).

use std::collections::HashMap;

use crate::types::*;

/// Accounts, confirmations, the round counter and burned fees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    accounts: HashMap<String, AccountInfo>,
    responses: HashMap<String, TransactionResponse>,
    round: u64,
    fees_burned: u128,
}

impl LedgerState {
    /// Create an empty state at the given round
    pub fn new(initial_round: u64) -> Self {
        Self {
            accounts: HashMap::new(),
            responses: HashMap::new(),
            round: initial_round,
            fees_burned: 0,
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Cumulative fees destroyed by applied transactions
    pub fn fees_burned(&self) -> u128 {
        self.fees_burned
    }

    /// Insert or overwrite an account record
    pub fn register(&mut self, account: AccountInfo) {
        self.accounts.insert(account.address.clone(), account);
    }

    /// Advance the round counter, saturating at `u64::MAX`
    pub fn advance(&mut self, rounds: u64) -> u64 {
        self.round = self.round.saturating_add(rounds);
        self.round
    }

    pub fn account(&self, address: &str) -> Option<&AccountInfo> {
        self.accounts.get(address)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountInfo> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Read a set of accounts in one pass; fails if any address is unknown
    pub fn read_accounts(&self, addresses: &[String]) -> LedgerResult<Vec<AccountInfo>> {
        addresses
            .iter()
            .map(|address| {
                self.accounts
                    .get(address)
                    .cloned()
                    .ok_or_else(|| LedgerError::account_not_found(address.as_str()))
            })
            .collect()
    }

    /// Sum of all native balances
    pub fn total_balance(&self) -> u128 {
        self.accounts.values().map(|a| u128::from(a.balance)).sum()
    }

    pub fn response(&self, tx_id: &str) -> Option<&TransactionResponse> {
        self.responses.get(tx_id)
    }

    pub fn record_response(&mut self, tx_id: String, response: TransactionResponse) {
        self.responses.insert(tx_id, response);
    }

    /// Apply a payment under the id `tx_id`.
    ///
    /// All checks run before any record is touched, so an error leaves the
    /// state exactly as it was. The fee is burned. A receiver that is not
    /// registered is treated as an external account: the sender is still
    /// debited and no record is created for the receiver.
    pub fn apply_payment(
        &mut self,
        tx_id: &str,
        transaction: &Transaction,
    ) -> LedgerResult<TransactionResponse> {
        let sender = self
            .accounts
            .get(&transaction.sender)
            .ok_or_else(|| LedgerError::account_not_found(transaction.sender.as_str()))?;

        let available = sender.balance;
        let total_cost = match transaction.total_cost() {
            Some(cost) if cost <= available => cost,
            cost => {
                return Err(LedgerError::InsufficientBalance {
                    required: cost.unwrap_or(u64::MAX),
                    available,
                })
            }
        };

        let self_payment = transaction.sender == transaction.receiver;
        let receiver_balance = if self_payment {
            Some(available - total_cost)
        } else {
            self.accounts.get(&transaction.receiver).map(|r| r.balance)
        };
        let credited = match receiver_balance {
            Some(balance) => Some(balance.checked_add(transaction.amount).ok_or_else(|| {
                LedgerError::BalanceOverflow {
                    address: transaction.receiver.clone(),
                    balance,
                    amount: transaction.amount,
                }
            })?),
            None => None,
        };

        let round = self.round;
        if let Some(sender) = self.accounts.get_mut(&transaction.sender) {
            sender.balance = available - total_cost;
            sender.round = round;
        }
        if let (Some(new_balance), Some(receiver)) =
            (credited, self.accounts.get_mut(&transaction.receiver))
        {
            receiver.balance = new_balance;
            receiver.round = round;
        }
        self.fees_burned += u128::from(transaction.fee);

        let response = TransactionResponse::confirmed(tx_id, round);
        self.responses.insert(tx_id.to_string(), response.clone());
        Ok(response)
    }

    /// Drop all accounts, confirmations and burned fees and rewind to `baseline_round`
    pub fn clear(&mut self, baseline_round: u64) {
        self.accounts.clear();
        self.responses.clear();
        self.fees_burned = 0;
        self.round = baseline_round;
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_INITIAL_ROUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionBuilder;
    use proptest::prelude::*;

    fn payment(sender: &str, receiver: &str, amount: u64, fee: u64) -> Transaction {
        TransactionBuilder::payment(sender)
            .to(receiver)
            .amount(amount)
            .fee(fee)
            .build()
            .unwrap()
    }

    #[test]
    fn test_transfer_burns_fee() {
        let mut state = LedgerState::new(1_000);
        state.register(AccountInfo::new("S", 10_000_000));
        state.register(AccountInfo::new("R", 1_000_000));

        let response = state
            .apply_payment("tx1", &payment("S", "R", 2_000_000, 1_000))
            .unwrap();

        assert_eq!(response.confirmed_round, Some(1_000));
        assert_eq!(state.account("S").unwrap().balance, 7_999_000);
        assert_eq!(state.account("R").unwrap().balance, 3_000_000);
        assert_eq!(state.fees_burned(), 1_000);
        assert_eq!(state.total_balance(), 10_999_000);
        assert_eq!(state.response("tx1"), Some(&response));
    }

    #[test]
    fn test_failed_payment_leaves_state_untouched() {
        let mut state = LedgerState::new(1_000);
        state.register(AccountInfo::new("S", 500_000).with_asset(7, 3));
        state.register(AccountInfo::new("R", 1_000_000));
        let before = state.clone();

        let err = state
            .apply_payment("tx1", &payment("S", "R", 1_000_000, 1_000))
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                required: 1_001_000,
                available: 500_000
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_unknown_sender() {
        let mut state = LedgerState::new(1_000);
        let err = state
            .apply_payment("tx1", &payment("NOBODY", "R", 1, 1))
            .unwrap_err();
        assert_eq!(err, LedgerError::account_not_found("NOBODY"));
    }

    #[test]
    fn test_cost_overflow_reports_insufficient_balance() {
        let mut state = LedgerState::new(1_000);
        state.register(AccountInfo::new("S", u64::MAX));
        let err = state
            .apply_payment("tx1", &payment("S", "R", u64::MAX, 1))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                required: u64::MAX,
                available: u64::MAX
            }
        );
    }

    #[test]
    fn test_receiver_overflow_is_rejected_atomically() {
        let mut state = LedgerState::new(1_000);
        state.register(AccountInfo::new("S", 10));
        state.register(AccountInfo::new("R", u64::MAX));
        let before = state.clone();

        let err = state.apply_payment("tx1", &payment("S", "R", 5, 1)).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow { amount: 5, .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_self_payment_only_burns_fee() {
        let mut state = LedgerState::new(1_000);
        state.register(AccountInfo::new("S", 5_000));
        state.apply_payment("tx1", &payment("S", "S", 2_000, 10)).unwrap();
        assert_eq!(state.account("S").unwrap().balance, 4_990);
    }

    #[test]
    fn test_advance_keeps_record_rounds() {
        let mut state = LedgerState::new(1_000);
        state.register(AccountInfo::new("S", 5_000).at_round(1_000));
        assert_eq!(state.advance(5), 1_005);
        assert_eq!(state.account("S").unwrap().round, 1_000);

        state.apply_payment("tx1", &payment("S", "X", 1, 1)).unwrap();
        assert_eq!(state.account("S").unwrap().round, 1_005);
    }

    #[test]
    fn test_clear_returns_to_baseline() {
        let mut state = LedgerState::new(1_000);
        state.register(AccountInfo::new("S", 5_000));
        state.apply_payment("tx1", &payment("S", "X", 1, 1)).unwrap();
        state.advance(10);

        state.clear(1_000);
        assert!(state.is_empty());
        assert_eq!(state.round(), 1_000);
        assert_eq!(state.fees_burned(), 0);
        assert!(state.response("tx1").is_none());
    }

    proptest! {
        #[test]
        fn prop_balances_plus_burned_fees_are_conserved(
            balances in prop::collection::vec(0u64..5_000_000, 2..6),
            transfers in prop::collection::vec((0usize..6, 0usize..6, 0u64..2_000_000, 0u64..5_000), 0..40),
        ) {
            let mut state = LedgerState::new(1_000);
            let addresses: Vec<String> = (0..balances.len()).map(|i| format!("ACCT{i}")).collect();
            for (address, balance) in addresses.iter().zip(&balances) {
                state.register(AccountInfo::new(address.clone(), *balance));
            }
            let initial: u128 = balances.iter().map(|b| u128::from(*b)).sum();

            for (n, (from, to, amount, fee)) in transfers.into_iter().enumerate() {
                let from = &addresses[from % addresses.len()];
                let to = &addresses[to % addresses.len()];
                let before = state.clone();
                match state.apply_payment(&format!("tx{n}"), &payment(from, to, amount, fee)) {
                    Ok(_) => {}
                    Err(_) => prop_assert_eq!(&state, &before),
                }
                prop_assert_eq!(state.total_balance() + state.fees_burned(), initial);
            }
        }
    }
}
