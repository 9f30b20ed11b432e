//! A single account: balance plus its ordered transaction history.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Amount;
use crate::model::{self, AccountClass, AccountId, Transaction, TxKind};

use super::error::{LedgerError, ValidationError};

/// Interest rate applied to savings balances when no explicit rate is given.
pub const DEFAULT_INTEREST_RATE: f64 = 0.04;

/// An account ledger: holder data, current balance, and the append-only
/// transaction log the balance is derived from.
///
/// The balance always equals the signed fold of the log (credits add,
/// debits subtract, seeded at zero) and never goes negative. Operations
/// validate before mutating; a rejected operation leaves the account
/// untouched. Balance update and log append happen in one call, so no
/// caller can observe one without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    name: String,
    #[serde(rename = "account_number")]
    number: AccountId,
    pin: String,
    #[serde(rename = "account_type")]
    class: AccountClass,
    balance: Amount,
    #[serde(rename = "creation_date", default = "model::today")]
    created_on: NaiveDate,
    #[serde(default = "model::now")]
    last_accessed: NaiveDateTime,
    transactions: Vec<Transaction>,
}

/// Public API
impl Account {
    /// Open a new account with zero balance and an empty log.
    ///
    /// Number uniqueness is the directory's check, not this one.
    pub fn open(
        name: &str,
        number: &str,
        pin: &str,
        class: AccountClass,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        let number = number.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if number.is_empty() {
            return Err(ValidationError::EmptyNumber);
        }
        if !valid_pin(pin) {
            return Err(ValidationError::InvalidPin);
        }
        Ok(Self {
            name: name.to_string(),
            number: number.to_string(),
            pin: pin.to_string(),
            class,
            balance: Amount::ZERO,
            created_on: model::today(),
            last_accessed: model::now(),
            transactions: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> &AccountId {
        &self.number
    }

    pub fn class(&self) -> AccountClass {
        self.class
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    pub fn last_accessed(&self) -> NaiveDateTime {
        self.last_accessed
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Credit the balance and append a deposit record.
    pub fn deposit(
        &mut self,
        amount: Amount,
        description: impl Into<String>,
    ) -> Result<(), ValidationError> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        self.credit(TxKind::Deposit, amount, description.into());
        Ok(())
    }

    /// Debit the balance and append a withdraw record. The balance can
    /// never go negative; an overdraw is rejected with nothing mutated.
    pub fn withdraw(
        &mut self,
        amount: Amount,
        description: impl Into<String>,
    ) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(amount).into());
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                account: self.number.clone(),
                balance: self.balance,
                requested: amount,
            });
        }
        self.debit(TxKind::Withdraw, amount, description.into());
        Ok(())
    }

    /// Credit `balance * rate` as interest and return the amount.
    ///
    /// Only savings accounts accrue interest; for any other class this is
    /// a no-op returning zero, not an error. A zero interest amount (zero
    /// balance, or a non-positive rate) also appends nothing, since every
    /// record in the log must carry a positive amount.
    pub fn apply_interest(&mut self, rate: f64) -> Amount {
        if self.class != AccountClass::Savings {
            return Amount::ZERO;
        }
        let interest = self.balance.at_rate(rate);
        if !interest.is_positive() {
            return Amount::ZERO;
        }
        self.credit(
            TxKind::Interest,
            interest,
            format!("Interest @ {:.1}%", rate * 100.0),
        );
        interest
    }

    /// Replace the PIN. Format check only; no strength or reuse policy.
    pub fn change_pin(&mut self, new_pin: &str) -> Result<(), ValidationError> {
        if !valid_pin(new_pin) {
            return Err(ValidationError::InvalidPin);
        }
        self.pin = new_pin.to_string();
        self.touch();
        Ok(())
    }

    pub fn pin_matches(&self, pin: &str) -> bool {
        self.pin == pin
    }

    /// Read-only view of the log, optionally filtered to one kind and
    /// optionally truncated to the most recent `limit` entries.
    pub fn transactions(
        &self,
        limit: Option<usize>,
        kind: Option<TxKind>,
    ) -> impl Iterator<Item = &Transaction> {
        let matches = move |tx: &&Transaction| kind.is_none_or(|k| tx.kind() == k);
        let total = self.transactions.iter().filter(matches).count();
        let skip = limit.map_or(0, |limit| total.saturating_sub(limit));
        self.transactions.iter().filter(matches).skip(skip)
    }

    /// Running balance after each record, folded from zero with the same
    /// sign rule as the balance invariant. Derived, never stored.
    pub fn balance_history(&self) -> impl Iterator<Item = (NaiveDateTime, Amount)> {
        self.transactions.iter().scan(Amount::ZERO, |balance, tx| {
            if tx.kind().is_credit() {
                *balance += tx.amount();
            } else {
                *balance -= tx.amount();
            }
            Some((tx.timestamp(), *balance))
        })
    }

    /// The balance the log folds to. Equals `balance()` for any account
    /// this crate produced; a mismatch means the store was edited by hand.
    pub fn replayed_balance(&self) -> Amount {
        self.balance_history()
            .last()
            .map_or(Amount::ZERO, |(_, balance)| balance)
    }

    /// Read-only projection of the account header.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            name: self.name.clone(),
            number: self.number.clone(),
            class: self.class,
            created_on: self.created_on,
            last_accessed: self.last_accessed,
            balance: self.balance,
            transactions: self.transactions.len(),
        }
    }
}

/// Crate-internal API
impl Account {
    /// Apply a validated credit: balance update and record append as one
    /// step. Callers have already checked `amount > 0`.
    pub(crate) fn credit(&mut self, kind: TxKind, amount: Amount, description: String) {
        debug_assert!(kind.is_credit());
        self.balance += amount;
        self.transactions.push(Transaction::new(kind, amount, description));
        self.touch();
    }

    /// Apply a validated debit. Callers have already checked
    /// `0 < amount <= balance`.
    pub(crate) fn debit(&mut self, kind: TxKind, amount: Amount, description: String) {
        debug_assert!(!kind.is_credit());
        self.balance -= amount;
        self.transactions.push(Transaction::new(kind, amount, description));
        self.touch();
    }

    /// Warn if a loaded account's stored balance disagrees with its log.
    pub(crate) fn check_invariant(&self) {
        let replayed = self.replayed_balance();
        if replayed != self.balance {
            warn!(
                account = %self.number,
                stored = %self.balance,
                replayed = %replayed,
                "stored balance does not match transaction log"
            );
        }
    }

    fn touch(&mut self) {
        self.last_accessed = model::now();
    }
}

fn valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Read-only projection of an account's header fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub number: AccountId,
    pub class: AccountClass,
    pub created_on: NaiveDate,
    pub last_accessed: NaiveDateTime,
    pub balance: Amount,
    pub transactions: usize,
}

impl fmt::Display for AccountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account Holder: {}", self.name)?;
        writeln!(f, "Account Number: {}", self.number)?;
        writeln!(f, "Account Type: {}", self.class)?;
        writeln!(f, "Creation Date: {}", self.created_on)?;
        writeln!(f, "Last Accessed: {}", self.last_accessed.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Current Balance: {}", self.balance)?;
        write!(f, "Transaction Count: {}", self.transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn savings(number: &str) -> Account {
        Account::open("Asha", number, "1234", AccountClass::Savings).unwrap()
    }

    fn amt(scaled: i64) -> Amount {
        Amount::from_scaled(scaled)
    }

    // Open

    #[test]
    fn open_starts_empty() {
        let account = savings("A1");
        assert_eq!(account.balance(), Amount::ZERO);
        assert_eq!(account.transaction_count(), 0);
        assert_eq!(account.name(), "Asha");
        assert_eq!(account.class(), AccountClass::Savings);
    }

    #[test]
    fn open_trims_name_and_number() {
        let account = Account::open("  Asha ", " A1 ", "1234", AccountClass::Current).unwrap();
        assert_eq!(account.name(), "Asha");
        assert_eq!(account.number(), "A1");
    }

    #[test]
    fn open_rejects_empty_name() {
        let result = Account::open("  ", "A1", "1234", AccountClass::Savings);
        assert!(matches!(result, Err(ValidationError::EmptyName)));
    }

    #[test]
    fn open_rejects_empty_number() {
        let result = Account::open("Asha", "", "1234", AccountClass::Savings);
        assert!(matches!(result, Err(ValidationError::EmptyNumber)));
    }

    #[test]
    fn open_rejects_bad_pin() {
        for pin in ["123", "12345", "12a4", "", "١٢٣٤"] {
            let result = Account::open("Asha", "A1", pin, AccountClass::Savings);
            assert!(matches!(result, Err(ValidationError::InvalidPin)), "pin {pin:?}");
        }
    }

    // Deposit

    #[test]
    fn deposit_increases_balance_and_appends_record() {
        let mut account = savings("A1");
        account.deposit(amt(100_000), "salary").unwrap();

        assert_eq!(account.balance(), amt(100_000));
        assert_eq!(account.transaction_count(), 1);
        let tx = account.transactions(None, None).next().unwrap();
        assert_eq!(tx.kind(), TxKind::Deposit);
        assert_eq!(tx.amount(), amt(100_000));
        assert_eq!(tx.description(), "salary");
    }

    #[test]
    fn deposit_rejects_non_positive_amount() {
        let mut account = savings("A1");
        for amount in [Amount::ZERO, amt(-100)] {
            let result = account.deposit(amount, "");
            assert!(matches!(result, Err(ValidationError::NonPositiveAmount(_))));
        }
        assert_eq!(account.balance(), Amount::ZERO);
        assert_eq!(account.transaction_count(), 0);
    }

    // Withdraw

    #[test]
    fn withdraw_decreases_balance() {
        let mut account = savings("A1");
        account.deposit(amt(10_000), "").unwrap();
        account.withdraw(amt(3_000), "groceries").unwrap();

        assert_eq!(account.balance(), amt(7_000));
        assert_eq!(account.transaction_count(), 2);
    }

    #[test]
    fn withdraw_exact_balance_succeeds() {
        let mut account = savings("A1");
        account.deposit(amt(10_000), "").unwrap();
        account.withdraw(amt(10_000), "").unwrap();
        assert_eq!(account.balance(), Amount::ZERO);
    }

    #[test]
    fn withdraw_overdraw_fails_and_mutates_nothing() {
        let mut account = savings("A1");
        account.deposit(amt(100_000), "").unwrap();

        let result = account.withdraw(amt(150_000), "");
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(account.balance(), amt(100_000));
        assert_eq!(account.transaction_count(), 1);
    }

    #[test]
    fn withdraw_rejects_non_positive_amount() {
        let mut account = savings("A1");
        account.deposit(amt(100), "").unwrap();
        let result = account.withdraw(Amount::ZERO, "");
        assert!(matches!(
            result,
            Err(LedgerError::Validation(ValidationError::NonPositiveAmount(_)))
        ));
    }

    // Interest

    #[test]
    fn interest_on_savings_credits_balance() {
        let mut account = savings("A1");
        account.deposit(amt(70_000), "").unwrap();

        let interest = account.apply_interest(DEFAULT_INTEREST_RATE);
        assert_eq!(interest, amt(2_800));
        assert_eq!(account.balance(), amt(72_800));

        let tx = account.transactions(None, Some(TxKind::Interest)).next().unwrap();
        assert_eq!(tx.amount(), amt(2_800));
        assert_eq!(tx.description(), "Interest @ 4.0%");
    }

    #[test]
    fn interest_on_current_account_is_a_noop() {
        let mut account = Account::open("Birch", "A2", "5678", AccountClass::Current).unwrap();
        account.deposit(amt(70_000), "").unwrap();

        let interest = account.apply_interest(DEFAULT_INTEREST_RATE);
        assert_eq!(interest, Amount::ZERO);
        assert_eq!(account.balance(), amt(70_000));
        assert_eq!(account.transaction_count(), 1);
    }

    #[test]
    fn interest_on_zero_balance_appends_nothing() {
        let mut account = savings("A1");
        let interest = account.apply_interest(DEFAULT_INTEREST_RATE);
        assert_eq!(interest, Amount::ZERO);
        assert_eq!(account.transaction_count(), 0);
    }

    // PIN

    #[test]
    fn change_pin_replaces_pin() {
        let mut account = savings("A1");
        account.change_pin("9876").unwrap();
        assert!(account.pin_matches("9876"));
        assert!(!account.pin_matches("1234"));
    }

    #[test]
    fn change_pin_rejects_bad_format() {
        let mut account = savings("A1");
        let result = account.change_pin("98x6");
        assert!(matches!(result, Err(ValidationError::InvalidPin)));
        assert!(account.pin_matches("1234"));
    }

    // Transactions view

    fn with_history() -> Account {
        let mut account = savings("A1");
        account.deposit(amt(10_000), "first").unwrap();
        account.withdraw(amt(4_000), "second").unwrap();
        account.deposit(amt(1_000), "third").unwrap();
        account.withdraw(amt(500), "fourth").unwrap();
        account
    }

    #[test]
    fn transactions_unfiltered_in_insertion_order() {
        let account = with_history();
        let descriptions: Vec<_> = account
            .transactions(None, None)
            .map(|tx| tx.description().to_string())
            .collect();
        assert_eq!(descriptions, ["first", "second", "third", "fourth"]);
    }

    #[test]
    fn transactions_filters_by_kind() {
        let account = with_history();
        let deposits: Vec<_> = account.transactions(None, Some(TxKind::Deposit)).collect();
        assert_eq!(deposits.len(), 2);
        assert!(deposits.iter().all(|tx| tx.kind() == TxKind::Deposit));
    }

    #[test]
    fn transactions_limit_takes_the_tail() {
        let account = with_history();
        let last_two: Vec<_> = account
            .transactions(Some(2), None)
            .map(|tx| tx.description().to_string())
            .collect();
        assert_eq!(last_two, ["third", "fourth"]);
    }

    #[test]
    fn transactions_limit_applies_after_filter() {
        let account = with_history();
        let last_deposit: Vec<_> = account
            .transactions(Some(1), Some(TxKind::Deposit))
            .map(|tx| tx.description().to_string())
            .collect();
        assert_eq!(last_deposit, ["third"]);
    }

    #[test]
    fn transactions_limit_larger_than_log_yields_everything() {
        let account = with_history();
        assert_eq!(account.transactions(Some(100), None).count(), 4);
    }

    // Balance history

    #[test]
    fn balance_history_folds_from_zero() {
        let mut account = savings("A1");
        account.deposit(amt(10_000), "").unwrap();
        account.withdraw(amt(4_000), "").unwrap();

        let history: Vec<_> = account.balance_history().map(|(_, b)| b).collect();
        assert_eq!(history, [amt(10_000), amt(6_000)]);
    }

    #[test]
    fn balance_history_is_empty_for_new_account() {
        assert_eq!(savings("A1").balance_history().count(), 0);
    }

    #[test]
    fn replayed_balance_matches_stored_balance() {
        let mut account = with_history();
        account.apply_interest(DEFAULT_INTEREST_RATE);
        assert_eq!(account.replayed_balance(), account.balance());
    }

    // Summary

    #[test]
    fn summary_projects_header_fields() {
        let account = with_history();
        let summary = account.summary();
        assert_eq!(summary.number, "A1");
        assert_eq!(summary.name, "Asha");
        assert_eq!(summary.class, AccountClass::Savings);
        assert_eq!(summary.balance, account.balance());
        assert_eq!(summary.transactions, 4);

        let text = summary.to_string();
        assert!(text.contains("Account Number: A1"));
        assert!(text.contains("Transaction Count: 4"));
    }
}
