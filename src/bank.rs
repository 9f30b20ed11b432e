//! Service context tying the directory to its durable store.
//!
//! Every mutating call performs the ledger mutation and then flushes the
//! whole directory, so the store always reflects the last completed
//! mutation and no caller can forget the save. Read calls are flush-free.

use thiserror::Error;
use tracing::info;

use crate::Amount;
use crate::ledger::{Account, AccountSummary, Directory, DirectoryStats, LedgerError};
use crate::model::AccountClass;
use crate::store::{Store, StoreError};

/// Error at the service boundary: a rejected ledger operation, or a
/// failed flush (the latter means the mutation is not durable and the
/// caller must retry or abort).
#[derive(Debug, Error)]
pub enum BankError {
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

/// The live bank: in-memory directory plus the store it flushes to.
///
/// Mutation requires `&mut self`, so one operation runs to completion
/// (flush included) before the next begins; balance update and record
/// append are one step inside the ledger.
pub struct Bank {
    directory: Directory,
    store: Store,
}

/// Public API
impl Bank {
    /// Load the directory from the store, recovering to empty on a
    /// missing or corrupt file.
    pub fn open(store: Store) -> Self {
        let directory = store.load_or_default();
        Self { directory, store }
    }

    /// Read-only view of the directory.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn stats(&self) -> DirectoryStats {
        self.directory.stats()
    }

    pub fn summary(&self, number: &str) -> Result<AccountSummary, BankError> {
        self.find(number).map(Account::summary)
    }

    pub fn create_account(
        &mut self,
        name: &str,
        number: &str,
        pin: &str,
        class: AccountClass,
    ) -> Result<AccountSummary, BankError> {
        let result = self.try_create_account(name, number, pin, class);
        Self::log_result("create account", number, None, &result);
        result
    }

    /// Deposit into an account, returning the new balance.
    pub fn deposit(
        &mut self,
        number: &str,
        amount: Amount,
        description: &str,
    ) -> Result<Amount, BankError> {
        let result = self.try_deposit(number, amount, description);
        Self::log_result("deposit", number, Some(amount), &result);
        result
    }

    /// Withdraw from an account, returning the new balance.
    pub fn withdraw(
        &mut self,
        number: &str,
        amount: Amount,
        description: &str,
    ) -> Result<Amount, BankError> {
        let result = self.try_withdraw(number, amount, description);
        Self::log_result("withdrawal", number, Some(amount), &result);
        result
    }

    /// Move funds between two accounts; all-or-nothing.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Amount,
        description: &str,
    ) -> Result<(), BankError> {
        let result = self.try_transfer(from, to, amount, description);
        match &result {
            Ok(()) => info!(from, to, amount = %amount, "transfer applied"),
            Err(e) => info!(from, to, amount = %amount, reason = %e, "transfer rejected"),
        }
        result
    }

    /// Apply interest to a savings account, returning the interest
    /// amount. Zero (and no flush) for any other class.
    pub fn apply_interest(&mut self, number: &str, rate: f64) -> Result<Amount, BankError> {
        let result = self.try_apply_interest(number, rate);
        Self::log_result("interest", number, result.as_ref().ok().copied(), &result);
        result
    }

    pub fn change_pin(&mut self, number: &str, new_pin: &str) -> Result<(), BankError> {
        let result = self.try_change_pin(number, new_pin);
        Self::log_result("PIN change", number, None, &result);
        result
    }
}

/// Private API
impl Bank {
    /// Small helper to log operation results.
    fn log_result<T>(op: &str, account: &str, amount: Option<Amount>, result: &Result<T, BankError>) {
        match (result, amount) {
            (Ok(_), Some(amt)) => {
                info!(account, amount = %amt, "{op} applied");
            }
            (Ok(_), None) => {
                info!(account, "{op} applied");
            }
            (Err(e), Some(amt)) => {
                info!(account, amount = %amt, reason = %e, "{op} rejected");
            }
            (Err(e), None) => {
                info!(account, reason = %e, "{op} rejected");
            }
        }
    }

    fn find(&self, number: &str) -> Result<&Account, BankError> {
        self.directory
            .find(number)
            .ok_or_else(|| LedgerError::NotFound(number.to_string()).into())
    }

    fn find_mut(&mut self, number: &str) -> Result<&mut Account, BankError> {
        self.directory
            .find_mut(number)
            .ok_or_else(|| LedgerError::NotFound(number.to_string()).into())
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.store.save(&self.directory)
    }

    fn try_create_account(
        &mut self,
        name: &str,
        number: &str,
        pin: &str,
        class: AccountClass,
    ) -> Result<AccountSummary, BankError> {
        let summary = self.directory.open_account(name, number, pin, class)?.summary();
        self.flush()?;
        Ok(summary)
    }

    fn try_deposit(
        &mut self,
        number: &str,
        amount: Amount,
        description: &str,
    ) -> Result<Amount, BankError> {
        let account = self.find_mut(number)?;
        account.deposit(amount, description).map_err(LedgerError::from)?;
        let balance = account.balance();
        self.flush()?;
        Ok(balance)
    }

    fn try_withdraw(
        &mut self,
        number: &str,
        amount: Amount,
        description: &str,
    ) -> Result<Amount, BankError> {
        let account = self.find_mut(number)?;
        account.withdraw(amount, description)?;
        let balance = account.balance();
        self.flush()?;
        Ok(balance)
    }

    fn try_transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Amount,
        description: &str,
    ) -> Result<(), BankError> {
        self.directory.transfer(from, to, amount, description)?;
        self.flush()?;
        Ok(())
    }

    fn try_apply_interest(&mut self, number: &str, rate: f64) -> Result<Amount, BankError> {
        let interest = self.find_mut(number)?.apply_interest(rate);
        // Nothing was mutated when no interest accrued
        if interest.is_positive() {
            self.flush()?;
        }
        Ok(interest)
    }

    fn try_change_pin(&mut self, number: &str, new_pin: &str) -> Result<(), BankError> {
        self.find_mut(number)?
            .change_pin(new_pin)
            .map_err(LedgerError::from)?;
        self.flush()?;
        Ok(())
    }
}
