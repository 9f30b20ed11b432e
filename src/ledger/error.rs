//! Error taxonomy for ledger and directory operations.
//!
//! Every error here is local and recoverable: the operation is rejected,
//! state is left unchanged, and the condition is reported to the caller.

use thiserror::Error;

use crate::Amount;
use crate::model::AccountId;

/// Malformed or out-of-range input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    #[error("holder name must not be empty")]
    EmptyName,

    #[error("account number must not be empty")]
    EmptyNumber,

    #[error("account type must be 'savings' or 'current', got '{0}'")]
    UnknownClass(String),

    #[error("cannot transfer from account {0} to itself")]
    SameAccountTransfer(AccountId),
}

/// Top-level error returned by ledger and directory operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Amount,
        requested: Amount,
    },

    #[error("account number {0} already exists")]
    DuplicateAccount(AccountId),

    #[error("account {0} not found")]
    NotFound(AccountId),
}
