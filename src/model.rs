//! Core domain types for the account ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::Amount;
use crate::ledger::ValidationError;

/// Account identifier, assigned at creation and never reused.
pub type AccountId = String;

/// The kind of a ledger entry. Closed set: the balance sign rule matches
/// on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Deposit,
    Withdraw,
    Interest,
    TransferOut,
    TransferIn,
}

impl TxKind {
    /// Sign rule for the balance fold: credits add, debits subtract.
    pub fn is_credit(self) -> bool {
        match self {
            TxKind::Deposit | TxKind::Interest | TxKind::TransferIn => true,
            TxKind::Withdraw | TxKind::TransferOut => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Deposit => "deposit",
            TxKind::Withdraw => "withdraw",
            TxKind::Interest => "interest",
            TxKind::TransferOut => "transfer_out",
            TxKind::TransferIn => "transfer_in",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account class. Interest only accrues on savings accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    Savings,
    Current,
}

impl AccountClass {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountClass::Savings => "savings",
            AccountClass::Current => "current",
        }
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "savings" => Ok(AccountClass::Savings),
            "current" => Ok(AccountClass::Current),
            other => Err(ValidationError::UnknownClass(other.to_string())),
        }
    }
}

/// One immutable ledger entry. Created exactly once by a balance-mutating
/// account operation, never edited afterwards; append order is the sole
/// ordering key, the timestamp is advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "txn_type")]
    kind: TxKind,
    amount: Amount,
    #[serde(rename = "date", default = "now")]
    timestamp: NaiveDateTime,
    #[serde(default)]
    description: String,
}

impl Transaction {
    pub(crate) fn new(kind: TxKind, amount: Amount, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            timestamp: now(),
            description: description.into(),
        }
    }

    pub fn kind(&self) -> TxKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

pub(crate) fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    // second precision, matching the store's datetime format
    now.with_nanosecond(0).unwrap_or(now)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
