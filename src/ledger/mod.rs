//! The account directory: the single writable copy of all account state.
//!
//! Every account is owned exclusively by the directory; lookups and
//! mutations all go through it. Uniqueness check and insertion are one
//! `&mut self` call, and transfer borrows both legs disjointly from the
//! same call, so no interleaving between the check and the mutation is
//! possible.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Amount;
use crate::model::{AccountClass, AccountId, TxKind};

mod account;
pub use account::{Account, AccountSummary, DEFAULT_INTEREST_RATE};

mod error;
pub use error::{LedgerError, ValidationError};

/// Mapping from account number to account, preserving registration order.
#[derive(Debug, Default)]
pub struct Directory {
    accounts: HashMap<AccountId, Account>,
    /// Registration order; every entry has a matching key in `accounts`.
    order: Vec<AccountId>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Validate, check uniqueness, and insert as one step.
    pub fn open_account(
        &mut self,
        name: &str,
        number: &str,
        pin: &str,
        class: AccountClass,
    ) -> Result<&Account, LedgerError> {
        let account = Account::open(name, number, pin, class)?;
        if self.accounts.contains_key(account.number()) {
            return Err(LedgerError::DuplicateAccount(account.number().clone()));
        }
        let number = account.number().clone();
        self.order.push(number.clone());
        Ok(self.accounts.entry(number).or_insert(account))
    }

    /// Insert an existing account, rejecting number collisions.
    pub fn register(&mut self, account: Account) -> Result<(), LedgerError> {
        if self.accounts.contains_key(account.number()) {
            return Err(LedgerError::DuplicateAccount(account.number().clone()));
        }
        self.order.push(account.number().clone());
        self.accounts.insert(account.number().clone(), account);
        Ok(())
    }

    pub fn find(&self, number: &str) -> Option<&Account> {
        self.accounts.get(number)
    }

    pub fn find_mut(&mut self, number: &str) -> Option<&mut Account> {
        self.accounts.get_mut(number)
    }

    /// All accounts as `(number, account)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.order
            .iter()
            .filter_map(|number| self.accounts.get_key_value(number))
    }

    /// Move funds between two accounts as a single atomic unit: either
    /// both records are appended and both balances updated, or neither.
    ///
    /// The withdraw leg runs first; the deposit leg cannot fail once the
    /// withdraw leg has passed validation. A same-account transfer is
    /// rejected even with sufficient funds.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Amount,
        description: &str,
    ) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(amount).into());
        }
        if from == to {
            return Err(ValidationError::SameAccountTransfer(from.to_string()).into());
        }

        // from != to, so the keys are disjoint
        let [source, target] = self.accounts.get_disjoint_mut([from, to]);
        let source = source.ok_or_else(|| LedgerError::NotFound(from.to_string()))?;
        let target = target.ok_or_else(|| LedgerError::NotFound(to.to_string()))?;

        if amount > source.balance() {
            return Err(LedgerError::InsufficientFunds {
                account: from.to_string(),
                balance: source.balance(),
                requested: amount,
            });
        }

        source.debit(
            TxKind::TransferOut,
            amount,
            format!("Transfer to {to}: {description}"),
        );
        target.credit(
            TxKind::TransferIn,
            amount,
            format!("Transfer from {from}: {description}"),
        );
        Ok(())
    }

    /// Aggregate statistics, folded over the directory on demand.
    pub fn stats(&self) -> DirectoryStats {
        let mut stats = DirectoryStats {
            accounts: self.order.len(),
            savings: 0,
            current: 0,
            total_balance: Amount::ZERO,
        };
        for (_, account) in self.iter() {
            match account.class() {
                AccountClass::Savings => stats.savings += 1,
                AccountClass::Current => stats.current += 1,
            }
            stats.total_balance += account.balance();
        }
        stats
    }

    /// Accounts whose number contains `term`, or whose holder name
    /// contains it case-insensitively, in registration order.
    pub fn search(&self, term: &str) -> impl Iterator<Item = &Account> {
        let term = term.to_string();
        let needle = term.to_lowercase();
        self.iter()
            .filter(move |(number, account)| {
                number.contains(&term) || account.name().to_lowercase().contains(&needle)
            })
            .map(|(_, account)| account)
    }
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.accounts == other.accounts
    }
}

/// Aggregate read-only statistics over the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub accounts: usize,
    pub savings: usize,
    pub current: usize,
    pub total_balance: Amount,
}

// The persisted layout is a JSON object keyed by account number. A plain
// map derive would lose registration order, so both directions go through
// the order index.

impl Serialize for Directory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (number, account) in self.iter() {
            map.serialize_entry(number, account)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Directory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DirectoryVisitor;

        impl<'de> Visitor<'de> for DirectoryVisitor {
            type Value = Directory;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of account number to account")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut directory = Directory::new();
                // The account's own number field is authoritative; the map
                // key merely mirrors it.
                while let Some((_, account)) = access.next_entry::<String, Account>()? {
                    account.check_invariant();
                    directory.register(account).map_err(serde::de::Error::custom)?;
                }
                Ok(directory)
            }
        }

        deserializer.deserialize_map(DirectoryVisitor)
    }
}
