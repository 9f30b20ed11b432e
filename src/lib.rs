pub mod amount;
pub mod bank;
pub mod ledger;
pub mod model;
pub mod report;
pub mod store;

pub use amount::Amount;
pub use bank::{Bank, BankError};
pub use ledger::{Account, AccountSummary, Directory, DirectoryStats, LedgerError, ValidationError};
pub use model::{AccountClass, AccountId, Transaction, TxKind};
pub use store::{Store, StoreError};
