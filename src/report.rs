//! CSV reporting over the directory: the admin account listing and the
//! per-account statement.

use std::io;

use serde::Serialize;

use crate::ledger::{Account, Directory};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct AccountRow {
    account: String,
    name: String,
    r#type: String,
    balance: String,
    created: String,
    last_accessed: String,
    transactions: usize,
}

#[derive(Debug, Serialize)]
struct StatementRow {
    r#type: String,
    amount: String,
    date: String,
    description: String,
}

/// Write one row per account, in directory order. The header is written
/// even when the directory is empty.
pub fn write_accounts(directory: &Directory, writer: impl io::Write) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record([
        "account",
        "name",
        "type",
        "balance",
        "created",
        "last_accessed",
        "transactions",
    ])?;

    for (number, account) in directory.iter() {
        writer.serialize(AccountRow {
            account: number.clone(),
            name: account.name().to_string(),
            r#type: account.class().to_string(),
            balance: account.balance().to_string(),
            created: account.created_on().to_string(),
            last_accessed: account.last_accessed().format(DATETIME_FORMAT).to_string(),
            transactions: account.transaction_count(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one row per transaction of one account, in ledger order.
pub fn write_statement(account: &Account, writer: impl io::Write) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(["type", "amount", "date", "description"])?;

    for tx in account.transactions(None, None) {
        writer.serialize(StatementRow {
            r#type: tx.kind().to_string(),
            amount: tx.amount().to_string(),
            date: tx.timestamp().format(DATETIME_FORMAT).to_string(),
            description: tx.description().to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
