//! The single account whose balance the ledger keeps in sync with the transactions.

use rusqlite::{Connection, OptionalExtension};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::DatabaseId, money::Money};

/// The fixed key of the one and only account row.
pub const ACCOUNT_ID: DatabaseId = 1;

/// The money available in the account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The current net worth, the signed sum of all transactions.
    pub balance: Money,
    /// When the balance was last written.
    pub updated_at: OffsetDateTime,
}

/// Create the account table in the database.
///
/// The `CHECK` constraint on the ID means the table can never hold more than
/// the one account row.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            balance TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Insert the account with a zero balance if it does not exist yet.
///
/// An existing account is left untouched.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn ensure_account(connection: &Connection) -> Result<(), rusqlite::Error> {
    let inserted = connection.execute(
        "INSERT OR IGNORE INTO account (id, balance, updated_at) VALUES (?1, ?2, ?3)",
        (ACCOUNT_ID, Money::ZERO, OffsetDateTime::now_utc()),
    )?;

    if inserted != 0 {
        tracing::info!("Created account with balance 0");
    }

    Ok(())
}

/// Get the account.
///
/// Inside a write transaction this is the read half of the ledger's
/// read-modify-write on the balance.
///
/// # Errors
/// Returns [Error::AccountMissing] if the database has not been initialized,
/// or [Error::SqlError] if there is some other SQL error.
pub fn get_account(connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            "SELECT balance, updated_at FROM account WHERE id = ?1",
            [ACCOUNT_ID],
            map_row_to_account,
        )
        .optional()?
        .ok_or(Error::AccountMissing)
}

/// Get the current balance.
///
/// # Errors
/// Returns [Error::AccountMissing] if the database has not been initialized,
/// or [Error::SqlError] if there is some other SQL error.
pub fn get_balance(connection: &Connection) -> Result<Money, Error> {
    get_account(connection).map(|account| account.balance)
}

/// Write the balance of `account` to the database.
///
/// `updated_at` is set to `now` on both the row and `account`.
///
/// # Errors
/// Returns [Error::AccountMissing] if the database has not been initialized,
/// or [Error::SqlError] if there is some other SQL error.
pub fn save_balance(
    account: &mut Account,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let now = now.to_offset(UtcOffset::UTC);
    let rows_affected = connection.execute(
        "UPDATE account SET balance = ?1, updated_at = ?2 WHERE id = ?3",
        (account.balance, now, ACCOUNT_ID),
    )?;

    if rows_affected == 0 {
        return Err(Error::AccountMissing);
    }

    account.updated_at = now;

    Ok(())
}

fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let balance = row.get(0)?;
    let updated_at = row.get(1)?;

    Ok(Account {
        balance,
        updated_at,
    })
}
