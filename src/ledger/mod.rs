//! Keeps the account balance in sync with the transactions.
//!
//! Every function here that changes a transaction also changes the balance,
//! and both changes are committed in one SQLite transaction started with
//! `BEGIN IMMEDIATE`. The write lock is therefore held from the moment the
//! balance is read until it is written back, so two writers can never base
//! their change on the same stale balance.

mod bulk;
mod effect;
mod mutation;

pub use bulk::bulk_add_transactions;
pub use mutation::{
    TransactionChanges, create_transaction, delete_transaction, update_transaction,
};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::Error;

/// Start a transaction that takes the database write lock immediately.
///
/// Dropping the returned transaction without committing rolls it back.
fn begin_write(connection: &Connection) -> Result<SqlTransaction<'_>, Error> {
    SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate).map_err(Error::from)
}
