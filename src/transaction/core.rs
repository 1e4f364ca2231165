//! Defines the core data models and database queries for transactions.
//!
//! The functions in this module only touch the `transaction` table. They do
//! not keep the account balance in sync, use the functions in
//! [crate::ledger] for anything that changes a transaction.

use std::{collections::HashSet, fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::TransactionId, money::Money};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction adds money to or takes money from the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money paid into the account.
    Deposit,
    /// Money spent from the account.
    Expense,
}

impl TransactionType {
    /// The name used for the type in the database and in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidInput(format!(
                "\"{other}\" is not a valid transaction type, expected \"deposit\" or \"expense\""
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A deposit or expense recorded against the account.
///
/// To create a new `Transaction`, use [Transaction::build] and pass the
/// builder to [crate::ledger::create_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The magnitude of the transaction, never negative.
    pub amount: Money,
    /// Whether the amount is added to or taken from the balance.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// `false` for transactions loaded from the external feed.
    pub editable: bool,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: Money, kind: TransactionType) -> TransactionBuilder {
        TransactionBuilder {
            id: None,
            amount,
            kind,
            editable: true,
            created_at: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal_macros::dec;
///
/// use crate::{money::Money, transaction::{Transaction, TransactionType}};
///
/// // An imported transaction that keeps the feed's ID and timestamp.
/// let builder = Transaction::build(Money::new(dec!(45.99)), TransactionType::Expense)
///     .id(Some(42))
///     .created_at(Some(created_at))
///     .editable(false);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// An explicit ID, e.g. one supplied by the import feed.
    ///
    /// `None` lets the database assign the next ID in its sequence.
    pub id: Option<TransactionId>,

    /// The magnitude of the transaction.
    ///
    /// The sign is carried by `kind`, so this must not be negative.
    pub amount: Money,

    /// Whether the transaction is a deposit or an expense.
    pub kind: TransactionType,

    /// Whether the transaction was entered locally.
    pub editable: bool,

    /// When the transaction happened. Defaults to the time of insertion.
    pub created_at: Option<OffsetDateTime>,
}

impl TransactionBuilder {
    /// Set an explicit ID for the transaction.
    pub fn id(mut self, id: Option<TransactionId>) -> Self {
        self.id = id;
        self
    }

    /// Set whether the transaction was entered locally.
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Set when the transaction happened.
    pub fn created_at(mut self, created_at: Option<OffsetDateTime>) -> Self {
        self.created_at = created_at;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, amount, type, editable, created_at, updated_at";

/// Insert a transaction row.
///
/// `now` is used for `updated_at`, and for `created_at` if the builder does
/// not set it. Timestamps are stored in UTC.
///
/// This does not touch the account balance.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// e.g. the ID is already taken.
pub fn insert_transaction(
    builder: TransactionBuilder,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = now.to_offset(UtcOffset::UTC);
    let created_at = builder
        .created_at
        .map(|created_at| created_at.to_offset(UtcOffset::UTC))
        .unwrap_or(now);

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (id, amount, type, editable, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.id,
                builder.amount,
                builder.kind,
                builder.editable,
                created_at,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve all transactions, most recent first.
///
/// Transactions created at the same instant are ordered by descending ID.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Return the subset of `ids` that already exist in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn existing_transaction_ids(
    ids: &[TransactionId],
    connection: &Connection,
) -> Result<HashSet<TransactionId>, Error> {
    // Prepare the select statement once for reuse
    let mut stmt =
        connection.prepare("SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE id = ?1)")?;
    let mut existing = HashSet::new();

    for &id in ids {
        let exists: bool = stmt.query_row([id], |row| row.get(0))?;

        if exists {
            existing.insert(id);
        }
    }

    Ok(existing)
}

/// Overwrite the amount and type of a transaction and refresh `updated_at`.
///
/// This does not touch the account balance.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction_row(
    id: TransactionId,
    amount: Money,
    kind: TransactionType,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET amount = ?1, type = ?2, updated_at = ?3 WHERE id = ?4
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (amount, kind, now.to_offset(UtcOffset::UTC), id),
            map_transaction_row,
        )?;

    Ok(transaction)
}

type RowsAffected = usize;

/// Delete a transaction row.
///
/// This does not touch the account balance.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_transaction_row(
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id",
            &[(":id", &id)],
        )
        .map_err(Error::from)
}

/// Move the ID sequence up to the largest transaction ID in the table.
///
/// Rows inserted with explicit IDs were never issued by the sequence, so
/// after inserting them the next generated ID must continue above the
/// maximum ID now present. The sequence is never moved backwards.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn reconcile_transaction_sequence(connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "UPDATE sqlite_sequence
         SET seq = (SELECT MAX(id) FROM \"transaction\")
         WHERE name = 'transaction'
           AND seq < (SELECT COALESCE(MAX(id), 0) FROM \"transaction\")",
        (),
    )?;

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('deposit', 'expense')),
                editable INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT INTO sqlite_sequence (name, seq)
         SELECT 'transaction', 0
         WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = 'transaction')",
        (),
    )?;

    // Listings are ordered by creation time.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_created_at ON \"transaction\"(created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let kind = row.get(2)?;
    let editable = row.get(3)?;
    let created_at = row.get(4)?;
    let updated_at = row.get(5)?;

    Ok(Transaction {
        id,
        amount,
        kind,
        editable,
        created_at,
        updated_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        db::initialize,
        money::Money,
        transaction::{
            Transaction, TransactionType, count_transactions, get_transaction, get_transactions,
        },
    };

    use super::{
        delete_transaction_row, existing_transaction_ids, insert_transaction,
        reconcile_transaction_sequence, update_transaction_row,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn deposit(amount: rust_decimal::Decimal) -> super::TransactionBuilder {
        Transaction::build(Money::new(amount), TransactionType::Deposit)
    }

    #[test]
    fn insert_succeeds() {
        let conn = get_test_connection();
        let now = datetime!(2025-06-27 10:00 UTC);

        let transaction = insert_transaction(deposit(dec!(12.3)), now, &conn).unwrap();

        assert_eq!(transaction.id, 1);
        assert_eq!(transaction.amount, Money::new(dec!(12.3)));
        assert_eq!(transaction.kind, TransactionType::Deposit);
        assert!(transaction.editable);
        assert_eq!(transaction.created_at, now);
        assert_eq!(transaction.updated_at, now);
    }

    #[test]
    fn insert_keeps_explicit_id_and_created_at() {
        let conn = get_test_connection();
        let created_at = datetime!(2025-01-01 08:30 +13);

        let transaction = insert_transaction(
            deposit(dec!(1))
                .id(Some(42))
                .created_at(Some(created_at))
                .editable(false),
            datetime!(2025-06-27 10:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.id, 42);
        assert_eq!(transaction.created_at, created_at);
        assert!(!transaction.editable);
    }

    #[test]
    fn insert_fails_on_duplicate_id() {
        let conn = get_test_connection();
        let now = OffsetDateTime::now_utc();
        insert_transaction(deposit(dec!(1)).id(Some(7)), now, &conn).unwrap();

        let result = insert_transaction(deposit(dec!(2)).id(Some(7)), now, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
    }

    #[test]
    fn get_fails_on_missing_id() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(1337, &conn), Err(Error::NotFound));
    }

    #[test]
    fn get_transactions_orders_most_recent_first() {
        let conn = get_test_connection();
        let now = datetime!(2025-06-27 10:00 UTC);
        let oldest = insert_transaction(
            deposit(dec!(1)).created_at(Some(datetime!(2025-01-01 0:00 UTC))),
            now,
            &conn,
        )
        .unwrap();
        let newest = insert_transaction(deposit(dec!(2)), now, &conn).unwrap();
        let same_time_higher_id = insert_transaction(deposit(dec!(3)), now, &conn).unwrap();

        let transactions = get_transactions(&conn).unwrap();

        assert_eq!(transactions, vec![same_time_higher_id, newest, oldest]);
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let now = OffsetDateTime::now_utc();
        let want_count = 20;
        for i in 1..=want_count {
            insert_transaction(deposit(i.into()), now, &conn)
                .expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }

    #[test]
    fn existing_ids_only_returns_stored_ids() {
        let conn = get_test_connection();
        let now = OffsetDateTime::now_utc();
        insert_transaction(deposit(dec!(1)).id(Some(3)), now, &conn).unwrap();
        insert_transaction(deposit(dec!(1)).id(Some(5)), now, &conn).unwrap();

        let existing = existing_transaction_ids(&[1, 3, 4, 5], &conn).unwrap();

        assert_eq!(existing, [3, 5].into_iter().collect());
    }

    #[test]
    fn update_row_changes_amount_type_and_updated_at() {
        let conn = get_test_connection();
        let created = insert_transaction(
            deposit(dec!(10)),
            datetime!(2025-06-27 10:00 UTC),
            &conn,
        )
        .unwrap();
        let later = datetime!(2025-06-28 10:00 UTC);

        let updated = update_transaction_row(
            created.id,
            Money::new(dec!(4)),
            TransactionType::Expense,
            later,
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, Money::new(dec!(4)));
        assert_eq!(updated.kind, TransactionType::Expense);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, later);
    }

    #[test]
    fn update_row_fails_on_missing_id() {
        let conn = get_test_connection();

        let result = update_transaction_row(
            1,
            Money::ZERO,
            TransactionType::Deposit,
            OffsetDateTime::now_utc(),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_row_removes_transaction() {
        let conn = get_test_connection();
        let transaction =
            insert_transaction(deposit(dec!(1)), OffsetDateTime::now_utc(), &conn).unwrap();

        let rows_affected = delete_transaction_row(transaction.id, &conn).unwrap();

        assert_eq!(rows_affected, 1);
        assert_eq!(get_transaction(transaction.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn next_generated_id_follows_explicit_ids() {
        let conn = get_test_connection();
        let now = OffsetDateTime::now_utc();
        insert_transaction(deposit(dec!(1)).id(Some(100)), now, &conn).unwrap();

        reconcile_transaction_sequence(&conn).unwrap();
        let generated = insert_transaction(deposit(dec!(1)), now, &conn).unwrap();

        assert_eq!(generated.id, 101);
    }

    #[test]
    fn reconcile_never_moves_sequence_backwards() {
        let conn = get_test_connection();
        let now = OffsetDateTime::now_utc();
        let first = insert_transaction(deposit(dec!(1)), now, &conn).unwrap();
        let second = insert_transaction(deposit(dec!(1)), now, &conn).unwrap();
        delete_transaction_row(second.id, &conn).unwrap();

        reconcile_transaction_sequence(&conn).unwrap();
        let third = insert_transaction(deposit(dec!(1)), now, &conn).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(third.id, 3);
    }

    #[test]
    fn database_rejects_unknown_type() {
        let conn = get_test_connection();

        let result = conn.execute(
            "INSERT INTO \"transaction\" (amount, type, created_at, updated_at)
             VALUES ('1', 'refund', '2025-01-01', '2025-01-01')",
            (),
        );

        assert!(result.is_err());
    }
}
