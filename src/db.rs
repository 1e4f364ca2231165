//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    account::{create_account_table, ensure_account},
    transaction::create_transaction_table,
};

/// Create the tables for the domain models and the account row if they do not exist.
///
/// Safe to call on a database that has already been initialized, existing
/// data is left untouched.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    ensure_account(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    use crate::{
        account::get_balance,
        ledger::create_transaction,
        money::Money,
        transaction::{Transaction, TransactionType, get_transactions},
    };

    use super::initialize;

    #[test]
    fn initializes_empty_database() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        assert_eq!(get_balance(&conn), Ok(Money::ZERO));
        assert_eq!(get_transactions(&conn), Ok(Vec::new()));
    }

    #[test]
    fn initializing_twice_keeps_data() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let transaction = create_transaction(
            Transaction::build(Money::new(dec!(25)), TransactionType::Deposit),
            &conn,
        )
        .unwrap();

        initialize(&conn).unwrap();

        assert_eq!(get_balance(&conn), Ok(Money::new(dec!(25))));
        assert_eq!(get_transactions(&conn), Ok(vec![transaction]));
    }

    #[test]
    fn ids_keep_counting_after_reinitializing() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let first = create_transaction(
            Transaction::build(Money::new(dec!(1)), TransactionType::Deposit),
            &conn,
        )
        .unwrap();

        initialize(&conn).unwrap();
        let second = create_transaction(
            Transaction::build(Money::new(dec!(1)), TransactionType::Deposit),
            &conn,
        )
        .unwrap();

        assert_eq!((first.id, second.id), (1, 2));
    }
}
