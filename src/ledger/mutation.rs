//! Create, update and delete a single transaction while keeping the balance in sync.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    account::{get_account, save_balance},
    database_id::TransactionId,
    ledger::{begin_write, effect::would_overdraw},
    money::Money,
    transaction::{
        Transaction, TransactionBuilder, TransactionType, delete_transaction_row,
        get_transaction, insert_transaction, update_transaction_row,
    },
};

/// The fields of a transaction that may be changed after it was created.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionChanges {
    /// The new amount.
    pub amount: Option<Money>,
    /// The new transaction type.
    pub kind: Option<TransactionType>,
}

/// Record a new transaction and apply it to the balance.
///
/// The balance and the new row are written in one database transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidInput] if the amount is negative or would take the
///   balance out of range,
/// - [Error::InsufficientBalance] if the transaction is an expense larger
///   than the current balance, in which case nothing is written,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_amount(builder.amount)?;

    let tx = begin_write(connection)?;
    let mut account = get_account(&tx)?;

    if would_overdraw(account.balance, builder.kind, builder.amount)? {
        return Err(Error::InsufficientBalance);
    }

    let now = OffsetDateTime::now_utc();
    account.apply(builder.kind, builder.amount)?;
    save_balance(&mut account, now, &tx)?;
    let transaction = insert_transaction(builder, now, &tx)?;

    tx.commit()?;

    tracing::debug!(
        "Created {} transaction {} for {}, balance is now {}",
        transaction.kind,
        transaction.id,
        transaction.amount,
        account.balance
    );

    Ok(transaction)
}

/// Change the amount and/or type of a transaction and move the balance by the difference.
///
/// The original transaction is first taken back out of the balance and the
/// new values are then checked against what is left. If the new values would
/// overdraw the account, the original transaction is applied again so the
/// balance is exactly what it was before the call.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidInput] if the new amount is negative or would take the
///   balance out of range,
/// - [Error::NotFound] if `id` does not refer to a transaction,
/// - [Error::InsufficientBalance] if the new values would overdraw the
///   account, in which case nothing is written,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    changes: TransactionChanges,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }

    let tx = begin_write(connection)?;
    let original = get_transaction(id, &tx)?;
    let mut account = get_account(&tx)?;

    let new_amount = changes.amount.unwrap_or(original.amount);
    let new_kind = changes.kind.unwrap_or(original.kind);

    account.reverse(original.kind, original.amount)?;

    if would_overdraw(account.balance, new_kind, new_amount)? {
        account.apply(original.kind, original.amount)?;
        return Err(Error::InsufficientBalance);
    }

    let now = OffsetDateTime::now_utc();
    account.apply(new_kind, new_amount)?;
    save_balance(&mut account, now, &tx)?;
    let transaction = update_transaction_row(id, new_amount, new_kind, now, &tx)?;

    tx.commit()?;

    tracing::debug!(
        "Updated transaction {id} from {} {} to {} {}, balance is now {}",
        original.kind,
        original.amount,
        transaction.kind,
        transaction.amount,
        account.balance
    );

    Ok(transaction)
}

/// Delete a transaction and take it back out of the balance.
///
/// Deleting is never refused for lack of funds, so deleting a deposit can
/// leave the balance below zero.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction,
/// - [Error::InvalidInput] if taking the transaction out would put the
///   balance out of range,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tx = begin_write(connection)?;
    let transaction = get_transaction(id, &tx)?;
    let mut account = get_account(&tx)?;

    account.reverse(transaction.kind, transaction.amount)?;
    save_balance(&mut account, OffsetDateTime::now_utc(), &tx)?;

    if delete_transaction_row(id, &tx)? == 0 {
        return Err(Error::NotFound);
    }

    tx.commit()?;

    if account.balance.is_negative() {
        tracing::warn!(
            "Deleting transaction {id} left the balance negative: {}",
            account.balance
        );
    }

    Ok(transaction)
}

fn validate_amount(amount: Money) -> Result<(), Error> {
    if amount.is_negative() {
        return Err(Error::InvalidInput(format!(
            "amount must not be negative, got {amount}"
        )));
    }

    Ok(())
}
