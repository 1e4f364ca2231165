//! Reconcile a batch of transactions from the external feed with the ledger.

use std::collections::HashSet;

use rust_decimal::Decimal;
use rusqlite::Connection;
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    account::{get_account, save_balance},
    database_id::TransactionId,
    ledger::{
        begin_write,
        effect::{apply_effect, apply_net_change},
    },
    money::Money,
    transaction::{
        Transaction, TransactionBuilder, TransactionType, existing_transaction_ids,
        insert_transaction, reconcile_transaction_sequence,
    },
};

/// A transaction from the feed that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    /// The ID the feed assigned, if any.
    pub id: Option<TransactionId>,
    /// The magnitude of the transaction.
    pub amount: Money,
    /// Whether the transaction is a deposit or an expense.
    pub kind: TransactionType,
    /// When the feed says the transaction happened.
    pub created_at: Option<OffsetDateTime>,
}

impl ImportCandidate {
    fn into_builder(self) -> TransactionBuilder {
        Transaction::build(self.amount, self.kind)
            .id(self.id)
            .created_at(self.created_at)
            .editable(false)
    }
}

/// Validate the shape of every raw candidate in `raw`.
///
/// # Errors
/// Returns [Error::InvalidInput] naming the index and field of the first
/// candidate that is malformed. No candidates are returned in that case.
pub fn parse_candidates(raw: &[Value]) -> Result<Vec<ImportCandidate>, Error> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| parse_candidate(index, value))
        .collect()
}

/// Insert the transactions in `raw` that are not in the database yet and
/// add their net effect to the balance.
///
/// Candidates whose ID is already stored are skipped, as are repeats of an
/// ID earlier in the same batch. Candidates without an ID are always new.
/// The batch is only checked as a whole: an expense may exceed the current
/// balance as long as the deposits in the same batch cover it.
///
/// Imported transactions are not editable. The new transactions are returned
/// in the order they appear in `raw`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidInput] if any candidate is malformed or the batch would
///   take the balance out of range,
/// - [Error::InsufficientBalance] if the net effect of the new candidates
///   would take the balance below zero,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// Nothing is written if an error is returned.
pub fn bulk_add_transactions(
    raw: &[Value],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let candidates = parse_candidates(raw)?;

    let tx = begin_write(connection)?;

    let candidate_ids: Vec<TransactionId> = candidates.iter().filter_map(|c| c.id).collect();
    let existing_ids = existing_transaction_ids(&candidate_ids, &tx)?;
    let mut seen_ids = HashSet::new();

    let new_candidates: Vec<(usize, ImportCandidate)> = candidates
        .into_iter()
        .enumerate()
        .filter(|(_, candidate)| match candidate.id {
            Some(id) => !existing_ids.contains(&id) && seen_ids.insert(id),
            None => true,
        })
        .collect();

    if new_candidates.is_empty() {
        tracing::info!("No new transactions in a batch of {}", raw.len());
        return Ok(Vec::new());
    }

    let net_change = new_candidates
        .iter()
        .try_fold(Money::ZERO, |net_change, (_, candidate)| {
            apply_effect(net_change, candidate.kind, candidate.amount)
        })?;

    let mut account = get_account(&tx)?;
    let new_balance = apply_net_change(account.balance, net_change)?;

    if new_balance.is_negative() {
        tracing::warn!(
            "Rejected batch with net change {net_change} against balance {}",
            account.balance
        );
        return Err(Error::InsufficientBalance);
    }

    let now = OffsetDateTime::now_utc();
    account.balance = new_balance;
    save_balance(&mut account, now, &tx)?;

    // Explicit IDs go in first so the sequence never hands out an ID that a
    // later row in the batch needs.
    let (with_id, without_id): (Vec<_>, Vec<_>) = new_candidates
        .into_iter()
        .partition(|(_, candidate)| candidate.id.is_some());

    let mut inserted = Vec::with_capacity(with_id.len() + without_id.len());
    for (index, candidate) in with_id.into_iter().chain(without_id) {
        let transaction = insert_transaction(candidate.into_builder(), now, &tx)?;
        inserted.push((index, transaction));
    }

    reconcile_transaction_sequence(&tx)?;
    tx.commit()?;

    tracing::info!(
        "Imported {} of {} transactions, balance is now {}",
        inserted.len(),
        raw.len(),
        account.balance
    );

    inserted.sort_by_key(|(index, _)| *index);

    Ok(inserted
        .into_iter()
        .map(|(_, transaction)| transaction)
        .collect())
}

fn parse_candidate(index: usize, value: &Value) -> Result<ImportCandidate, Error> {
    let Value::Object(object) = value else {
        return Err(invalid(index, None, "expected an object"));
    };

    Ok(ImportCandidate {
        id: parse_id(index, object)?,
        amount: parse_amount(index, object)?,
        kind: parse_kind(index, object)?,
        created_at: parse_created_at(index, object)?,
    })
}

fn parse_id(index: usize, object: &Map<String, Value>) -> Result<Option<TransactionId>, Error> {
    let id = match object.get("id") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(text)) => text.trim().parse::<TransactionId>().ok(),
        Some(_) => None,
    };

    match id {
        Some(id) if id > 0 => Ok(Some(id)),
        _ => Err(invalid(index, Some("id"), "expected a positive integer")),
    }
}

fn parse_amount(index: usize, object: &Map<String, Value>) -> Result<Money, Error> {
    let amount = match object.get("amount") {
        None | Some(Value::Null) => {
            return Err(invalid(index, Some("amount"), "this field is required"));
        }
        Some(Value::Number(number)) => parse_decimal(&number.to_string()),
        Some(Value::String(text)) => parse_decimal(text.trim()),
        Some(_) => None,
    };

    match amount {
        Some(amount) if amount < Decimal::ZERO => {
            Err(invalid(index, Some("amount"), "must not be negative"))
        }
        Some(amount) => Ok(Money::new(amount)),
        None => Err(invalid(index, Some("amount"), "expected a number")),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn parse_kind(index: usize, object: &Map<String, Value>) -> Result<TransactionType, Error> {
    match object.get("type") {
        None | Some(Value::Null) => Err(invalid(index, Some("type"), "this field is required")),
        Some(Value::String(text)) => text.parse().map_err(|_| {
            invalid(
                index,
                Some("type"),
                &format!("\"{text}\" is not one of \"deposit\" or \"expense\""),
            )
        }),
        Some(_) => Err(invalid(index, Some("type"), "expected a string")),
    }
}

fn parse_created_at(
    index: usize,
    object: &Map<String, Value>,
) -> Result<Option<OffsetDateTime>, Error> {
    match object.get("createdAt") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => OffsetDateTime::parse(text, &Rfc3339)
            .map(Some)
            .map_err(|error| invalid(index, Some("createdAt"), &error.to_string())),
        Some(_) => Err(invalid(
            index,
            Some("createdAt"),
            "expected an RFC 3339 timestamp",
        )),
    }
}

fn invalid(index: usize, field: Option<&str>, message: &str) -> Error {
    match field {
        Some(field) => Error::InvalidInput(format!("transaction {index}: {field}: {message}")),
        None => Error::InvalidInput(format!("transaction {index}: {message}")),
    }
}
