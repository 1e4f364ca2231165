//! Defines the endpoint for changing the amount or type of a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    ledger::{TransactionChanges, update_transaction},
    money::Money,
    transaction::{Transaction, TransactionType},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for editing a transaction.
///
/// Fields that are left out keep their current value. Any other fields,
/// such as `id` or `createdAt`, are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct EditTransactionRequest {
    amount: Option<Money>,
    #[serde(rename = "type")]
    kind: Option<TransactionType>,
}

/// A route handler for editing a transaction, responds with the updated transaction.
///
/// Serves both `PUT` and `PATCH`.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Json(request): Json<EditTransactionRequest>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let changes = TransactionChanges {
        amount: request.amount,
        kind: request.kind,
    };

    update_transaction(transaction_id, changes, &connection)
        .inspect_err(|error| {
            tracing::warn!("could not update transaction {transaction_id}: {error}")
        })
        .map(Json)
}
