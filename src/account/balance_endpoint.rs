//! Defines the endpoint for reading the current balance.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, account::get_balance, money::Money};

/// The state needed to read the balance.
#[derive(Debug, Clone)]
pub struct BalanceState {
    /// The database connection for reading the account.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for the balance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The current balance of the account.
    pub balance: Money,
}

/// A route handler that responds with the current balance.
pub async fn get_balance_endpoint(
    State(state): State<BalanceState>,
) -> Result<Json<BalanceResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let balance = get_balance(&connection)?;

    Ok(Json(BalanceResponse { balance }))
}
