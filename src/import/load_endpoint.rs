//! Defines the endpoint that loads transactions from the external feed.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, import::FeedClient, ledger::bulk_add_transactions, transaction::Transaction,
};

/// The state needed to load transactions from the feed.
#[derive(Debug, Clone)]
pub struct LoadFromFeedState {
    /// The database connection for storing the imported transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The client for the external feed.
    pub feed_client: FeedClient,
}

impl FromRef<AppState> for LoadFromFeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            feed_client: state.feed_client.clone(),
        }
    }
}

/// A route handler that fetches the feed and stores the transactions that
/// are new, responds with the transactions that were added.
///
/// Any failure, including a batch that would overdraw the account, is
/// logged and reported to the client as [Error::ImportFetchFailed].
pub async fn load_from_feed_endpoint(
    State(state): State<LoadFromFeedState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    // Fetch before taking the lock so a slow feed does not block other requests.
    let raw_transactions = state
        .feed_client
        .fetch_transactions()
        .await
        .map_err(log_import_error)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    bulk_add_transactions(&raw_transactions, &connection)
        .map(Json)
        .map_err(log_import_error)
}

fn log_import_error(error: Error) -> Error {
    tracing::error!("Error loading transactions from API: {error}");
    Error::ImportFetchFailed
}
