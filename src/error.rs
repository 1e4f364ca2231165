//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The operation would leave the account with a negative balance.
    ///
    /// Raised before anything is written, so the caller can assume the
    /// balance and transactions are exactly as they were before the request.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// The request data did not have the expected shape, e.g. a missing
    /// amount, a negative amount or an unknown transaction type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the ID is
    /// correct and that the transaction has not been deleted.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Loading transactions from the external feed failed.
    ///
    /// The underlying cause is logged on the server and not shown to the
    /// client.
    #[error("error loading transactions from API")]
    ImportFetchFailed,

    /// The external feed could not be reached or sent an unusable response.
    #[error("could not fetch transactions from the feed: {0}")]
    FeedError(String),

    /// The account row is missing from the database.
    ///
    /// The account is created when the database is initialized, so this
    /// indicates the database was not initialized or has been tampered with.
    #[error("the account has not been initialized")]
    AccountMissing,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A message that is safe to show to the client.
    pub error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, message) = match self {
            Error::InsufficientBalance => {
                (StatusCode::BAD_REQUEST, "Insufficient balance".to_owned())
            }
            Error::InvalidInput(details) => (StatusCode::BAD_REQUEST, details),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
            Error::ImportFetchFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error loading transactions from API".to_owned(),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        (status_code, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::test_utils::{assert_json_content_type, read_json_body};

    use super::{Error, ErrorBody};

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn client_errors_have_client_status_codes() {
        let cases = [
            (Error::InsufficientBalance, StatusCode::BAD_REQUEST),
            (
                Error::InvalidInput("bad".to_owned()),
                StatusCode::BAD_REQUEST,
            ),
            (Error::NotFound, StatusCode::NOT_FOUND),
        ];

        for (error, want_status) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), want_status);
        }
    }

    #[test]
    fn internal_errors_have_server_status_codes() {
        let cases = [
            Error::ImportFetchFailed,
            Error::FeedError("connection refused".to_owned()),
            Error::AccountMissing,
            Error::DatabaseLockError,
        ];

        for error in cases {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[tokio::test]
    async fn error_body_is_json() {
        let response = Error::InsufficientBalance.into_response();

        assert_json_content_type(&response);
        let body: ErrorBody = read_json_body(response).await;
        assert_eq!(body.error, "Insufficient balance");
    }

    #[tokio::test]
    async fn internal_details_are_not_sent_to_client() {
        let response = Error::FeedError("secret.internal:8080 refused".to_owned()).into_response();

        let body: ErrorBody = read_json_body(response).await;
        assert!(!body.error.contains("secret.internal"));
    }

    #[tokio::test]
    async fn import_failure_has_fixed_message() {
        let response = Error::ImportFetchFailed.into_response();

        let body: ErrorBody = read_json_body(response).await;
        assert_eq!(body.error, "Error loading transactions from API");
    }
}
