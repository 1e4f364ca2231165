//! An HTTP client for the external transaction feed.

use serde_json::Value;

use crate::Error;

/// The feed used when no other URL is configured.
pub const DEFAULT_FEED_URL: &str =
    "https://685efce5c55df675589d49df.mockapi.io/api/v1/transactions";

/// Fetches the raw list of transactions from the external feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Create a client for the feed at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// The URL the client fetches from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the list of transactions from the feed.
    ///
    /// The items are returned as raw JSON, their shape is checked when they
    /// are imported.
    ///
    /// # Errors
    /// Returns [Error::FeedError] if the feed cannot be reached, responds
    /// with a non-success status, or the body is not a JSON array.
    pub async fn fetch_transactions(&self) -> Result<Vec<Value>, Error> {
        tracing::debug!("Fetching transactions from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|error| Error::FeedError(format!("request to {} failed: {error}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FeedError(format!(
                "{} responded with {status}",
                self.url
            )));
        }

        let transactions: Vec<Value> = response.json().await.map_err(|error| {
            Error::FeedError(format!(
                "could not parse response from {} as a list: {error}",
                self.url
            ))
        })?;

        tracing::debug!(
            "Fetched {} transactions from {}",
            transactions.len(),
            self.url
        );

        Ok(transactions)
    }
}
