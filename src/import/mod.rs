//! Loading transactions from the external feed.

mod feed_client;
mod load_endpoint;

pub use feed_client::{DEFAULT_FEED_URL, FeedClient};
pub use load_endpoint::load_from_feed_endpoint;
