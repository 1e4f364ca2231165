#![allow(missing_docs)]

pub(crate) mod feed;
pub(crate) mod http;

pub(crate) use feed::{spawn_feed, spawn_feed_serving};
pub(crate) use http::{assert_json_content_type, read_json_body};
