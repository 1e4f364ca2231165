use axum::{body::Body, http::header::CONTENT_TYPE, response::Response};
use serde::de::DeserializeOwned;

#[track_caller]
pub(crate) fn assert_json_content_type(response: &Response<Body>) {
    let content_type_header = response
        .headers()
        .get(CONTENT_TYPE)
        .expect("content-type header missing");
    assert_eq!(content_type_header, "application/json");
}

pub(crate) async fn read_json_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    serde_json::from_slice(&body).expect("response body is not the expected JSON")
}
