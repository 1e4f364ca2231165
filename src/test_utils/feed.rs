use axum::{Json, Router, routing::get};
use serde_json::Value;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_feed(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind test feed listener");
    let address = listener
        .local_addr()
        .expect("could not get test feed address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("test feed server failed");
    });

    format!("http://{address}")
}

/// Serve `body` as JSON from `/transactions` and return the full URL.
pub(crate) async fn spawn_feed_serving(body: Value) -> String {
    let router = Router::new().route(
        "/transactions",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );

    format!("{}/transactions", spawn_feed(router).await)
}
