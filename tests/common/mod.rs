// tests/common/mod.rs
// Shared helpers: a throwaway HTTP server on 127.0.0.1:0 and fixture loading.
#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}")).expect("fixture")
}

/// Serve `app` on an ephemeral port; returns `http://127.0.0.1:<port>`.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}
