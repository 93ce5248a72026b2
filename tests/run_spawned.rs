// tests/run_spawned.rs
// The full entry point, driven the way the binary drives it: inside `tokio::spawn`.
mod common;

use std::{env, fs};

use axum::{routing::get, Router};

use alert_wire::cli::Cli;
use alert_wire::RunMode;

const EMPTY_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;

#[serial_test::serial]
#[tokio::test]
async fn run_completes_on_a_spawned_task() {
    let base = common::serve(Router::new().route("/rss", get(|| async { EMPTY_FEED }))).await;

    let tmp = tempfile::tempdir().unwrap();
    let sources = tmp.path().join("sources.toml");
    fs::write(
        &sources,
        format!("[[sources]]\nlabel = \"Quiet\"\nurl = \"{base}/rss\"\n"),
    )
    .unwrap();
    let seen = tmp.path().join("seen.json");

    env::set_var("TELEGRAM_TOKEN", "t");
    env::set_var("TELEGRAM_CHAT_ID", "-1");

    let cli = Cli {
        debug: false,
        rules: None,
        sources: Some(sources),
        seen_file: Some(seen.clone()),
        window_minutes: Some(30),
    };
    let result = tokio::spawn(async move { alert_wire::run(&cli).await })
        .await
        .expect("run task panicked")
        .expect("run failed");

    env::remove_var("TELEGRAM_TOKEN");
    env::remove_var("TELEGRAM_CHAT_ID");

    assert_eq!(result.mode, RunMode::Normal);
    assert_eq!(result.sources.len(), 1);
    assert!(!result.sources[0].failed(), "{:?}", result.sources[0].error);
    assert_eq!(result.total_dispatched, 0);
    assert!(seen.exists());
}
