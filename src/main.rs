//! alert-wire: one polling run per invocation (schedule it with cron/systemd).
//! Always exits 0 so the scheduler keeps calling us; problems go to the log.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alert_wire::cli::Cli;

/// `RUST_LOG` wins; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("alert_wire=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    // Spawned so a panic inside the run is caught as a JoinError.
    match tokio::spawn(async move { alert_wire::run(&cli).await }).await {
        Ok(Ok(result)) => {
            tracing::info!(mode = ?result.mode, "sent {} alerts", result.total_dispatched)
        }
        Ok(Err(e)) => {
            let chain = format!("{e:#}");
            tracing::error!(error = %chain, "run aborted")
        }
        Err(e) => tracing::error!(error = %e, "run panicked"),
    }
    ExitCode::SUCCESS
}
