//! Ledger Transfer service
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌────────────┐
//! │  Config  │───▶│ Postgres │───▶│ Engine +     │───▶│  Gateway   │
//! │  (YAML)  │    │  (sqlx)  │    │ AccountSvc   │    │  (axum)    │
//! └──────────┘    └──────────┘    └──────────────┘    └────────────┘
//! ```
//!
//! Usage: `ledger_transfer [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;

use ledger_transfer::config::AppConfig;
use ledger_transfer::db::Database;
use ledger_transfer::gateway::{self, AppState};
use ledger_transfer::logging::init_logging;
use ledger_transfer::{PgLedger, TracingObserver};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config =
        AppConfig::load(&env).with_context(|| format!("loading configuration for env '{}'", env))?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }

    let _log_guard = init_logging(&app_config.logging);
    tracing::info!(
        env = %env,
        build = env!("LEDGER_BUILD_REV"),
        "Starting ledger transfer service"
    );

    let db = Database::connect(&app_config.database)
        .await
        .context("connecting to PostgreSQL")?;
    if app_config.database.ensure_schema {
        db.ensure_schema().await.context("creating ledger schema")?;
    }

    let store = Arc::new(PgLedger::new(db.pool().clone()));
    let engine_config = app_config.transfer.engine_config();
    tracing::info!(
        lock_timeout = ?engine_config.lock_timeout,
        unit_timeout = ?engine_config.unit_timeout,
        max_attempts = engine_config.retry.max_attempts,
        "Transfer engine configured"
    );
    let state = Arc::new(AppState::new(store, Arc::new(TracingObserver), engine_config));

    gateway::run_server(&app_config.gateway, state)
        .await
        .context("gateway server")?;

    tracing::info!("Ledger transfer service stopped");
    Ok(())
}
