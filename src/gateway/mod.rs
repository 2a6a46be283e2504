//! HTTP Gateway
//!
//! JSON-over-HTTP surface for the ledger:
//!
//! | Method | Path                          | Handler                     |
//! |--------|-------------------------------|-----------------------------|
//! | POST   | `/accounts`                   | create account (201)        |
//! | GET    | `/accounts/{id}`              | get account                 |
//! | GET    | `/accounts/{id}/transactions` | account transfer history    |
//! | POST   | `/transactions`               | transfer                    |
//! | GET    | `/transactions`               | transfer history            |
//! | GET    | `/health`                     | store health (200 / 503)    |

pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{Next, from_fn},
    response::Response,
    routing::{get, post},
};
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::store::LedgerStore;
pub use state::AppState;

/// Access log: one line per request with status and latency.
async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_us = started.elapsed().as_micros() as u64;
    if response.status().is_server_error() {
        tracing::error!(%method, path = %path, status, latency_us, "request");
    } else {
        tracing::info!(%method, path = %path, status, latency_us, "request");
    }
    response
}

/// Build the gateway router over any ledger store.
pub fn router<S: LedgerStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/accounts", post(handlers::create_account::<S>))
        .route("/accounts/{id}", get(handlers::get_account::<S>))
        .route(
            "/accounts/{id}/transactions",
            get(handlers::list_account_transactions::<S>),
        )
        .route(
            "/transactions",
            post(handlers::create_transaction::<S>).get(handlers::list_transactions::<S>),
        )
        .route("/health", get(handlers::health_check::<S>))
        .layer(from_fn(log_requests))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Start HTTP Gateway server; returns after a graceful shutdown.
pub async fn run_server<S: LedgerStore>(
    config: &GatewayConfig,
    state: Arc<AppState<S>>,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Ledger gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}
