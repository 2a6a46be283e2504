//! HTTP handlers
//!
//! Thin adapters: decode the request, call the service or engine, wrap the
//! outcome in the response envelope.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Serialize;

use super::state::AppState;
use super::types::{ApiError, ApiResult, created, ok};
use crate::account::{Account, CreateAccountRequest};
use crate::core_types::AccountId;
use crate::store::LedgerStore;
use crate::transfer::{TransferRecord, TransferRequest};

/// POST /accounts
pub async fn create_account<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<Account> {
    let Json(req) = body?;
    let account = state
        .accounts
        .create_account(req.account_id, req.balance)
        .await?;
    created("Account created successfully", account)
}

/// GET /accounts/{id}
pub async fn get_account<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Account> {
    let Path(id) = id?;
    let account = state.accounts.get_account(id).await?;
    ok("Account retrieved successfully", account)
}

/// POST /transactions
pub async fn create_transaction<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TransferRecord> {
    let Json(req) = body?;
    let record = state.engine.submit(&req).await?;
    ok("Transfer completed successfully", record)
}

/// GET /transactions
pub async fn list_transactions<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Vec<TransferRecord>> {
    let records = state.engine.transfer_history().await?;
    ok("Transaction history retrieved successfully", records)
}

/// GET /accounts/{id}/transactions
pub async fn list_account_transactions<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Vec<TransferRecord>> {
    let Path(id) = id?;
    let records = state.engine.account_transfer_history(id).await?;
    ok("Account transaction history retrieved successfully", records)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub build: &'static str,
}

/// GET /health
///
/// 200 when the store answers, 503 otherwise. Store details stay in the logs.
pub async fn health_check<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<HealthResponse> {
    if let Err(e) = state.store.health_check().await {
        tracing::error!(error = %e, "[HEALTH] store ping failed");
        return ApiError::service_unavailable("Store unavailable").into_err();
    }
    ok(
        "ok",
        HealthResponse {
            status: "ok",
            build: env!("LEDGER_BUILD_REV"),
        },
    )
}
