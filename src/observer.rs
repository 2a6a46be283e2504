//! Ledger Observer
//!
//! Structured hook points for account and transfer lifecycle events. The
//! engine and the account service report through a [`LedgerObserver`];
//! [`TracingObserver`] turns every event into a `tracing` record.

use std::time::Duration;

use crate::account::Account;
use crate::core_types::AccountId;
use crate::error::LedgerError;
use crate::store::StoreError;
use crate::transfer::{TransferRecord, TransferRequest};

/// Lifecycle hooks. Every method defaults to a no-op.
pub trait LedgerObserver: Send + Sync {
    fn account_created(&self, _account: &Account) {}

    fn account_rejected(&self, _account_id: AccountId, _error: &LedgerError) {}

    /// A transfer attempt is starting. `attempt` counts from 1.
    fn transfer_started(&self, _request: &TransferRequest, _attempt: u32) {}

    fn transfer_committed(&self, _record: &TransferRecord, _elapsed: Duration) {}

    fn transfer_failed(&self, _request: &TransferRequest, _error: &LedgerError) {}

    fn transfer_retrying(
        &self,
        _request: &TransferRequest,
        _attempt: u32,
        _backoff: Duration,
        _error: &LedgerError,
    ) {
    }

    /// An explicit rollback failed; the unit is discarded regardless.
    fn rollback_failed(&self, _request: &TransferRequest, _error: &StoreError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LedgerObserver for NoopObserver {}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LedgerObserver for TracingObserver {
    fn account_created(&self, account: &Account) {
        tracing::info!(
            account_id = account.id,
            balance = %account.balance,
            "Account created"
        );
    }

    fn account_rejected(&self, account_id: AccountId, error: &LedgerError) {
        tracing::warn!(account_id, code = error.code(), error = %error, "Account rejected");
    }

    fn transfer_started(&self, request: &TransferRequest, attempt: u32) {
        tracing::debug!(
            source = request.source_account_id,
            destination = request.destination_account_id,
            amount = %request.amount,
            attempt,
            "Transfer started"
        );
    }

    fn transfer_committed(&self, record: &TransferRecord, elapsed: Duration) {
        tracing::info!(
            transfer_id = record.id,
            source = record.source_account_id,
            destination = record.destination_account_id,
            amount = %record.amount,
            elapsed_us = elapsed.as_micros() as u64,
            "Transfer committed"
        );
    }

    fn transfer_failed(&self, request: &TransferRequest, error: &LedgerError) {
        match error.class() {
            crate::error::ErrorClass::Internal => tracing::error!(
                source = request.source_account_id,
                destination = request.destination_account_id,
                code = error.code(),
                error = %error,
                "Transfer failed"
            ),
            _ => tracing::warn!(
                source = request.source_account_id,
                destination = request.destination_account_id,
                code = error.code(),
                error = %error,
                "Transfer rejected"
            ),
        }
    }

    fn transfer_retrying(
        &self,
        request: &TransferRequest,
        attempt: u32,
        backoff: Duration,
        error: &LedgerError,
    ) {
        tracing::info!(
            source = request.source_account_id,
            destination = request.destination_account_id,
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            code = error.code(),
            "Retrying transfer"
        );
    }

    fn rollback_failed(&self, request: &TransferRequest, error: &StoreError) {
        tracing::error!(
            source = request.source_account_id,
            destination = request.destination_account_id,
            error = %error,
            "Rollback failed"
        );
    }
}

#[cfg(test)]
pub mod mock {
    //! Counting observer for tests

    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct RecordingObserver {
        pub started: AtomicUsize,
        pub committed: AtomicUsize,
        pub failed: AtomicUsize,
        pub retried: AtomicUsize,
        pub rollback_failures: AtomicUsize,
        pub accounts_created: AtomicUsize,
        pub accounts_rejected: AtomicUsize,
        pub last_error: Mutex<Option<LedgerError>>,
    }

    impl RecordingObserver {
        pub fn count(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    impl LedgerObserver for RecordingObserver {
        fn account_created(&self, _account: &Account) {
            self.accounts_created.fetch_add(1, Ordering::SeqCst);
        }

        fn account_rejected(&self, _account_id: AccountId, error: &LedgerError) {
            self.accounts_rejected.fetch_add(1, Ordering::SeqCst);
            *self.last_error.lock().unwrap() = Some(error.clone());
        }

        fn transfer_started(&self, _request: &TransferRequest, _attempt: u32) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn transfer_committed(&self, _record: &TransferRecord, _elapsed: Duration) {
            self.committed.fetch_add(1, Ordering::SeqCst);
        }

        fn transfer_failed(&self, _request: &TransferRequest, error: &LedgerError) {
            self.failed.fetch_add(1, Ordering::SeqCst);
            *self.last_error.lock().unwrap() = Some(error.clone());
        }

        fn transfer_retrying(
            &self,
            _request: &TransferRequest,
            _attempt: u32,
            _backoff: Duration,
            _error: &LedgerError,
        ) {
            self.retried.fetch_add(1, Ordering::SeqCst);
        }

        fn rollback_failed(&self, _request: &TransferRequest, _error: &StoreError) {
            self.rollback_failures.fetch_add(1, Ordering::SeqCst);
        }
    }
}
