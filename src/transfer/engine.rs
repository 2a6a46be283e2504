//! Transfer Engine
//!
//! Moves funds between two accounts as one atomic unit of work:
//!
//! ```text
//! validate ─► begin ─► lock rows (ascending id) ─► existence ─► sufficiency
//!          ─► debit/credit ─► append record ─► commit
//! ```
//!
//! Any failure after `begin` rolls the unit back in full. Rows are always
//! locked in ascending id order, so two transfers over the same pair of
//! accounts cannot deadlock regardless of direction. A unit cut short by
//! cancellation or by the unit timeout is rolled back the same way.
//!
//! The engine holds no mutable state of its own; all coordination is the
//! store's row locks and isolation level.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use super::repository::TransactionRepository;
use super::retry::RetryPolicy;
use super::types::{TransferRecord, TransferRequest};
use crate::account::{Account, AccountRepository};
use crate::core_types::AccountId;
use crate::error::{LedgerError, LedgerResult};
use crate::money::check_precision;
use crate::observer::LedgerObserver;
use crate::store::{LedgerStore, UnitOptions};

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum wait for each row lock.
    pub lock_timeout: Option<Duration>,
    /// Maximum duration of a unit from `begin` up to commit.
    pub unit_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

/// Stateless validation shared by every attempt. Never touches the store.
pub fn validate(request: &TransferRequest) -> LedgerResult<()> {
    check_precision(request.amount)?;
    if request.source_account_id == request.destination_account_id {
        return Err(LedgerError::SameAccount);
    }
    if request.amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    Ok(())
}

/// Run `step` against the unit deadline, if any. Overrunning is contention.
async fn within<T>(
    deadline: Option<(tokio::time::Instant, Duration)>,
    step: impl Future<Output = LedgerResult<T>>,
) -> LedgerResult<T> {
    match deadline {
        Some((at, limit)) => tokio::time::timeout_at(at, step).await.map_err(|_| {
            LedgerError::Contention(format!("unit did not complete within {:?}", limit))
        })?,
        None => step.await,
    }
}

pub struct TransferEngine<S: LedgerStore> {
    store: Arc<S>,
    observer: Arc<dyn LedgerObserver>,
    config: EngineConfig,
}

impl<S: LedgerStore> TransferEngine<S> {
    pub fn new(store: Arc<S>, observer: Arc<dyn LedgerObserver>) -> Self {
        Self {
            store,
            observer,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Move `amount` from `source` to `destination`.
    pub async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    ) -> LedgerResult<TransferRecord> {
        self.submit(&TransferRequest::new(source, destination, amount))
            .await
    }

    /// Like [`transfer`](Self::transfer), aborting when `cancel` resolves
    /// before the unit reaches commit.
    pub async fn transfer_with_cancel<C>(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
        cancel: C,
    ) -> LedgerResult<TransferRecord>
    where
        C: Future<Output = ()>,
    {
        self.submit_with_cancel(&TransferRequest::new(source, destination, amount), cancel)
            .await
    }

    pub async fn submit(&self, request: &TransferRequest) -> LedgerResult<TransferRecord> {
        self.submit_with_cancel(request, std::future::pending()).await
    }

    /// Execute `request` with the configured retry policy.
    ///
    /// Cancellation is only observed before commit. Once the commit has been
    /// issued the transfer runs to completion.
    pub async fn submit_with_cancel<C>(
        &self,
        request: &TransferRequest,
        cancel: C,
    ) -> LedgerResult<TransferRecord>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        let started = Instant::now();
        let mut attempt = 1;

        loop {
            self.observer.transfer_started(request, attempt);

            let err = match self.run_once(request, cancel.as_mut()).await {
                Ok(record) => {
                    self.observer.transfer_committed(&record, started.elapsed());
                    return Ok(record);
                }
                Err(e) => e,
            };

            if err == LedgerError::Cancelled
                || !err.is_retryable()
                || !self.config.retry.should_retry(attempt)
            {
                self.observer.transfer_failed(request, &err);
                return Err(err);
            }

            let backoff = self.config.retry.backoff(attempt);
            self.observer
                .transfer_retrying(request, attempt, backoff, &err);
            let cancelled = tokio::select! {
                biased;
                _ = cancel.as_mut() => true,
                _ = tokio::time::sleep(backoff) => false,
            };
            if cancelled {
                let err = LedgerError::Cancelled;
                self.observer.transfer_failed(request, &err);
                return Err(err);
            }
            attempt += 1;
        }
    }

    /// All committed transfers, most recent first.
    pub async fn transfer_history(&self) -> LedgerResult<Vec<TransferRecord>> {
        Ok(self.store.transfers().list_all().await?)
    }

    /// Transfers where `account_id` is source or destination, most recent first.
    /// An unknown account simply has no history.
    pub async fn account_transfer_history(
        &self,
        account_id: AccountId,
    ) -> LedgerResult<Vec<TransferRecord>> {
        Ok(self.store.transfers().list_by_account(account_id).await?)
    }

    /// One attempt: validate, then run the unit up to commit.
    ///
    /// `cancel` and the unit timeout race every step before commit. When either
    /// fires, the open unit is still rolled back through the store, so the
    /// rollback is counted and a failing rollback reaches the observer.
    async fn run_once<C>(
        &self,
        request: &TransferRequest,
        mut cancel: Pin<&mut C>,
    ) -> LedgerResult<TransferRecord>
    where
        C: Future<Output = ()>,
    {
        validate(request)?;

        let deadline = self
            .config
            .unit_timeout
            .map(|limit| (tokio::time::Instant::now() + limit, limit));
        let options = UnitOptions {
            lock_timeout: self.config.lock_timeout,
        };

        let mut tx = tokio::select! {
            biased;
            _ = cancel.as_mut() => return Err(LedgerError::Cancelled),
            tx = within(deadline, async {
                self.store.begin(options).await.map_err(LedgerError::from)
            }) => tx?,
        };

        let applied = tokio::select! {
            biased;
            _ = cancel.as_mut() => Err(LedgerError::Cancelled),
            applied = within(deadline, self.apply(&mut tx, request)) => applied,
        };

        match applied {
            Ok(record) => {
                self.store.commit(tx).await?;
                Ok(record)
            }
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    self.observer.rollback_failed(request, &rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, tx: &mut S::Tx, request: &TransferRequest) -> LedgerResult<TransferRecord> {
        let accounts = self.store.accounts();

        let mut locked: BTreeMap<AccountId, Account> = BTreeMap::new();
        for id in request.lock_order() {
            if let Some(account) = accounts.get_for_update(&mut *tx, id).await? {
                locked.insert(id, account);
            }
        }

        let source = locked
            .get(&request.source_account_id)
            .ok_or(LedgerError::SourceNotFound(request.source_account_id))?;
        let destination = locked
            .get(&request.destination_account_id)
            .ok_or(LedgerError::DestinationNotFound(request.destination_account_id))?;

        if source.balance < request.amount {
            return Err(LedgerError::InsufficientBalance {
                account_id: source.id,
                available: source.balance,
                requested: request.amount,
            });
        }

        let new_source = source
            .balance
            .checked_sub(request.amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        let new_destination = destination
            .balance
            .checked_add(request.amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        if !accounts
            .update_balance(Some(&mut *tx), source.id, new_source)
            .await?
        {
            return Err(LedgerError::SourceNotFound(source.id));
        }
        if !accounts
            .update_balance(Some(&mut *tx), destination.id, new_destination)
            .await?
        {
            return Err(LedgerError::DestinationNotFound(destination.id));
        }

        let record = self.store.transfers().append(Some(&mut *tx), request).await?;
        Ok(record)
    }
}
