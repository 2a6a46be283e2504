//! Ledger Store
//!
//! Transactional storage of accounts and transfer records. A store hands out
//! units of work (`Tx`) and the two typed repositories that operate on them.
//!
//! # Unit-of-work contract
//!
//! - `begin` opens a unit at SERIALIZABLE isolation (or an equivalent
//!   guarantee for non-SQL backends).
//! - Every repository call that receives `Some(tx)` / `&mut tx` runs inside that
//!   same unit; nothing opens a nested transaction behind the caller's back.
//! - Row locks taken through [`AccountRepository::get_for_update`] are held
//!   until `commit` or `rollback`.
//! - Dropping a unit without committing rolls it back.
//!
//! # Backends
//!
//! - [`postgres::PgLedger`]: PostgreSQL via `sqlx` (`SELECT ... FOR UPDATE`)
//! - [`memory::MemoryLedger`]: in-process store with per-row async locks

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::account::AccountRepository;
use crate::transfer::TransactionRepository;

/// Store-level failures, classified for retry decisions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// Lock wait timeout, deadlock victim or serialization failure.
    #[error("Lock or serialization conflict: {0}")]
    Contention(String),

    /// Transport-level failure reaching the store.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Contention(_) | StoreError::Unavailable(_))
    }
}

/// Options applied when a unit of work is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitOptions {
    /// Maximum wait for a single row lock. `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Tx: Send;
    type Accounts: AccountRepository<Tx = Self::Tx>;
    type Transfers: TransactionRepository<Tx = Self::Tx>;

    fn accounts(&self) -> &Self::Accounts;

    fn transfers(&self) -> &Self::Transfers;

    /// Open a SERIALIZABLE unit of work.
    async fn begin(&self, options: UnitOptions) -> Result<Self::Tx, StoreError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Cheap liveness check.
    async fn health_check(&self) -> Result<(), StoreError>;
}
