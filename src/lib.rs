//! Ledger Transfer - Transactional fund transfers between accounts
//!
//! Accounts hold exact decimal balances (5 fractional digits). A transfer
//! debits one account and credits another as a single atomic unit, locking
//! both rows in ascending id order so concurrent transfers never deadlock.
//!
//! # Modules
//!
//! - [`core_types`] - Account and transfer id aliases
//! - [`money`] - Precision rules and 5-digit decimal formatting
//! - [`error`] - `LedgerError` taxonomy and classification
//! - [`account`] - Account model, repository contract, lifecycle service
//! - [`transfer`] - Transfer engine, record types, retry policy
//! - [`store`] - Unit-of-work contract with PostgreSQL and in-memory backends
//! - [`observer`] - Structured lifecycle hooks
//! - [`gateway`] - axum HTTP surface
//! - [`config`] / [`logging`] / [`db`] - Process bootstrap

// Core types - must be first!
pub mod core_types;
pub mod error;
pub mod money;

// Ledger core
pub mod account;
pub mod observer;
pub mod store;
pub mod transfer;

// Process bootstrap and HTTP boundary
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use account::{Account, AccountService};
pub use core_types::{AccountId, TransferId};
pub use error::{ErrorClass, LedgerError, LedgerResult};
pub use observer::{LedgerObserver, NoopObserver, TracingObserver};
pub use store::memory::MemoryLedger;
pub use store::postgres::PgLedger;
pub use store::{LedgerStore, StoreError, UnitOptions};
pub use transfer::{EngineConfig, RetryPolicy, TransferEngine, TransferRecord, TransferRequest};
