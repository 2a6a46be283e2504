//! Fund Transfers
//!
//! Atomic two-account transfers with an append-only audit log.
//!
//! - [`types`]: request and record types
//! - [`repository`]: transaction repository contract
//! - [`engine`]: the transfer engine (validation, locking, commit)
//! - [`retry`]: optional bounded retry for transient outcomes
//!
//! # Invariants
//!
//! 1. **Conservation**: a committed transfer changes the sum of all balances by zero
//! 2. **Atomicity**: balance writes and the audit record commit together or not at all
//! 3. **Non-negativity**: no committed balance is ever below zero
//! 4. **Lock order**: rows are locked in ascending account id

pub mod engine;
pub mod repository;
pub mod retry;
pub mod types;

// Re-exports for convenience
pub use engine::{EngineConfig, TransferEngine};
pub use repository::TransactionRepository;
pub use retry::RetryPolicy;
pub use types::{TransferRecord, TransferRequest};
