//! Core types used throughout the ledger
//!
//! Fundamental type aliases shared by the store, the repositories and the
//! transfer engine.

/// Account ID - assigned by the caller at creation, never generated by the store.
///
/// # Constraints:
/// - **Unique**: primary key of the `accounts` table
/// - **Immutable**: an account is never re-keyed
/// - **Lock order**: transfers lock accounts in ascending `AccountId` order
pub type AccountId = i64;

/// Transfer record ID - assigned by the store at insertion, strictly increasing.
pub type TransferId = i64;
