//! Ledger schema (PostgreSQL)
//!
//! Statements are idempotent and run in order by [`super::Database::ensure_schema`].

pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id      BIGINT PRIMARY KEY,
    balance NUMERIC(38, 5) NOT NULL CHECK (balance >= 0)
)
"#;

pub const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id                     BIGSERIAL PRIMARY KEY,
    source_account_id      BIGINT NOT NULL REFERENCES accounts (id),
    destination_account_id BIGINT NOT NULL REFERENCES accounts (id),
    amount                 NUMERIC(38, 5) NOT NULL CHECK (amount > 0),
    created_at             TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (source_account_id <> destination_account_id)
)
"#;

pub const CREATE_TRANSACTIONS_SOURCE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_source
    ON transactions (source_account_id, created_at DESC)
"#;

pub const CREATE_TRANSACTIONS_DESTINATION_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_destination
    ON transactions (destination_account_id, created_at DESC)
"#;

/// All schema statements in execution order.
pub const SCHEMA: &[(&str, &str)] = &[
    ("accounts", CREATE_ACCOUNTS_TABLE),
    ("transactions", CREATE_TRANSACTIONS_TABLE),
    ("idx_transactions_source", CREATE_TRANSACTIONS_SOURCE_INDEX),
    ("idx_transactions_destination", CREATE_TRANSACTIONS_DESTINATION_INDEX),
];
