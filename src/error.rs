//! Ledger Error Types
//!
//! `LedgerError` is the single outcome error of the ledger core. Every variant
//! carries a stable code, a stable message and a coarse [`ErrorClass`] that
//! the boundary layer maps to a transport status.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::AccountId;
use crate::money::MoneyError;
use crate::store::StoreError;

/// Coarse outcome classification used by boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Request rejected by business rules; never retried.
    Validation,
    /// Referenced account does not exist.
    NotFound,
    /// Request conflicts with existing state (duplicate key).
    Conflict,
    /// Transient contention or resource failure; safe to retry from scratch.
    Transient,
    /// Unexpected store failure.
    Internal,
}

/// Ledger error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Amount must have at most {max} decimal places (got {provided})")]
    InvalidPrecision { provided: u32, max: u32 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Source and destination accounts are the same")]
    SameAccount,

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Initial balance cannot be negative")]
    NegativeBalance,

    #[error("Insufficient balance")]
    InsufficientBalance {
        account_id: AccountId,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Balance would overflow")]
    BalanceOverflow,

    // === Account Errors ===
    #[error("Account already exists")]
    DuplicateAccount(AccountId),

    #[error("Account not found")]
    NotFound(AccountId),

    #[error("Source account not found")]
    SourceNotFound(AccountId),

    #[error("Destination account not found")]
    DestinationNotFound(AccountId),

    // === System Errors ===
    #[error("Transfer conflicted with a concurrent transfer: {0}")]
    Contention(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Transfer cancelled before commit")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidPrecision { .. } => "INVALID_PRECISION",
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::SameAccount => "SAME_ACCOUNT",
            LedgerError::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            LedgerError::NegativeBalance => "NEGATIVE_BALANCE",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::BalanceOverflow => "BALANCE_OVERFLOW",
            LedgerError::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            LedgerError::DestinationNotFound(_) => "DESTINATION_NOT_FOUND",
            LedgerError::Contention(_) => "CONTENTION",
            LedgerError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            LedgerError::Cancelled => "CANCELLED",
            LedgerError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::InvalidPrecision { .. }
            | LedgerError::InvalidAmount(_)
            | LedgerError::SameAccount
            | LedgerError::NonPositiveAmount
            | LedgerError::NegativeBalance
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::BalanceOverflow => ErrorClass::Validation,
            LedgerError::NotFound(_)
            | LedgerError::SourceNotFound(_)
            | LedgerError::DestinationNotFound(_) => ErrorClass::NotFound,
            LedgerError::DuplicateAccount(_) => ErrorClass::Conflict,
            LedgerError::Contention(_)
            | LedgerError::StoreUnavailable(_)
            | LedgerError::Cancelled => ErrorClass::Transient,
            LedgerError::Storage(_) => ErrorClass::Internal,
        }
    }

    /// Whether the caller may re-run the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Contention(_) | LedgerError::StoreUnavailable(_) | LedgerError::Cancelled
        )
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self.class() {
            ErrorClass::Validation => 400,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::Transient => 503,
            ErrorClass::Internal => 500,
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::PrecisionOverflow { provided, max } => {
                LedgerError::InvalidPrecision { provided, max }
            }
            MoneyError::InvalidFormat(msg) => LedgerError::InvalidAmount(msg),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Contention(msg) => LedgerError::Contention(msg),
            StoreError::Unavailable(msg) => LedgerError::StoreUnavailable(msg),
            StoreError::Duplicate(msg) | StoreError::Backend(msg) => LedgerError::Storage(msg),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::SameAccount.code(), "SAME_ACCOUNT");
        assert_eq!(
            LedgerError::InvalidPrecision {
                provided: 6,
                max: 5
            }
            .code(),
            "INVALID_PRECISION"
        );
        assert_eq!(LedgerError::SourceNotFound(1).code(), "SOURCE_NOT_FOUND");
    }

    #[test]
    fn test_classification() {
        assert_eq!(LedgerError::SameAccount.class(), ErrorClass::Validation);
        assert_eq!(LedgerError::NotFound(7).class(), ErrorClass::NotFound);
        assert_eq!(
            LedgerError::DuplicateAccount(7).class(),
            ErrorClass::Conflict
        );
        assert_eq!(
            LedgerError::Contention("deadlock".into()).class(),
            ErrorClass::Transient
        );
        assert_eq!(LedgerError::Storage("x".into()).class(), ErrorClass::Internal);
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(LedgerError::Contention("lock timeout".into()).is_retryable());
        assert!(LedgerError::StoreUnavailable("io".into()).is_retryable());
        assert!(!LedgerError::NonPositiveAmount.is_retryable());
        assert!(!LedgerError::DuplicateAccount(1).is_retryable());
        assert!(!LedgerError::Storage("constraint".into()).is_retryable());
    }

    #[test]
    fn test_money_errors_are_client_errors() {
        let err: LedgerError = crate::money::parse_amount("1e5").unwrap_err().into();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
        assert_eq!(err.code(), "INVALID_AMOUNT");
        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(err.http_status(), 400);

        let err: LedgerError = crate::money::check_precision(Decimal::new(1, 6))
            .unwrap_err()
            .into();
        assert_eq!(err, LedgerError::InvalidPrecision { provided: 6, max: 5 });
    }

    #[test]
    fn test_http_status() {
        assert_eq!(LedgerError::NonPositiveAmount.http_status(), 400);
        assert_eq!(LedgerError::DestinationNotFound(2).http_status(), 404);
        assert_eq!(LedgerError::DuplicateAccount(2).http_status(), 409);
        assert_eq!(LedgerError::StoreUnavailable("down".into()).http_status(), 503);
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            LedgerError::from(StoreError::Contention("40001".into())),
            LedgerError::Contention("40001".into())
        );
        assert_eq!(
            LedgerError::from(StoreError::Unavailable("pool closed".into())),
            LedgerError::StoreUnavailable("pool closed".into())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LedgerError::InsufficientBalance {
                account_id: 1,
                available: Decimal::ONE,
                requested: Decimal::TEN,
            }
            .to_string(),
            "Insufficient balance"
        );
    }
}
