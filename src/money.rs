//! Money Precision Module
//!
//! Every balance and transfer amount in the ledger is an exact
//! `rust_decimal::Decimal` bounded to [`MAX_SCALE`] fractional digits.
//! All precision checks and all client-facing formatting go through here.
//!
//! ## Rules
//! 1. Precision is the scale as given: `30.000000` carries six fractional
//!    digits and is rejected just like `0.000001`.
//! 2. No silent truncation on input. Amounts that exceed the scale are rejected.
//! 3. Amounts cross the JSON boundary as strings only. A JSON number would
//!    lose its spelling (and possibly its value) before it is checked.
//! 4. Output is always rendered with exactly [`MAX_SCALE`] fractional digits.
//!
//! ```rust
//! use ledger_transfer::money::{check_precision, format_amount};
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! let amount = Decimal::from_str("30.5").unwrap();
//! assert!(check_precision(amount).is_ok());
//! assert_eq!(format_amount(amount), "30.50000");
//! ```

use rust_decimal::prelude::*;
use thiserror::Error;

/// Maximum number of fractional digits a balance or amount may carry.
pub const MAX_SCALE: u32 = 5;

/// Money precision/format errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Reject values carrying more than [`MAX_SCALE`] fractional digits,
/// trailing zeros included.
pub fn check_precision(value: Decimal) -> Result<(), MoneyError> {
    let provided = value.scale();
    if provided > MAX_SCALE {
        return Err(MoneyError::PrecisionOverflow {
            provided,
            max: MAX_SCALE,
        });
    }
    Ok(())
}

/// Render with exactly [`MAX_SCALE`] fractional digits (banker's rounding past the scale).
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = value.round_dp(MAX_SCALE);
    rounded.rescale(MAX_SCALE);
    rounded.to_string()
}

/// Parse a client-supplied decimal string.
///
/// Format rules follow the gateway's strict decimal handling: no empty strings,
/// no `.5` / `5.` shorthands, no scientific notation, no `+` prefix.
/// Sign and precision are business rules and are left to the ledger core.
pub fn parse_amount(raw: &str) -> Result<Decimal, MoneyError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    if unsigned.starts_with('+') || s.starts_with('+') {
        return Err(MoneyError::InvalidFormat("+ prefix not allowed".into()));
    }
    if unsigned.starts_with('.') {
        return Err(MoneyError::InvalidFormat("use 0.5 not .5".into()));
    }
    if unsigned.ends_with('.') {
        return Err(MoneyError::InvalidFormat("use 5.0 not 5.".into()));
    }
    if unsigned.contains(['e', 'E']) {
        return Err(MoneyError::InvalidFormat(
            "scientific notation not allowed".into(),
        ));
    }
    Decimal::from_str(s).map_err(|e| MoneyError::InvalidFormat(e.to_string()))
}

/// Serde adapter for ledger amounts.
///
/// Serializes as a JSON string with exactly five fractional digits. Input must
/// be a JSON string in strict format; JSON numbers are rejected.
pub mod fixed5 {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_amount(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let s = String::deserialize(deserializer)?;
        parse_amount(&s).map_err(D::Error::custom)
    }
}
