//! Data models for ledger accounts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core_types::AccountId;

/// Ledger account
///
/// `balance` is never negative and never carries more than
/// [`MAX_SCALE`](crate::money::MAX_SCALE) significant fractional digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    #[serde(rename = "account_id")]
    pub id: AccountId,
    #[serde(with = "crate::money::fixed5")]
    pub balance: Decimal,
}

impl Account {
    pub fn new(id: AccountId, balance: Decimal) -> Self {
        Self { id, balance }
    }
}

/// Account creation request (boundary input)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub account_id: AccountId,
    #[serde(alias = "initial_balance", with = "crate::money::fixed5")]
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_account_json_shape() {
        let account = Account::new(1, Decimal::from_str("100").unwrap());
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "account_id": 1, "balance": "100.00000" })
        );
    }

    #[test]
    fn test_create_request_accepts_initial_balance_alias() {
        let req: CreateAccountRequest =
            serde_json::from_str(r#"{"account_id": 7, "initial_balance": "12.5"}"#).unwrap();
        assert_eq!(req.account_id, 7);
        assert_eq!(req.balance, Decimal::from_str("12.5").unwrap());

        let req: CreateAccountRequest =
            serde_json::from_str(r#"{"account_id": 8, "balance": "3"}"#).unwrap();
        assert_eq!(req.balance, Decimal::from(3));

        let number: Result<CreateAccountRequest, _> =
            serde_json::from_str(r#"{"account_id": 8, "balance": 3}"#);
        assert!(number.is_err());
    }
}
