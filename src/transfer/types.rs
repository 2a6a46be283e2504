//! Transfer Core Types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core_types::{AccountId, TransferId};

/// Request to move `amount` from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    #[serde(with = "crate::money::fixed5")]
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(source: AccountId, destination: AccountId, amount: Decimal) -> Self {
        Self {
            source_account_id: source,
            destination_account_id: destination,
            amount,
        }
    }

    /// Both account ids in global lock order (ascending).
    #[inline]
    pub fn lock_order(&self) -> [AccountId; 2] {
        let (a, b) = (self.source_account_id, self.destination_account_id);
        if a <= b { [a, b] } else { [b, a] }
    }
}

/// Immutable audit record of a committed transfer.
///
/// `id` and `created_at` are assigned by the store at insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TransferRecord {
    pub id: TransferId,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    #[serde(with = "crate::money::fixed5")]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Whether `account_id` is the source or the destination.
    #[inline]
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.source_account_id == account_id || self.destination_account_id == account_id
    }
}

/// History ordering: most recent first, ties broken by descending id.
pub fn sort_most_recent_first(records: &mut [TransferRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
