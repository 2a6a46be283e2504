//! Transaction repository contract
//!
//! Append-only access to the `transactions` collection (transfer audit log).

use async_trait::async_trait;

use super::types::{TransferRecord, TransferRequest};
use crate::core_types::{AccountId, TransferId};
use crate::store::StoreError;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Unit-of-work handle shared with the matching account repository.
    type Tx: Send;

    /// Append one record; the store assigns `id` and `created_at`.
    async fn append(
        &self,
        tx: Option<&mut Self::Tx>,
        transfer: &TransferRequest,
    ) -> Result<TransferRecord, StoreError>;

    async fn get(&self, id: TransferId) -> Result<Option<TransferRecord>, StoreError>;

    /// All records, most recent first.
    async fn list_all(&self) -> Result<Vec<TransferRecord>, StoreError>;

    /// Records where `account_id` is source or destination, most recent first.
    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransferRecord>, StoreError>;
}
