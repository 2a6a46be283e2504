//! Account repository contract
//!
//! Typed accessor over the ledger store's `accounts` collection. Every
//! operation takes the ambient unit of work explicitly so that calls made
//! inside the transfer engine's atomic unit never open a second transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::models::Account;
use crate::core_types::AccountId;
use crate::store::StoreError;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Unit-of-work handle shared with the matching transaction repository.
    type Tx: Send;

    /// Insert a new account. A taken id yields [`StoreError::Duplicate`].
    async fn create(&self, tx: Option<&mut Self::Tx>, account: &Account) -> Result<(), StoreError>;

    /// Plain point read. Never blocks on row locks held by other units.
    async fn get(
        &self,
        tx: Option<&mut Self::Tx>,
        id: AccountId,
    ) -> Result<Option<Account>, StoreError>;

    /// Point read that takes an exclusive row lock held until the unit ends.
    ///
    /// A lock wait that times out or is chosen as a deadlock victim yields
    /// [`StoreError::Contention`]. A missing row yields `Ok(None)`.
    async fn get_for_update(
        &self,
        tx: &mut Self::Tx,
        id: AccountId,
    ) -> Result<Option<Account>, StoreError>;

    /// Overwrite the balance. Returns `false` when no such row exists.
    async fn update_balance(
        &self,
        tx: Option<&mut Self::Tx>,
        id: AccountId,
        balance: Decimal,
    ) -> Result<bool, StoreError>;
}
