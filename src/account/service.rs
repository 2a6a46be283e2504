//! Account lifecycle service

use std::sync::Arc;

use rust_decimal::Decimal;

use super::models::Account;
use super::repository::AccountRepository;
use crate::core_types::AccountId;
use crate::error::{LedgerError, LedgerResult};
use crate::money::check_precision;
use crate::observer::LedgerObserver;
use crate::store::{LedgerStore, StoreError};

pub struct AccountService<S: LedgerStore> {
    store: Arc<S>,
    observer: Arc<dyn LedgerObserver>,
}

impl<S: LedgerStore> AccountService<S> {
    pub fn new(store: Arc<S>, observer: Arc<dyn LedgerObserver>) -> Self {
        Self { store, observer }
    }

    /// Open an account with `initial_balance`.
    ///
    /// Checks run in order: precision, sign, then uniqueness (enforced by the
    /// store, so two concurrent creates of the same id yield one success).
    pub async fn create_account(
        &self,
        id: AccountId,
        initial_balance: Decimal,
    ) -> LedgerResult<Account> {
        let result = self.insert(id, initial_balance).await;
        match &result {
            Ok(account) => self.observer.account_created(account),
            Err(e) => self.observer.account_rejected(id, e),
        }
        result
    }

    async fn insert(&self, id: AccountId, initial_balance: Decimal) -> LedgerResult<Account> {
        check_precision(initial_balance)?;
        if initial_balance < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance);
        }

        let account = Account::new(id, initial_balance);
        match self.store.accounts().create(None, &account).await {
            Ok(()) => Ok(account),
            Err(StoreError::Duplicate(_)) => Err(LedgerError::DuplicateAccount(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Unlocked snapshot of one account.
    pub async fn get_account(&self, id: AccountId) -> LedgerResult<Account> {
        self.store
            .accounts()
            .get(None, id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }
}
