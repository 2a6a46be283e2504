use std::sync::Arc;

use crate::account::AccountService;
use crate::observer::LedgerObserver;
use crate::store::LedgerStore;
use crate::transfer::{EngineConfig, TransferEngine};

/// Gateway application state (shared)
pub struct AppState<S: LedgerStore> {
    pub store: Arc<S>,
    pub accounts: AccountService<S>,
    pub engine: TransferEngine<S>,
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(store: Arc<S>, observer: Arc<dyn LedgerObserver>, config: EngineConfig) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), observer.clone()),
            engine: TransferEngine::new(store.clone(), observer).with_config(config),
            store,
        }
    }
}
