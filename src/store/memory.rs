//! In-Memory Ledger Store
//!
//! Process-local backend honouring the same unit-of-work contract as the
//! PostgreSQL store:
//!
//! - every account row has its own async mutex; `get_for_update` holds it until
//!   the unit commits, rolls back, or is dropped
//! - writes inside a unit are staged and published under a single write lock at
//!   commit, so plain readers see either none or all of a unit's effects
//! - plain reads only touch the committed snapshot and never wait on row locks
//!
//! Faults can be injected at named points to exercise rollback paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LedgerStore, StoreError, UnitOptions};
use crate::account::{Account, AccountRepository};
use crate::core_types::{AccountId, TransferId};
use crate::transfer::types::sort_most_recent_first;
use crate::transfer::{TransactionRepository, TransferRecord, TransferRequest};

/// Points where a fault can be injected. An armed fault fails every call
/// reaching that point with [`StoreError::Unavailable`] until cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Connect,
    LockRow,
    UpdateBalance,
    Append,
    Commit,
    Rollback,
}

#[derive(Default)]
struct Committed {
    balances: BTreeMap<AccountId, Decimal>,
    records: Vec<TransferRecord>,
}

struct MemoryState {
    committed: RwLock<Committed>,
    row_locks: DashMap<AccountId, Arc<Mutex<()>>>,
    next_transfer_id: AtomicI64,
    faults: DashSet<FaultPoint>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            committed: RwLock::new(Committed::default()),
            row_locks: DashMap::new(),
            next_transfer_id: AtomicI64::new(1),
            faults: DashSet::new(),
            commits: AtomicUsize::new(0),
            rollbacks: AtomicUsize::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Committed> {
        self.committed.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Committed> {
        self.committed.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_fault(&self, point: FaultPoint) -> Result<(), StoreError> {
        if self.faults.contains(&point) {
            return Err(StoreError::Unavailable(format!(
                "injected fault at {:?}",
                point
            )));
        }
        Ok(())
    }

    fn row_lock(&self, id: AccountId) -> Arc<Mutex<()>> {
        self.row_locks.entry(id).or_default().value().clone()
    }

    fn committed_balance(&self, id: AccountId) -> Option<Decimal> {
        self.read().balances.get(&id).copied()
    }

    fn next_record(&self, transfer: &TransferRequest) -> TransferRecord {
        TransferRecord {
            id: self.next_transfer_id.fetch_add(1, Ordering::SeqCst),
            source_account_id: transfer.source_account_id,
            destination_account_id: transfer.destination_account_id,
            amount: transfer.amount,
            created_at: Utc::now(),
        }
    }
}

fn check_non_negative(id: AccountId, balance: Decimal) -> Result<(), StoreError> {
    if balance < Decimal::ZERO {
        return Err(StoreError::Backend(format!(
            "check constraint violated: balance of account {} would be negative",
            id
        )));
    }
    Ok(())
}

async fn acquire(
    lock: Arc<Mutex<()>>,
    id: AccountId,
    timeout: Option<Duration>,
) -> Result<OwnedMutexGuard<()>, StoreError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, lock.lock_owned())
            .await
            .map_err(|_| {
                StoreError::Contention(format!(
                    "lock wait on account {} exceeded {:?}",
                    id, limit
                ))
            }),
        None => Ok(lock.lock_owned().await),
    }
}

/// Unit of work over a [`MemoryLedger`].
pub struct MemoryTx {
    state: Arc<MemoryState>,
    lock_timeout: Option<Duration>,
    held: BTreeMap<AccountId, OwnedMutexGuard<()>>,
    created: BTreeMap<AccountId, Decimal>,
    balances: BTreeMap<AccountId, Decimal>,
    records: Vec<TransferRecord>,
}

impl MemoryTx {
    fn new(state: Arc<MemoryState>, options: UnitOptions) -> Self {
        Self {
            state,
            lock_timeout: options.lock_timeout,
            held: BTreeMap::new(),
            created: BTreeMap::new(),
            balances: BTreeMap::new(),
            records: Vec::new(),
        }
    }

    async fn lock_row(&mut self, id: AccountId) -> Result<(), StoreError> {
        if self.held.contains_key(&id) {
            return Ok(());
        }
        self.state.check_fault(FaultPoint::LockRow)?;
        let guard = acquire(self.state.row_lock(id), id, self.lock_timeout).await?;
        self.held.insert(id, guard);
        Ok(())
    }

    /// Balance as seen from inside this unit.
    fn visible_balance(&self, id: AccountId) -> Option<Decimal> {
        self.balances
            .get(&id)
            .or_else(|| self.created.get(&id))
            .copied()
            .or_else(|| self.state.committed_balance(id))
    }

    /// Account ids currently locked by this unit.
    pub fn locked_accounts(&self) -> Vec<AccountId> {
        self.held.keys().copied().collect()
    }

    fn publish(self) -> Result<(), StoreError> {
        let mut committed = self.state.write();
        if let Some(id) = self
            .created
            .keys()
            .find(|id| committed.balances.contains_key(id))
        {
            return Err(StoreError::Duplicate(format!("account {} already exists", id)));
        }
        committed.balances.extend(self.created.iter());
        committed.balances.extend(self.balances.iter());
        committed.records.extend(self.records.iter().cloned());
        Ok(())
        // row guards in `self.held` are released when `self` drops here
    }
}

/// Account repository over a [`MemoryLedger`].
pub struct MemoryAccounts {
    state: Arc<MemoryState>,
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    type Tx = MemoryTx;

    async fn create(&self, tx: Option<&mut MemoryTx>, account: &Account) -> Result<(), StoreError> {
        check_non_negative(account.id, account.balance)?;
        match tx {
            Some(tx) => {
                if tx.visible_balance(account.id).is_some() {
                    return Err(StoreError::Duplicate(format!(
                        "account {} already exists",
                        account.id
                    )));
                }
                tx.created.insert(account.id, account.balance);
                Ok(())
            }
            None => {
                self.state.check_fault(FaultPoint::Connect)?;
                let mut committed = self.state.write();
                if committed.balances.contains_key(&account.id) {
                    return Err(StoreError::Duplicate(format!(
                        "account {} already exists",
                        account.id
                    )));
                }
                committed.balances.insert(account.id, account.balance);
                Ok(())
            }
        }
    }

    async fn get(
        &self,
        tx: Option<&mut MemoryTx>,
        id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        let balance = match tx {
            Some(tx) => tx.visible_balance(id),
            None => {
                self.state.check_fault(FaultPoint::Connect)?;
                self.state.committed_balance(id)
            }
        };
        Ok(balance.map(|balance| Account::new(id, balance)))
    }

    async fn get_for_update(
        &self,
        tx: &mut MemoryTx,
        id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        if tx.visible_balance(id).is_none() {
            return Ok(None);
        }
        tx.lock_row(id).await?;
        // re-read under the lock: the pre-lock value may be stale
        Ok(tx.visible_balance(id).map(|balance| Account::new(id, balance)))
    }

    async fn update_balance(
        &self,
        tx: Option<&mut MemoryTx>,
        id: AccountId,
        balance: Decimal,
    ) -> Result<bool, StoreError> {
        self.state.check_fault(FaultPoint::UpdateBalance)?;
        check_non_negative(id, balance)?;
        match tx {
            Some(tx) => {
                if tx.visible_balance(id).is_none() {
                    return Ok(false);
                }
                tx.lock_row(id).await?;
                tx.balances.insert(id, balance);
                Ok(true)
            }
            None => {
                let _guard = acquire(self.state.row_lock(id), id, None).await?;
                let mut committed = self.state.write();
                match committed.balances.get_mut(&id) {
                    Some(current) => {
                        *current = balance;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    }
}

/// Transaction repository over a [`MemoryLedger`].
pub struct MemoryTransfers {
    state: Arc<MemoryState>,
}

impl MemoryTransfers {
    fn snapshot<F>(&self, keep: F) -> Vec<TransferRecord>
    where
        F: Fn(&TransferRecord) -> bool,
    {
        let mut records: Vec<TransferRecord> = self
            .state
            .read()
            .records
            .iter()
            .filter(|r| keep(r))
            .cloned()
            .collect();
        sort_most_recent_first(&mut records);
        records
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransfers {
    type Tx = MemoryTx;

    async fn append(
        &self,
        tx: Option<&mut MemoryTx>,
        transfer: &TransferRequest,
    ) -> Result<TransferRecord, StoreError> {
        self.state.check_fault(FaultPoint::Append)?;
        let record = self.state.next_record(transfer);
        match tx {
            Some(tx) => tx.records.push(record.clone()),
            None => self.state.write().records.push(record.clone()),
        }
        Ok(record)
    }

    async fn get(&self, id: TransferId) -> Result<Option<TransferRecord>, StoreError> {
        self.state.check_fault(FaultPoint::Connect)?;
        Ok(self
            .state
            .read()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<TransferRecord>, StoreError> {
        self.state.check_fault(FaultPoint::Connect)?;
        Ok(self.snapshot(|_| true))
    }

    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        self.state.check_fault(FaultPoint::Connect)?;
        Ok(self.snapshot(|r| r.involves(account_id)))
    }
}

/// In-memory ledger store
pub struct MemoryLedger {
    state: Arc<MemoryState>,
    accounts: MemoryAccounts,
    transfers: MemoryTransfers,
}

impl MemoryLedger {
    pub fn new() -> Self {
        let state = Arc::new(MemoryState::new());
        Self {
            accounts: MemoryAccounts {
                state: state.clone(),
            },
            transfers: MemoryTransfers {
                state: state.clone(),
            },
            state,
        }
    }

    /// Arm a fault; every call reaching `point` fails until cleared.
    pub fn inject_fault(&self, point: FaultPoint) {
        self.state.faults.insert(point);
    }

    pub fn clear_fault(&self, point: FaultPoint) {
        self.state.faults.remove(&point);
    }

    /// Committed balance of every account, keyed by id.
    pub fn balances(&self) -> BTreeMap<AccountId, Decimal> {
        self.state.read().balances.clone()
    }

    /// Sum of all committed balances.
    pub fn total_balance(&self) -> Decimal {
        self.state.read().balances.values().copied().sum()
    }

    pub fn commit_count(&self) -> usize {
        self.state.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.state.rollbacks.load(Ordering::SeqCst)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    type Tx = MemoryTx;
    type Accounts = MemoryAccounts;
    type Transfers = MemoryTransfers;

    fn accounts(&self) -> &MemoryAccounts {
        &self.accounts
    }

    fn transfers(&self) -> &MemoryTransfers {
        &self.transfers
    }

    async fn begin(&self, options: UnitOptions) -> Result<MemoryTx, StoreError> {
        self.state.check_fault(FaultPoint::Connect)?;
        Ok(MemoryTx::new(self.state.clone(), options))
    }

    async fn commit(&self, tx: MemoryTx) -> Result<(), StoreError> {
        self.state.check_fault(FaultPoint::Commit)?;
        tx.publish()?;
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<(), StoreError> {
        // staged writes and row locks go away with the unit either way
        drop(tx);
        self.state.check_fault(FaultPoint::Rollback)?;
        self.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.state.check_fault(FaultPoint::Connect)
    }
}
