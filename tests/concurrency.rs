//! Concurrency tests for the transfer engine over the in-memory store.
//!
//! Run on a multi-threaded runtime so transfers really race for row locks.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;

use ledger_transfer::account::AccountRepository;
use ledger_transfer::{
    Account, AccountId, EngineConfig, LedgerError, LedgerStore, MemoryLedger, NoopObserver,
    TransferEngine, TransferRecord, UnitOptions,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn setup(
    accounts: &[(AccountId, &str)],
    config: EngineConfig,
) -> (Arc<MemoryLedger>, Arc<TransferEngine<MemoryLedger>>) {
    let ledger = Arc::new(MemoryLedger::new());
    for (id, balance) in accounts {
        ledger
            .accounts()
            .create(None, &Account::new(*id, dec(balance)))
            .await
            .unwrap();
    }
    let engine = TransferEngine::new(ledger.clone(), Arc::new(NoopObserver)).with_config(config);
    (ledger, Arc::new(engine))
}

/// Deterministic LCG so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn opposite_direction_storm_terminates_and_restores_balances() {
    let (ledger, engine) = setup(&[(1, "1000"), (2, "1000")], EngineConfig::default()).await;

    let handles: Vec<_> = (0..400)
        .map(|i| {
            let engine = engine.clone();
            let (source, destination) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
            tokio::spawn(async move { engine.transfer(source, destination, dec("2.5")).await })
        })
        .collect();

    let results = tokio::time::timeout(Duration::from_secs(30), join_all(handles))
        .await
        .expect("opposite-direction transfers deadlocked");

    for result in results {
        result.unwrap().unwrap();
    }
    assert_eq!(ledger.balances()[&1], dec("1000"));
    assert_eq!(ledger.balances()[&2], dec("1000"));
    assert_eq!(engine.transfer_history().await.unwrap().len(), 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn random_transfers_conserve_total_and_reconcile_with_history() {
    let accounts: Vec<(AccountId, &str)> = (1..=10).map(|id| (id, "100")).collect();
    let (ledger, engine) = setup(&accounts, EngineConfig::default()).await;
    let initial_total = ledger.total_balance();

    let mut rng = Lcg(42);
    let handles: Vec<_> = (0..600)
        .map(|_| {
            let source = 1 + rng.below(10) as AccountId;
            let destination = 1 + rng.below(10) as AccountId;
            // up to 60.00000 in steps of 0.00001; some will be insufficient
            let amount = Decimal::new(1 + rng.below(6_000_000) as i64, 5);
            let engine = engine.clone();
            tokio::spawn(async move { engine.transfer(source, destination, amount).await })
        })
        .collect();

    let mut committed: Vec<TransferRecord> = Vec::new();
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(record) => committed.push(record),
            Err(LedgerError::SameAccount) | Err(LedgerError::InsufficientBalance { .. }) => {}
            Err(other) => panic!("unexpected outcome: {:?}", other),
        }
    }

    let balances = ledger.balances();
    assert_eq!(ledger.total_balance(), initial_total);
    assert!(balances.values().all(|b| *b >= Decimal::ZERO));

    // every committed transfer has exactly one record, and replaying the
    // records from the initial state yields the final balances
    let history = engine.transfer_history().await.unwrap();
    assert_eq!(history.len(), committed.len());

    let mut replayed: BTreeMap<AccountId, Decimal> =
        (1..=10).map(|id| (id, dec("100"))).collect();
    for record in &history {
        *replayed.get_mut(&record.source_account_id).unwrap() -= record.amount;
        *replayed.get_mut(&record.destination_account_id).unwrap() += record.amount;
    }
    assert_eq!(replayed, balances);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_drain_never_overdraws() {
    let (ledger, engine) = setup(&[(1, "100"), (2, "0"), (3, "0")], EngineConfig::default()).await;

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let engine = engine.clone();
            let destination = if i % 2 == 0 { 2 } else { 3 };
            tokio::spawn(async move { engine.transfer(1, destination, dec("10")).await })
        })
        .collect();

    let mut succeeded = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert_eq!(e.code(), "INSUFFICIENT_BALANCE"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(ledger.balances()[&1], Decimal::ZERO);
    assert_eq!(ledger.balances()[&2] + ledger.balances()[&3], dec("100"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lock_timeout_contention_leaves_state_untouched() {
    let config = EngineConfig {
        lock_timeout: Some(Duration::from_millis(25)),
        ..EngineConfig::default()
    };
    let (ledger, engine) = setup(&[(1, "100"), (2, "100")], config).await;

    let mut holder = ledger.begin(UnitOptions::default()).await.unwrap();
    ledger.accounts().get_for_update(&mut holder, 1).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let engine = engine.clone();
            let (source, destination) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
            tokio::spawn(async move { engine.transfer(source, destination, dec("1")).await })
        })
        .collect();

    for result in join_all(handles).await {
        let err = result.unwrap().unwrap_err();
        assert!(matches!(err, LedgerError::Contention(_)), "{:?}", err);
        assert!(err.is_retryable());
    }

    ledger.rollback(holder).await.unwrap();
    assert_eq!(ledger.balances()[&1], dec("100"));
    assert_eq!(ledger.balances()[&2], dec("100"));
    assert!(engine.transfer_history().await.unwrap().is_empty());

    // locks released: transfers go through again
    engine.transfer(1, 2, dec("1")).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_proceed_while_rows_are_locked() {
    let (ledger, engine) = setup(&[(1, "100"), (2, "100")], EngineConfig::default()).await;
    engine.transfer(1, 2, dec("5")).await.unwrap();

    let mut holder = ledger.begin(UnitOptions::default()).await.unwrap();
    ledger.accounts().get_for_update(&mut holder, 1).await.unwrap();
    ledger.accounts().get_for_update(&mut holder, 2).await.unwrap();

    let reads = async {
        let account = ledger.accounts().get(None, 1).await.unwrap().unwrap();
        let history = engine.account_transfer_history(2).await.unwrap();
        (account, history)
    };
    let (account, history) = tokio::time::timeout(Duration::from_millis(500), reads)
        .await
        .expect("plain reads blocked on row locks");

    assert_eq!(account.balance, dec("95"));
    assert_eq!(history.len(), 1);
    drop(holder);
}
