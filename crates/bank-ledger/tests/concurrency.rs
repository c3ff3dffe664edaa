//! Concurrent transfers against one source account.

use std::sync::Arc;

use bank_core::{Account, Decimal};
use bank_ledger::{Ledger, Params, PasswordHasher};
use bank_store::MemoryStore;
use futures::future::join_all;

fn ledger() -> Ledger<MemoryStore> {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
    Ledger::with_hasher(Arc::new(MemoryStore::new()), PasswordHasher::new(params))
}

async fn open_accounts(ledger: &Ledger<MemoryStore>, count: usize) -> Vec<Account> {
    let user = ledger.create_user("owner@x.com", "Aa1!2345").await.unwrap();
    let mut accounts = Vec::with_capacity(count);
    for _ in 0..count {
        accounts.push(ledger.create_account(&user.user_id).await.unwrap());
    }
    accounts
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_never_overdraw() {
    let ledger = Arc::new(ledger());
    let accounts = open_accounts(&ledger, 2).await;
    let (source, sink) = (&accounts[0], &accounts[1]);
    ledger
        .update_account(&source.account_number, Decimal::from(50))
        .await
        .unwrap();

    let attempts = (0..20).map(|_| {
        let ledger = Arc::clone(&ledger);
        let from = source.account_id.clone();
        let to = sink.account_id.clone();
        tokio::spawn(async move { ledger.create_transaction(&from, &to, Decimal::TEN).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 5);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(bank_core::LedgerError::is_amount_too_small));

    let source = ledger.get_account(&source.account_number).await.unwrap();
    let sink = ledger.get_account(&sink.account_number).await.unwrap();
    assert_eq!(source.balance, Decimal::ZERO);
    assert_eq!(sink.balance, Decimal::from(50));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossing_transfers_conserve_the_total() {
    let ledger = Arc::new(ledger());
    let accounts = open_accounts(&ledger, 3).await;
    for account in &accounts {
        ledger
            .update_account(&account.account_number, Decimal::ONE_HUNDRED)
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..30 {
        let ledger = Arc::clone(&ledger);
        let from = accounts[i % 3].account_id.clone();
        let to = accounts[(i + 1) % 3].account_id.clone();
        let amount = Decimal::new(i64::try_from(i).unwrap() + 1, 1);
        handles.push(tokio::spawn(async move {
            ledger.create_transaction(&from, &to, amount).await
        }));
    }
    for handle in join_all(handles).await {
        handle.unwrap().unwrap();
    }

    let total: Decimal = ledger
        .list_accounts()
        .await
        .unwrap()
        .iter()
        .map(|a| a.balance)
        .sum();
    assert_eq!(total, Decimal::from(300));
    assert!(ledger
        .list_accounts()
        .await
        .unwrap()
        .iter()
        .all(|a| a.balance >= Decimal::ZERO));
}
