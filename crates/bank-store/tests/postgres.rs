//! PostgreSQL backend tests.
//!
//! These need a live database and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/bank_test cargo test -p bank-store -- --ignored
//! ```
//!
//! Every test registers users with unique emails so runs do not collide.

use bank_core::{AccountNumber, Decimal, NewAccount, NewTransaction, NewUser};
use bank_store::{PgStore, PgStoreOptions, Store, StoreError, UnitOfWork};

async fn connect() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&url, &PgStoreOptions::default())
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");
    store
}

fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn insert_and_read_back() {
    let store = connect().await;
    let email = unique_email("readback");

    let mut unit = store.begin().await.unwrap();
    let user = unit.insert_user(&NewUser::new(&email, "hash")).await.unwrap();
    let account = unit
        .insert_account(&NewAccount::new(user.user_id, AccountNumber::generate()))
        .await
        .unwrap();
    unit.commit().await.unwrap();

    let mut unit = store.begin().await.unwrap();
    let found = unit
        .find_account_by_number(&account.account_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, account);
    assert_eq!(found.balance, Decimal::ZERO);
    let by_email = unit.find_user_by_email(&email).await.unwrap().unwrap();
    assert_eq!(by_email.user_id, user.user_id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_is_a_unique_violation() {
    let store = connect().await;
    let email = unique_email("dup");

    let mut unit = store.begin().await.unwrap();
    unit.insert_user(&NewUser::new(&email, "hash")).await.unwrap();
    unit.commit().await.unwrap();

    let mut unit = store.begin().await.unwrap();
    let err = unit
        .insert_user(&NewUser::new(&email, "hash"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { .. }));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn transfer_records_cascade_with_account() {
    let store = connect().await;

    let mut unit = store.begin().await.unwrap();
    let user = unit
        .insert_user(&NewUser::new(unique_email("cascade"), "hash"))
        .await
        .unwrap();
    let a = unit
        .insert_account(&NewAccount::new(user.user_id, AccountNumber::generate()))
        .await
        .unwrap();
    let b = unit
        .insert_account(&NewAccount::new(user.user_id, AccountNumber::generate()))
        .await
        .unwrap();
    unit.insert_transaction(&NewTransaction::new(
        a.account_id.clone(),
        b.account_id.clone(),
        Decimal::ONE,
    ))
    .await
    .unwrap();
    assert_eq!(unit.list_transactions(&b.account_id).await.unwrap().len(), 1);

    unit.delete_account(&a.account_id).await.unwrap();
    assert!(unit.list_transactions(&b.account_id).await.unwrap().is_empty());

    let err = unit.delete_user(&user.user_id).await.unwrap_err();
    assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn negative_balance_is_a_check_violation() {
    let store = connect().await;

    let mut unit = store.begin().await.unwrap();
    let user = unit
        .insert_user(&NewUser::new(unique_email("check"), "hash"))
        .await
        .unwrap();
    let a = unit
        .insert_account(&NewAccount::new(user.user_id, AccountNumber::generate()))
        .await
        .unwrap();

    let err = unit
        .set_balance(&a.account_id, Decimal::NEGATIVE_ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CheckViolation { .. }));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn held_row_lock_times_out() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let options = PgStoreOptions {
        lock_timeout: std::time::Duration::from_millis(100),
        ..PgStoreOptions::default()
    };
    let store = PgStore::connect(&url, &options).await.unwrap();
    store.migrate().await.unwrap();

    let mut setup = store.begin().await.unwrap();
    let user = setup
        .insert_user(&NewUser::new(unique_email("lock"), "hash"))
        .await
        .unwrap();
    let a = setup
        .insert_account(&NewAccount::new(user.user_id, AccountNumber::generate()))
        .await
        .unwrap();
    setup.commit().await.unwrap();

    let mut holder = store.begin().await.unwrap();
    holder.lock_accounts(&[a.account_id.clone()]).await.unwrap();

    let mut waiter = store.begin().await.unwrap();
    let err = waiter.lock_accounts(&[a.account_id]).await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout(_)));
    holder.rollback().await.unwrap();
}
