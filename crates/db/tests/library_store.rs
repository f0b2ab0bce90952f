//! Integration tests for the PostgreSQL library store.
//!
//! Need a live database (`DATABASE_URL`); run with `--ignored`.

use assert_matches::assert_matches;
use bibliotech_core::error::CoreError;
use bibliotech_core::library::{BorrowerStanding, CopyStatus};
use bibliotech_core::loan::{LoanStatus, NewLoan};
use bibliotech_core::repository::{BorrowerRepository, CopyRepository, LoanRepository};
use bibliotech_db::models::library::CreateBorrower;
use bibliotech_db::repositories::{BorrowerRepo, CopyRepo, UserRepo};
use bibliotech_db::PgLibraryStore;
use chrono::NaiveDate;
use sqlx::PgPool;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Seed {
    borrower_id: i64,
    copy_id: i64,
    user_id: i64,
}

async fn seed(pool: &PgPool) -> Seed {
    let borrower = BorrowerRepo::create(
        pool,
        &CreateBorrower {
            name: "Ana".into(),
            email: Some("ana@example.com".into()),
            phone: None,
        },
    )
    .await
    .unwrap();
    let copy = CopyRepo::create(pool, "Dom Casmurro").await.unwrap();
    let user = UserRepo::create(pool, "Front desk").await.unwrap();
    Seed {
        borrower_id: borrower.id,
        copy_id: copy.id,
        user_id: user.id,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn health_check_succeeds(pool: PgPool) {
    bibliotech_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn create_writes_loan_and_parties_together(pool: PgPool) {
    let ids = seed(&pool).await;
    let store = PgLibraryStore::new(pool);

    let mut borrower = BorrowerRepository::find_by_id(&store, ids.borrower_id)
        .await
        .unwrap()
        .unwrap();
    let mut copy = CopyRepository::find_by_id(&store, ids.copy_id)
        .await
        .unwrap()
        .unwrap();
    borrower.standing = BorrowerStanding::Indebted;
    copy.status = CopyStatus::Loaned;

    let new = NewLoan::new(borrower.id, copy.id, ids.user_id, date(2025, 3, 1), None).unwrap();
    let loan = store.create(new, &borrower, &copy).await.unwrap();

    assert_eq!(loan.status, LoanStatus::Pending);
    assert_eq!(loan.due_date, date(2025, 3, 8));
    let stored = BorrowerRepository::find_by_id(&store, borrower.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.standing, BorrowerStanding::Indebted);
    let stored = CopyRepository::find_by_id(&store, copy.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, CopyStatus::Loaned);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn mark_overdue_and_status_queries(pool: PgPool) {
    let ids = seed(&pool).await;
    let store = PgLibraryStore::new(pool);
    let borrower = BorrowerRepository::find_by_id(&store, ids.borrower_id)
        .await
        .unwrap()
        .unwrap();
    let copy = CopyRepository::find_by_id(&store, ids.copy_id)
        .await
        .unwrap()
        .unwrap();

    let new = NewLoan::new(
        borrower.id,
        copy.id,
        ids.user_id,
        date(2025, 3, 1),
        Some(date(2025, 3, 2)),
    )
    .unwrap();
    let loan = store.create(new, &borrower, &copy).await.unwrap();

    let due = store
        .find_by_status_and_due_date(LoanStatus::Pending, date(2025, 3, 2))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);

    let changed = store.mark_overdue(&[loan.id], date(2025, 3, 3)).await.unwrap();
    assert_eq!(changed, 1);
    // Already overdue: nothing left to change.
    let changed = store.mark_overdue(&[loan.id], date(2025, 3, 3)).await.unwrap();
    assert_eq!(changed, 0);

    let overdue = store.find_by_status(LoanStatus::Overdue).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, loan.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn sweep_writes_leave_a_closed_loan_alone(pool: PgPool) {
    let ids = seed(&pool).await;
    let store = PgLibraryStore::new(pool);
    let borrower = BorrowerRepository::find_by_id(&store, ids.borrower_id)
        .await
        .unwrap()
        .unwrap();
    let copy = CopyRepository::find_by_id(&store, ids.copy_id)
        .await
        .unwrap()
        .unwrap();
    let new = NewLoan::new(
        borrower.id,
        copy.id,
        ids.user_id,
        date(2025, 3, 1),
        Some(date(2025, 3, 2)),
    )
    .unwrap();
    let mut loan = store.create(new, &borrower, &copy).await.unwrap();

    loan.complete(ids.user_id, date(2025, 3, 3), None, false).unwrap();
    let returned = store.save(&loan).await.unwrap();

    assert_eq!(
        store.mark_overdue(&[loan.id], date(2025, 3, 3)).await.unwrap(),
        0
    );
    assert!(!store
        .record_notification(loan.id, date(2025, 3, 3))
        .await
        .unwrap());
    let stored = LoanRepository::find_by_id(&store, loan.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, returned);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn second_open_loan_for_a_copy_is_an_invalid_state(pool: PgPool) {
    let ids = seed(&pool).await;
    let store = PgLibraryStore::new(pool);
    let borrower = BorrowerRepository::find_by_id(&store, ids.borrower_id)
        .await
        .unwrap()
        .unwrap();
    let copy = CopyRepository::find_by_id(&store, ids.copy_id)
        .await
        .unwrap()
        .unwrap();
    let new = || {
        NewLoan::new(borrower.id, copy.id, ids.user_id, date(2025, 3, 1), None).unwrap()
    };

    store.create(new(), &borrower, &copy).await.unwrap();
    let second = store.create(new(), &borrower, &copy).await;

    assert_matches!(
        second,
        Err(CoreError::InvalidState(msg)) if msg.contains("already has an open loan")
    );
    assert_eq!(
        store.find_by_status(LoanStatus::Pending).await.unwrap().len(),
        1
    );
}
