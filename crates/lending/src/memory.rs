//! In-process library store.
//!
//! Implements every repository contract over maps guarded by one async
//! mutex, so each repository call is atomic. Used by the test suites and
//! for running the API without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bibliotech_core::error::CoreError;
use bibliotech_core::library::{BookCopy, Borrower, BorrowerStanding, CopyStatus, StaffUser};
use bibliotech_core::loan::{Loan, LoanStatus, NewLoan};
use bibliotech_core::repository::{
    BorrowerRepository, CopyRepository, LoanRepository, UserRepository,
};
use bibliotech_core::types::DbId;
use chrono::NaiveDate;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    loans: BTreeMap<DbId, Loan>,
    borrowers: BTreeMap<DbId, Borrower>,
    copies: BTreeMap<DbId, BookCopy>,
    users: BTreeMap<DbId, StaffUser>,
    next_id: DbId,
    fail_writes: bool,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_loan(&self, id: DbId) -> Result<(), CoreError> {
        if self.loans.contains_key(&id) {
            Ok(())
        } else {
            Err(CoreError::NotFound { entity: "Loan", id })
        }
    }

    fn check_writable(&self) -> Result<(), CoreError> {
        if self.fail_writes {
            Err(CoreError::Internal("store is read-only".into()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct InMemoryLibrary {
    tables: Mutex<Tables>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding ------------------------------------------------------------

    /// Insert a borrower in good standing.
    pub async fn add_borrower(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Borrower {
        let mut t = self.tables.lock().await;
        let borrower = Borrower {
            id: t.next_id(),
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            standing: BorrowerStanding::Regular,
        };
        t.borrowers.insert(borrower.id, borrower.clone());
        borrower
    }

    /// Insert an available copy.
    pub async fn add_copy(&self, title: &str) -> BookCopy {
        let mut t = self.tables.lock().await;
        let copy = BookCopy {
            id: t.next_id(),
            title: title.to_string(),
            status: CopyStatus::Available,
        };
        t.copies.insert(copy.id, copy.clone());
        copy
    }

    pub async fn add_user(&self, name: &str) -> StaffUser {
        let mut t = self.tables.lock().await;
        let user = StaffUser {
            id: t.next_id(),
            name: name.to_string(),
        };
        t.users.insert(user.id, user.clone());
        user
    }

    /// Insert or replace a borrower.
    pub async fn put_borrower(&self, borrower: Borrower) {
        self.tables
            .lock()
            .await
            .borrowers
            .insert(borrower.id, borrower);
    }

    /// Insert or replace a copy.
    pub async fn put_copy(&self, copy: BookCopy) {
        self.tables.lock().await.copies.insert(copy.id, copy);
    }

    /// Insert or replace a loan as-is.
    pub async fn put_loan(&self, loan: Loan) {
        let mut t = self.tables.lock().await;
        t.next_id = t.next_id.max(loan.id);
        t.loans.insert(loan.id, loan);
    }

    /// Make every subsequent write fail with [`CoreError::Internal`].
    pub async fn set_fail_writes(&self, fail: bool) {
        self.tables.lock().await.fail_writes = fail;
    }

    // -- inspection ---------------------------------------------------------

    pub async fn loan(&self, id: DbId) -> Option<Loan> {
        self.tables.lock().await.loans.get(&id).cloned()
    }

    pub async fn borrower(&self, id: DbId) -> Option<Borrower> {
        self.tables.lock().await.borrowers.get(&id).cloned()
    }

    pub async fn copy(&self, id: DbId) -> Option<BookCopy> {
        self.tables.lock().await.copies.get(&id).cloned()
    }

    pub async fn loans(&self) -> Vec<Loan> {
        self.tables.lock().await.loans.values().cloned().collect()
    }
}

#[async_trait]
impl LoanRepository for InMemoryLibrary {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Loan>, CoreError> {
        Ok(self.loan(id).await)
    }

    async fn create(
        &self,
        loan: NewLoan,
        borrower: &Borrower,
        copy: &BookCopy,
    ) -> Result<Loan, CoreError> {
        let mut t = self.tables.lock().await;
        t.check_writable()?;
        let loan = loan.into_loan(t.next_id());
        t.loans.insert(loan.id, loan.clone());
        t.borrowers.insert(borrower.id, borrower.clone());
        t.copies.insert(copy.id, copy.clone());
        Ok(loan)
    }

    async fn save(&self, loan: &Loan) -> Result<Loan, CoreError> {
        let mut t = self.tables.lock().await;
        t.check_writable()?;
        t.ensure_loan(loan.id)?;
        t.loans.insert(loan.id, loan.clone());
        Ok(loan.clone())
    }

    async fn save_with_parties(
        &self,
        loan: &Loan,
        borrower: &Borrower,
        copy: &BookCopy,
    ) -> Result<Loan, CoreError> {
        let mut t = self.tables.lock().await;
        t.check_writable()?;
        t.ensure_loan(loan.id)?;
        t.loans.insert(loan.id, loan.clone());
        t.borrowers.insert(borrower.id, borrower.clone());
        t.copies.insert(copy.id, copy.clone());
        Ok(loan.clone())
    }

    async fn mark_overdue(&self, ids: &[DbId], today: NaiveDate) -> Result<usize, CoreError> {
        let mut t = self.tables.lock().await;
        t.check_writable()?;
        let mut changed = 0;
        for id in ids {
            if let Some(loan) = t.loans.get_mut(id) {
                if loan.mark_overdue_if_due(today) {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn record_notification(&self, id: DbId, today: NaiveDate) -> Result<bool, CoreError> {
        let mut t = self.tables.lock().await;
        t.check_writable()?;
        match t.loans.get_mut(&id) {
            Some(loan) if loan.status.is_open() => {
                loan.record_notification(today);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_status(&self, status: LoanStatus) -> Result<Vec<Loan>, CoreError> {
        let t = self.tables.lock().await;
        Ok(t.loans
            .values()
            .filter(|l| l.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_status_and_due_date(
        &self,
        status: LoanStatus,
        due_date: NaiveDate,
    ) -> Result<Vec<Loan>, CoreError> {
        let t = self.tables.lock().await;
        Ok(t.loans
            .values()
            .filter(|l| l.status == status && l.due_date == due_date)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BorrowerRepository for InMemoryLibrary {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Borrower>, CoreError> {
        Ok(self.borrower(id).await)
    }
}

#[async_trait]
impl CopyRepository for InMemoryLibrary {
    async fn find_by_id(&self, id: DbId) -> Result<Option<BookCopy>, CoreError> {
        Ok(self.copy(id).await)
    }
}

#[async_trait]
impl UserRepository for InMemoryLibrary {
    async fn find_by_id(&self, id: DbId) -> Result<Option<StaffUser>, CoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn ids_are_unique_across_tables() {
        let store = InMemoryLibrary::new();
        let b = store.add_borrower("Ana", None, None).await;
        let c = store.add_copy("Dom Casmurro").await;
        let u = store.add_user("Staff").await;
        assert_ne!(b.id, c.id);
        assert_ne!(c.id, u.id);
    }

    #[tokio::test]
    async fn failed_write_changes_nothing() {
        let store = InMemoryLibrary::new();
        let b = store.add_borrower("Ana", None, None).await;
        let c = store.add_copy("Dom Casmurro").await;
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let new = NewLoan::new(b.id, c.id, 1, today, None).unwrap();

        store.set_fail_writes(true).await;
        let result = store.create(new, &b, &c).await;

        assert_matches!(result, Err(CoreError::Internal(_)));
        assert!(store.loans().await.is_empty());
    }

    #[tokio::test]
    async fn status_and_due_date_filter() {
        let store = InMemoryLibrary::new();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let due = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        store
            .put_loan(NewLoan::new(1, 2, 3, today, Some(due)).unwrap().into_loan(10))
            .await;
        store
            .put_loan(NewLoan::new(1, 2, 3, today, None).unwrap().into_loan(11))
            .await;

        let found = store
            .find_by_status_and_due_date(LoanStatus::Pending, due)
            .await
            .unwrap();
        assert_eq!(found.iter().map(|l| l.id).collect::<Vec<_>>(), vec![10]);
    }

    #[tokio::test]
    async fn save_with_parties_of_unknown_loan_is_not_found() {
        let store = InMemoryLibrary::new();
        let b = store.add_borrower("Ana", None, None).await;
        let c = store.add_copy("Dom Casmurro").await;
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let loan = NewLoan::new(b.id, c.id, 1, today, None).unwrap().into_loan(77);

        let result = store.save_with_parties(&loan, &b, &c).await;

        assert_matches!(result, Err(CoreError::NotFound { entity: "Loan", id: 77 }));
        assert!(store.loans().await.is_empty());
    }

    #[tokio::test]
    async fn mark_overdue_skips_loans_closed_or_renewed_since_read() {
        let store = InMemoryLibrary::new();
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let due = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let later = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

        let pending = NewLoan::new(1, 2, 3, start, Some(due)).unwrap().into_loan(10);
        let mut returned = pending.clone();
        returned.id = 11;
        returned.complete(3, today, None, false).unwrap();
        let mut renewed = pending.clone();
        renewed.id = 12;
        renewed.due_date = later;
        for loan in [pending, returned, renewed] {
            store.put_loan(loan).await;
        }

        let changed = store.mark_overdue(&[10, 11, 12, 99], today).await.unwrap();

        assert_eq!(changed, 1);
        assert_eq!(store.loan(10).await.unwrap().status, LoanStatus::Overdue);
        let returned = store.loan(11).await.unwrap();
        assert_eq!(returned.status, LoanStatus::Returned);
        assert_eq!(returned.completion_date, Some(today));
        assert_eq!(store.loan(12).await.unwrap().status, LoanStatus::Pending);
    }

    #[tokio::test]
    async fn record_notification_only_touches_open_loans() {
        let store = InMemoryLibrary::new();
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let open = NewLoan::new(1, 2, 3, start, None).unwrap().into_loan(10);
        let mut cancelled = open.clone();
        cancelled.id = 11;
        cancelled.cancel(3, today).unwrap();
        store.put_loan(open).await;
        store.put_loan(cancelled.clone()).await;

        assert!(store.record_notification(10, today).await.unwrap());
        assert!(!store.record_notification(11, today).await.unwrap());
        assert!(!store.record_notification(99, today).await.unwrap());

        assert_eq!(store.loan(10).await.unwrap().last_notified_date, Some(today));
        assert_eq!(store.loan(11).await.unwrap(), cancelled);
    }
}
