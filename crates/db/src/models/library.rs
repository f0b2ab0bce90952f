//! Borrower, copy and staff row models.

use bibliotech_core::error::CoreError;
use bibliotech_core::library::{BookCopy, Borrower, BorrowerStanding, CopyStatus, StaffUser};
use bibliotech_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `borrowers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BorrowerRow {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub standing: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<BorrowerRow> for Borrower {
    type Error = CoreError;

    fn try_from(row: BorrowerRow) -> Result<Self, Self::Error> {
        let standing = BorrowerStanding::parse(&row.standing)
            .map_err(|e| CoreError::Internal(format!("Corrupt borrower row {}: {e}", row.id)))?;
        Ok(Borrower {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            standing,
        })
    }
}

/// DTO for inserting a borrower.
#[derive(Debug, Clone)]
pub struct CreateBorrower {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A row from the `book_copies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CopyRow {
    pub id: DbId,
    pub title: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CopyRow> for BookCopy {
    type Error = CoreError;

    fn try_from(row: CopyRow) -> Result<Self, Self::Error> {
        let status = CopyStatus::parse(&row.status)
            .map_err(|e| CoreError::Internal(format!("Corrupt copy row {}: {e}", row.id)))?;
        Ok(BookCopy {
            id: row.id,
            title: row.title,
            status,
        })
    }
}

/// A row from the `staff_users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StaffUserRow {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

impl From<StaffUserRow> for StaffUser {
    fn from(row: StaffUserRow) -> Self {
        StaffUser {
            id: row.id,
            name: row.name,
        }
    }
}
