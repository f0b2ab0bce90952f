//! Borrowers, physical copies and staff users referenced by loans.
//!
//! Loans hold only ids; these records are looked up through the
//! [`repository`](crate::repository) contracts. The standing enums capture
//! the side effects a loan lifecycle has on the borrower and the copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Borrower
// ---------------------------------------------------------------------------

/// Whether a borrower is currently allowed to take a new loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowerStanding {
    /// No outstanding loan, may borrow.
    Regular,
    /// Holds an open loan.
    Indebted,
    /// Lost a copy; blocked until staff clears the record.
    Irregular,
}

impl BorrowerStanding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Indebted => "indebted",
            Self::Irregular => "irregular",
        }
    }

    pub fn parse(label: &str) -> Result<Self, CoreError> {
        match label {
            "regular" => Ok(Self::Regular),
            "indebted" => Ok(Self::Indebted),
            "irregular" => Ok(Self::Irregular),
            _ => Err(CoreError::Validation(format!(
                "Unknown borrower standing: '{label}'"
            ))),
        }
    }
}

impl fmt::Display for BorrowerStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A library member who can borrow copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub standing: BorrowerStanding,
}

impl Borrower {
    /// Check that the borrower may take a new loan.
    pub fn ensure_eligible(&self) -> Result<(), CoreError> {
        match self.standing {
            BorrowerStanding::Regular => Ok(()),
            BorrowerStanding::Indebted => Err(CoreError::Validation(format!(
                "Borrower {} already has an outstanding loan",
                self.id
            ))),
            BorrowerStanding::Irregular => Err(CoreError::Validation(format!(
                "Borrower {} has an irregular record and cannot borrow",
                self.id
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

/// Circulation status of one physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    Available,
    Loaned,
    Lost,
}

impl CopyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Loaned => "loaned",
            Self::Lost => "lost",
        }
    }

    pub fn parse(label: &str) -> Result<Self, CoreError> {
        match label {
            "available" => Ok(Self::Available),
            "loaned" => Ok(Self::Loaned),
            "lost" => Ok(Self::Lost),
            _ => Err(CoreError::Validation(format!(
                "Unknown copy status: '{label}'"
            ))),
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical copy of a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCopy {
    pub id: DbId,
    pub title: String,
    pub status: CopyStatus,
}

impl BookCopy {
    /// Check that the copy is on the shelf.
    pub fn ensure_available(&self) -> Result<(), CoreError> {
        if self.status == CopyStatus::Available {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Copy {} of '{}' is not available (status: {})",
                self.id, self.title, self.status
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

/// A staff member who registers and closes loans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: DbId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
