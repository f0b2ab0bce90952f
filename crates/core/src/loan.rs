//! Loan entity, status constants and lifecycle state machine.
//!
//! This module lives in `core` (zero internal deps) so the facade, the
//! overdue sweep and every repository implementation share one definition
//! of which status changes are legal.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Period constants
// ---------------------------------------------------------------------------

/// Default loan period, in days, when no explicit due date is requested.
pub const LOAN_PERIOD_DAYS: u64 = 7;

/// Number of days a renewal adds to the due date.
pub const RENEWAL_DAYS: u64 = 7;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// String label for [`LoanStatus::Pending`].
pub const STATUS_PENDING: &str = "pending";
/// String label for [`LoanStatus::Overdue`].
pub const STATUS_OVERDUE: &str = "overdue";
/// String label for [`LoanStatus::Returned`].
pub const STATUS_RETURNED: &str = "returned";
/// String label for [`LoanStatus::Lost`].
pub const STATUS_LOST: &str = "lost";
/// String label for [`LoanStatus::Cancelled`].
pub const STATUS_CANCELLED: &str = "cancelled";

/// All valid loan status labels.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_OVERDUE,
    STATUS_RETURNED,
    STATUS_LOST,
    STATUS_CANCELLED,
];

/// Lifecycle status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// The copy is with the borrower and the due date has not passed.
    Pending,
    /// The due date passed without the copy being returned.
    Overdue,
    /// The copy came back. Terminal.
    Returned,
    /// The copy was declared lost. Terminal.
    Lost,
    /// The loan was voided by staff. Terminal.
    Cancelled,
}

impl LoanStatus {
    /// Stable string label, as stored in the `loans.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Overdue => STATUS_OVERDUE,
            Self::Returned => STATUS_RETURNED,
            Self::Lost => STATUS_LOST,
            Self::Cancelled => STATUS_CANCELLED,
        }
    }

    /// Parse a status label.
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        match label {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_OVERDUE => Ok(Self::Overdue),
            STATUS_RETURNED => Ok(Self::Returned),
            STATUS_LOST => Ok(Self::Lost),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            _ => Err(CoreError::Validation(format!(
                "Unknown loan status: '{label}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Whether no further transition may leave this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Returned | Self::Lost | Self::Cancelled)
    }

    /// Whether the loan is still open (the copy is out).
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::LoanStatus::{self, Cancelled, Lost, Overdue, Pending, Returned};
    use crate::error::CoreError;

    /// Returns the set of statuses reachable from `from`.
    ///
    /// `Overdue -> Pending` is only taken by a renewal. Terminal statuses
    /// return an empty slice.
    pub fn valid_transitions(from: LoanStatus) -> &'static [LoanStatus] {
        match from {
            Pending => &[Overdue, Cancelled, Returned, Lost],
            Overdue => &[Pending, Cancelled, Returned, Lost],
            Returned | Lost | Cancelled => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: LoanStatus, to: LoanStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning [`CoreError::InvalidState`]
    /// for disallowed edges.
    pub fn validate_transition(from: LoanStatus, to: LoanStatus) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::InvalidState(format!(
                "Invalid loan transition: {from} -> {to}"
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A loan of one physical copy to one borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: DbId,
    pub borrower_id: DbId,
    pub copy_id: DbId,
    /// Staff member that registered the loan.
    pub created_by: DbId,
    /// Staff member that closed the loan (set iff the status is terminal).
    pub completed_by: Option<DbId>,
    pub status: LoanStatus,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub renewal_count: i32,
    pub observation: Option<String>,
    /// Day of the last successful overdue/reminder notice.
    pub last_notified_date: Option<NaiveDate>,
}

/// A loan that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub borrower_id: DbId,
    pub copy_id: DbId,
    pub created_by: DbId,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl NewLoan {
    /// Build a loan starting `today`.
    ///
    /// Without an explicit `due_date` the loan runs for
    /// [`LOAN_PERIOD_DAYS`]. A due date before `today` is rejected.
    pub fn new(
        borrower_id: DbId,
        copy_id: DbId,
        created_by: DbId,
        today: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Result<Self, CoreError> {
        let due_date = match due_date {
            Some(d) if d < today => {
                return Err(CoreError::Validation(format!(
                    "Due date {d} is before the loan date {today}"
                )));
            }
            Some(d) => d,
            None => add_days(today, LOAN_PERIOD_DAYS)?,
        };

        Ok(Self {
            borrower_id,
            copy_id,
            created_by,
            loan_date: today,
            due_date,
        })
    }

    /// Materialize the pending loan once the repository assigned an id.
    pub fn into_loan(self, id: DbId) -> Loan {
        Loan {
            id,
            borrower_id: self.borrower_id,
            copy_id: self.copy_id,
            created_by: self.created_by,
            completed_by: None,
            status: LoanStatus::Pending,
            loan_date: self.loan_date,
            due_date: self.due_date,
            completion_date: None,
            renewal_count: 0,
            observation: None,
            last_notified_date: None,
        }
    }
}

impl Loan {
    /// Cancel the loan, stamping the completer and completion date.
    pub fn cancel(&mut self, actor: DbId, today: NaiveDate) -> Result<(), CoreError> {
        state_machine::validate_transition(self.status, LoanStatus::Cancelled)?;
        self.status = LoanStatus::Cancelled;
        self.completed_by = Some(actor);
        self.completion_date = Some(today);
        Ok(())
    }

    /// Close the loan as returned, or as lost when `lost` is set.
    ///
    /// Returns the terminal status that was applied.
    pub fn complete(
        &mut self,
        actor: DbId,
        today: NaiveDate,
        observation: Option<String>,
        lost: bool,
    ) -> Result<LoanStatus, CoreError> {
        let target = if lost {
            LoanStatus::Lost
        } else {
            LoanStatus::Returned
        };
        state_machine::validate_transition(self.status, target)?;
        self.status = target;
        self.completed_by = Some(actor);
        self.completion_date = Some(today);
        self.observation = observation;
        Ok(target)
    }

    /// Extend the loan by [`RENEWAL_DAYS`].
    ///
    /// An overdue loan goes back to pending and is due `RENEWAL_DAYS` from
    /// `today`; a pending loan is due `RENEWAL_DAYS` after its current due
    /// date.
    pub fn renew(&mut self, today: NaiveDate) -> Result<(), CoreError> {
        let due_date = match self.status {
            LoanStatus::Overdue => {
                state_machine::validate_transition(self.status, LoanStatus::Pending)?;
                add_days(today, RENEWAL_DAYS)?
            }
            LoanStatus::Pending => add_days(self.due_date, RENEWAL_DAYS)?,
            other => {
                return Err(CoreError::InvalidState(format!(
                    "Loan {} cannot be renewed while {other}",
                    self.id
                )));
            }
        };

        self.status = LoanStatus::Pending;
        self.due_date = due_date;
        self.renewal_count += 1;
        Ok(())
    }

    /// Move a pending loan to overdue when its due date is not after
    /// `today`. Returns whether the status changed.
    pub fn mark_overdue_if_due(&mut self, today: NaiveDate) -> bool {
        if self.status == LoanStatus::Pending && self.due_date <= today {
            self.status = LoanStatus::Overdue;
            true
        } else {
            false
        }
    }

    /// Whether a pending loan falls due on the day after `today`.
    pub fn is_due_tomorrow(&self, today: NaiveDate) -> bool {
        self.status == LoanStatus::Pending
            && today.checked_add_days(Days::new(1)) == Some(self.due_date)
    }

    /// Whether a notice was already delivered on `today`.
    pub fn was_notified_on(&self, today: NaiveDate) -> bool {
        self.last_notified_date == Some(today)
    }

    /// Record a successfully delivered notice.
    pub fn record_notification(&mut self, today: NaiveDate) {
        self.last_notified_date = Some(today);
    }
}

/// Add `days` to `date`, reporting calendar overflow as a validation error.
pub fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, CoreError> {
    date.checked_add_days(Days::new(days)).ok_or_else(|| {
        CoreError::Validation(format!("Date {date} + {days} days is out of range"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::state_machine::*;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pending_loan(due: NaiveDate) -> Loan {
        NewLoan::new(1, 2, 3, date(2025, 3, 1), Some(due))
            .unwrap()
            .into_loan(10)
    }

    fn loan_with_status(status: LoanStatus) -> Loan {
        let mut loan = pending_loan(date(2025, 3, 8));
        loan.status = status;
        loan
    }

    // -- labels -------------------------------------------------------------

    #[test]
    fn status_labels_round_trip() {
        for label in VALID_STATUSES {
            assert_eq!(LoanStatus::parse(label).unwrap().as_str(), *label);
        }
    }

    #[test]
    fn unknown_status_label_is_rejected() {
        assert_matches!(LoanStatus::parse("atrasado"), Err(CoreError::Validation(_)));
    }

    // -- state machine ------------------------------------------------------

    #[test]
    fn pending_reaches_every_non_pending_status() {
        assert!(can_transition(LoanStatus::Pending, LoanStatus::Overdue));
        assert!(can_transition(LoanStatus::Pending, LoanStatus::Cancelled));
        assert!(can_transition(LoanStatus::Pending, LoanStatus::Returned));
        assert!(can_transition(LoanStatus::Pending, LoanStatus::Lost));
    }

    #[test]
    fn overdue_returns_to_pending_only_as_an_edge() {
        assert!(can_transition(LoanStatus::Overdue, LoanStatus::Pending));
        assert!(!can_transition(LoanStatus::Overdue, LoanStatus::Overdue));
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        for status in [LoanStatus::Returned, LoanStatus::Lost, LoanStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(valid_transitions(status).is_empty());
        }
    }

    #[test]
    fn validate_transition_reports_both_ends() {
        let err = validate_transition(LoanStatus::Returned, LoanStatus::Pending).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state: Invalid loan transition: returned -> pending"
        );
    }

    // -- new loans ----------------------------------------------------------

    #[test]
    fn new_loan_defaults_to_loan_period() {
        let new = NewLoan::new(1, 2, 3, date(2025, 3, 1), None).unwrap();
        assert_eq!(new.due_date, date(2025, 3, 8));
        let loan = new.into_loan(5);
        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.renewal_count, 0);
        assert!(loan.completed_by.is_none());
    }

    #[test]
    fn new_loan_rejects_due_date_in_the_past() {
        let result = NewLoan::new(1, 2, 3, date(2025, 3, 1), Some(date(2025, 2, 28)));
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    // -- cancel / complete --------------------------------------------------

    #[test]
    fn cancel_stamps_completer_and_date() {
        let mut loan = loan_with_status(LoanStatus::Overdue);
        loan.cancel(9, date(2025, 3, 10)).unwrap();
        assert_eq!(loan.status, LoanStatus::Cancelled);
        assert_eq!(loan.completed_by, Some(9));
        assert_eq!(loan.completion_date, Some(date(2025, 3, 10)));
    }

    #[test]
    fn cancel_of_terminal_loan_leaves_it_unchanged() {
        let mut loan = loan_with_status(LoanStatus::Returned);
        let before = loan.clone();
        assert_matches!(loan.cancel(9, date(2025, 3, 10)), Err(CoreError::InvalidState(_)));
        assert_eq!(loan, before);
    }

    #[test]
    fn complete_as_returned() {
        let mut loan = loan_with_status(LoanStatus::Pending);
        let status = loan
            .complete(4, date(2025, 3, 5), Some("cover torn".into()), false)
            .unwrap();
        assert_eq!(status, LoanStatus::Returned);
        assert_eq!(loan.observation.as_deref(), Some("cover torn"));
        assert_eq!(loan.completed_by, Some(4));
    }

    #[test]
    fn complete_as_lost() {
        let mut loan = loan_with_status(LoanStatus::Overdue);
        let status = loan.complete(4, date(2025, 3, 20), None, true).unwrap();
        assert_eq!(status, LoanStatus::Lost);
        assert_eq!(loan.completion_date, Some(date(2025, 3, 20)));
    }

    #[test]
    fn complete_of_cancelled_loan_fails() {
        let mut loan = loan_with_status(LoanStatus::Cancelled);
        let before = loan.clone();
        assert_matches!(
            loan.complete(4, date(2025, 3, 20), None, false),
            Err(CoreError::InvalidState(_))
        );
        assert_eq!(loan, before);
    }

    // -- renew --------------------------------------------------------------

    #[test]
    fn renew_pending_extends_from_current_due_date() {
        let mut loan = pending_loan(date(2025, 3, 8));
        loan.renew(date(2025, 3, 3)).unwrap();
        assert_eq!(loan.due_date, date(2025, 3, 15));
        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.renewal_count, 1);
    }

    #[test]
    fn renew_overdue_restarts_from_today() {
        let mut loan = loan_with_status(LoanStatus::Overdue);
        loan.renew(date(2025, 3, 12)).unwrap();
        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.due_date, date(2025, 3, 19));
        assert_eq!(loan.renewal_count, 1);
    }

    #[test]
    fn renew_of_lost_loan_fails_unchanged() {
        let mut loan = loan_with_status(LoanStatus::Lost);
        let before = loan.clone();
        assert_matches!(loan.renew(date(2025, 3, 12)), Err(CoreError::InvalidState(_)));
        assert_eq!(loan, before);
    }

    // -- sweep helpers ------------------------------------------------------

    #[test]
    fn due_today_counts_as_overdue() {
        let mut loan = pending_loan(date(2025, 3, 8));
        assert!(loan.mark_overdue_if_due(date(2025, 3, 8)));
        assert_eq!(loan.status, LoanStatus::Overdue);
    }

    #[test]
    fn due_tomorrow_stays_pending() {
        let mut loan = pending_loan(date(2025, 3, 8));
        assert!(!loan.mark_overdue_if_due(date(2025, 3, 7)));
        assert_eq!(loan.status, LoanStatus::Pending);
        assert!(loan.is_due_tomorrow(date(2025, 3, 7)));
    }

    #[test]
    fn notification_guard_is_per_day() {
        let mut loan = pending_loan(date(2025, 3, 8));
        loan.record_notification(date(2025, 3, 7));
        assert!(loan.was_notified_on(date(2025, 3, 7)));
        assert!(!loan.was_notified_on(date(2025, 3, 8)));
    }
}
