//! Loan lifecycle orchestration.
//!
//! - [`LoanFacade`] is the only entry point for state-changing loan
//!   operations. It validates, persists once, then broadcasts one
//!   [`LoanEvent`](bibliotech_events::LoanEvent).
//! - [`OverdueSweep`] advances due loans and sends overdue and reminder
//!   notices, at most once per loan per day.
//! - [`observers`] holds the stock lifecycle observers.
//! - [`memory`] is an in-process store used by tests and local runs.

pub mod facade;
pub mod memory;
pub mod observers;
pub mod stores;
pub mod sweep;
pub mod validators;

pub use facade::{CompleteLoan, CreateLoan, LoanFacade};
pub use stores::LibraryStores;
pub use sweep::{OverdueSweep, SweepReport, UnnotifiedLoan};
