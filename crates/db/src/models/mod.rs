pub mod library;
pub mod loan;
