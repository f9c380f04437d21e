//! The module contains the errors the ledger can return.
//!
//! Validation errors are produced before any in-memory mutation happens, so
//! a caller that receives one can correct the input and retry without
//! worrying about partial application. [`Persistence`] is different: it is
//! only surfaced from the synchronous import commit, where failing loudly is
//! preferred over silently diverging from the backing store.
//!
//! [`Persistence`]: LedgerError::Persistence
use thiserror::Error;

use crate::store::StoreError;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Target account not found: {0}")]
    TargetAccountNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Id mismatch: {0}")]
    IdMismatch(String),
    #[error("Cannot remove recurring link: {0}")]
    RecurringLinkRemoval(String),
    #[error("Cannot delete protected transaction: {0}")]
    ProtectedTransaction(String),
    #[error("Series not found: {0}")]
    SeriesNotFound(String),
    #[error("Invalid series data: {0}")]
    InvalidSeriesData(String),
    #[error("Invalid start date: {0}")]
    InvalidStartDate(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::TargetAccountNotFound(a), Self::TargetAccountNotFound(b)) => a == b,
            (Self::CategoryNotFound(a), Self::CategoryNotFound(b)) => a == b,
            (Self::TransactionNotFound(a), Self::TransactionNotFound(b)) => a == b,
            (Self::IdMismatch(a), Self::IdMismatch(b)) => a == b,
            (Self::RecurringLinkRemoval(a), Self::RecurringLinkRemoval(b)) => a == b,
            (Self::ProtectedTransaction(a), Self::ProtectedTransaction(b)) => a == b,
            (Self::SeriesNotFound(a), Self::SeriesNotFound(b)) => a == b,
            (Self::InvalidSeriesData(a), Self::InvalidSeriesData(b)) => a == b,
            (Self::InvalidStartDate(a), Self::InvalidStartDate(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
