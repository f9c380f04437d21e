//! Persistence interface.
//!
//! The ledger never talks to a concrete database. It is built over a
//! [`Store`], an injected collaborator exposing per-entity load/save plus
//! an immediate single-record delete. Backends that can flush a full
//! snapshot without suspending additionally implement [`CommitSync`]; the
//! bulk-import path requires that capability through a static bound, chosen
//! at construction time rather than probed at runtime.

use thiserror::Error;

use crate::{
    Account, Category, RecurringOccurrence, RecurringSeries, SubcategoryLink, Transaction,
    TransactionId,
};

/// Error reported by a storage backend.
///
/// The ledger wraps it as `LedgerError::Persistence` when it must be
/// surfaced to the caller; transient failures outside the import commit are
/// logged instead (in-memory state stays the session's source of truth).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("store error: {0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Borrowed full-state snapshot handed to [`CommitSync::commit_all`].
///
/// Collections are listed in dependency order; backends are expected to
/// persist them in this order so partially-written state never references
/// a missing parent.
pub struct LedgerSnapshot<'a> {
    pub accounts: Vec<&'a Account>,
    pub categories: Vec<&'a Category>,
    pub subcategory_links: Vec<&'a SubcategoryLink>,
    pub transactions: Vec<&'a Transaction>,
    pub occurrences: Vec<&'a RecurringOccurrence>,
    pub series: Vec<&'a RecurringSeries>,
}

/// Asynchronous per-entity persistence.
///
/// `save_*` calls replace the backend's whole collection for that entity
/// type; the ledger batches them after each applied event.
/// `delete_transaction_now` must hit durable storage before returning, so a
/// deletion survives an abrupt process kill even if the next batched save
/// never runs.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn load_accounts(&self) -> Result<Vec<Account>, StoreError>;
    async fn load_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn load_subcategory_links(&self) -> Result<Vec<SubcategoryLink>, StoreError>;
    async fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError>;
    async fn load_series(&self) -> Result<Vec<RecurringSeries>, StoreError>;
    async fn load_occurrences(&self) -> Result<Vec<RecurringOccurrence>, StoreError>;

    async fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError>;
    async fn save_categories(&self, categories: &[Category]) -> Result<(), StoreError>;
    async fn save_subcategory_links(&self, links: &[SubcategoryLink]) -> Result<(), StoreError>;
    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError>;
    async fn save_series(&self, series: &[RecurringSeries]) -> Result<(), StoreError>;
    async fn save_occurrences(&self, occurrences: &[RecurringOccurrence])
    -> Result<(), StoreError>;

    async fn delete_transaction_now(&self, id: &TransactionId) -> Result<(), StoreError>;
}

/// Capability: flush a full snapshot synchronously.
///
/// Implemented only by backends that can commit without suspending (local
/// files, embedded databases, in-memory tables). Required by
/// `finish_import` and suitable for app-termination flushes.
pub trait CommitSync: Store {
    fn commit_all(&self, snapshot: &LedgerSnapshot<'_>) -> Result<(), StoreError>;
}
