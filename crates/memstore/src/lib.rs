//! In-memory [`Store`] backend.
//!
//! Reference implementation of the persistence interface: plain tables
//! behind a mutex, no I/O. It backs the ledger integration tests the way
//! an in-memory SQLite database backs a server's, and doubles as the
//! template for writing a real backend, including the synchronous
//! [`CommitSync`] commit used by bulk import.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ledger::{
    Account, Category, CommitSync, LedgerSnapshot, RecurringOccurrence, RecurringSeries, Store,
    StoreError, SubcategoryLink, Transaction, TransactionId,
};

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<Account>,
    categories: Vec<Category>,
    subcategory_links: Vec<SubcategoryLink>,
    transactions: Vec<Transaction>,
    series: Vec<RecurringSeries>,
    occurrences: Vec<RecurringOccurrence>,
    /// Number of `commit_all` calls, for tests asserting the sync path ran.
    commits: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// When set, every save and commit fails; simulates a broken backend.
    fail_saves: Mutex<bool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Lock poisoning only happens when a panicking test held the guard;
        // the tables themselves stay usable.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        let failing = self
            .fail_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *failing {
            return Err(StoreError::new("backend unavailable"));
        }
        Ok(())
    }

    /// Makes every subsequent save/commit fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        *self
            .fail_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = fail;
    }

    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.lock().commits
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.lock().transactions.len()
    }

    #[must_use]
    pub fn contains_transaction(&self, id: &TransactionId) -> bool {
        self.lock().transactions.iter().any(|tx| &tx.id == id)
    }
}

impl Store for MemoryStore {
    async fn load_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.lock().accounts.clone())
    }

    async fn load_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.lock().categories.clone())
    }

    async fn load_subcategory_links(&self) -> Result<Vec<SubcategoryLink>, StoreError> {
        Ok(self.lock().subcategory_links.clone())
    }

    async fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.lock().transactions.clone())
    }

    async fn load_series(&self) -> Result<Vec<RecurringSeries>, StoreError> {
        Ok(self.lock().series.clone())
    }

    async fn load_occurrences(&self) -> Result<Vec<RecurringOccurrence>, StoreError> {
        Ok(self.lock().occurrences.clone())
    }

    async fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock().accounts = accounts.to_vec();
        Ok(())
    }

    async fn save_categories(&self, categories: &[Category]) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock().categories = categories.to_vec();
        Ok(())
    }

    async fn save_subcategory_links(&self, links: &[SubcategoryLink]) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock().subcategory_links = links.to_vec();
        Ok(())
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock().transactions = transactions.to_vec();
        Ok(())
    }

    async fn save_series(&self, series: &[RecurringSeries]) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock().series = series.to_vec();
        Ok(())
    }

    async fn save_occurrences(
        &self,
        occurrences: &[RecurringOccurrence],
    ) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock().occurrences = occurrences.to_vec();
        Ok(())
    }

    async fn delete_transaction_now(&self, id: &TransactionId) -> Result<(), StoreError> {
        self.check_failure()?;
        self.lock().transactions.retain(|tx| &tx.id != id);
        Ok(())
    }
}

impl CommitSync for MemoryStore {
    fn commit_all(&self, snapshot: &LedgerSnapshot<'_>) -> Result<(), StoreError> {
        self.check_failure()?;
        let mut tables = self.lock();
        // Dependency order: parents before the records that reference them.
        tables.accounts = snapshot.accounts.iter().map(|a| (*a).clone()).collect();
        tables.categories = snapshot.categories.iter().map(|c| (*c).clone()).collect();
        tables.subcategory_links = snapshot
            .subcategory_links
            .iter()
            .map(|l| (*l).clone())
            .collect();
        tables.transactions = snapshot
            .transactions
            .iter()
            .map(|t| (*t).clone())
            .collect();
        tables.occurrences = snapshot.occurrences.iter().map(|o| (*o).clone()).collect();
        tables.series = snapshot.series.iter().map(|s| (*s).clone()).collect();
        tables.commits += 1;
        Ok(())
    }
}
