//! Canonical in-memory collections.
//!
//! `LedgerState` is the single source of truth for records; derived data
//! (balances, aggregates, report caches, the sectioned view) lives with its
//! owning component and is reconstructible from here. Only the apply
//! pipeline mutates this struct.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    Account, Category, RecurringOccurrence, RecurringSeries, SubcategoryLink, Transaction,
    TransactionId,
};

#[derive(Default)]
pub struct LedgerState {
    /// Insertion-ordered so bulk imports and saves replay deterministically.
    pub(crate) transactions: IndexMap<TransactionId, Transaction>,
    pub(crate) accounts: HashMap<Uuid, Account>,
    pub(crate) categories: HashMap<Uuid, Category>,
    pub(crate) subcategory_links: Vec<SubcategoryLink>,
    pub(crate) series: HashMap<Uuid, RecurringSeries>,
    pub(crate) occurrences: Vec<RecurringOccurrence>,
}

impl LedgerState {
    #[must_use]
    pub fn transaction(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.get(id)
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn account(&self, id: &Uuid) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    #[must_use]
    pub fn category(&self, id: &Uuid) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    #[must_use]
    pub fn series(&self, id: &Uuid) -> Option<&RecurringSeries> {
        self.series.get(id)
    }

    pub fn all_series(&self) -> impl Iterator<Item = &RecurringSeries> {
        self.series.values()
    }

    pub fn occurrences(&self) -> impl Iterator<Item = &RecurringOccurrence> {
        self.occurrences.iter()
    }

    /// `(series, date)` pairs already expanded into transactions.
    #[must_use]
    pub fn covered_occurrences(&self) -> HashSet<(Uuid, NaiveDate)> {
        self.occurrences
            .iter()
            .map(|occurrence| (occurrence.series_id, occurrence.date))
            .collect()
    }

    pub(crate) fn insert_transaction(&mut self, tx: Transaction) {
        self.transactions.insert(tx.id.clone(), tx);
    }

    pub(crate) fn replace_transaction(&mut self, tx: Transaction) {
        self.transactions.insert(tx.id.clone(), tx);
    }

    /// Removes a transaction preserving the insertion order of the rest.
    pub(crate) fn remove_transaction(&mut self, id: &TransactionId) -> Option<Transaction> {
        self.transactions.shift_remove(id)
    }

    pub(crate) fn remove_occurrences_for_transaction(&mut self, id: &TransactionId) {
        self.occurrences
            .retain(|occurrence| &occurrence.transaction_id != id);
    }

    pub(crate) fn remove_occurrences_for_series(&mut self, series_id: &Uuid) {
        self.occurrences
            .retain(|occurrence| &occurrence.series_id != series_id);
    }
}
