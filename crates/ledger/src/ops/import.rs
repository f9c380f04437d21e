//! Two-phase bulk import.
//!
//! Between `begin_import` and `finish_import` the pipeline skips per-event
//! persistence, aggregate maintenance and view rebuilds: throughput over
//! per-event safety. `finish_import` then runs one synchronous
//! dependency-ordered commit and one full aggregate rebuild. This is the
//! single place where an abrupt kill can leave aggregates stale until the
//! next rebuild trigger.

use crate::{
    CommitSync, Converter, Ledger, LedgerEvent, LedgerSnapshot, Priority, ResultLedger,
    SectionedView, Store, Transaction,
};

impl<S: Store, C: Converter> Ledger<S, C> {
    /// Enters import mode.
    pub fn begin_import(&mut self) {
        self.importing = true;
    }

    #[must_use]
    pub fn is_importing(&self) -> bool {
        self.importing
    }

    /// Validates and records a batch of transactions as one event.
    ///
    /// All records are validated before any of them is applied; a bad row
    /// rejects the whole batch with nothing mutated.
    pub async fn bulk_add_transactions(&mut self, txs: Vec<Transaction>) -> ResultLedger<usize> {
        for tx in &txs {
            self.validate_transaction(tx)?;
        }
        let count = txs.len();
        self.apply(LedgerEvent::BulkAdded(txs), Priority::Normal)
            .await;
        Ok(count)
    }

    /// Leaves import mode: one synchronous commit of everything in
    /// dependency order, then one full aggregate rebuild.
    ///
    /// A commit failure is surfaced as `Persistence`, never silently
    /// retried against some other storage path, but the in-memory rebuild
    /// still runs so the session keeps consistent derived state.
    pub async fn finish_import(&mut self) -> ResultLedger<()>
    where
        S: CommitSync,
    {
        self.importing = false;

        let snapshot = LedgerSnapshot {
            accounts: self.state.accounts().collect(),
            categories: self.state.categories().collect(),
            subcategory_links: self.state.subcategory_links.iter().collect(),
            transactions: self.state.transactions().collect(),
            occurrences: self.state.occurrences().collect(),
            series: self.state.all_series().collect(),
        };
        let committed = self.store.commit_all(&snapshot);

        self.rebuild_aggregates();
        self.reports.clear();
        self.view = SectionedView::build(&self.state);
        self.notifier.submit();

        committed?;
        Ok(())
    }
}
