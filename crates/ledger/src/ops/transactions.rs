//! Transaction mutations and the apply pipeline.

use tracing::error;

use crate::{
    BalanceOp, Converter, Ledger, LedgerError, LedgerEvent, Priority, ResultLedger, SectionedView,
    Store, Transaction, TransactionId, TransactionKind,
};

impl<S: Store, C: Converter> Ledger<S, C> {
    /// Validates and records a new transaction.
    pub async fn add_transaction(&mut self, tx: Transaction) -> ResultLedger<TransactionId> {
        self.validate_transaction(&tx)?;
        let id = tx.id.clone();
        self.apply(LedgerEvent::Added(tx), Priority::High).await;
        Ok(id)
    }

    /// Replaces the transaction `id` with `new`.
    ///
    /// `new` must carry the same id as the record it replaces, must not
    /// strip an existing recurring link, and protected records cannot be
    /// edited at all.
    pub async fn update_transaction(
        &mut self,
        id: &TransactionId,
        new: Transaction,
    ) -> ResultLedger<()> {
        let old = self
            .state
            .transaction(id)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
        if new.id != *id {
            return Err(LedgerError::IdMismatch(format!(
                "expected {id}, got {}",
                new.id
            )));
        }
        if old.kind.is_protected() {
            return Err(LedgerError::ProtectedTransaction(id.to_string()));
        }
        if old.series_id.is_some() && new.series_id.is_none() {
            return Err(LedgerError::RecurringLinkRemoval(id.to_string()));
        }
        self.validate_transaction(&new)?;
        self.apply(
            LedgerEvent::Updated {
                old: Box::new(old),
                new: Box::new(new),
            },
            Priority::High,
        )
        .await;
        Ok(())
    }

    /// Deletes the transaction `id`.
    ///
    /// The matching occurrence record (if any) is kept, so a generated
    /// entry the user removed does not reappear on the next generation run.
    pub async fn delete_transaction(&mut self, id: &TransactionId) -> ResultLedger<()> {
        let old = self
            .state
            .transaction(id)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
        if old.kind.is_protected() {
            return Err(LedgerError::ProtectedTransaction(id.to_string()));
        }
        self.apply(LedgerEvent::Deleted(old), Priority::High).await;
        Ok(())
    }

    /// Pre-mutation validation: fail fast, mutate nothing.
    pub(crate) fn validate_transaction(&self, tx: &Transaction) -> ResultLedger<()> {
        if !tx.amount.is_positive() {
            return Err(LedgerError::InvalidAmount("amount must be > 0".to_string()));
        }

        if tx.kind == TransactionKind::Transfer {
            let source = tx
                .source_account_id
                .ok_or_else(|| LedgerError::AccountNotFound("transfer without source".to_string()))?;
            if self.state.account(&source).is_none() {
                return Err(LedgerError::AccountNotFound(source.to_string()));
            }
            let target = tx.target_account_id.ok_or_else(|| {
                LedgerError::TargetAccountNotFound("transfer without target".to_string())
            })?;
            if self.state.account(&target).is_none() {
                return Err(LedgerError::TargetAccountNotFound(target.to_string()));
            }
            return Ok(());
        }

        if let Some(source) = tx.source_account_id
            && self.state.account(&source).is_none()
        {
            return Err(LedgerError::AccountNotFound(source.to_string()));
        }
        if let Some(target) = tx.target_account_id
            && self.state.account(&target).is_none()
        {
            return Err(LedgerError::TargetAccountNotFound(target.to_string()));
        }

        let has_account = tx.source_account_id.is_some() || tx.target_account_id.is_some();
        match tx.category_id {
            Some(category) => {
                if self.state.category(&category).is_none() {
                    return Err(LedgerError::CategoryNotFound(category.to_string()));
                }
                if let Some(subcategory) = tx.subcategory_id {
                    let linked = self.state.subcategory_links.iter().any(|link| {
                        link.subcategory_id == subcategory && link.category_id == category
                    });
                    if !linked {
                        return Err(LedgerError::CategoryNotFound(format!(
                            "subcategory {subcategory} not linked to {category}"
                        )));
                    }
                }
            }
            // A category is only optional for entries that bind no account
            // (series templates without one).
            None if has_account => {
                return Err(LedgerError::CategoryNotFound(
                    "category required".to_string(),
                ));
            }
            None => {}
        }
        Ok(())
    }

    /// The apply pipeline.
    ///
    /// Side effects always run in this order: in-memory mutation, balance
    /// deltas, cache invalidation, aggregate maintenance, persistence,
    /// debounced notification. Import mode defers persistence, aggregates
    /// and the view rebuild to `finish_import`.
    pub(crate) async fn apply(&mut self, event: LedgerEvent, priority: Priority) {
        let mut view_stale = false;

        match event {
            LedgerEvent::Added(tx) => {
                self.state.insert_transaction(tx.clone());
                self.balances
                    .update_for_transaction(&self.converter, BalanceOp::Add(&tx), priority)
                    .await;
                self.invalidate_reports_for_date(tx.date);
                if !self.importing {
                    self.category_totals
                        .apply_added(&self.converter, &tx, self.base_currency);
                    self.monthly_totals
                        .apply_added(&self.converter, &tx, self.base_currency);
                    self.persist_transactions().await;
                }
                view_stale = true;
            }
            LedgerEvent::Updated { old, new } => {
                self.state.replace_transaction((*new).clone());
                self.balances
                    .update_for_transaction(
                        &self.converter,
                        BalanceOp::Update {
                            old: old.as_ref(),
                            new: new.as_ref(),
                        },
                        priority,
                    )
                    .await;
                self.invalidate_reports_for_date(old.date);
                self.invalidate_reports_for_date(new.date);
                if !self.importing {
                    self.category_totals
                        .apply_updated(&self.converter, &old, &new, self.base_currency);
                    self.monthly_totals
                        .apply_updated(&self.converter, &old, &new, self.base_currency);
                    self.persist_transactions().await;
                }
                view_stale = true;
            }
            LedgerEvent::Deleted(tx) => {
                self.state.remove_transaction(&tx.id);
                self.balances
                    .update_for_transaction(&self.converter, BalanceOp::Remove(&tx), priority)
                    .await;
                self.invalidate_reports_for_date(tx.date);
                if !self.importing {
                    self.category_totals
                        .apply_deleted(&self.converter, &tx, self.base_currency);
                    self.monthly_totals
                        .apply_deleted(&self.converter, &tx, self.base_currency);
                    // Immediate durable delete first, so the removal
                    // survives a process kill even if the batched save
                    // below never runs.
                    if let Err(err) = self.store.delete_transaction_now(&tx.id).await {
                        error!(transaction = %tx.id, "immediate delete failed: {err}");
                    }
                    self.persist_transactions().await;
                }
                view_stale = true;
            }
            LedgerEvent::BulkAdded(txs) => {
                for tx in &txs {
                    self.state.insert_transaction(tx.clone());
                }
                for tx in &txs {
                    self.balances
                        .update_for_transaction(&self.converter, BalanceOp::Add(tx), priority)
                        .await;
                }
                // Cheap targeted invalidation cannot be guaranteed correct
                // across an arbitrary batch.
                self.reports.clear();
                if !self.importing {
                    for tx in &txs {
                        self.category_totals
                            .apply_added(&self.converter, tx, self.base_currency);
                        self.monthly_totals
                            .apply_added(&self.converter, tx, self.base_currency);
                    }
                    self.persist_transactions().await;
                }
                view_stale = true;
            }
            LedgerEvent::SeriesCreated(series) => {
                self.state.series.insert(series.id, series);
                if !self.importing {
                    self.persist_series().await;
                }
            }
            LedgerEvent::SeriesUpdated { new, .. } => {
                self.state.series.insert(new.id, *new);
                if !self.importing {
                    self.persist_series().await;
                }
            }
            LedgerEvent::SeriesStopped(series_id) => {
                if let Some(series) = self.state.series.get_mut(&series_id) {
                    series.active = false;
                }
                if !self.importing {
                    self.persist_series().await;
                }
            }
            LedgerEvent::SeriesDeleted(series_id) => {
                self.state.series.remove(&series_id);
                self.state.remove_occurrences_for_series(&series_id);
                if !self.importing {
                    self.persist_series().await;
                    self.persist_occurrences().await;
                }
            }
        }

        if view_stale && !self.importing {
            self.view = SectionedView::build(&self.state);
        }
        self.notifier.submit();
    }

    /// Batched save of the transaction collection; failures are logged, the
    /// in-memory state stays authoritative for the session.
    pub(crate) async fn persist_transactions(&self) {
        let all: Vec<Transaction> = self.state.transactions().cloned().collect();
        if let Err(err) = self.store.save_transactions(&all).await {
            error!("saving transactions failed: {err}");
        }
    }

    pub(crate) async fn persist_series(&self) {
        let all: Vec<crate::RecurringSeries> = self.state.all_series().cloned().collect();
        if let Err(err) = self.store.save_series(&all).await {
            error!("saving series failed: {err}");
        }
    }

    pub(crate) async fn persist_occurrences(&self) {
        let all: Vec<crate::RecurringOccurrence> = self.state.occurrences().cloned().collect();
        if let Err(err) = self.store.save_occurrences(&all).await {
            error!("saving occurrences failed: {err}");
        }
    }

    pub(crate) async fn persist_accounts(&self) {
        let all: Vec<crate::Account> = self.state.accounts().cloned().collect();
        if let Err(err) = self.store.save_accounts(&all).await {
            error!("saving accounts failed: {err}");
        }
    }

    pub(crate) async fn persist_categories(&self) {
        let all: Vec<crate::Category> = self.state.categories().cloned().collect();
        if let Err(err) = self.store.save_categories(&all).await {
            error!("saving categories failed: {err}");
        }
        if let Err(err) = self
            .store
            .save_subcategory_links(&self.state.subcategory_links)
            .await
        {
            error!("saving subcategory links failed: {err}");
        }
    }
}
