//! Recurring series lifecycle and generation.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    Converter, Ledger, LedgerError, LedgerEvent, Priority, RecurringSeries, ResultLedger, Store,
    Subscription, SubscriptionStatus, recurring,
};

impl<S: Store, C: Converter> Ledger<S, C> {
    /// Registers a new series template.
    ///
    /// The template's own invariants were checked by
    /// [`RecurringSeries::new`]; here the referenced account and category
    /// must exist.
    pub async fn create_series(&mut self, series: RecurringSeries) -> ResultLedger<Uuid> {
        self.validate_series_refs(&series)?;
        let id = series.id;
        self.apply(LedgerEvent::SeriesCreated(series), Priority::High)
            .await;
        Ok(id)
    }

    /// Replaces a series template.
    ///
    /// When the schedule itself changed (frequency or start date), the
    /// already generated future-dated transactions are deleted from `today`
    /// forward (occurrence records included) and the new schedule is
    /// expanded in their place.
    pub async fn update_series(
        &mut self,
        id: &Uuid,
        new: RecurringSeries,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultLedger<()> {
        let old = self
            .state
            .series(id)
            .cloned()
            .ok_or_else(|| LedgerError::SeriesNotFound(id.to_string()))?;
        if new.id != *id {
            return Err(LedgerError::IdMismatch(format!(
                "expected {id}, got {}",
                new.id
            )));
        }
        self.validate_series_refs(&new)?;

        let schedule_changed =
            old.frequency != new.frequency || old.start_date != new.start_date;
        if schedule_changed {
            self.delete_future_generated(id, today).await;
        }
        self.apply(
            LedgerEvent::SeriesUpdated {
                old: Box::new(old),
                new: Box::new(new),
            },
            Priority::High,
        )
        .await;
        if schedule_changed {
            // Expand the new schedule forward only; history generated
            // under the old schedule is already settled.
            self.generate_series_window(id, Some(today), today, now).await;
        }
        Ok(())
    }

    /// Deactivates a series; generated history stays untouched.
    pub async fn stop_series(&mut self, id: &Uuid) -> ResultLedger<()> {
        if self.state.series(id).is_none() {
            return Err(LedgerError::SeriesNotFound(id.to_string()));
        }
        self.apply(LedgerEvent::SeriesStopped(*id), Priority::High)
            .await;
        Ok(())
    }

    /// Removes a series and its occurrence records.
    ///
    /// Future-dated generated transactions are deleted; past ones are kept
    /// as history, link intact.
    pub async fn delete_series(&mut self, id: &Uuid, today: NaiveDate) -> ResultLedger<()> {
        if self.state.series(id).is_none() {
            return Err(LedgerError::SeriesNotFound(id.to_string()));
        }
        self.delete_future_generated(id, today).await;
        self.apply(LedgerEvent::SeriesDeleted(*id), Priority::High)
            .await;
        Ok(())
    }

    /// Moves a subscription through its `active ⇄ paused → archived`
    /// machine. Archiving also stops generation for good.
    pub async fn set_subscription_status(
        &mut self,
        id: &Uuid,
        status: SubscriptionStatus,
    ) -> ResultLedger<()> {
        let old = self
            .state
            .series(id)
            .cloned()
            .ok_or_else(|| LedgerError::SeriesNotFound(id.to_string()))?;

        let current = old
            .subscription
            .as_ref()
            .map_or(SubscriptionStatus::Active, |s| s.status);
        if !current.can_transition(status) {
            return Err(LedgerError::InvalidSeriesData(format!(
                "cannot move subscription from {current:?} to {status:?}"
            )));
        }

        let mut new = old.clone();
        let subscription = new.subscription.get_or_insert_with(Subscription::default);
        subscription.status = status;
        if status == SubscriptionStatus::Archived {
            new.active = false;
        }
        self.apply(
            LedgerEvent::SeriesUpdated {
                old: Box::new(old),
                new: Box::new(new),
            },
            Priority::High,
        )
        .await;
        Ok(())
    }

    /// Expands every generating series up to `today + horizon`, skipping
    /// dates already covered by an occurrence record. Safe to call as often
    /// as the caller likes; a second run with unchanged state adds
    /// nothing.
    ///
    /// Returns the number of transactions created.
    pub async fn generate_due(
        &mut self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultLedger<usize> {
        let covered = self.state.covered_occurrences();
        let due: Vec<RecurringSeries> = self
            .state
            .all_series()
            .filter(|series| series.generates())
            .cloned()
            .collect();

        let mut generated = 0usize;
        for series in due {
            for (tx, occurrence) in
                recurring::generate(&series, &covered, today, self.horizon, now)
            {
                self.state.occurrences.push(occurrence);
                self.apply(LedgerEvent::Added(tx), Priority::Normal).await;
                generated += 1;
            }
        }
        if generated > 0 && !self.importing {
            self.persist_occurrences().await;
        }
        Ok(generated)
    }

    /// Expands a single series, optionally only from `not_before` forward.
    async fn generate_series_window(
        &mut self,
        series_id: &Uuid,
        not_before: Option<NaiveDate>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) {
        let covered = self.state.covered_occurrences();
        let Some(series) = self.state.series(series_id).cloned() else {
            return;
        };
        let batch =
            recurring::generate_window(&series, &covered, not_before, today, self.horizon, now);
        let generated = !batch.is_empty();
        for (tx, occurrence) in batch {
            self.state.occurrences.push(occurrence);
            self.apply(LedgerEvent::Added(tx), Priority::Normal).await;
        }
        if generated && !self.importing {
            self.persist_occurrences().await;
        }
    }

    /// Deletes this series' generated transactions dated `today` or later,
    /// together with their occurrence records, so the schedule can be
    /// expanded afresh.
    async fn delete_future_generated(&mut self, series_id: &Uuid, today: NaiveDate) {
        let doomed: Vec<crate::Transaction> = self
            .state
            .transactions()
            .filter(|tx| tx.series_id == Some(*series_id) && tx.date >= today)
            .cloned()
            .collect();
        for tx in doomed {
            let id = tx.id.clone();
            self.apply(LedgerEvent::Deleted(tx), Priority::High).await;
            self.state.remove_occurrences_for_transaction(&id);
        }
        if !self.importing {
            self.persist_occurrences().await;
        }
    }

    fn validate_series_refs(&self, series: &RecurringSeries) -> ResultLedger<()> {
        if let Some(account_id) = series.source_account_id
            && self.state.account(&account_id).is_none()
        {
            return Err(LedgerError::AccountNotFound(account_id.to_string()));
        }
        if let Some(account_id) = series.target_account_id
            && self.state.account(&account_id).is_none()
        {
            return Err(LedgerError::TargetAccountNotFound(account_id.to_string()));
        }
        if let Some(category_id) = series.category_id
            && self.state.category(&category_id).is_none()
        {
            return Err(LedgerError::CategoryNotFound(category_id.to_string()));
        }
        Ok(())
    }
}
