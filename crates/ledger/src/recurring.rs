//! Recurring series and the occurrence generator.
//!
//! Generation is a pure function: given a series, the set of already
//! covered `(series, date)` pairs, a reference day and a horizon, it
//! returns the transactions and occurrence records that are still missing.
//! Re-running it with the same inputs produces nothing new; idempotence
//! lives here, not in the caller.

use std::collections::HashSet;

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money, ResultLedger, Transaction, TransactionKind};

/// How often a series produces an occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    /// Custom interval in days (≥ 1).
    EveryDays(u32),
}

impl Frequency {
    /// The `step`-th occurrence date counted from `start`.
    ///
    /// Monthly steps are computed from the start date each time rather than
    /// from the previous occurrence, so a series anchored on the 31st posts
    /// on the 31st again after a short month instead of drifting to the
    /// 28th forever.
    #[must_use]
    pub fn nth_from(self, start: NaiveDate, step: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Weekly => start.checked_add_days(Days::new(u64::from(step) * 7)),
            Frequency::Monthly => start.checked_add_months(Months::new(step)),
            Frequency::EveryDays(n) => {
                start.checked_add_days(Days::new(u64::from(step) * u64::from(n)))
            }
        }
    }
}

/// Lifecycle of a subscription: `active ⇄ paused`, both may be archived,
/// archived is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn can_transition(self, next: SubscriptionStatus) -> bool {
        match (self, next) {
            (SubscriptionStatus::Archived, _) => false,
            (a, b) if a == b => false,
            _ => true,
        }
    }
}

/// Subscription metadata on top of a plain recurring series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub status: SubscriptionStatus,
    /// Days before each occurrence a reminder should fire (consumed by the
    /// notification layer, opaque to the ledger).
    pub reminder_days: Vec<u32>,
    pub brand: Option<String>,
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            status: SubscriptionStatus::Active,
            reminder_days: Vec::new(),
            brand: None,
        }
    }
}

/// Template from which concrete transactions are generated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub id: Uuid,
    pub description: String,
    pub amount: Money,
    pub currency: Currency,
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub source_account_id: Option<Uuid>,
    pub target_account_id: Option<Uuid>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub subscription: Option<Subscription>,
}

impl RecurringSeries {
    /// Validates the template fields that do not need ledger context.
    ///
    /// `start_date` arrives as user input and is parsed here; account and
    /// category references are checked by the ledger at creation time.
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        currency: Currency,
        kind: TransactionKind,
        frequency: Frequency,
        start_date: &str,
    ) -> ResultLedger<Self> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidSeriesData(
                "amount must be > 0".to_string(),
            ));
        }
        if let Frequency::EveryDays(n) = frequency
            && n == 0
        {
            return Err(LedgerError::InvalidSeriesData(
                "interval must be at least one day".to_string(),
            ));
        }
        let start_date: NaiveDate = start_date
            .parse()
            .map_err(|_| LedgerError::InvalidStartDate(start_date.to_string()))?;
        Ok(Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            currency,
            kind,
            category_id: None,
            subcategory_id: None,
            source_account_id: None,
            target_account_id: None,
            frequency,
            start_date,
            end_date: None,
            active: true,
            subscription: None,
        })
    }

    /// Whether the generator should expand this series at all.
    #[must_use]
    pub fn generates(&self) -> bool {
        self.active
            && self
                .subscription
                .as_ref()
                .is_none_or(|s| s.status == SubscriptionStatus::Active)
    }
}

/// Join record making generation idempotent: one per `(series, date)` that
/// has already been turned into a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringOccurrence {
    pub id: Uuid,
    pub series_id: Uuid,
    pub date: NaiveDate,
    pub transaction_id: crate::TransactionId,
}

/// Expands `series` into the transactions still missing within
/// `[start, min(end, today + horizon)]`.
///
/// `covered` is the set of `(series id, occurrence date)` pairs already
/// generated; dates in it are skipped, which is what makes a second run
/// with the same inputs produce nothing.
pub fn generate(
    series: &RecurringSeries,
    covered: &HashSet<(Uuid, NaiveDate)>,
    today: NaiveDate,
    horizon: Months,
    now: DateTime<Utc>,
) -> Vec<(Transaction, RecurringOccurrence)> {
    generate_window(series, covered, None, today, horizon, now)
}

/// Like [`generate`], but with an optional lower bound on occurrence
/// dates. Schedule cutover uses `not_before = today`: the old schedule's
/// history stays, the new one is only expanded forward.
pub(crate) fn generate_window(
    series: &RecurringSeries,
    covered: &HashSet<(Uuid, NaiveDate)>,
    not_before: Option<NaiveDate>,
    today: NaiveDate,
    horizon: Months,
    now: DateTime<Utc>,
) -> Vec<(Transaction, RecurringOccurrence)> {
    if !series.generates() {
        return Vec::new();
    }

    let Some(limit) = today.checked_add_months(horizon) else {
        return Vec::new();
    };
    let limit = match series.end_date {
        Some(end) if end < limit => end,
        _ => limit,
    };

    let mut out = Vec::new();
    for step in 0u32.. {
        let Some(date) = series.frequency.nth_from(series.start_date, step) else {
            break;
        };
        if date > limit {
            break;
        }
        if not_before.is_some_and(|floor| date < floor) {
            continue;
        }
        if covered.contains(&(series.id, date)) {
            continue;
        }

        // The template was validated at series creation, so synthesis
        // cannot fail on the amount invariant.
        let Ok(mut tx) = Transaction::new(
            date,
            series.description.clone(),
            series.amount,
            series.currency,
            series.kind,
            now,
        ) else {
            break;
        };
        if let Some(category_id) = series.category_id {
            tx = tx.with_category(category_id, series.subcategory_id);
        }
        if let Some(account_id) = series.source_account_id {
            tx.source_account_id = Some(account_id);
        }
        if let Some(account_id) = series.target_account_id {
            tx.target_account_id = Some(account_id);
        }

        let occurrence = RecurringOccurrence {
            id: Uuid::new_v4(),
            series_id: series.id,
            date,
            transaction_id: tx.id.clone(),
        };
        tx = tx.with_series(series.id, occurrence.id);

        out.push((tx, occurrence));
    }
    out
}
