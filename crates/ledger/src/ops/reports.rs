//! Reporting reads: range summaries, per-category and per-day expense
//! totals, pagination.
//!
//! Reads go through the LRU cache first and fall back to a computation
//! over the canonical state. Mutations invalidate exactly the cached
//! ranges that contain the touched date; only bulk operations and a base
//! currency change clear the whole cache.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    Converter, Currency, Ledger, LedgerError, Money, ResultLedger, Store, TransactionId,
    TransactionKind,
};

/// Income/expense/transfer totals over a date range, in base currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub income: Money,
    pub expense: Money,
    pub transfers: Money,
    /// `income - expense`; transfers move money around, they are not flow.
    pub net: Money,
}

/// Cache key: report kind plus its half-open `[from, to)` range.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ReportKey {
    Summary { from: NaiveDate, to: NaiveDate },
    CategoryExpenses { from: NaiveDate, to: NaiveDate },
    DailyExpenses { from: NaiveDate, to: NaiveDate },
}

impl ReportKey {
    /// Whether a mutation on `date` can change this cached value.
    fn covers(&self, date: NaiveDate) -> bool {
        let (from, to) = match self {
            ReportKey::Summary { from, to }
            | ReportKey::CategoryExpenses { from, to }
            | ReportKey::DailyExpenses { from, to } => (*from, *to),
        };
        from <= date && date < to
    }
}

#[derive(Clone, Debug)]
pub(crate) enum CachedReport {
    Summary(Summary),
    CategoryExpenses(Vec<(Uuid, Money)>),
    DailyExpenses(Vec<(NaiveDate, Money)>),
}

fn validate_range(from: NaiveDate, to: NaiveDate) -> ResultLedger<()> {
    if from >= to {
        return Err(LedgerError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

impl<S: Store, C: Converter> Ledger<S, C> {
    /// Total income/expense/transfer/net flow over `[from, to)`.
    pub fn summary(&mut self, from: NaiveDate, to: NaiveDate) -> ResultLedger<Summary> {
        validate_range(from, to)?;
        let key = ReportKey::Summary { from, to };
        if let Some(CachedReport::Summary(cached)) = self.reports.get(&key) {
            return Ok(*cached);
        }

        let mut summary = Summary::default();
        for tx in self.state.transactions() {
            if tx.date < from || tx.date >= to {
                continue;
            }
            let amount = self.in_base(tx.amount, tx.currency);
            match tx.kind {
                TransactionKind::Income | TransactionKind::DepositInterest => {
                    summary.income += amount;
                }
                TransactionKind::Expense => summary.expense += amount,
                kind if kind.is_internal() => summary.transfers += amount,
                _ => {}
            }
        }
        summary.net = summary.income - summary.expense;

        self.reports.set(key, CachedReport::Summary(summary));
        Ok(summary)
    }

    /// Expense total per category over `[from, to)`, largest first.
    pub fn category_expenses(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultLedger<Vec<(Uuid, Money)>> {
        validate_range(from, to)?;
        let key = ReportKey::CategoryExpenses { from, to };
        if let Some(CachedReport::CategoryExpenses(cached)) = self.reports.get(&key) {
            return Ok(cached.clone());
        }

        let mut totals: std::collections::HashMap<Uuid, Money> = std::collections::HashMap::new();
        for tx in self.state.transactions() {
            if tx.kind != TransactionKind::Expense || tx.date < from || tx.date >= to {
                continue;
            }
            let Some(category_id) = tx.category_id else {
                continue;
            };
            *totals.entry(category_id).or_insert(Money::ZERO) +=
                self.in_base(tx.amount, tx.currency);
        }
        let mut out: Vec<(Uuid, Money)> = totals.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        self.reports
            .set(key, CachedReport::CategoryExpenses(out.clone()));
        Ok(out)
    }

    /// Expense total per calendar day over `[from, to)`, chronological.
    pub fn daily_expenses(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultLedger<Vec<(NaiveDate, Money)>> {
        validate_range(from, to)?;
        let key = ReportKey::DailyExpenses { from, to };
        if let Some(CachedReport::DailyExpenses(cached)) = self.reports.get(&key) {
            return Ok(cached.clone());
        }

        let mut totals: std::collections::BTreeMap<NaiveDate, Money> =
            std::collections::BTreeMap::new();
        for tx in self.state.transactions() {
            if tx.kind != TransactionKind::Expense || tx.date < from || tx.date >= to {
                continue;
            }
            *totals.entry(tx.date).or_insert(Money::ZERO) += self.in_base(tx.amount, tx.currency);
        }
        let out: Vec<(NaiveDate, Money)> = totals.into_iter().collect();

        self.reports
            .set(key, CachedReport::DailyExpenses(out.clone()));
        Ok(out)
    }

    /// Expense total for one category since forever, from the running
    /// aggregate: O(1), no scan.
    #[must_use]
    pub fn category_total(&self, category_id: &Uuid) -> Money {
        self.category_totals.total(category_id)
    }

    /// Income/expense bucket for one month, from the running aggregate.
    #[must_use]
    pub fn monthly_bucket(&self, year: i32, month: u32) -> crate::MonthlyBucket {
        self.monthly_totals.bucket(year, month)
    }

    /// One page of the day-sectioned view; `cursor` of `None` starts at the
    /// top, the returned token resumes after the last row of this page.
    pub fn page_transactions(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> ResultLedger<(Vec<TransactionId>, Option<String>)> {
        self.view.page(cursor, limit)
    }

    /// Switches the reporting currency: full aggregate rebuild plus a
    /// blanket cache clear, the two places incremental maintenance cannot
    /// be trusted across.
    pub fn set_base_currency(&mut self, currency: Currency) {
        if currency == self.base_currency {
            return;
        }
        self.base_currency = currency;
        self.rebuild_aggregates();
        self.reports.clear();
        self.notifier.submit();
    }

    pub(crate) fn rebuild_aggregates(&mut self) {
        self.category_totals
            .rebuild(&self.converter, self.state.transactions(), self.base_currency);
        self.monthly_totals
            .rebuild(&self.converter, self.state.transactions(), self.base_currency);
    }

    /// Drops exactly the cached reports whose range contains `date`.
    pub(crate) fn invalidate_reports_for_date(&mut self, date: NaiveDate) {
        let stale: Vec<ReportKey> = self
            .reports
            .keys()
            .into_iter()
            .filter(|key| key.covers(date))
            .collect();
        for key in stale {
            self.reports.remove(&key);
        }
    }

    fn in_base(&self, amount: Money, from: Currency) -> Money {
        self.converter
            .convert_cached(amount, from, self.base_currency)
            .unwrap_or(amount)
    }
}
