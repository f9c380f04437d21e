//! Incrementally maintained report totals.
//!
//! Two running folds over the transaction set, both in the base currency:
//! expense per category and income/expense per calendar month. They are
//! caches, not truth: after a bulk import, a base-currency change or
//! detected drift, `rebuild` recomputes them with one O(N) scan, and the
//! result must match what the incremental path accumulated.
//!
//! Both paths convert through the same synchronous cached rate, so with a
//! stable rate table they agree exactly; a drifting live source is bounded
//! by one minor unit per transaction.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{Converter, Currency, Money, Transaction, TransactionKind};

/// Converts into the base currency for aggregation.
///
/// Falls back to the raw amount when no rate is on hand, mirroring the
/// balance coordinator's policy: an imprecise bucket beats a silently
/// missing one.
fn to_base<C: Converter>(
    converter: &C,
    amount: Money,
    from: Currency,
    base: Currency,
) -> Money {
    converter.convert_cached(amount, from, base).unwrap_or(amount)
}

/// Expense total per category, in base currency.
#[derive(Debug, Default)]
pub struct CategoryTotals {
    totals: HashMap<Uuid, Money>,
}

impl CategoryTotals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total(&self, category_id: &Uuid) -> Money {
        self.totals.get(category_id).copied().unwrap_or(Money::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &Money)> {
        self.totals.iter()
    }

    pub fn apply_added<C: Converter>(&mut self, converter: &C, tx: &Transaction, base: Currency) {
        self.shift(converter, tx, base, 1);
    }

    pub fn apply_deleted<C: Converter>(&mut self, converter: &C, tx: &Transaction, base: Currency) {
        self.shift(converter, tx, base, -1);
    }

    /// May span two buckets when the category changed.
    pub fn apply_updated<C: Converter>(
        &mut self,
        converter: &C,
        old: &Transaction,
        new: &Transaction,
        base: Currency,
    ) {
        self.shift(converter, old, base, -1);
        self.shift(converter, new, base, 1);
    }

    pub fn rebuild<'a, C: Converter>(
        &mut self,
        converter: &C,
        transactions: impl IntoIterator<Item = &'a Transaction>,
        base: Currency,
    ) {
        self.totals.clear();
        for tx in transactions {
            self.shift(converter, tx, base, 1);
        }
    }

    fn shift<C: Converter>(&mut self, converter: &C, tx: &Transaction, base: Currency, sign: i64) {
        if tx.kind != TransactionKind::Expense {
            return;
        }
        let Some(category_id) = tx.category_id else {
            return;
        };
        let converted = to_base(converter, tx.amount, tx.currency, base);
        let entry = self.totals.entry(category_id).or_insert(Money::ZERO);
        *entry += Money::new(sign * converted.minor());
        if entry.is_zero() {
            self.totals.remove(&category_id);
        }
    }
}

/// One month's income/expense pair, in base currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonthlyBucket {
    pub income: Money,
    pub expense: Money,
}

/// Income/expense totals keyed by `(year, month)`, in base currency.
///
/// Internal movements (transfers, deposit top-ups/withdrawals) are
/// excluded; deposit interest counts as income.
#[derive(Debug, Default)]
pub struct MonthlyTotals {
    totals: HashMap<(i32, u32), MonthlyBucket>,
}

impl MonthlyTotals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bucket(&self, year: i32, month: u32) -> MonthlyBucket {
        self.totals
            .get(&(year, month))
            .copied()
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(i32, u32), &MonthlyBucket)> {
        self.totals.iter()
    }

    pub fn apply_added<C: Converter>(&mut self, converter: &C, tx: &Transaction, base: Currency) {
        self.shift(converter, tx, base, 1);
    }

    pub fn apply_deleted<C: Converter>(&mut self, converter: &C, tx: &Transaction, base: Currency) {
        self.shift(converter, tx, base, -1);
    }

    /// May span two buckets when the date moved across a month boundary.
    pub fn apply_updated<C: Converter>(
        &mut self,
        converter: &C,
        old: &Transaction,
        new: &Transaction,
        base: Currency,
    ) {
        self.shift(converter, old, base, -1);
        self.shift(converter, new, base, 1);
    }

    pub fn rebuild<'a, C: Converter>(
        &mut self,
        converter: &C,
        transactions: impl IntoIterator<Item = &'a Transaction>,
        base: Currency,
    ) {
        self.totals.clear();
        for tx in transactions {
            self.shift(converter, tx, base, 1);
        }
    }

    fn shift<C: Converter>(&mut self, converter: &C, tx: &Transaction, base: Currency, sign: i64) {
        let is_income = matches!(
            tx.kind,
            TransactionKind::Income | TransactionKind::DepositInterest
        );
        if !is_income && tx.kind != TransactionKind::Expense {
            return;
        }
        let converted = to_base(converter, tx.amount, tx.currency, base);
        let signed = Money::new(sign * converted.minor());
        let entry = self.totals.entry(tx.month()).or_default();
        if is_income {
            entry.income += signed;
        } else {
            entry.expense += signed;
        }
        if entry.income.is_zero() && entry.expense.is_zero() {
            self.totals.remove(&tx.month());
        }
    }
}
