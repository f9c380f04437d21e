//! Event-sourced personal-finance ledger.
//!
//! The [`Ledger`] owns the canonical in-memory collections and serializes
//! every mutation through one apply pipeline with a fixed side-effect
//! order: validate, mutate state, move balances, invalidate report caches,
//! maintain aggregates, persist, notify. Persistence and currency rates are
//! injected collaborators ([`Store`], [`Converter`]); the ledger itself is
//! the source of truth for the running session.
//!
//! Single-writer by construction: all mutation goes through `&mut self`, so
//! the borrow checker enforces the serialization the design asks for.
//! Suspension happens only after the synchronous in-memory mutation, at
//! store saves and rate lookups.

use std::time::Duration;

use chrono::Months;

pub use account::{Account, BalanceMode, DepositTerms};
pub use aggregate::{CategoryTotals, MonthlyBucket, MonthlyTotals};
pub use balance::{BalanceCoordinator, BalanceOp, Priority};
pub use cache::LruCache;
pub use category::{Category, CategoryKind, SubcategoryLink};
pub use convert::{Converter, FixedRates};
pub use currency::Currency;
pub use error::LedgerError;
pub use event::LedgerEvent;
pub use money::Money;
pub use notify::ChangeNotifier;
pub use recurring::{
    Frequency, RecurringOccurrence, RecurringSeries, Subscription, SubscriptionStatus,
};
pub use state::LedgerState;
pub use store::{CommitSync, LedgerSnapshot, Store, StoreError};
pub use transaction::{Transaction, TransactionId, TransactionKind};
pub use view::SectionedView;

pub use ops::reports::Summary;

mod account;
mod aggregate;
mod balance;
mod cache;
mod category;
mod convert;
mod currency;
mod error;
mod event;
mod money;
mod notify;
mod ops;
mod recurring;
mod state;
mod store;
mod transaction;
mod view;

pub mod generator {
    //! Re-export of the pure occurrence generator for direct use in tests
    //! and tooling.
    pub use crate::recurring::generate;
}

pub type ResultLedger<T> = Result<T, LedgerError>;

use ops::reports::{CachedReport, ReportKey};

/// The event-sourced transaction store.
///
/// Generic over the persistence backend and the currency-rate source so
/// both are fixed at construction time; operations that need extra backend
/// capabilities (the synchronous import commit) require them through trait
/// bounds instead of runtime type inspection.
pub struct Ledger<S, C> {
    state: LedgerState,
    balances: BalanceCoordinator,
    category_totals: CategoryTotals,
    monthly_totals: MonthlyTotals,
    reports: LruCache<ReportKey, CachedReport>,
    view: SectionedView,
    store: S,
    converter: C,
    notifier: ChangeNotifier,
    base_currency: Currency,
    horizon: Months,
    importing: bool,
}

impl<S: Store, C: Converter> Ledger<S, C> {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder(store: S, converter: C) -> LedgerBuilder<S, C> {
        LedgerBuilder {
            store,
            converter,
            base_currency: Currency::default(),
            cache_capacity: 32,
            horizon_months: 3,
            debounce: Duration::from_millis(16),
        }
    }

    /// Read-only canonical state.
    #[must_use]
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// The currency all reports and aggregates are expressed in.
    #[must_use]
    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    /// Day-sectioned read view for display.
    #[must_use]
    pub fn view(&self) -> &SectionedView {
        &self.view
    }

    /// A receiver whose value bumps once per coalesced mutation burst.
    #[must_use]
    pub fn subscribe_changes(&self) -> tokio::sync::watch::Receiver<u64> {
        self.notifier.subscribe()
    }

    /// The persistence backend, for inspection.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tears the ledger down, handing the backend back (e.g. to reopen it).
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}

/// The builder for `Ledger`.
pub struct LedgerBuilder<S, C> {
    store: S,
    converter: C,
    base_currency: Currency,
    cache_capacity: usize,
    horizon_months: u32,
    debounce: Duration,
}

impl<S: Store, C: Converter> LedgerBuilder<S, C> {
    /// Currency reports and aggregates are expressed in.
    pub fn base_currency(mut self, currency: Currency) -> Self {
        self.base_currency = currency;
        self
    }

    /// Capacity of the report cache.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// How far ahead recurring series are expanded, in months.
    pub fn horizon_months(mut self, months: u32) -> Self {
        self.horizon_months = months;
        self
    }

    /// Quiet period that ends a mutation burst (roughly one UI frame).
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Construct `Ledger`, loading all collections from the store and
    /// deriving balances, aggregates and the read view from them.
    pub async fn build(self) -> ResultLedger<Ledger<S, C>> {
        let mut state = LedgerState::default();
        for account in self.store.load_accounts().await? {
            state.accounts.insert(account.id, account);
        }
        for category in self.store.load_categories().await? {
            state.categories.insert(category.id, category);
        }
        state.subcategory_links = self.store.load_subcategory_links().await?;
        for tx in self.store.load_transactions().await? {
            state.insert_transaction(tx);
        }
        for series in self.store.load_series().await? {
            state.series.insert(series.id, series);
        }
        state.occurrences = self.store.load_occurrences().await?;

        let mut balances = BalanceCoordinator::new();
        balances.register_accounts(state.accounts.values());
        for tx in state.transactions.values() {
            balances
                .update_for_transaction(&self.converter, BalanceOp::Add(tx), Priority::Normal)
                .await;
        }

        let mut category_totals = CategoryTotals::new();
        category_totals.rebuild(&self.converter, state.transactions(), self.base_currency);
        let mut monthly_totals = MonthlyTotals::new();
        monthly_totals.rebuild(&self.converter, state.transactions(), self.base_currency);

        let view = SectionedView::build(&state);

        Ok(Ledger {
            state,
            balances,
            category_totals,
            monthly_totals,
            reports: LruCache::new(self.cache_capacity),
            view,
            store: self.store,
            converter: self.converter,
            notifier: ChangeNotifier::spawn(self.debounce),
            base_currency: self.base_currency,
            horizon: Months::new(self.horizon_months),
            importing: false,
        })
    }
}
