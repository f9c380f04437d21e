//! Balance coordination.
//!
//! The coordinator is the single authoritative answer to "what is this
//! account's balance right now". Balances are kept as a baseline plus an
//! accumulated signed delta and moved incrementally per transaction;
//! history is never rescanned on the hot path. A transfer debits the source
//! and credits the target inside one call, so no caller can observe half a
//! transfer.

use std::collections::HashMap;

use tracing::warn;
use uuid::Uuid;

use crate::{Account, BalanceMode, Converter, Currency, Money, Transaction};

/// What happened to the transaction being reflected into balances.
#[derive(Debug)]
pub enum BalanceOp<'a> {
    Add(&'a Transaction),
    Remove(&'a Transaction),
    Update {
        old: &'a Transaction,
        new: &'a Transaction,
    },
}

/// Scheduling hint for a balance update.
///
/// `High` (user-visible edits) awaits the accurate async rate; `Normal`
/// (bulk/background work) settles for the cached rate so a flood of
/// updates never stalls on the rate source. Ordering per account is call
/// order in both cases, since the single-writer pipeline awaits in sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    High,
    Normal,
}

#[derive(Debug)]
struct TrackedAccount {
    currency: Currency,
    mode: BalanceMode,
    baseline: Money,
    delta: Money,
}

/// Owns per-account balances; see the module docs.
#[derive(Debug, Default)]
pub struct BalanceCoordinator {
    accounts: HashMap<Uuid, TrackedAccount>,
}

impl BalanceCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent bulk upsert of tracked accounts and their baselines.
    ///
    /// Re-registering refreshes currency, mode and baseline but keeps the
    /// accumulated delta, so replaying registration is harmless.
    pub fn register_accounts<'a>(&mut self, accounts: impl IntoIterator<Item = &'a Account>) {
        for account in accounts {
            self.accounts
                .entry(account.id)
                .and_modify(|tracked| {
                    tracked.currency = account.currency;
                    tracked.mode = account.mode;
                    tracked.baseline = account.initial_balance;
                })
                .or_insert(TrackedAccount {
                    currency: account.currency,
                    mode: account.mode,
                    baseline: account.initial_balance,
                    delta: Money::ZERO,
                });
        }
    }

    pub fn set_initial_balance(&mut self, amount: Money, account_id: Uuid) {
        match self.accounts.get_mut(&account_id) {
            Some(tracked) => tracked.baseline = amount,
            None => warn!(%account_id, "set_initial_balance for untracked account"),
        }
    }

    pub fn mark_as_manual(&mut self, account_id: Uuid) {
        match self.accounts.get_mut(&account_id) {
            Some(tracked) => tracked.mode = BalanceMode::Manual,
            None => warn!(%account_id, "mark_as_manual for untracked account"),
        }
    }

    pub fn remove_account(&mut self, account_id: &Uuid) {
        self.accounts.remove(account_id);
    }

    /// The current balance: baseline + accumulated delta.
    ///
    /// Manual accounts get the same treatment: their baseline is the
    /// user-entered figure instead of an opening balance, but entered
    /// transactions still move them.
    #[must_use]
    pub fn balance(&self, account_id: &Uuid) -> Option<Money> {
        self.accounts
            .get(account_id)
            .map(|tracked| tracked.baseline + tracked.delta)
    }

    #[must_use]
    pub fn mode(&self, account_id: &Uuid) -> Option<BalanceMode> {
        self.accounts.get(account_id).map(|tracked| tracked.mode)
    }

    /// Applies the signed balance delta implied by `op` in O(1).
    ///
    /// For a transfer both sides are adjusted before the call returns. An
    /// unregistered account is a validated-away case (it means the
    /// pipeline's checks were bypassed), so it is logged and skipped rather
    /// than surfaced.
    pub async fn update_for_transaction<C: Converter>(
        &mut self,
        converter: &C,
        op: BalanceOp<'_>,
        priority: Priority,
    ) {
        match op {
            BalanceOp::Add(tx) => self.apply_signed(converter, tx, 1, priority).await,
            BalanceOp::Remove(tx) => self.apply_signed(converter, tx, -1, priority).await,
            BalanceOp::Update { old, new } => {
                self.apply_signed(converter, old, -1, priority).await;
                self.apply_signed(converter, new, 1, priority).await;
            }
        }
    }

    /// Credits the target and debits the source of `tx`, multiplied by
    /// `sign` (+1 apply, -1 reverse).
    async fn apply_signed<C: Converter>(
        &mut self,
        converter: &C,
        tx: &Transaction,
        sign: i64,
        priority: Priority,
    ) {
        if let Some(source_id) = tx.source_account_id {
            let amount = self
                .in_account_currency(converter, tx, &source_id, false, priority)
                .await;
            if let Some(amount) = amount {
                self.shift(&source_id, Money::new(-sign * amount.minor()));
            }
        }
        if let Some(target_id) = tx.target_account_id {
            let amount = self
                .in_account_currency(converter, tx, &target_id, true, priority)
                .await;
            if let Some(amount) = amount {
                self.shift(&target_id, Money::new(sign * amount.minor()));
            }
        }
    }

    /// Resolves the amount `tx` moves on `account_id`, in that account's
    /// currency.
    ///
    /// The explicit target amount wins for the target side of a
    /// cross-currency transfer; otherwise the converter decides. A missing
    /// rate falls back to the raw amount: dropping the delta entirely
    /// would silently diverge the balance, which is worse than an imprecise
    /// rate.
    async fn in_account_currency<C: Converter>(
        &self,
        converter: &C,
        tx: &Transaction,
        account_id: &Uuid,
        is_target: bool,
        priority: Priority,
    ) -> Option<Money> {
        let Some(tracked) = self.accounts.get(account_id) else {
            warn!(
                %account_id,
                transaction = %tx.id,
                "balance update for unregistered account skipped"
            );
            return None;
        };

        if is_target
            && let (Some(target_currency), Some(target_amount)) =
                (tx.target_currency, tx.target_amount)
            && target_currency == tracked.currency
        {
            return Some(target_amount);
        }

        if tx.currency == tracked.currency {
            return Some(tx.amount);
        }

        let converted = match priority {
            Priority::High => converter.convert(tx.amount, tx.currency, tracked.currency).await,
            Priority::Normal => converter.convert_cached(tx.amount, tx.currency, tracked.currency),
        };
        match converted {
            Some(amount) => Some(amount),
            None => {
                warn!(
                    from = %tx.currency,
                    to = %tracked.currency,
                    transaction = %tx.id,
                    "no conversion rate, applying raw amount"
                );
                Some(tx.amount)
            }
        }
    }

    fn shift(&mut self, account_id: &Uuid, delta: Money) {
        if let Some(tracked) = self.accounts.get_mut(account_id) {
            tracked.delta += delta;
        }
    }
}
