//! Deposit interest accrual.
//!
//! Accounts carrying deposit terms get one system-generated interest
//! transaction per posting month. The entries are protected (the pipeline
//! refuses to edit or delete them) and accrual is idempotent per
//! `(account, year, month)`, checked against the live transaction set.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    Converter, Ledger, LedgerEvent, Money, Priority, ResultLedger, Store, Transaction,
    TransactionKind,
};

fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

/// Monthly interest in minor units: principal × (bps / 10 000) / 12,
/// rounded half away from zero.
fn monthly_interest(principal: Money, annual_rate_bps: u32) -> Money {
    let numerator = i128::from(principal.minor()) * i128::from(annual_rate_bps);
    let denominator = 10_000i128 * 12;
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    Money::new(rounded as i64)
}

impl<S: Store, C: Converter> Ledger<S, C> {
    /// Posts interest for every deposit account whose posting day for the
    /// current month has been reached. Returns the number of entries
    /// created; a second run in the same month creates none.
    pub async fn accrue_deposit_interest(
        &mut self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultLedger<usize> {
        let candidates: Vec<crate::Account> = self
            .state
            .accounts()
            .filter(|account| account.deposit.is_some())
            .cloned()
            .collect();

        let mut posted = 0usize;
        for account in candidates {
            let Some(terms) = account.deposit.as_ref() else {
                continue;
            };

            let (year, month) = (today.year(), today.month());
            let day = terms.posting_day.clamp(1, days_in_month(year, month));
            let Some(posting_date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            if posting_date > today {
                continue;
            }

            let already_posted = self.state.transactions().any(|tx| {
                tx.kind == TransactionKind::DepositInterest
                    && tx.target_account_id == Some(account.id)
                    && tx.month() == (year, month)
            });
            if already_posted {
                continue;
            }

            let interest = monthly_interest(terms.principal, terms.annual_rate_bps);
            if !interest.is_positive() {
                continue;
            }

            let Ok(tx) = Transaction::new(
                posting_date,
                format!("Interest on {}", account.name),
                interest,
                account.currency,
                TransactionKind::DepositInterest,
                now,
            ) else {
                continue;
            };
            let tx = tx.with_target_account(account.id, account.name.clone());

            // System-generated: goes straight through the pipeline, the
            // user-input validation path does not apply.
            self.apply(LedgerEvent::Added(tx), Priority::Normal).await;
            posted += 1;

            if terms.capitalize
                && let Some(stored) = self.state.accounts.get_mut(&account.id)
                && let Some(stored_terms) = stored.deposit.as_mut()
            {
                stored_terms.principal += interest;
            }
        }

        if posted > 0 && !self.importing {
            self.persist_accounts().await;
        }
        Ok(posted)
    }
}
