//! The module contains the `Account` struct and its implementation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, Money};

/// How an account's balance is established.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceMode {
    /// The baseline is a figure the user typed in; entered transactions
    /// still move it incrementally, but it does not start from zero.
    Manual,
    /// The baseline is an explicit initial balance and everything else is
    /// the signed sum of transaction history.
    #[default]
    Derived,
}

/// Terms of a savings deposit attached to an account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositTerms {
    pub principal: Money,
    /// Annual interest rate in basis points (250 = 2.50 % p.a.).
    pub annual_rate_bps: u32,
    /// Day of month interest is posted on (clamped to the month's length).
    pub posting_day: u32,
    /// If set, posted interest is folded into the principal.
    pub capitalize: bool,
}

/// An account.
///
/// An account is a representation of a bank account, a card, a cash wallet
/// or a deposit. The balance itself is **not** stored here: the balance
/// coordinator owns the authoritative figure; the account only carries the
/// baseline the coordinator starts from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, generated once so the account can be renamed
    /// without breaking references.
    pub id: Uuid,
    pub name: String,
    pub currency: Currency,
    pub mode: BalanceMode,
    /// Baseline for both modes: the manually set figure in `Manual`, the
    /// opening balance in `Derived`.
    pub initial_balance: Money,
    pub deposit: Option<DepositTerms>,
    pub display_order: Option<u32>,
}

impl Account {
    pub fn new(name: impl Into<String>, currency: Currency, initial_balance: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency,
            mode: BalanceMode::Derived,
            initial_balance,
            deposit: None,
            display_order: None,
        }
    }

    pub fn manual(name: impl Into<String>, currency: Currency, balance: Money) -> Self {
        Self {
            mode: BalanceMode::Manual,
            ..Self::new(name, currency, balance)
        }
    }

    pub fn with_deposit(mut self, terms: DepositTerms) -> Self {
        self.deposit = Some(terms);
        self
    }
}
