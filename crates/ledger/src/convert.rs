//! Currency conversion collaborator.
//!
//! The ledger never fetches rates itself. A `Converter` is injected at
//! construction and consulted two ways: the synchronous cached path feeds
//! computed aggregates (best effort, must not suspend), the asynchronous
//! path feeds balance updates (accurate, may hit the network). Either path
//! may answer `None`: missing rates are the collaborator's honest answer,
//! not an error.

use std::collections::HashMap;

use crate::{Currency, Money};

#[allow(async_fn_in_trait)]
pub trait Converter {
    /// Best-effort conversion from whatever rate is already on hand.
    fn convert_cached(&self, amount: Money, from: Currency, to: Currency) -> Option<Money>;

    /// Accurate conversion; may suspend while the rate is looked up.
    async fn convert(&self, amount: Money, from: Currency, to: Currency) -> Option<Money>;
}

/// Static rate table.
///
/// The reference `Converter`: rates are fixed-point micro-units (1_000_000
/// = 1.0) so the whole path stays in integer arithmetic, matching the
/// minor-units rule for money. Conversion accounts for differing decimal
/// scales between currencies and rounds half away from zero.
#[derive(Debug, Default, Clone)]
pub struct FixedRates {
    /// (from, to) → rate in micro-units.
    rates: HashMap<(Currency, Currency), u64>,
}

impl FixedRates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rate and its reciprocal.
    #[must_use]
    pub fn with_rate(mut self, from: Currency, to: Currency, rate_micro: u64) -> Self {
        self.rates.insert((from, to), rate_micro);
        if rate_micro > 0 {
            let reciprocal = (1_000_000u128 * 1_000_000 / u128::from(rate_micro)) as u64;
            self.rates.entry((to, from)).or_insert(reciprocal);
        }
        self
    }

    fn apply(&self, amount: Money, from: Currency, to: Currency) -> Option<Money> {
        if from == to {
            return Some(amount);
        }
        let rate = *self.rates.get(&(from, to))?;

        // amount_minor(from) / 10^mu(from) * rate * 10^mu(to), rounded half
        // away from zero. Kept in i128 to avoid intermediate overflow.
        let numerator = i128::from(amount.minor())
            * i128::from(rate)
            * 10i128.pow(u32::from(to.minor_units()));
        let denominator = 1_000_000i128 * 10i128.pow(u32::from(from.minor_units()));
        let half = denominator / 2;
        let rounded = if numerator >= 0 {
            (numerator + half) / denominator
        } else {
            (numerator - half) / denominator
        };
        i64::try_from(rounded).ok().map(Money::new)
    }
}

impl Converter for FixedRates {
    fn convert_cached(&self, amount: Money, from: Currency, to: Currency) -> Option<Money> {
        self.apply(amount, from, to)
    }

    async fn convert(&self, amount: Money, from: Currency, to: Currency) -> Option<Money> {
        self.apply(amount, from, to)
    }
}
