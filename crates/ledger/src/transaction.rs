//! Transaction primitives.
//!
//! A `Transaction` is an immutable value: updates replace the whole record
//! through the apply pipeline, they never mutate one in place. Its identity
//! is content-derived: a SHA-256 over the normalized identifying fields
//! plus the creation timestamp, so two intentionally identical entries
//! (same coffee, same price, bought twice) still get distinct ids.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, LedgerError, Money, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    DepositTopUp,
    DepositWithdrawal,
    DepositInterest,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::DepositTopUp => "deposit_top_up",
            Self::DepositWithdrawal => "deposit_withdrawal",
            Self::DepositInterest => "deposit_interest",
        }
    }

    /// Internal movements between own accounts; excluded from income/expense
    /// reporting.
    #[must_use]
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            Self::Transfer | Self::DepositTopUp | Self::DepositWithdrawal
        )
    }

    /// System-generated entries the user may not delete or edit.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::DepositInterest)
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            "deposit_top_up" => Ok(Self::DepositTopUp),
            "deposit_withdrawal" => Ok(Self::DepositWithdrawal),
            "deposit_interest" => Ok(Self::DepositInterest),
            other => Err(LedgerError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Content-derived transaction identifier (hex-encoded SHA-256).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// NFC-normalize and trim free text before hashing, so visually identical
/// descriptions produce the same id bytes regardless of input composition.
fn normalize_text(input: &str) -> String {
    input.trim().nfc().collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Calendar day the transaction belongs to (no time component).
    pub date: NaiveDate,
    pub description: String,
    /// Always positive; the sign of a balance delta comes from the account
    /// role (source is debited, target is credited), not from the amount.
    pub amount: Money,
    pub currency: Currency,
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub source_account_id: Option<Uuid>,
    pub source_account_name: Option<String>,
    pub target_account_id: Option<Uuid>,
    pub target_account_name: Option<String>,
    /// For cross-currency transfers: what actually arrived on the target.
    pub target_currency: Option<Currency>,
    pub target_amount: Option<Money>,
    pub series_id: Option<Uuid>,
    pub occurrence_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: Money,
        currency: Currency,
        kind: TransactionKind,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Self> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        let description = description.into();
        let id = Self::content_id(date, &description, amount, currency, kind, created_at);
        Ok(Self {
            id,
            date,
            description,
            amount,
            currency,
            kind,
            category_id: None,
            subcategory_id: None,
            source_account_id: None,
            source_account_name: None,
            target_account_id: None,
            target_account_name: None,
            target_currency: None,
            target_amount: None,
            series_id: None,
            occurrence_id: None,
            created_at,
        })
    }

    /// Hash of the normalized identifying fields.
    ///
    /// The creation timestamp participates so intentional duplicates stay
    /// distinct; everything else is normalized first (date to `%Y-%m-%d`,
    /// description trimmed + NFC).
    fn content_id(
        date: NaiveDate,
        description: &str,
        amount: Money,
        currency: Currency,
        kind: TransactionKind,
        created_at: DateTime<Utc>,
    ) -> TransactionId {
        let mut hasher = Sha256::new();
        hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(normalize_text(description).as_bytes());
        hasher.update(b"\x1f");
        hasher.update(amount.minor().to_le_bytes());
        hasher.update(kind.as_str().as_bytes());
        hasher.update(currency.code().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(created_at.to_rfc3339().as_bytes());
        TransactionId(hex::encode(hasher.finalize()))
    }

    pub fn with_category(mut self, category_id: Uuid, subcategory_id: Option<Uuid>) -> Self {
        self.category_id = Some(category_id);
        self.subcategory_id = subcategory_id;
        self
    }

    pub fn with_source_account(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.source_account_id = Some(id);
        self.source_account_name = Some(name.into());
        self
    }

    pub fn with_target_account(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.target_account_id = Some(id);
        self.target_account_name = Some(name.into());
        self
    }

    /// Records the converted amount that arrived on the target side of a
    /// cross-currency transfer.
    pub fn with_target_amount(mut self, currency: Currency, amount: Money) -> Self {
        self.target_currency = Some(currency);
        self.target_amount = Some(amount);
        self
    }

    pub fn with_series(mut self, series_id: Uuid, occurrence_id: Uuid) -> Self {
        self.series_id = Some(series_id);
        self.occurrence_id = Some(occurrence_id);
        self
    }

    /// The year/month bucket the transaction falls into.
    #[must_use]
    pub fn month(&self) -> (i32, u32) {
        use chrono::Datelike;
        (self.date.year(), self.date.month())
    }
}
