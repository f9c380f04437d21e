//! Day-sectioned read view over the transaction set.
//!
//! A secondary, read-only index kept for display: transactions grouped by
//! calendar day, newest day first, newest entry first within a day.
//! Section counts and dates are O(1) lookups; rows hold only ids and are
//! materialized lazily against `LedgerState`. The view is rebuilt whenever
//! the backing state changes; it never carries state of its own.

use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, LedgerState, ResultLedger, Transaction, TransactionId};

#[derive(Debug, Default)]
struct Section {
    date: NaiveDate,
    ids: Vec<TransactionId>,
}

#[derive(Debug, Default)]
pub struct SectionedView {
    sections: Vec<Section>,
}

impl SectionedView {
    /// Rebuilds the index from scratch; O(N log N) over the live set.
    #[must_use]
    pub fn build(state: &LedgerState) -> Self {
        let mut rows: Vec<(&NaiveDate, &Transaction)> =
            state.transactions().map(|tx| (&tx.date, tx)).collect();
        // Newest first; creation time breaks ties within a day.
        rows.sort_by(|a, b| b.0.cmp(a.0).then(b.1.created_at.cmp(&a.1.created_at)));

        let mut sections: Vec<Section> = Vec::new();
        for (date, tx) in rows {
            match sections.last_mut() {
                Some(section) if section.date == *date => section.ids.push(tx.id.clone()),
                _ => sections.push(Section {
                    date: *date,
                    ids: vec![tx.id.clone()],
                }),
            }
        }
        Self { sections }
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn section_date(&self, section: usize) -> Option<NaiveDate> {
        self.sections.get(section).map(|s| s.date)
    }

    #[must_use]
    pub fn section_len(&self, section: usize) -> Option<usize> {
        self.sections.get(section).map(|s| s.ids.len())
    }

    /// Materializes one row against the canonical state.
    #[must_use]
    pub fn row<'a>(
        &self,
        state: &'a LedgerState,
        section: usize,
        index: usize,
    ) -> Option<&'a Transaction> {
        let id = self.sections.get(section)?.ids.get(index)?;
        state.transaction(id)
    }

    /// One page of row ids starting after `cursor` (or from the top for
    /// `None`), plus the cursor for the next page.
    pub fn page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> ResultLedger<(Vec<TransactionId>, Option<String>)> {
        let start = match cursor {
            Some(raw) => {
                let decoded = PageCursor::decode(raw)?;
                match self.position_after(&decoded) {
                    Some(position) => position,
                    None => return Ok((Vec::new(), None)),
                }
            }
            None => 0,
        };

        let flat: Vec<&TransactionId> = self
            .sections
            .iter()
            .flat_map(|section| section.ids.iter())
            .collect();
        let page: Vec<TransactionId> = flat
            .iter()
            .skip(start)
            .take(limit)
            .map(|id| (*id).clone())
            .collect();

        let next = if start + page.len() < flat.len() {
            match page.last() {
                Some(last_id) => {
                    let date = self
                        .sections
                        .iter()
                        .find(|section| section.ids.contains(last_id))
                        .map(|section| section.date);
                    date.map(|date| {
                        PageCursor {
                            date,
                            transaction_id: last_id.clone(),
                        }
                        .encode()
                    })
                    .transpose()?
                }
                None => None,
            }
        } else {
            None
        };

        Ok((page, next))
    }

    /// Flat index of the row following the cursor position, `None` when the
    /// cursor's transaction is gone (the caller restarts from the top).
    fn position_after(&self, cursor: &PageCursor) -> Option<usize> {
        let mut flat_index = 0usize;
        for section in &self.sections {
            for id in &section.ids {
                flat_index += 1;
                if *id == cursor.transaction_id {
                    return Some(flat_index);
                }
            }
        }
        None
    }
}

/// Opaque pagination token: position encoded as base64(JSON).
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PageCursor {
    date: NaiveDate,
    transaction_id: TransactionId,
}

impl PageCursor {
    fn encode(&self) -> ResultLedger<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| LedgerError::InvalidCursor("invalid page cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultLedger<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| LedgerError::InvalidCursor("invalid page cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| LedgerError::InvalidCursor("invalid page cursor".to_string()))
    }
}
