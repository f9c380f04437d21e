//! Typed mutation events.
//!
//! Every change to the ledger (user edits, bulk imports, series
//! lifecycle) is expressed as one of these values and pushed through the apply
//! pipeline, which runs its side effects (state mutation, balance deltas,
//! cache invalidation, aggregate maintenance, persistence, notification) in
//! one fixed order. State is never mutated ad hoc.

use uuid::Uuid;

use crate::{RecurringSeries, Transaction};

#[derive(Clone, Debug)]
pub enum LedgerEvent {
    Added(Transaction),
    Updated {
        old: Box<Transaction>,
        new: Box<Transaction>,
    },
    Deleted(Transaction),
    BulkAdded(Vec<Transaction>),
    SeriesCreated(RecurringSeries),
    SeriesUpdated {
        old: Box<RecurringSeries>,
        new: Box<RecurringSeries>,
    },
    SeriesStopped(Uuid),
    SeriesDeleted(Uuid),
}
