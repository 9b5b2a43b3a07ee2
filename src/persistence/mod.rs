//! Result Persistence
//!
//! Turns a completed session into a storable record and keeps aggregate
//! stats consistent between the device cache and the remote store.
//! Nothing here is on the timing-critical path; the driver spawns these
//! calls and only logs failures.

pub mod record;
pub mod reconcile;
pub mod store;
pub mod sync;

use thiserror::Error;

pub use record::{GameHistoryRecord, QuestionPerformance};
pub use reconcile::{reconcile, AggregateStats, Reconciliation};
pub use store::{InMemoryResultStore, InMemoryStatsCache, ResultStore, StatsCache};
pub use sync::{persist_completion, sync_stats};

/// Persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Backend unreachable or refused the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored bytes could not be encoded/decoded.
    #[error("encoding error: {0}")]
    Encoding(String),
}
