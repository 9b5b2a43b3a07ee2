//! Persistence Boundaries
//!
//! The engine pushes finished records to a remote [`ResultStore`] and keeps
//! aggregate stats in a local [`StatsCache`]. Real backends live in the
//! host; the in-memory adapters here back tests and the demo binary.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::persistence::reconcile::AggregateStats;
use crate::persistence::record::GameHistoryRecord;
use crate::persistence::PersistenceError;

/// Remote store of history records and aggregate stats.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Append a finished session.
    async fn push_record(&self, record: &GameHistoryRecord) -> Result<(), PersistenceError>;
    /// Aggregate stats for a user, `None` if never stored.
    async fn load_stats(&self, user_id: &str) -> Result<Option<AggregateStats>, PersistenceError>;
    /// Overwrite aggregate stats for a user.
    async fn save_stats(&self, user_id: &str, stats: AggregateStats) -> Result<(), PersistenceError>;
}

/// Device-local stats cache.
#[async_trait]
pub trait StatsCache: Send + Sync {
    /// Cached stats, `None` if absent.
    async fn load(&self, user_id: &str) -> Result<Option<AggregateStats>, PersistenceError>;
    /// Replace cached stats.
    async fn store(&self, user_id: &str, stats: AggregateStats) -> Result<(), PersistenceError>;
}

// =============================================================================
// IN-MEMORY ADAPTERS
// =============================================================================

/// In-memory remote store with a switch to simulate going offline.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    records: RwLock<Vec<GameHistoryRecord>>,
    stats: RwLock<BTreeMap<String, AggregateStats>>,
    offline: AtomicBool,
}

impl InMemoryResultStore {
    /// Empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Records pushed so far.
    pub async fn records(&self) -> Vec<GameHistoryRecord> {
        self.records.read().await.clone()
    }

    fn check_online(&self) -> Result<(), PersistenceError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable(String::from("result store offline")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn push_record(&self, record: &GameHistoryRecord) -> Result<(), PersistenceError> {
        self.check_online()?;
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn load_stats(&self, user_id: &str) -> Result<Option<AggregateStats>, PersistenceError> {
        self.check_online()?;
        Ok(self.stats.read().await.get(user_id).copied())
    }

    async fn save_stats(&self, user_id: &str, stats: AggregateStats) -> Result<(), PersistenceError> {
        self.check_online()?;
        self.stats.write().await.insert(user_id.to_string(), stats);
        Ok(())
    }
}

/// In-memory cache holding the encoded bytes, like a key-value store would.
#[derive(Debug, Default)]
pub struct InMemoryStatsCache {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStatsCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put raw bytes under a key (for corrupt-entry tests).
    pub async fn insert_raw(&self, user_id: &str, bytes: Vec<u8>) {
        self.entries.write().await.insert(user_id.to_string(), bytes);
    }
}

#[async_trait]
impl StatsCache for InMemoryStatsCache {
    async fn load(&self, user_id: &str) -> Result<Option<AggregateStats>, PersistenceError> {
        match self.entries.read().await.get(user_id) {
            Some(bytes) => AggregateStats::from_bytes(bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn store(&self, user_id: &str, stats: AggregateStats) -> Result<(), PersistenceError> {
        let bytes = stats.to_bytes()?;
        self.entries.write().await.insert(user_id.to_string(), bytes);
        Ok(())
    }
}
