//! Stats Sync
//!
//! Glue between the stores: fold a finished session into both copies of
//! the aggregate stats and keep them reconciled.

use tracing::{debug, instrument, warn};

use crate::persistence::reconcile::{reconcile, AggregateStats};
use crate::persistence::record::GameHistoryRecord;
use crate::persistence::store::{ResultStore, StatsCache};
use crate::persistence::PersistenceError;

/// Reconcile local and remote stats and write back to whichever is behind.
///
/// An unreadable cache entry counts as missing. If the remote store
/// fails the local copy is left as it was and the error is returned.
#[instrument(skip(cache, store))]
pub async fn sync_stats(
    cache: &dyn StatsCache,
    store: &dyn ResultStore,
    user_id: &str,
) -> Result<AggregateStats, PersistenceError> {
    let local = load_local(cache, user_id).await;
    let remote = store.load_stats(user_id).await?;

    let result = reconcile(local, remote);
    if result.push_to_local {
        debug!("Local stats behind, updating cache");
        cache.store(user_id, result.merged).await?;
    }
    if result.push_to_remote {
        debug!("Remote stats behind, updating store");
        store.save_stats(user_id, result.merged).await?;
    }
    Ok(result.merged)
}

/// Record a finished session locally and remotely, then reconcile.
///
/// The local cache is updated first so a remote failure never loses
/// the session from this device's stats; the next sync catches up.
#[instrument(skip(cache, store, record), fields(user = %record.user_id, score = record.score))]
pub async fn persist_completion(
    cache: &dyn StatsCache,
    store: &dyn ResultStore,
    record: &GameHistoryRecord,
) -> Result<AggregateStats, PersistenceError> {
    let user_id = record.user_id.as_str();

    let mut local = load_local(cache, user_id).await.unwrap_or_default();
    local.apply_record(record);
    cache.store(user_id, local).await?;

    store.push_record(record).await?;

    let mut remote = store.load_stats(user_id).await?.unwrap_or_default();
    remote.apply_record(record);

    let result = reconcile(Some(local), Some(remote));
    store.save_stats(user_id, result.merged).await?;
    if result.push_to_local {
        cache.store(user_id, result.merged).await?;
    }
    Ok(result.merged)
}

async fn load_local(cache: &dyn StatsCache, user_id: &str) -> Option<AggregateStats> {
    match cache.load(user_id).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Discarding unreadable cached stats for {}: {}", user_id, e);
            None
        }
    }
}
