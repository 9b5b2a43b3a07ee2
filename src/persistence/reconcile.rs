//! Stats Reconciliation
//!
//! Local cache and remote store both hold aggregate stats. Every field is
//! cumulative or a record high, so the merge is a per-field max and the
//! side that is behind gets the merged value. Timestamps play no part.

use serde::{Serialize, Deserialize};

use crate::persistence::record::GameHistoryRecord;
use crate::persistence::PersistenceError;

/// Aggregate per-user statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Sessions completed
    pub games_played: u64,
    /// Sum of prizes won
    pub total_earnings: u64,
    /// Best single-session score
    pub highest_score: u32,
}

impl AggregateStats {
    /// Fold a completed session in.
    pub fn apply_record(&mut self, record: &GameHistoryRecord) {
        self.games_played = self.games_played.saturating_add(1);
        self.total_earnings = self.total_earnings.saturating_add(record.earnings);
        self.highest_score = self.highest_score.max(record.score);
    }

    /// Field-wise maximum.
    pub fn merge_max(&self, other: &AggregateStats) -> AggregateStats {
        AggregateStats {
            games_played: self.games_played.max(other.games_played),
            total_earnings: self.total_earnings.max(other.total_earnings),
            highest_score: self.highest_score.max(other.highest_score),
        }
    }

    /// Encode for the local cache.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        bincode::serialize(self).map_err(|e| PersistenceError::Encoding(e.to_string()))
    }

    /// Decode from the local cache.
    pub fn from_bytes(data: &[u8]) -> Result<Self, PersistenceError> {
        bincode::deserialize(data).map_err(|e| PersistenceError::Encoding(e.to_string()))
    }
}

/// Outcome of reconciling two copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    /// Merged value both sides should hold
    pub merged: AggregateStats,
    /// Local cache is behind
    pub push_to_local: bool,
    /// Remote store is behind
    pub push_to_remote: bool,
}

/// Merge local and remote stats. Missing sides count as all zeros.
pub fn reconcile(local: Option<AggregateStats>, remote: Option<AggregateStats>) -> Reconciliation {
    let local_value = local.unwrap_or_default();
    let remote_value = remote.unwrap_or_default();
    let merged = local_value.merge_max(&remote_value);

    Reconciliation {
        merged,
        push_to_local: local.map_or(true, |l| l != merged),
        push_to_remote: remote.map_or(true, |r| r != merged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(games: u64, earnings: u64, high: u32) -> AggregateStats {
        AggregateStats { games_played: games, total_earnings: earnings, highest_score: high }
    }

    #[test]
    fn test_fieldwise_max_both_behind() {
        let r = reconcile(Some(stats(10, 500, 900)), Some(stats(12, 400, 1100)));
        assert_eq!(r.merged, stats(12, 500, 1100));
        assert!(r.push_to_local);
        assert!(r.push_to_remote);
    }

    #[test]
    fn test_only_local_behind() {
        let r = reconcile(Some(stats(1, 0, 100)), Some(stats(3, 50, 300)));
        assert_eq!(r.merged, stats(3, 50, 300));
        assert!(r.push_to_local);
        assert!(!r.push_to_remote);
    }

    #[test]
    fn test_equal_needs_nothing() {
        let r = reconcile(Some(stats(2, 2, 2)), Some(stats(2, 2, 2)));
        assert!(!r.push_to_local);
        assert!(!r.push_to_remote);
    }

    #[test]
    fn test_missing_side_gets_pushed() {
        let r = reconcile(None, Some(stats(4, 10, 20)));
        assert_eq!(r.merged, stats(4, 10, 20));
        assert!(r.push_to_local);
        assert!(!r.push_to_remote);

        let r = reconcile(None, None);
        assert_eq!(r.merged, AggregateStats::default());
    }

    #[test]
    fn test_never_regresses() {
        let local = stats(5, 1000, 1500);
        let r = reconcile(Some(local), Some(stats(0, 0, 0)));
        assert_eq!(r.merged, local);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let s = stats(7, 8, 9);
        assert_eq!(AggregateStats::from_bytes(&s.to_bytes().unwrap()).unwrap(), s);
        assert!(AggregateStats::from_bytes(&[1, 2]).is_err());
    }
}
