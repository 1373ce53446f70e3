use crate::model::{ReplicaResultSet, ReplicaStatus};

/// Per-replica classification of one attempt's result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuorumTally {
    /// Replicas that answered at all.
    pub responded: usize,
    /// Replicas reporting a failure status (or nothing usable).
    pub failed: usize,
    /// First version-conflict status seen, if any.
    pub version_conflict: Option<ReplicaStatus>,
    /// Replicas that rejected the protection key.
    pub security_rejections: usize,
}

impl QuorumTally {
    pub fn from_results(results: &ReplicaResultSet) -> Self {
        let mut tally = QuorumTally {
            responded: results.len(),
            ..Default::default()
        };

        for (_, statuses) in results.iter() {
            if statuses.is_empty() {
                tally.failed += 1;
                continue;
            }
            if let Some(conflict) = statuses.values().find(|s| s.is_version_conflict()) {
                tally.version_conflict.get_or_insert(*conflict);
                continue;
            }
            if statuses.values().any(|s| s.is_security_failure()) {
                tally.security_rejections += 1;
            }
            if statuses.values().any(|s| !s.is_ok()) {
                tally.failed += 1;
            }
        }
        tally
    }

    /// Strictly fewer than half of the responding replicas failed.
    pub fn majority_succeeded(&self) -> bool {
        self.responded > 0 && self.failed * 2 < self.responded
    }
}
