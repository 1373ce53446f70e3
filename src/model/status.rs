use super::types::{FullKey, ReplicaId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status a replica reports for one key of one operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicaStatus {
    Ok,
    Failed,
    FailedNotAbsent,
    /// The protection key presented does not match the one bound to the address.
    FailedSecurity,
    /// The version id is already held with a different parent.
    VersionConflict,
    /// The address already has versions but the write names no parent.
    VersionConflictNoBasedOn,
    /// The named parent is not held by the replica.
    VersionConflictNoVersionKey,
    /// The version is older than the newest version held.
    VersionConflictOldTimestamp,
    NotFound,
}

impl ReplicaStatus {
    pub fn is_ok(self) -> bool {
        self == ReplicaStatus::Ok
    }

    pub fn is_version_conflict(self) -> bool {
        matches!(
            self,
            ReplicaStatus::VersionConflict
                | ReplicaStatus::VersionConflictNoBasedOn
                | ReplicaStatus::VersionConflictNoVersionKey
                | ReplicaStatus::VersionConflictOldTimestamp
        )
    }

    pub fn is_security_failure(self) -> bool {
        self == ReplicaStatus::FailedSecurity
    }
}

impl fmt::Display for ReplicaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplicaStatus::Ok => "OK",
            ReplicaStatus::Failed => "FAILED",
            ReplicaStatus::FailedNotAbsent => "FAILED_NOT_ABSENT",
            ReplicaStatus::FailedSecurity => "FAILED_SECURITY",
            ReplicaStatus::VersionConflict => "VERSION_CONFLICT",
            ReplicaStatus::VersionConflictNoBasedOn => "VERSION_CONFLICT_NO_BASED_ON",
            ReplicaStatus::VersionConflictNoVersionKey => "VERSION_CONFLICT_NO_VERSION_KEY",
            ReplicaStatus::VersionConflictOldTimestamp => "VERSION_CONFLICT_OLD_TIMESTAMP",
            ReplicaStatus::NotFound => "NOT_FOUND",
        };
        f.write_str(name)
    }
}

/// Per-replica outcome of one store attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicaResultSet {
    replies: BTreeMap<ReplicaId, BTreeMap<FullKey, ReplicaStatus>>,
}

impl ReplicaResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, replica: ReplicaId, key: FullKey, status: ReplicaStatus) {
        self.replies.entry(replica).or_default().insert(key, status);
    }

    /// Records that a replica answered without reporting any key.
    pub fn insert_empty(&mut self, replica: ReplicaId) {
        self.replies.entry(replica).or_default();
    }

    pub fn with(mut self, replica: ReplicaId, key: FullKey, status: ReplicaStatus) -> Self {
        self.insert(replica, key, status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Number of replicas that responded.
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn replicas(&self) -> impl Iterator<Item = &ReplicaId> {
        self.replies.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReplicaId, &BTreeMap<FullKey, ReplicaStatus>)> {
        self.replies.iter()
    }

    /// Whether any replica accepted `key`.
    pub fn accepted(&self, key: &FullKey) -> bool {
        self.replies
            .values()
            .any(|statuses| statuses.get(key).is_some_and(|status| status.is_ok()))
    }

    /// Whether `replica` answered with OK for every key it reported.
    pub fn acknowledged(&self, replica: &ReplicaId) -> bool {
        self.replies
            .get(replica)
            .map(|statuses| !statuses.is_empty() && statuses.values().all(|s| s.is_ok()))
            .unwrap_or(false)
    }
}
