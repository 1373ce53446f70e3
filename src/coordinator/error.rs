use super::conflict::Resolution;
use crate::model::{ReplicaId, ReplicaStatus};
use thiserror::Error;

/// Why a put did not go through.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PutError {
    #[error("replica reported {status} at write time")]
    VersionConflict { status: ReplicaStatus },

    #[error("lost conflict resolution on replica {replica} ({resolution:?})")]
    VersionFork {
        replica: ReplicaId,
        resolution: Resolution,
    },

    #[error("protection key rejected by {replicas} replica(s)")]
    Security { replicas: usize },

    #[error("put failed after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },

    #[error("put verification failed: {reason}")]
    VerificationFailed { reason: String },
}

impl PutError {
    /// Status code a workflow can branch on.
    pub fn status(&self) -> ReplicaStatus {
        match self {
            PutError::VersionConflict { status } => *status,
            PutError::VersionFork { .. } => ReplicaStatus::VersionConflict,
            PutError::Security { .. } => ReplicaStatus::FailedSecurity,
            PutError::RetriesExhausted { .. } | PutError::VerificationFailed { .. } => {
                ReplicaStatus::Failed
            }
        }
    }

    /// A concurrent writer won; the workflow may rebuild on the new head and retry.
    pub fn is_version_fork(&self) -> bool {
        self.status().is_version_conflict()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoveError {
    #[error("protection key rejected by {replicas} replica(s)")]
    Security { replicas: usize },

    #[error("data still present after {attempts} remove attempt(s)")]
    RetriesExhausted { attempts: u32 },
}

impl RemoveError {
    pub fn status(&self) -> ReplicaStatus {
        match self {
            RemoveError::Security { .. } => ReplicaStatus::FailedSecurity,
            RemoveError::RetriesExhausted { .. } => ReplicaStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfirmError {
    #[error("confirm failed after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },
}

impl ConfirmError {
    pub fn status(&self) -> ReplicaStatus {
        ReplicaStatus::Failed
    }
}
