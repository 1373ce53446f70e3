//! Put Coordinator
//!
//! Drives one versioned write to a verdict:
//!
//! 1. **Submit** the envelope to the replica set.
//! 2. **Evaluate** the per-replica statuses. A security rejection or a
//!    structural version conflict (no parent, unknown parent, old timestamp)
//!    ends the put. A replica whose head moved past our parent sends the put
//!    to conflict resolution. A failed majority leads to a retry.
//! 3. **Retry** after a compensating remove of the attempted version, until
//!    the attempt budget is spent.
//! 4. **Verify** with a digest read that every replica still shows our version
//!    as newest or on its visible chain.
//! 5. **Resolve** each divergent replica with [`resolve`]; losing to a sibling
//!    fails the put.
//!
//! Compensation only runs when the attempt may have left our version on a
//! replica: some replica accepted it, or the transport failed before the
//! replies were known.

use super::config::CoordinatorConfig;
use super::conflict::resolve;
use super::error::PutError;
use super::handle::{OperationHandle, PutListener};
use super::quorum::QuorumTally;
use crate::model::{
    ContentEnvelope, Digest, FullKey, Parameters, ReplicaId, ReplicaResultSet, ReplicaStatus, VersionId,
};
use crate::storage::{ReplicatedStore, StoreFuture};

use std::sync::Arc;
use tokio::runtime::Handle;

enum PutState {
    Submitting,
    AwaitingResult(StoreFuture<ReplicaResultSet>),
    RetryPut,
    Verifying(ReplicaResultSet),
    /// A replica already holds a version built on our parent.
    Contested(ReplicaStatus),
    ResolvingConflict(Vec<(ReplicaId, Digest)>),
    Done(Result<VersionId, PutError>),
}

pub struct PutCoordinator {
    store: Arc<dyn ReplicatedStore>,
    params: Parameters,
    envelope: ContentEnvelope,
    max_retries: u32,
    attempts: u32,
    /// The latest attempt may have stored our version somewhere.
    wrote: bool,
}

impl PutCoordinator {
    pub fn new(
        store: Arc<dyn ReplicatedStore>,
        params: &Parameters,
        envelope: ContentEnvelope,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            params: params.for_envelope(&envelope),
            envelope,
            max_retries: config.max_put_retries,
            attempts: 0,
            wrote: false,
        }
    }

    fn key(&self) -> FullKey {
        self.envelope.full_key(&self.params.address)
    }

    /// Runs the put to completion. `Ok` carries the version that was written.
    pub async fn run(mut self) -> Result<VersionId, PutError> {
        let mut state = PutState::Submitting;
        loop {
            state = match state {
                PutState::Submitting => {
                    self.attempts += 1;
                    tracing::debug!("Submitting put {} (attempt {})", self.key(), self.attempts);
                    PutState::AwaitingResult(self.store.put_async(&self.params, &self.envelope))
                }
                PutState::AwaitingResult(pending) => self.evaluate(pending.await).await,
                PutState::RetryPut => self.retry().await,
                PutState::Verifying(results) => self.verify(&results).await,
                PutState::Contested(status) => self.contest(status).await,
                PutState::ResolvingConflict(divergent) => self.resolve_conflicts(divergent).await,
                PutState::Done(outcome) => return outcome,
            };
        }
    }

    /// Spawns the put and returns a handle to its outcome.
    pub fn spawn(self, runtime: &Handle) -> OperationHandle<Result<VersionId, PutError>> {
        OperationHandle::spawn_on(runtime, self.run())
    }

    /// Spawns the put and reports the outcome to `listener` as well.
    pub fn spawn_with_listener(
        self,
        runtime: &Handle,
        listener: Arc<dyn PutListener>,
    ) -> OperationHandle<Result<VersionId, PutError>> {
        OperationHandle::spawn_on(runtime, async move {
            let outcome = self.run().await;
            match &outcome {
                Ok(version) => listener.on_put_success(*version),
                Err(err) => listener.on_put_failure(err),
            }
            outcome
        })
    }

    async fn evaluate(&mut self, outcome: anyhow::Result<ReplicaResultSet>) -> PutState {
        let results = match outcome {
            Ok(results) if !results.is_empty() => results,
            Ok(_) => {
                tracing::warn!("Put {} reached no replica", self.key());
                self.wrote = false;
                return PutState::RetryPut;
            }
            Err(err) => {
                tracing::warn!("Put {} failed in transport: {}", self.key(), err);
                self.wrote = true;
                return PutState::RetryPut;
            }
        };
        self.wrote = results.accepted(&self.key());

        let tally = QuorumTally::from_results(&results);
        if let Some(status) = tally.version_conflict {
            tracing::info!("Put {} hit {} at write time", self.key(), status);
            if status == ReplicaStatus::VersionConflict {
                return PutState::Contested(status);
            }
            return self.fail(PutError::VersionConflict { status }).await;
        }
        if tally.security_rejections > 0 {
            return self
                .fail(PutError::Security {
                    replicas: tally.security_rejections,
                })
                .await;
        }
        if tally.majority_succeeded() {
            PutState::Verifying(results)
        } else {
            tracing::debug!(
                "Put {}: {} of {} replicas failed",
                self.key(),
                tally.failed,
                tally.responded
            );
            PutState::RetryPut
        }
    }

    async fn retry(&self) -> PutState {
        if self.wrote {
            self.compensate().await;
        }
        if self.attempts > self.max_retries {
            tracing::warn!("Put {} gave up after {} attempts", self.key(), self.attempts);
            return PutState::Done(Err(PutError::RetriesExhausted {
                attempts: self.attempts,
            }));
        }
        PutState::Submitting
    }

    async fn verify(&self, results: &ReplicaResultSet) -> PutState {
        let ours = self.envelope.version_id;
        if self.params.prepare {
            // Prepared versions are invisible to digests until confirmed.
            return PutState::Done(Ok(ours));
        }

        let digests = match self.store.digest_async(&self.params.all_versions()).await {
            Ok(digests) if !digests.is_empty() => digests,
            Ok(_) => {
                return self
                    .fail(PutError::VerificationFailed {
                        reason: "no replica returned a digest".to_string(),
                    })
                    .await;
            }
            Err(err) => {
                return self
                    .fail(PutError::VerificationFailed {
                        reason: format!("digest read failed: {}", err),
                    })
                    .await;
            }
        };

        let key = self.key();
        let mut divergent = Vec::new();
        for (replica, digest) in digests {
            let newest_is_ours = digest.newest().is_some_and(|newest| newest.key == key);
            if newest_is_ours || digest.on_visible_chain(&key) {
                continue;
            }
            if digest.is_empty() {
                if results.acknowledged(&replica) {
                    return self
                        .fail(PutError::VerificationFailed {
                            reason: format!("replica {} acknowledged {} but holds nothing", replica, key),
                        })
                        .await;
                }
                continue;
            }
            divergent.push((replica, digest));
        }

        if divergent.is_empty() {
            tracing::debug!("Put {} verified", key);
            PutState::Done(Ok(ours))
        } else {
            PutState::ResolvingConflict(divergent)
        }
    }

    async fn resolve_conflicts(&self, divergent: Vec<(ReplicaId, Digest)>) -> PutState {
        let ours = self.envelope.version_id;
        let parent = self.envelope.parent_version_id;

        for (replica, digest) in divergent {
            let resolution = resolve(&digest, parent, ours);
            if resolution.is_anomalous() {
                tracing::warn!(
                    "Replica {} diverged on {}: {:?}, keeping our version",
                    replica,
                    self.key(),
                    resolution
                );
            }
            if !resolution.we_win() {
                tracing::info!(
                    "Put {} lost to a concurrent version on replica {}: {:?}",
                    self.key(),
                    replica,
                    resolution
                );
                return self.fail(PutError::VersionFork { replica, resolution }).await;
            }
        }
        PutState::Done(Ok(ours))
    }

    /// Settles a write-time conflict against the replicas' current digests.
    ///
    /// Losing to a sibling fails the put. Winning everywhere means the
    /// sibling's writer will withdraw, so a put that landed on some replica is
    /// submitted again without compensation; one that landed nowhere lost
    /// the race to a version that is already in place.
    async fn contest(&mut self, status: ReplicaStatus) -> PutState {
        let digests = match self.store.digest_async(&self.params.all_versions()).await {
            Ok(digests) if !digests.is_empty() => digests,
            Ok(_) => return self.fail(PutError::VersionConflict { status }).await,
            Err(err) => {
                tracing::warn!("Digest for contested put {} failed: {}", self.key(), err);
                return self.fail(PutError::VersionConflict { status }).await;
            }
        };

        let key = self.key();
        let ours = self.envelope.version_id;
        let parent = self.envelope.parent_version_id;
        for (replica, digest) in digests {
            if let Some(entry) = digest.entry_for(ours).filter(|entry| entry.parent != parent) {
                tracing::warn!(
                    "Replica {} holds {} with parent {:?}; leaving it in place",
                    replica,
                    key,
                    entry.parent
                );
                self.wrote = false;
                return self.fail(PutError::VersionConflict { status }).await;
            }
            let newest_is_ours = digest.newest().is_some_and(|newest| newest.key == key);
            if newest_is_ours || digest.on_visible_chain(&key) || digest.is_empty() {
                continue;
            }
            let resolution = resolve(&digest, parent, ours);
            if !resolution.we_win() {
                tracing::info!(
                    "Put {} lost to a concurrent version on replica {}: {:?}",
                    key,
                    replica,
                    resolution
                );
                return self.fail(PutError::VersionFork { replica, resolution }).await;
            }
        }

        if self.wrote && self.attempts <= self.max_retries {
            tracing::debug!("Put {} won its conflict, submitting again", key);
            return PutState::Submitting;
        }
        self.fail(PutError::VersionConflict { status }).await
    }

    async fn fail(&self, error: PutError) -> PutState {
        if self.wrote {
            self.compensate().await;
        }
        PutState::Done(Err(error))
    }

    /// Best-effort removal of the version this put attempted.
    async fn compensate(&self) {
        match self.store.remove_async(&self.params).await {
            Ok(results) => {
                tracing::debug!(
                    "Compensating remove of {} reached {} replica(s)",
                    self.key(),
                    results.len()
                )
            }
            Err(err) => tracing::warn!("Compensating remove of {} failed: {}", self.key(), err),
        }
    }
}
