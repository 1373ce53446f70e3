use super::config::CoordinatorConfig;
use super::error::RemoveError;
use super::handle::OperationHandle;
use super::quorum::QuorumTally;
use crate::model::{Digest, Parameters};
use crate::storage::ReplicatedStore;

use std::sync::Arc;
use tokio::runtime::Handle;

/// Removes one version, or every version when the parameters name none, and
/// keeps removing until a digest of the same scope comes back empty. That
/// digest counts prepared versions, so an unconfirmed write is not mistaken
/// for an absent one.
pub struct RemoveCoordinator {
    store: Arc<dyn ReplicatedStore>,
    params: Parameters,
    max_retries: u32,
    attempts: u32,
}

impl RemoveCoordinator {
    pub fn new(store: Arc<dyn ReplicatedStore>, params: Parameters, config: &CoordinatorConfig) -> Self {
        Self {
            store,
            params,
            max_retries: config.max_remove_retries,
            attempts: 0,
        }
    }

    fn scope(&self) -> String {
        match self.params.version {
            Some(version) => format!("{}@{}", self.params.address, version),
            None => format!("{} (all versions)", self.params.address),
        }
    }

    pub async fn run(mut self) -> Result<(), RemoveError> {
        loop {
            self.attempts += 1;
            tracing::debug!("Removing {} (attempt {})", self.scope(), self.attempts);

            match self.store.remove_async(&self.params).await {
                Ok(results) => {
                    let tally = QuorumTally::from_results(&results);
                    if tally.security_rejections > 0 {
                        tracing::warn!("Remove of {} rejected: protection key mismatch", self.scope());
                        return Err(RemoveError::Security {
                            replicas: tally.security_rejections,
                        });
                    }
                }
                Err(err) => tracing::warn!("Remove of {} failed in transport: {}", self.scope(), err),
            }

            if self.verify_absent().await {
                tracing::info!("Removed {}", self.scope());
                return Ok(());
            }

            if self.attempts > self.max_retries {
                tracing::warn!(
                    "Remove of {} gave up after {} attempts, data still present",
                    self.scope(),
                    self.attempts
                );
                return Err(RemoveError::RetriesExhausted {
                    attempts: self.attempts,
                });
            }
        }
    }

    pub fn spawn(self, runtime: &Handle) -> OperationHandle<Result<(), RemoveError>> {
        OperationHandle::spawn_on(runtime, self.run())
    }

    async fn verify_absent(&self) -> bool {
        let scope = self.params.clone().including_pending();
        match self.store.digest_async(&scope).await {
            Ok(digests) => digests.values().all(Digest::is_empty),
            Err(err) => {
                tracing::warn!("Digest after removing {} failed: {}", self.scope(), err);
                false
            }
        }
    }
}
