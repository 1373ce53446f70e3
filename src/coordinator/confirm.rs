use super::config::CoordinatorConfig;
use super::error::ConfirmError;
use super::handle::OperationHandle;
use super::quorum::QuorumTally;
use crate::model::Parameters;
use crate::storage::ReplicatedStore;

use std::sync::Arc;
use tokio::runtime::Handle;

/// Second phase of a two-phase write. Same quorum and retry rules as a put,
/// without verification or conflict resolution.
pub struct ConfirmCoordinator {
    store: Arc<dyn ReplicatedStore>,
    params: Parameters,
    max_retries: u32,
    attempts: u32,
}

impl ConfirmCoordinator {
    pub fn new(store: Arc<dyn ReplicatedStore>, params: Parameters, config: &CoordinatorConfig) -> Self {
        Self {
            store,
            params,
            max_retries: config.max_confirm_retries,
            attempts: 0,
        }
    }

    pub async fn run(mut self) -> Result<(), ConfirmError> {
        loop {
            self.attempts += 1;

            match self.store.confirm_async(&self.params).await {
                Ok(results) if !results.is_empty() => {
                    let tally = QuorumTally::from_results(&results);
                    if tally.majority_succeeded() {
                        tracing::debug!("Confirmed {} on {} replica(s)", self.params.address, tally.responded);
                        return Ok(());
                    }
                    tracing::debug!(
                        "Confirm of {}: {} of {} replicas failed",
                        self.params.address,
                        tally.failed,
                        tally.responded
                    );
                }
                Ok(_) => tracing::warn!("Confirm of {} reached no replica", self.params.address),
                Err(err) => tracing::warn!("Confirm of {} failed in transport: {}", self.params.address, err),
            }

            if self.attempts > self.max_retries {
                tracing::warn!(
                    "Confirm of {} gave up after {} attempts",
                    self.params.address,
                    self.attempts
                );
                return Err(ConfirmError::RetriesExhausted {
                    attempts: self.attempts,
                });
            }
        }
    }

    pub fn spawn(self, runtime: &Handle) -> OperationHandle<Result<(), ConfirmError>> {
        OperationHandle::spawn_on(runtime, self.run())
    }
}
