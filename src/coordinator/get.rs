use super::handle::OperationHandle;
use crate::model::{ContentEnvelope, DigestMap, Parameters};
use crate::storage::ReplicatedStore;

use std::sync::Arc;
use tokio::runtime::Handle;

/// Single read of one version, or of the newest one. No retry.
pub struct GetCoordinator {
    store: Arc<dyn ReplicatedStore>,
    params: Parameters,
}

impl GetCoordinator {
    pub fn new(store: Arc<dyn ReplicatedStore>, params: Parameters) -> Self {
        Self { store, params }
    }

    /// `None` when the data is missing or the read failed.
    pub async fn run(self) -> Option<ContentEnvelope> {
        match self.store.get_async(&self.params).await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::debug!("Get of {} failed: {}", self.params.address, err);
                None
            }
        }
    }

    pub fn spawn(self, runtime: &Handle) -> OperationHandle<Option<ContentEnvelope>> {
        OperationHandle::spawn_on(runtime, self.run())
    }
}

/// Single digest read across the replica set. No retry.
pub struct DigestCoordinator {
    store: Arc<dyn ReplicatedStore>,
    params: Parameters,
}

impl DigestCoordinator {
    pub fn new(store: Arc<dyn ReplicatedStore>, params: Parameters) -> Self {
        Self { store, params }
    }

    pub async fn run(self) -> Option<DigestMap> {
        match self.store.digest_async(&self.params).await {
            Ok(digests) => Some(digests),
            Err(err) => {
                tracing::debug!("Digest of {} failed: {}", self.params.address, err);
                None
            }
        }
    }

    pub fn spawn(self, runtime: &Handle) -> OperationHandle<Option<DigestMap>> {
        OperationHandle::spawn_on(runtime, self.run())
    }
}
