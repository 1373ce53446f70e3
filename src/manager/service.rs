use crate::coordinator::{
    ConfirmCoordinator, ConfirmError, CoordinatorConfig, DigestCoordinator, GetCoordinator,
    OperationHandle, PutCoordinator, PutError, PutListener, RemoveCoordinator, RemoveError,
};
use crate::model::{ContentEnvelope, DigestMap, Parameters, VersionId};
use crate::storage::ReplicatedStore;

use std::sync::Arc;
use tokio::runtime::Handle;

/// Entry point for workflows: one coordinator per call, all sharing a store.
pub struct DataManager {
    store: Arc<dyn ReplicatedStore>,
    config: CoordinatorConfig,
    runtime: Handle,
}

impl DataManager {
    /// `runtime` drives spawned and blocking operations.
    pub fn new(store: Arc<dyn ReplicatedStore>, config: CoordinatorConfig, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            store,
            config,
            runtime,
        })
    }

    fn put_coordinator(&self, params: &Parameters, envelope: ContentEnvelope) -> PutCoordinator {
        PutCoordinator::new(self.store.clone(), params, envelope, &self.config)
    }

    pub async fn put(&self, params: &Parameters, envelope: ContentEnvelope) -> Result<VersionId, PutError> {
        self.put_coordinator(params, envelope).run().await
    }

    /// Starts a put and reports its outcome to `listener`; never blocks.
    pub fn put_with_listener(
        &self,
        params: &Parameters,
        envelope: ContentEnvelope,
        listener: Arc<dyn PutListener>,
    ) -> OperationHandle<Result<VersionId, PutError>> {
        self.put_coordinator(params, envelope)
            .spawn_with_listener(&self.runtime, listener)
    }

    /// Blocks the calling thread until the put is done. Not for use inside the runtime.
    pub fn put_blocking(&self, params: &Parameters, envelope: ContentEnvelope) -> bool {
        matches!(
            self.put_coordinator(params, envelope)
                .spawn(&self.runtime)
                .wait_blocking(),
            Some(Ok(_))
        )
    }

    /// Writes `payload` as the successor of the newest version currently
    /// readable, or as an initial version when there is none.
    pub async fn put_next(&self, params: &Parameters, payload: Vec<u8>) -> Result<VersionId, PutError> {
        let envelope = match self.get(&params.all_versions()).await {
            Some(current) => ContentEnvelope::successor(current.version_id, payload),
            None => ContentEnvelope::new(payload),
        };
        self.put(params, envelope.with_ttl(params.ttl_seconds)).await
    }

    pub async fn get(&self, params: &Parameters) -> Option<ContentEnvelope> {
        GetCoordinator::new(self.store.clone(), params.clone()).run().await
    }

    pub fn get_blocking(&self, params: &Parameters) -> Option<ContentEnvelope> {
        GetCoordinator::new(self.store.clone(), params.clone())
            .spawn(&self.runtime)
            .wait_blocking()
            .flatten()
    }

    /// Removes what `params` names: one version, or the whole address.
    pub async fn remove(&self, params: &Parameters) -> Result<(), RemoveError> {
        RemoveCoordinator::new(self.store.clone(), params.clone(), &self.config)
            .run()
            .await
    }

    pub async fn remove_version(&self, params: &Parameters, version: VersionId) -> Result<(), RemoveError> {
        self.remove(&params.clone().with_version(version)).await
    }

    pub fn remove_blocking(&self, params: &Parameters) -> bool {
        matches!(
            RemoveCoordinator::new(self.store.clone(), params.clone(), &self.config)
                .spawn(&self.runtime)
                .wait_blocking(),
            Some(Ok(()))
        )
    }

    pub async fn confirm(&self, params: &Parameters) -> Result<(), ConfirmError> {
        ConfirmCoordinator::new(self.store.clone(), params.clone(), &self.config)
            .run()
            .await
    }

    pub async fn digest(&self, params: &Parameters) -> Option<DigestMap> {
        DigestCoordinator::new(self.store.clone(), params.clone()).run().await
    }
}
