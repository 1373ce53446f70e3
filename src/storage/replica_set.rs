//! In-process replicated store.
//!
//! `LocalReplicaSet` owns a group of `MemoryReplica`s and implements
//! `ReplicatedStore` by fanning every operation out to the replicas that own
//! the address. Each replica request runs as its own task with a timeout;
//! the operation resolves once all of them have answered or timed out.

use super::memory::MemoryReplica;
use super::partitioner::ReplicaPlacement;
use super::store::{ReplicatedStore, StoreFuture};
use crate::model::{
    ContentEnvelope, DigestMap, FullKey, ObjectAddress, Parameters, ReplicaId, ReplicaResultSet,
    ReplicaStatus,
};

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Tunables of the in-process store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplicaSetConfig {
    /// Number of replicas holding each address.
    pub replication_factor: usize,
    /// Time a single replica gets to answer.
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    /// Simulated network delay added to every replica request.
    #[serde(with = "millis")]
    pub latency: Duration,
    /// Upper bound of the random jitter added on top of `latency`.
    #[serde(with = "millis")]
    pub jitter: Duration,
}

impl Default for ReplicaSetConfig {
    fn default() -> Self {
        Self {
            replication_factor: 3,
            request_timeout: Duration::from_millis(500),
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[derive(Clone)]
pub struct LocalReplicaSet {
    replicas: Arc<Vec<Arc<MemoryReplica>>>,
    placement: Arc<ReplicaPlacement>,
    config: ReplicaSetConfig,
}

impl LocalReplicaSet {
    /// Creates `replica_count` empty replicas named `replica-0`, `replica-1`, ...
    pub fn new(replica_count: usize, config: ReplicaSetConfig) -> Self {
        let replicas = (0..replica_count)
            .map(|i| Arc::new(MemoryReplica::new(ReplicaId(format!("replica-{}", i)))))
            .collect();
        Self::from_replicas(replicas, config)
    }

    pub fn from_replicas(replicas: Vec<Arc<MemoryReplica>>, config: ReplicaSetConfig) -> Self {
        Self {
            replicas: Arc::new(replicas),
            placement: Arc::new(ReplicaPlacement::new(config.replication_factor)),
            config,
        }
    }

    pub fn replicas(&self) -> &[Arc<MemoryReplica>] {
        &self.replicas
    }

    pub fn replica(&self, id: &ReplicaId) -> Option<Arc<MemoryReplica>> {
        self.replicas.iter().find(|replica| replica.id() == id).cloned()
    }

    /// Replicas responsible for `address`.
    pub fn owners(&self, address: &ObjectAddress) -> Vec<Arc<MemoryReplica>> {
        let members: Vec<ReplicaId> = self.replicas.iter().map(|r| r.id().clone()).collect();
        self.placement
            .owners(address, &members)
            .iter()
            .filter_map(|id| self.replica(id))
            .collect()
    }

    fn delay(&self) -> Duration {
        let jitter_ms = self.config.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.config.latency;
        }
        self.config.latency + Duration::from_millis(rand::random::<u64>() % jitter_ms)
    }

    /// Runs `op` on every owner of `address` and collects the replies that
    /// arrived in time. Offline replicas count as timed out.
    async fn fan_out<T, F>(&self, address: &ObjectAddress, op: F) -> anyhow::Result<Vec<(ReplicaId, T)>>
    where
        T: Send + 'static,
        F: Fn(&MemoryReplica) -> T + Send + Sync + 'static,
    {
        let owners = self.owners(address);
        if owners.is_empty() {
            return Err(anyhow::anyhow!("No replicas available for {}", address));
        }

        let op = Arc::new(op);
        let mut tasks = JoinSet::new();
        for replica in owners {
            let op = op.clone();
            let delay = self.delay();
            let timeout = self.config.request_timeout;
            tasks.spawn(async move {
                if replica.is_offline() {
                    return None;
                }
                let request = async {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    op(&replica)
                };
                match tokio::time::timeout(timeout, request).await {
                    Ok(reply) => Some((replica.id().clone(), reply)),
                    Err(_) => {
                        tracing::debug!("Replica {} timed out", replica.id());
                        None
                    }
                }
            });
        }

        let mut replies = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(reply)) => replies.push(reply),
                Ok(None) => {}
                Err(e) => tracing::error!("Replica request task failed: {}", e),
            }
        }
        Ok(replies)
    }
}

fn result_set(replies: Vec<(ReplicaId, Vec<(FullKey, ReplicaStatus)>)>) -> ReplicaResultSet {
    let mut results = ReplicaResultSet::new();
    for (replica, statuses) in replies {
        if statuses.is_empty() {
            results.insert_empty(replica);
            continue;
        }
        for (key, status) in statuses {
            results.insert(replica.clone(), key, status);
        }
    }
    results
}

impl ReplicatedStore for LocalReplicaSet {
    fn put_async(
        &self,
        params: &Parameters,
        envelope: &ContentEnvelope,
    ) -> StoreFuture<ReplicaResultSet> {
        let store = self.clone();
        let params = params.for_envelope(envelope);
        let envelope = envelope.clone();
        Box::pin(async move {
            let key = envelope.full_key(&params.address);
            let address = params.address.clone();
            let replies = store
                .fan_out(&address, move |replica| {
                    vec![(key.clone(), replica.put(&params, &envelope))]
                })
                .await?;
            Ok(result_set(replies))
        })
    }

    fn remove_async(&self, params: &Parameters) -> StoreFuture<ReplicaResultSet> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            let replies = store
                .fan_out(&address, move |replica| replica.remove(&params))
                .await?;
            Ok(result_set(replies))
        })
    }

    fn get_async(&self, params: &Parameters) -> StoreFuture<Option<ContentEnvelope>> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            let replies = store
                .fan_out(&address, move |replica| replica.get(&params))
                .await?;
            if replies.is_empty() {
                return Err(anyhow::anyhow!("No replica answered get for {}", address));
            }
            Ok(replies
                .into_iter()
                .filter_map(|(_, envelope)| envelope)
                .max_by_key(|envelope| envelope.version_id))
        })
    }

    fn digest_async(&self, params: &Parameters) -> StoreFuture<DigestMap> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            let replies = store
                .fan_out(&address, move |replica| replica.digest(&params))
                .await?;
            Ok(replies.into_iter().collect())
        })
    }

    fn confirm_async(&self, params: &Parameters) -> StoreFuture<ReplicaResultSet> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            let replies = store
                .fan_out(&address, move |replica| replica.confirm(&params))
                .await?;
            Ok(result_set(replies))
        })
    }
}
