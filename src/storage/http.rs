//! HTTP replicated store.
//!
//! Talks to replica nodes serving the routes from `handlers::replica_router`.
//! Every operation is a single POST per owning replica with a timeout;
//! a replica that errors or times out is simply absent from the result.

use super::partitioner::ReplicaPlacement;
use super::protocol::{
    ENDPOINT_REPLICA_CONFIRM, ENDPOINT_REPLICA_DIGEST, ENDPOINT_REPLICA_GET, ENDPOINT_REPLICA_PUT,
    ENDPOINT_REPLICA_REMOVE, ReplicaDigestResponse, ReplicaGetResponse, ReplicaPutRequest,
    ReplicaRequest, ReplicaStatusResponse,
};
use super::store::{ReplicatedStore, StoreFuture};
use crate::model::{
    ContentEnvelope, DigestMap, ObjectAddress, Parameters, ReplicaId, ReplicaResultSet,
};

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct HttpReplicatedStore {
    peers: Arc<Vec<SocketAddr>>,
    placement: Arc<ReplicaPlacement>,
    http_client: reqwest::Client,
    timeout: Duration,
}

/// Replica id under which a peer is known: its HTTP address.
pub fn peer_id(addr: &SocketAddr) -> ReplicaId {
    ReplicaId(addr.to_string())
}

impl HttpReplicatedStore {
    pub fn new(peers: Vec<SocketAddr>, replication_factor: usize, timeout: Duration) -> Self {
        Self {
            peers: Arc::new(peers),
            placement: Arc::new(ReplicaPlacement::new(replication_factor)),
            http_client: reqwest::Client::new(),
            timeout,
        }
    }

    fn owners(&self, address: &ObjectAddress) -> Vec<SocketAddr> {
        let members: Vec<ReplicaId> = self.peers.iter().map(peer_id).collect();
        self.placement
            .owners(address, &members)
            .into_iter()
            .filter_map(|id| self.peers.iter().find(|addr| peer_id(addr) == id).copied())
            .collect()
    }

    async fn post_once<Req, Resp>(&self, addr: SocketAddr, endpoint: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(format!("http://{}{}", addr, endpoint))
            .json(body)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Replica {} answered {} with {}",
                addr,
                endpoint,
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    /// Sends `body` to every owner of `address` concurrently and keeps the
    /// replies that arrived.
    async fn fan_out<Req, Resp>(
        &self,
        address: &ObjectAddress,
        endpoint: &'static str,
        body: Req,
    ) -> Result<Vec<Resp>>
    where
        Req: Serialize + Send + Sync + 'static,
        Resp: DeserializeOwned + Send + 'static,
    {
        let owners = self.owners(address);
        if owners.is_empty() {
            return Err(anyhow::anyhow!("No replicas available for {}", address));
        }

        let body = Arc::new(body);
        let mut tasks = JoinSet::new();
        for addr in owners {
            let store = self.clone();
            let body = body.clone();
            tasks.spawn(async move {
                let reply: Result<Resp> = store.post_once(addr, endpoint, body.as_ref()).await;
                (addr, reply)
            });
        }

        let mut replies = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(reply))) => replies.push(reply),
                Ok((addr, Err(e))) => tracing::warn!("Request to replica {} failed: {}", addr, e),
                Err(e) => tracing::error!("Replica request task failed: {}", e),
            }
        }
        Ok(replies)
    }

    async fn status_fan_out(
        &self,
        address: &ObjectAddress,
        endpoint: &'static str,
        params: Parameters,
    ) -> Result<ReplicaResultSet> {
        let replies: Vec<ReplicaStatusResponse> = self
            .fan_out(address, endpoint, ReplicaRequest { params })
            .await?;
        Ok(into_result_set(replies))
    }
}

fn into_result_set(replies: Vec<ReplicaStatusResponse>) -> ReplicaResultSet {
    let mut results = ReplicaResultSet::new();
    for reply in replies {
        if reply.statuses.is_empty() {
            results.insert_empty(reply.replica);
            continue;
        }
        for status in reply.statuses {
            results.insert(reply.replica.clone(), status.key, status.status);
        }
    }
    results
}

impl ReplicatedStore for HttpReplicatedStore {
    fn put_async(
        &self,
        params: &Parameters,
        envelope: &ContentEnvelope,
    ) -> StoreFuture<ReplicaResultSet> {
        let store = self.clone();
        let request = ReplicaPutRequest {
            params: params.for_envelope(envelope),
            envelope: envelope.clone(),
        };
        Box::pin(async move {
            let address = request.params.address.clone();
            let replies: Vec<ReplicaStatusResponse> = store
                .fan_out(&address, ENDPOINT_REPLICA_PUT, request)
                .await?;
            Ok(into_result_set(replies))
        })
    }

    fn remove_async(&self, params: &Parameters) -> StoreFuture<ReplicaResultSet> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            store
                .status_fan_out(&address, ENDPOINT_REPLICA_REMOVE, params)
                .await
        })
    }

    fn get_async(&self, params: &Parameters) -> StoreFuture<Option<ContentEnvelope>> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            let replies: Vec<ReplicaGetResponse> = store
                .fan_out(&address, ENDPOINT_REPLICA_GET, ReplicaRequest { params })
                .await?;
            if replies.is_empty() {
                return Err(anyhow::anyhow!("No replica answered get for {}", address));
            }
            Ok(replies
                .into_iter()
                .filter_map(|reply| reply.envelope)
                .max_by_key(|envelope| envelope.version_id))
        })
    }

    fn digest_async(&self, params: &Parameters) -> StoreFuture<DigestMap> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            let replies: Vec<ReplicaDigestResponse> = store
                .fan_out(&address, ENDPOINT_REPLICA_DIGEST, ReplicaRequest { params })
                .await?;
            Ok(replies
                .into_iter()
                .map(|reply| (reply.replica, reply.digest))
                .collect())
        })
    }

    fn confirm_async(&self, params: &Parameters) -> StoreFuture<ReplicaResultSet> {
        let store = self.clone();
        let params = params.clone();
        Box::pin(async move {
            let address = params.address.clone();
            store
                .status_fan_out(&address, ENDPOINT_REPLICA_CONFIRM, params)
                .await
        })
    }
}
