use axum::{Json, Router, extract::Extension, http::StatusCode, routing::post};
use std::sync::Arc;

use super::memory::MemoryReplica;
use super::protocol::{
    ENDPOINT_REPLICA_CONFIRM, ENDPOINT_REPLICA_DIGEST, ENDPOINT_REPLICA_GET, ENDPOINT_REPLICA_PUT,
    ENDPOINT_REPLICA_REMOVE, KeyStatus, ReplicaDigestResponse, ReplicaGetResponse, ReplicaPutRequest, ReplicaRequest,
    ReplicaStatusResponse,
};
use crate::model::{FullKey, ReplicaStatus};

fn status_response(
    replica: &MemoryReplica,
    statuses: Vec<(FullKey, ReplicaStatus)>,
) -> Json<ReplicaStatusResponse> {
    Json(ReplicaStatusResponse {
        replica: replica.id().clone(),
        statuses: statuses
            .into_iter()
            .map(|(key, status)| KeyStatus { key, status })
            .collect(),
    })
}

pub async fn handle_replica_put(
    Extension(replica): Extension<Arc<MemoryReplica>>,
    Json(req): Json<ReplicaPutRequest>,
) -> Result<Json<ReplicaStatusResponse>, StatusCode> {
    if replica.is_offline() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let key = req.envelope.full_key(&req.params.address);
    let status = replica.put(&req.params, &req.envelope);
    tracing::debug!("Replica put {} -> {}", key, status);
    Ok(status_response(&replica, vec![(key, status)]))
}

pub async fn handle_replica_remove(
    Extension(replica): Extension<Arc<MemoryReplica>>,
    Json(req): Json<ReplicaRequest>,
) -> Result<Json<ReplicaStatusResponse>, StatusCode> {
    if replica.is_offline() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let statuses = replica.remove(&req.params);
    tracing::debug!(
        "Replica remove {} -> {} key(s)",
        req.params.address,
        statuses.len()
    );
    Ok(status_response(&replica, statuses))
}

pub async fn handle_replica_confirm(
    Extension(replica): Extension<Arc<MemoryReplica>>,
    Json(req): Json<ReplicaRequest>,
) -> Result<Json<ReplicaStatusResponse>, StatusCode> {
    if replica.is_offline() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let statuses = replica.confirm(&req.params);
    Ok(status_response(&replica, statuses))
}

pub async fn handle_replica_get(
    Extension(replica): Extension<Arc<MemoryReplica>>,
    Json(req): Json<ReplicaRequest>,
) -> Result<Json<ReplicaGetResponse>, StatusCode> {
    if replica.is_offline() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(ReplicaGetResponse {
        replica: replica.id().clone(),
        envelope: replica.get(&req.params),
    }))
}

pub async fn handle_replica_digest(
    Extension(replica): Extension<Arc<MemoryReplica>>,
    Json(req): Json<ReplicaRequest>,
) -> Result<Json<ReplicaDigestResponse>, StatusCode> {
    if replica.is_offline() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(ReplicaDigestResponse {
        replica: replica.id().clone(),
        digest: replica.digest(&req.params),
    }))
}

/// Routes serving one replica's storage.
pub fn replica_router(replica: Arc<MemoryReplica>) -> Router {
    Router::new()
        .route(ENDPOINT_REPLICA_PUT, post(handle_replica_put))
        .route(ENDPOINT_REPLICA_REMOVE, post(handle_replica_remove))
        .route(ENDPOINT_REPLICA_CONFIRM, post(handle_replica_confirm))
        .route(ENDPOINT_REPLICA_GET, post(handle_replica_get))
        .route(ENDPOINT_REPLICA_DIGEST, post(handle_replica_digest))
        .layer(Extension(replica))
}
