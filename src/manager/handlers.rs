use super::service::DataManager;
use super::types::{
    ContentQuery, ENDPOINT_GET, ENDPOINT_PUT, ENDPOINT_REMOVE, GetResponse, PutRequest, PutResponse,
    RemoveResponse,
};
use crate::coordinator::{PutError, RemoveError};
use crate::model::{ContentEnvelope, Parameters, ReplicaStatus, VersionId};
use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

fn parse_version(raw: Option<&str>) -> Result<Option<VersionId>, String> {
    raw.map(|raw| raw.parse::<VersionId>().map_err(|err| err.to_string()))
        .transpose()
}

fn put_error_code(err: &PutError) -> StatusCode {
    match err {
        PutError::Security { .. } => StatusCode::FORBIDDEN,
        err if err.is_version_fork() => StatusCode::CONFLICT,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn remove_error_code(err: &RemoveError) -> StatusCode {
    match err {
        RemoveError::Security { .. } => StatusCode::FORBIDDEN,
        RemoveError::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn handle_put(
    Extension(manager): Extension<Arc<DataManager>>,
    Json(req): Json<PutRequest>,
) -> (StatusCode, Json<PutResponse>) {
    let parent = match parse_version(req.parent_version.as_deref()) {
        Ok(parent) => parent,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PutResponse {
                    success: false,
                    version: None,
                    status: ReplicaStatus::Failed,
                    error: Some(err),
                }),
            );
        }
    };

    let params = Parameters::for_content(req.location_id, req.domain_id, req.content_id)
        .with_ttl(req.ttl_seconds);
    let payload = req.payload.into_bytes();

    let outcome = match parent {
        Some(parent) => {
            let envelope = ContentEnvelope::successor(parent, payload).with_ttl(req.ttl_seconds);
            manager.put(&params, envelope).await
        }
        None => manager.put_next(&params, payload).await,
    };

    match outcome {
        Ok(version) => (
            StatusCode::OK,
            Json(PutResponse {
                success: true,
                version: Some(version.to_string()),
                status: ReplicaStatus::Ok,
                error: None,
            }),
        ),
        Err(err) => {
            tracing::warn!("Put of {} failed: {}", params.address, err);
            (
                put_error_code(&err),
                Json(PutResponse {
                    success: false,
                    version: None,
                    status: err.status(),
                    error: Some(err.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_get(
    Extension(manager): Extension<Arc<DataManager>>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<GetResponse>, StatusCode> {
    let version = parse_version(query.version.as_deref()).map_err(|_| StatusCode::BAD_REQUEST)?;
    let mut params = Parameters::for_content(query.location_id, query.domain_id, query.content_id);
    if let Some(version) = version {
        params = params.with_version(version);
    }

    match manager.get(&params).await {
        Some(envelope) => Ok(Json(GetResponse::from(envelope))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

pub async fn handle_remove(
    Extension(manager): Extension<Arc<DataManager>>,
    Json(query): Json<ContentQuery>,
) -> (StatusCode, Json<RemoveResponse>) {
    let version = match parse_version(query.version.as_deref()) {
        Ok(version) => version,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RemoveResponse {
                    success: false,
                    status: ReplicaStatus::Failed,
                    error: Some(err),
                }),
            );
        }
    };

    let params = Parameters::for_content(query.location_id, query.domain_id, query.content_id);
    let outcome = match version {
        Some(version) => manager.remove_version(&params, version).await,
        None => manager.remove(&params).await,
    };

    match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(RemoveResponse {
                success: true,
                status: ReplicaStatus::Ok,
                error: None,
            }),
        ),
        Err(err) => {
            tracing::warn!("Remove of {} failed: {}", params.address, err);
            (
                remove_error_code(&err),
                Json(RemoveResponse {
                    success: false,
                    status: err.status(),
                    error: Some(err.to_string()),
                }),
            )
        }
    }
}

/// Client-facing routes driving the coordinators.
pub fn gateway_router(manager: Arc<DataManager>) -> Router {
    Router::new()
        .route(ENDPOINT_PUT, post(handle_put))
        .route(ENDPOINT_GET, get(handle_get))
        .route(ENDPOINT_REMOVE, post(handle_remove))
        .layer(Extension(manager))
}
