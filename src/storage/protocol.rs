//! Replica Network Protocol
//!
//! Endpoints and Data Transfer Objects used between a coordinating node and
//! the replica nodes it contacts over HTTP. Bodies are JSON.

use crate::model::{ContentEnvelope, Digest, FullKey, Parameters, ReplicaId, ReplicaStatus};
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Stores one version on the replica.
pub const ENDPOINT_REPLICA_PUT: &str = "/replica/put";
/// Removes one version or a whole chain.
pub const ENDPOINT_REPLICA_REMOVE: &str = "/replica/remove";
/// Confirms prepared versions.
pub const ENDPOINT_REPLICA_CONFIRM: &str = "/replica/confirm";
/// Reads one version or the newest one.
pub const ENDPOINT_REPLICA_GET: &str = "/replica/get";
/// Returns the replica's digest for an address.
pub const ENDPOINT_REPLICA_DIGEST: &str = "/replica/digest";

// --- Data Transfer Objects ---

/// Body of a put sent to one replica.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaPutRequest {
    pub params: Parameters,
    pub envelope: ContentEnvelope,
}

/// Body of remove, confirm, get and digest requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaRequest {
    pub params: Parameters,
}

/// Status reported for one key.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyStatus {
    pub key: FullKey,
    pub status: ReplicaStatus,
}

/// Reply to put, remove and confirm.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaStatusResponse {
    pub replica: ReplicaId,
    pub statuses: Vec<KeyStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaGetResponse {
    pub replica: ReplicaId,
    /// `None` when the replica holds no visible version.
    pub envelope: Option<ContentEnvelope>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaDigestResponse {
    pub replica: ReplicaId,
    pub digest: Digest,
}
