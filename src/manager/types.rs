use crate::model::{ContentEnvelope, ReplicaStatus};
use serde::{Deserialize, Serialize};

pub const ENDPOINT_PUT: &str = "/put";
pub const ENDPOINT_GET: &str = "/get";
pub const ENDPOINT_REMOVE: &str = "/remove";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub location_id: String,
    pub domain_id: String,
    pub content_id: String,
    pub payload: String,
    /// Version to supersede. Without it the write goes on top of the newest version.
    #[serde(default)]
    pub parent_version: Option<String>,
    #[serde(default)]
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
    pub version: Option<String>,
    pub status: ReplicaStatus,
    pub error: Option<String>,
}

/// Names one object, optionally narrowed to one version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentQuery {
    pub location_id: String,
    pub domain_id: String,
    pub content_id: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub version: String,
    pub parent_version: Option<String>,
    pub payload: String,
}

impl From<ContentEnvelope> for GetResponse {
    fn from(envelope: ContentEnvelope) -> Self {
        Self {
            version: envelope.version_id.to_string(),
            parent_version: envelope.parent_version_id.map(|parent| parent.to_string()),
            payload: String::from_utf8_lossy(&envelope.payload).into_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub success: bool,
    pub status: ReplicaStatus,
    pub error: Option<String>,
}
