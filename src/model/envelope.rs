use super::types::{FullKey, ObjectAddress, VersionId, now_ms};
use serde::{Deserialize, Serialize};

/// TTL value meaning the version never expires.
pub const NO_EXPIRY: u64 = 0;

/// One immutable version of an object's content.
///
/// An envelope is created once with a fresh version id and is never changed
/// after it has been handed to a coordinator. If it supersedes existing data,
/// `parent_version_id` names the version it replaces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentEnvelope {
    pub version_id: VersionId,
    pub parent_version_id: Option<VersionId>,
    pub payload: Vec<u8>,
    pub ttl_seconds: u64,
}

impl ContentEnvelope {
    /// Creates the initial version of an object.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        Self {
            version_id: VersionId::for_payload(now_ms(), &payload),
            parent_version_id: None,
            payload,
            ttl_seconds: NO_EXPIRY,
        }
    }

    /// Creates a version superseding `parent`.
    ///
    /// The timestamp is kept strictly above the parent's so the chain stays
    /// ordered even when both versions are created within one clock tick.
    pub fn successor(parent: VersionId, payload: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        let timestamp = now_ms().max(parent.timestamp + 1);
        Self {
            version_id: VersionId::for_payload(timestamp, &payload),
            parent_version_id: Some(parent),
            payload,
            ttl_seconds: NO_EXPIRY,
        }
    }

    /// Assembles an envelope from already known parts (wire decoding, tests).
    pub fn from_parts(
        version_id: VersionId,
        parent_version_id: Option<VersionId>,
        payload: impl Into<Vec<u8>>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            version_id,
            parent_version_id,
            payload: payload.into(),
            ttl_seconds,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn is_initial(&self) -> bool {
        self.parent_version_id.is_none()
    }

    pub fn full_key(&self, address: &ObjectAddress) -> FullKey {
        FullKey::new(address.clone(), self.version_id)
    }
}
