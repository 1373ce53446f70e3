use super::envelope::{ContentEnvelope, NO_EXPIRY};
use super::types::{FullKey, ObjectAddress, ProtectionKey, VersionId};
use serde::{Deserialize, Serialize};

/// Immutable description of one store operation.
///
/// Names the object address, optionally narrows it to a single version, and
/// carries the protection key and write options forwarded to replicas.
/// Builders consume and return `Self`; a value handed to a coordinator is
/// never changed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameters {
    pub address: ObjectAddress,
    pub version: Option<VersionId>,
    pub parent_version: Option<VersionId>,
    pub protection_key: Option<ProtectionKey>,
    pub ttl_seconds: u64,
    /// First phase of a two-phase write: replicas keep the version pending
    /// until it is confirmed.
    pub prepare: bool,
    /// Digests list pending versions as well as visible ones.
    #[serde(default)]
    pub include_pending: bool,
}

impl Parameters {
    pub fn new(address: ObjectAddress) -> Self {
        Self {
            address,
            version: None,
            parent_version: None,
            protection_key: None,
            ttl_seconds: NO_EXPIRY,
            prepare: false,
            include_pending: false,
        }
    }

    pub fn for_content(
        location_id: impl Into<String>,
        domain_id: impl Into<String>,
        content_id: impl Into<String>,
    ) -> Self {
        Self::new(ObjectAddress::new(location_id, domain_id, content_id))
    }

    pub fn with_version(mut self, version: VersionId) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_parent(mut self, parent: Option<VersionId>) -> Self {
        self.parent_version = parent;
        self
    }

    pub fn with_protection_key(mut self, key: ProtectionKey) -> Self {
        self.protection_key = Some(key);
        self
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn prepared(mut self) -> Self {
        self.prepare = true;
        self
    }

    /// Makes digests also report versions that are still awaiting confirmation.
    pub fn including_pending(mut self) -> Self {
        self.include_pending = true;
        self
    }

    /// Narrows these parameters to the version described by `envelope`.
    pub fn for_envelope(&self, envelope: &ContentEnvelope) -> Self {
        let mut params = self.clone();
        params.version = Some(envelope.version_id);
        params.parent_version = envelope.parent_version_id;
        params.ttl_seconds = envelope.ttl_seconds;
        params
    }

    /// Same address and key, but addressing every version.
    pub fn all_versions(&self) -> Self {
        let mut params = self.clone();
        params.version = None;
        params.parent_version = None;
        params
    }

    pub fn full_key(&self) -> Option<FullKey> {
        self.version
            .map(|version| FullKey::new(self.address.clone(), version))
    }
}
