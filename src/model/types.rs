use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Identifier of one version of an object.
///
/// Built from the creation timestamp and a truncated SHA-256 of the payload.
/// Ordering compares the timestamp first and the hash second, which gives a
/// deterministic (if only hint-level) order between any two versions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionId {
    /// Milliseconds since the Unix epoch on the creating node.
    pub timestamp: u64,
    /// First eight bytes of the payload hash.
    pub hash: u64,
}

impl VersionId {
    pub fn new(timestamp: u64, hash: u64) -> Self {
        Self { timestamp, hash }
    }

    /// Derives the version id of `payload` created at `timestamp`.
    pub fn for_payload(timestamp: u64, payload: &[u8]) -> Self {
        Self {
            timestamp,
            hash: payload_hash(payload),
        }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:016x}", self.timestamp, self.hash)
    }
}

impl FromStr for VersionId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (timestamp, hash) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("Malformed version id: {}", s))?;
        Ok(Self {
            timestamp: timestamp.parse()?,
            hash: u64::from_str_radix(hash, 16)?,
        })
    }
}

fn payload_hash(payload: &[u8]) -> u64 {
    let digest = Sha256::digest(payload);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Address of one logical object; its versions form a chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectAddress {
    pub location_id: String,
    pub domain_id: String,
    pub content_id: String,
}

impl ObjectAddress {
    pub fn new(
        location_id: impl Into<String>,
        domain_id: impl Into<String>,
        content_id: impl Into<String>,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            domain_id: domain_id.into(),
            content_id: content_id.into(),
        }
    }
}

impl fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.location_id, self.domain_id, self.content_id)
    }
}

/// One version of one object, as held by a replica.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullKey {
    pub address: ObjectAddress,
    pub version: VersionId,
}

impl FullKey {
    pub fn new(address: ObjectAddress, version: VersionId) -> Self {
        Self { address, version }
    }
}

impl fmt::Display for FullKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.version)
    }
}

/// Address of a replica node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicaId(pub String);

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public half of the key pair protecting an object.
///
/// The first writer that presents a key binds it to the address; replicas
/// reject later writes and removals carrying a different key. Signing and
/// key custody belong to the caller.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProtectionKey {
    pub public_key: Vec<u8>,
}

impl ProtectionKey {
    pub fn new(public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            public_key: public_key.into(),
        }
    }
}

impl fmt::Debug for ProtectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtectionKey({:016x})", payload_hash(&self.public_key))
    }
}

/// Current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
