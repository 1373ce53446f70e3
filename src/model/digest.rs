use super::types::{FullKey, ReplicaId, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One version known to a replica together with the version it claims to supersede.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestEntry {
    pub key: FullKey,
    pub parent: Option<VersionId>,
}

impl DigestEntry {
    pub fn new(key: FullKey, parent: Option<VersionId>) -> Self {
        Self { key, parent }
    }

    pub fn version(&self) -> VersionId {
        self.key.version
    }
}

/// What one replica currently holds for one object address, newest first.
///
/// This is a single replica's view, not a merged history: two replicas may
/// report different chains for the same address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<DigestEntry>", into = "Vec<DigestEntry>")]
pub struct Digest {
    entries: Vec<DigestEntry>,
}

/// Digests keyed by the replica that reported them.
pub type DigestMap = BTreeMap<ReplicaId, Digest>;

impl Digest {
    pub fn new(entries: impl IntoIterator<Item = DigestEntry>) -> Self {
        let mut entries: Vec<DigestEntry> = entries.into_iter().collect();
        entries.sort_by(|a, b| b.key.cmp(&a.key));
        entries.dedup_by(|a, b| a.key == b.key);
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[DigestEntry] {
        &self.entries
    }

    pub fn newest(&self) -> Option<&DigestEntry> {
        self.entries.first()
    }

    pub fn contains_key(&self, key: &FullKey) -> bool {
        self.entries.iter().any(|entry| &entry.key == key)
    }

    pub fn contains_version(&self, version: VersionId) -> bool {
        self.entries.iter().any(|entry| entry.version() == version)
    }

    pub fn entry_for(&self, version: VersionId) -> Option<&DigestEntry> {
        self.entries.iter().find(|entry| entry.version() == version)
    }

    /// Versions reachable from the newest entry by following parent pointers.
    ///
    /// The walk stops at an initial version or at a parent this replica does
    /// not hold. Side branches built on an ancestor are not part of the chain.
    pub fn visible_chain(&self) -> Vec<VersionId> {
        let mut chain = Vec::new();
        let mut cursor = self.newest();
        while let Some(entry) = cursor {
            // A malformed digest could contain a parent cycle.
            if chain.len() >= self.entries.len() || chain.contains(&entry.version()) {
                break;
            }
            chain.push(entry.version());
            cursor = entry.parent.and_then(|parent| self.entry_for(parent));
        }
        chain
    }

    pub fn on_visible_chain(&self, key: &FullKey) -> bool {
        self.contains_key(key) && self.visible_chain().contains(&key.version)
    }

    /// Newest entry built on `parent`, preferring entries other than `ours`.
    ///
    /// Returns `ours` only when it is the single version built on `parent`.
    pub fn successor_of(&self, parent: VersionId, ours: VersionId) -> Option<&DigestEntry> {
        let mut siblings = self
            .entries
            .iter()
            .filter(|entry| entry.parent == Some(parent));
        let first = siblings.next()?;
        if first.version() != ours {
            return Some(first);
        }
        siblings.next().or(Some(first))
    }
}

impl From<Vec<DigestEntry>> for Digest {
    fn from(entries: Vec<DigestEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<Digest> for Vec<DigestEntry> {
    fn from(digest: Digest) -> Self {
        digest.entries
    }
}
