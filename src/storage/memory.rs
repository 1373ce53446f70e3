//! In-memory replica storage.
//!
//! `MemoryReplica` is what one replica node holds: a version chain per object
//! address, the protection key bound to each address, and a few switches used
//! to inject faults. The write-time version checks live here, so every
//! transport (in-process or HTTP) reports the same status codes.

use crate::model::{
    ContentEnvelope, Digest, DigestEntry, FullKey, ObjectAddress, Parameters, ProtectionKey,
    ReplicaId, ReplicaStatus, VersionId, now_ms,
};

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
struct StoredVersion {
    envelope: ContentEnvelope,
    stored_at: u64,
    /// Written with the prepare flag and not confirmed yet.
    pending: bool,
}

impl StoredVersion {
    fn expired(&self, now: u64) -> bool {
        self.envelope.ttl_seconds != 0
            && now >= self.stored_at + self.envelope.ttl_seconds.saturating_mul(1000)
    }

    fn visible(&self, now: u64) -> bool {
        !self.pending && !self.expired(now)
    }
}

#[derive(Debug, Default)]
struct Faults {
    reject_puts: AtomicBool,
    reject_removes: AtomicBool,
    offline: AtomicBool,
}

pub struct MemoryReplica {
    id: ReplicaId,
    local_data: DashMap<ObjectAddress, BTreeMap<VersionId, StoredVersion>>,
    protection: DashMap<ObjectAddress, ProtectionKey>,
    faults: Faults,
}

impl MemoryReplica {
    pub fn new(id: ReplicaId) -> Self {
        Self {
            id,
            local_data: DashMap::new(),
            protection: DashMap::new(),
            faults: Faults::default(),
        }
    }

    pub fn id(&self) -> &ReplicaId {
        &self.id
    }

    // --- Fault injection ---

    pub fn set_reject_puts(&self, reject: bool) {
        self.faults.reject_puts.store(reject, Ordering::SeqCst);
    }

    pub fn set_reject_removes(&self, reject: bool) {
        self.faults.reject_removes.store(reject, Ordering::SeqCst);
    }

    /// An offline replica never answers; stores report it as timed out.
    pub fn set_offline(&self, offline: bool) {
        self.faults.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.faults.offline.load(Ordering::SeqCst)
    }

    // --- Operations ---

    fn key_rejected(&self, params: &Parameters) -> bool {
        match self.protection.get(&params.address) {
            Some(bound) => params.protection_key.as_ref() != Some(bound.value()),
            None => false,
        }
    }

    /// Stores one version after checking it against the local chain.
    pub fn put(&self, params: &Parameters, envelope: &ContentEnvelope) -> ReplicaStatus {
        if self.faults.reject_puts.load(Ordering::SeqCst) {
            return ReplicaStatus::Failed;
        }
        if self.key_rejected(params) {
            tracing::warn!(
                "Replica {} rejected put for {}: protection key mismatch",
                self.id,
                params.address
            );
            return ReplicaStatus::FailedSecurity;
        }

        let now = now_ms();
        let mut chain = self.local_data.entry(params.address.clone()).or_default();
        chain.retain(|_, stored| !stored.expired(now));

        if let Some(existing) = chain.get(&envelope.version_id) {
            if existing.envelope.parent_version_id == envelope.parent_version_id {
                // Resubmission of a version we already hold.
                return ReplicaStatus::Ok;
            }
            return ReplicaStatus::VersionConflict;
        }

        let newest = chain
            .iter()
            .rev()
            .find(|(_, stored)| !stored.pending)
            .map(|(version, _)| *version);

        if let Some(newest) = newest {
            let Some(parent) = envelope.parent_version_id else {
                return ReplicaStatus::VersionConflictNoBasedOn;
            };
            if !chain.contains_key(&parent) {
                return ReplicaStatus::VersionConflictNoVersionKey;
            }
            if parent != newest {
                // Built on a version that has since been superseded here.
                return ReplicaStatus::VersionConflict;
            }
            if envelope.version_id.timestamp < newest.timestamp {
                return ReplicaStatus::VersionConflictOldTimestamp;
            }
        }

        chain.insert(
            envelope.version_id,
            StoredVersion {
                envelope: envelope.clone(),
                stored_at: now,
                pending: params.prepare,
            },
        );
        drop(chain);

        if let Some(key) = &params.protection_key {
            self.protection
                .entry(params.address.clone())
                .or_insert_with(|| key.clone());
        }

        tracing::debug!(
            "Replica {} stored {}@{}",
            self.id,
            params.address,
            envelope.version_id
        );
        ReplicaStatus::Ok
    }

    /// Makes prepared versions visible. Without a version every pending
    /// version of the address is confirmed.
    pub fn confirm(&self, params: &Parameters) -> Vec<(FullKey, ReplicaStatus)> {
        let Some(mut chain) = self.local_data.get_mut(&params.address) else {
            return params
                .full_key()
                .map(|key| vec![(key, ReplicaStatus::NotFound)])
                .unwrap_or_default();
        };

        match params.version {
            Some(version) => {
                let key = FullKey::new(params.address.clone(), version);
                match chain.get_mut(&version) {
                    Some(stored) => {
                        stored.pending = false;
                        vec![(key, ReplicaStatus::Ok)]
                    }
                    None => vec![(key, ReplicaStatus::NotFound)],
                }
            }
            None => chain
                .iter_mut()
                .filter(|(_, stored)| stored.pending)
                .map(|(version, stored)| {
                    stored.pending = false;
                    (FullKey::new(params.address.clone(), *version), ReplicaStatus::Ok)
                })
                .collect(),
        }
    }

    /// Removes one version, or the whole chain when no version is given.
    pub fn remove(&self, params: &Parameters) -> Vec<(FullKey, ReplicaStatus)> {
        let targets: Vec<FullKey> = match params.version {
            Some(version) => vec![FullKey::new(params.address.clone(), version)],
            None => self
                .local_data
                .get(&params.address)
                .map(|chain| {
                    chain
                        .keys()
                        .map(|version| FullKey::new(params.address.clone(), *version))
                        .collect()
                })
                .unwrap_or_default(),
        };

        if self.faults.reject_removes.load(Ordering::SeqCst) {
            return targets
                .into_iter()
                .map(|key| (key, ReplicaStatus::Failed))
                .collect();
        }
        if self.key_rejected(params) {
            tracing::warn!(
                "Replica {} rejected remove for {}: protection key mismatch",
                self.id,
                params.address
            );
            return targets
                .into_iter()
                .map(|key| (key, ReplicaStatus::FailedSecurity))
                .collect();
        }

        let mut results = Vec::with_capacity(targets.len());
        let mut now_empty = false;
        if let Some(mut chain) = self.local_data.get_mut(&params.address) {
            for key in targets {
                let status = match chain.remove(&key.version) {
                    Some(_) => ReplicaStatus::Ok,
                    None => ReplicaStatus::NotFound,
                };
                results.push((key, status));
            }
            now_empty = chain.is_empty();
        } else {
            results.extend(targets.into_iter().map(|key| (key, ReplicaStatus::NotFound)));
        }

        if now_empty {
            self.local_data.remove(&params.address);
            self.protection.remove(&params.address);
        }
        results
    }

    /// Returns the requested version, or the newest visible one.
    pub fn get(&self, params: &Parameters) -> Option<ContentEnvelope> {
        let now = now_ms();
        let chain = self.local_data.get(&params.address)?;
        let stored = match params.version {
            Some(version) => chain.get(&version).filter(|stored| stored.visible(now)),
            None => chain.values().rev().find(|stored| stored.visible(now)),
        }?;
        Some(stored.envelope.clone())
    }

    /// Summarises the visible versions of the address, or of a single version.
    /// Pending versions are listed too when `params.include_pending` is set.
    pub fn digest(&self, params: &Parameters) -> Digest {
        let now = now_ms();
        let Some(chain) = self.local_data.get(&params.address) else {
            return Digest::empty();
        };
        Digest::new(
            chain
                .iter()
                .filter(|(version, stored)| {
                    let listed = stored.visible(now)
                        || (params.include_pending && stored.pending && !stored.expired(now));
                    listed && params.version.is_none_or(|wanted| wanted == **version)
                })
                .map(|(version, stored)| {
                    DigestEntry::new(
                        FullKey::new(params.address.clone(), *version),
                        stored.envelope.parent_version_id,
                    )
                })
                .collect::<Vec<_>>(),
        )
    }

    // --- Introspection ---

    pub fn version_count(&self, address: &ObjectAddress) -> usize {
        self.local_data
            .get(address)
            .map(|chain| chain.len())
            .unwrap_or(0)
    }

    pub fn local_entry_count(&self) -> usize {
        self.local_data
            .iter()
            .map(|entry| entry.value().len())
            .sum()
    }
}
