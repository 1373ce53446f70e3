//! Model Tests
//!
//! Validates the version-chain value types.
//!
//! ## Test Scopes
//! - **Version ids**: ordering, hashing of payloads, text form.
//! - **Envelopes**: initial and successor versions.
//! - **Digests**: newest-first ordering, visible chain, sibling lookup.
//! - **Result sets**: per-replica acknowledgement.

#[cfg(test)]
mod tests {
    use crate::model::{
        ContentEnvelope, Digest, DigestEntry, FullKey, ObjectAddress, Parameters,
        ReplicaId, ReplicaResultSet, ReplicaStatus, VersionId, now_ms,
    };

    fn address() -> ObjectAddress {
        ObjectAddress::new("alice", "profile", "meta")
    }

    fn entry(version: VersionId, parent: Option<VersionId>) -> DigestEntry {
        DigestEntry::new(FullKey::new(address(), version), parent)
    }

    // ============================================================
    // VERSION ID TESTS
    // ============================================================

    #[test]
    fn test_version_id_orders_by_timestamp_then_hash() {
        let a = VersionId::new(100, 0xffff);
        let b = VersionId::new(101, 0x0001);
        let c = VersionId::new(101, 0x0002);

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_version_id_hash_depends_on_payload() {
        let a = VersionId::for_payload(100, b"first");
        let b = VersionId::for_payload(100, b"first");
        let c = VersionId::for_payload(100, b"second");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_version_id_text_form_parses_back() {
        let version = VersionId::for_payload(1_700_000_000_000, b"payload");
        let parsed: VersionId = version.to_string().parse().unwrap();

        assert_eq!(parsed, version);
        assert!("not-a-version".parse::<VersionId>().is_err());
        assert!("12345".parse::<VersionId>().is_err());
    }

    // ============================================================
    // ENVELOPE TESTS
    // ============================================================

    #[test]
    fn test_initial_envelope_has_no_parent() {
        let envelope = ContentEnvelope::new(b"v1".to_vec());

        assert!(envelope.is_initial());
        assert_eq!(envelope.payload, b"v1");
    }

    #[test]
    fn test_successor_points_at_parent_and_orders_after_it() {
        // Parent created "in the future" so the clock alone would not order them.
        let parent = VersionId::new(now_ms() + 60_000, 7);
        let child = ContentEnvelope::successor(parent, b"v2".to_vec());

        assert_eq!(child.parent_version_id, Some(parent));
        assert!(child.version_id > parent);
    }

    #[test]
    fn test_parameters_for_envelope_copies_version_fields() {
        let envelope = ContentEnvelope::new(b"data".to_vec()).with_ttl(60);
        let params = Parameters::for_content("alice", "files", "chunk-1").for_envelope(&envelope);

        assert_eq!(params.version, Some(envelope.version_id));
        assert_eq!(params.parent_version, None);
        assert_eq!(params.ttl_seconds, 60);
        assert_eq!(params.all_versions().version, None);
    }

    // ============================================================
    // DIGEST TESTS
    // ============================================================

    #[test]
    fn test_digest_is_sorted_newest_first() {
        let v1 = VersionId::new(1, 1);
        let v2 = VersionId::new(2, 1);
        let v3 = VersionId::new(3, 1);

        let digest = Digest::new(vec![entry(v2, Some(v1)), entry(v1, None), entry(v3, Some(v2))]);

        assert_eq!(digest.newest().unwrap().version(), v3);
        assert_eq!(digest.len(), 3);
        assert!(digest.contains_version(v1));
    }

    #[test]
    fn test_visible_chain_skips_side_branches() {
        let v1 = VersionId::new(1, 1);
        let v2a = VersionId::new(2, 1);
        let v2b = VersionId::new(2, 9);
        let v3 = VersionId::new(3, 1);

        // v3 builds on v2a; v2b is a sibling of v2a.
        let digest = Digest::new(vec![
            entry(v1, None),
            entry(v2a, Some(v1)),
            entry(v2b, Some(v1)),
            entry(v3, Some(v2a)),
        ]);

        assert_eq!(digest.visible_chain(), vec![v3, v2a, v1]);
        assert!(digest.on_visible_chain(&FullKey::new(address(), v2a)));
        assert!(!digest.on_visible_chain(&FullKey::new(address(), v2b)));
        assert!(digest.contains_key(&FullKey::new(address(), v2b)));
    }

    #[test]
    fn test_visible_chain_survives_parent_cycle() {
        let a = VersionId::new(1, 1);
        let b = VersionId::new(2, 1);
        let digest = Digest::new(vec![entry(a, Some(b)), entry(b, Some(a))]);

        assert_eq!(digest.visible_chain(), vec![b, a]);
    }

    #[test]
    fn test_successor_prefers_other_versions() {
        let v1 = VersionId::new(1, 1);
        let ours = VersionId::new(2, 5);
        let theirs = VersionId::new(2, 3);

        let digest = Digest::new(vec![entry(v1, None), entry(ours, Some(v1)), entry(theirs, Some(v1))]);
        assert_eq!(digest.successor_of(v1, ours).unwrap().version(), theirs);

        let only_ours = Digest::new(vec![entry(v1, None), entry(ours, Some(v1))]);
        assert_eq!(only_ours.successor_of(v1, ours).unwrap().version(), ours);

        let none = Digest::new(vec![entry(v1, None)]);
        assert!(none.successor_of(v1, ours).is_none());
    }

    #[test]
    fn test_digest_serde_restores_order() {
        let v1 = VersionId::new(1, 1);
        let v2 = VersionId::new(2, 1);
        let json = serde_json::to_string(&vec![entry(v1, None), entry(v2, Some(v1))]).unwrap();

        let digest: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(digest.newest().unwrap().version(), v2);
    }

    // ============================================================
    // RESULT SET TESTS
    // ============================================================

    #[test]
    fn test_result_set_acknowledgement() {
        let key = FullKey::new(address(), VersionId::new(1, 1));
        let ok = ReplicaId("r1".to_string());
        let failed = ReplicaId("r2".to_string());
        let silent = ReplicaId("r3".to_string());

        let mut results = ReplicaResultSet::new()
            .with(ok.clone(), key.clone(), ReplicaStatus::Ok)
            .with(failed.clone(), key.clone(), ReplicaStatus::Failed);
        results.insert_empty(silent.clone());

        assert_eq!(results.len(), 3);
        assert!(results.acknowledged(&ok));
        assert!(!results.acknowledged(&failed));
        assert!(!results.acknowledged(&silent));
        assert!(results.accepted(&key));

        let rejected = ReplicaResultSet::new().with(failed, key.clone(), ReplicaStatus::VersionConflict);
        assert!(!rejected.accepted(&key));
    }

    #[test]
    fn test_status_classification() {
        assert!(ReplicaStatus::VersionConflictOldTimestamp.is_version_conflict());
        assert!(ReplicaStatus::VersionConflict.is_version_conflict());
        assert!(!ReplicaStatus::Failed.is_version_conflict());
        assert!(ReplicaStatus::FailedSecurity.is_security_failure());
        assert_eq!(ReplicaStatus::VersionConflictNoBasedOn.to_string(), "VERSION_CONFLICT_NO_BASED_ON");
    }
}
