//! Data Manager Tests
//!
//! ## Test Scopes
//! - **Facade**: chained writes, version-scoped removal, two-phase writes, digests.
//! - **Blocking calls**: put/get/remove from a thread outside the runtime.
//! - **Gateway**: the HTTP routes, their status codes and error payloads.

#[cfg(test)]
mod tests {
    use crate::coordinator::{CoordinatorConfig, PutError, PutListener};
    use crate::manager::DataManager;
    use crate::manager::handlers::gateway_router;
    use crate::manager::types::{GetResponse, PutResponse, RemoveResponse};
    use crate::model::{ContentEnvelope, Parameters, ProtectionKey, ReplicaStatus, VersionId};
    use crate::storage::{LocalReplicaSet, ReplicaSetConfig};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn manager(runtime: Handle) -> Arc<DataManager> {
        let store = Arc::new(LocalReplicaSet::new(5, ReplicaSetConfig::default()));
        DataManager::new(store, CoordinatorConfig::default(), runtime)
    }

    fn params() -> Parameters {
        Parameters::for_content("bob", "profile", "settings")
    }

    // ============================================================
    // FACADE
    // ============================================================

    #[tokio::test]
    async fn test_put_next_builds_a_chain() {
        let manager = manager(Handle::current());

        let first = manager.put_next(&params(), b"one".to_vec()).await.unwrap();
        let second = manager.put_next(&params(), b"two".to_vec()).await.unwrap();

        assert!(second > first);
        let newest = manager.get(&params()).await.unwrap();
        assert_eq!(newest.version_id, second);
        assert_eq!(newest.parent_version_id, Some(first));
        assert_eq!(newest.payload, b"two");
    }

    #[tokio::test]
    async fn test_remove_version_then_remove_all() {
        let manager = manager(Handle::current());
        let first = manager.put_next(&params(), b"one".to_vec()).await.unwrap();
        let second = manager.put_next(&params(), b"two".to_vec()).await.unwrap();

        manager.remove_version(&params(), second).await.unwrap();
        assert_eq!(manager.get(&params()).await.unwrap().version_id, first);

        manager.remove(&params()).await.unwrap();
        assert!(manager.get(&params()).await.is_none());
        let digests = manager.digest(&params()).await.unwrap();
        assert!(digests.values().all(|digest| digest.is_empty()));
    }

    #[tokio::test]
    async fn test_prepare_then_confirm() {
        let manager = manager(Handle::current());
        let envelope = ContentEnvelope::new(b"draft".to_vec());
        let version = envelope.version_id;

        manager.put(&params().prepared(), envelope).await.unwrap();
        assert!(manager.get(&params()).await.is_none());

        manager.confirm(&params().with_version(version)).await.unwrap();
        assert_eq!(manager.get(&params()).await.unwrap().payload, b"draft");
    }

    #[tokio::test]
    async fn test_protected_object_rejects_other_keys() {
        let manager = manager(Handle::current());
        let owner = params().with_protection_key(ProtectionKey::new(b"bob-key".to_vec()));
        let stranger = params().with_protection_key(ProtectionKey::new(b"eve-key".to_vec()));
        manager.put_next(&owner, b"mine".to_vec()).await.unwrap();

        let err = manager.put_next(&stranger, b"theirs".to_vec()).await.unwrap_err();
        assert_eq!(err.status(), ReplicaStatus::FailedSecurity);

        let err = manager.remove(&stranger).await.unwrap_err();
        assert_eq!(err.status(), ReplicaStatus::FailedSecurity);
        assert_eq!(manager.get(&params()).await.unwrap().payload, b"mine");
    }

    #[derive(Default)]
    struct CountingListener {
        successes: AtomicUsize,
        failures: AtomicUsize,
    }

    impl PutListener for CountingListener {
        fn on_put_success(&self, _version: VersionId) {
            self.successes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_put_failure(&self, _error: &PutError) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_put_with_listener() {
        let manager = manager(Handle::current());
        let listener = Arc::new(CountingListener::default());

        let outcome = manager
            .put_with_listener(&params(), ContentEnvelope::new(b"async".to_vec()), listener.clone())
            .wait()
            .await
            .unwrap();

        assert!(outcome.is_ok());
        assert_eq!(listener.successes.load(Ordering::SeqCst), 1);
        assert_eq!(listener.failures.load(Ordering::SeqCst), 0);
    }

    // ============================================================
    // BLOCKING CALLS
    // ============================================================

    #[test]
    fn test_blocking_calls() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let manager = manager(runtime.handle().clone());
        let envelope = ContentEnvelope::new(b"blocking".to_vec());

        assert!(manager.put_blocking(&params(), envelope.clone()));
        assert_eq!(manager.get_blocking(&params()), Some(envelope));
        assert!(manager.remove_blocking(&params()));
        assert_eq!(manager.get_blocking(&params()), None);
    }

    // ============================================================
    // GATEWAY
    // ============================================================

    async fn spawn_gateway() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = gateway_router(manager(Handle::current()));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn content() -> serde_json::Value {
        serde_json::json!({
            "location_id": "bob",
            "domain_id": "profile",
            "content_id": "settings",
        })
    }

    #[tokio::test]
    async fn test_gateway_put_get_remove() {
        let addr = spawn_gateway().await;
        let client = reqwest::Client::new();

        let mut body = content();
        body["payload"] = "dark-mode".into();
        let response = client
            .post(format!("http://{}/put", addr))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let put: PutResponse = response.json().await.unwrap();
        assert!(put.success);
        assert_eq!(put.status, ReplicaStatus::Ok);
        let version = put.version.unwrap();

        let got: GetResponse = client
            .get(format!("http://{}/get", addr))
            .query(&[
                ("location_id", "bob"),
                ("domain_id", "profile"),
                ("content_id", "settings"),
            ])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(got.version, version);
        assert_eq!(got.payload, "dark-mode");
        assert_eq!(got.parent_version, None);

        let removed: RemoveResponse = client
            .post(format!("http://{}/remove", addr))
            .json(&content())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(removed.success);

        let missing = client
            .get(format!("http://{}/get", addr))
            .query(&[
                ("location_id", "bob"),
                ("domain_id", "profile"),
                ("content_id", "settings"),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_gateway_reports_conflicts_and_bad_input() {
        let addr = spawn_gateway().await;
        let client = reqwest::Client::new();

        let mut first = content();
        first["payload"] = "v1".into();
        let put: PutResponse = client
            .post(format!("http://{}/put", addr))
            .json(&first)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(put.success);

        // Built on a version nobody holds.
        let mut stale = content();
        stale["payload"] = "v2".into();
        stale["parent_version"] = VersionId::new(1, 1).to_string().into();
        let response = client
            .post(format!("http://{}/put", addr))
            .json(&stale)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
        let rejected: PutResponse = response.json().await.unwrap();
        assert!(!rejected.success);
        assert_eq!(rejected.status, ReplicaStatus::VersionConflictNoVersionKey);

        let mut garbage = content();
        garbage["payload"] = "v2".into();
        garbage["parent_version"] = "not-a-version".into();
        let response = client
            .post(format!("http://{}/put", addr))
            .json(&garbage)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }
}
