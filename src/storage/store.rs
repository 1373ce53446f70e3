//! Replicated Store Interface
//!
//! The boundary between the coordinators and whatever transports bytes to
//! replicas. An implementation contacts the replica set responsible for an
//! address, waits until every contacted replica has answered or timed out,
//! and resolves with the per-replica outcome. It never retries on its own;
//! retry policy belongs to the coordinators.

use crate::model::{ContentEnvelope, DigestMap, Parameters, ReplicaResultSet};

use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every store operation.
///
/// A failed future (transport error, nobody answered) is treated by the
/// coordinators exactly like a `FAILED` reply.
pub type StoreFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

pub trait ReplicatedStore: Send + Sync {
    /// Writes `envelope` under the address and version named by `params`.
    fn put_async(&self, params: &Parameters, envelope: &ContentEnvelope)
    -> StoreFuture<ReplicaResultSet>;

    /// Removes one version, or every version when `params` names none.
    fn remove_async(&self, params: &Parameters) -> StoreFuture<ReplicaResultSet>;

    /// Reads one version, or the newest one when `params` names none.
    fn get_async(&self, params: &Parameters) -> StoreFuture<Option<ContentEnvelope>>;

    /// Collects each replica's digest for the address (or the single version).
    fn digest_async(&self, params: &Parameters) -> StoreFuture<DigestMap>;

    /// Second phase of a two-phase write: makes prepared versions visible.
    fn confirm_async(&self, params: &Parameters) -> StoreFuture<ReplicaResultSet>;
}
