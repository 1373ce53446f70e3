//! Replicated Storage Module
//!
//! The store side of the protocol: the `ReplicatedStore` interface the
//! coordinators drive, and the implementations behind it.
//!
//! ## Core Concepts
//! - **Replica storage**: `MemoryReplica` keeps one replica's version chains and
//!   performs the write-time version and protection-key checks.
//! - **Placement**: `ReplicaPlacement` maps an object address onto the replicas that own it.
//! - **Fan-out**: `LocalReplicaSet` (in-process) and `HttpReplicatedStore` (remote nodes)
//!   send each operation to every owner and gather one reply per replica.
//! - **Replica API**: `handlers` serves a `MemoryReplica` over HTTP using the DTOs in `protocol`.

pub mod handlers;
pub mod http;
pub mod memory;
pub mod partitioner;
pub mod protocol;
pub mod replica_set;
pub mod store;

pub use http::HttpReplicatedStore;
pub use memory::MemoryReplica;
pub use replica_set::{LocalReplicaSet, ReplicaSetConfig};
pub use store::{ReplicatedStore, StoreFuture};
