//! Versioned Replicated Storage Library
//!
//! Versioned put/get/remove over a replicated key-value substrate, with no
//! central coordinator. Concurrent writers are reconciled after the fact by
//! comparing per-replica digests (optimistic concurrency).
//!
//! ## Architecture Modules
//!
//! - **`model`**: Version ids, envelopes, object addresses, digests, replica statuses
//!   and operation parameters shared by every other module.
//! - **`storage`**: The `ReplicatedStore` boundary and its implementations: an
//!   in-process replica set and an HTTP client for remote replica nodes, plus the
//!   replica-side version checks and routes.
//! - **`coordinator`**: Drives single operations to a verdict: quorum evaluation,
//!   bounded retry with compensating removes, digest verification and conflict
//!   resolution between sibling versions.
//! - **`manager`**: The `DataManager` facade used by workflows and the HTTP gateway
//!   exposing it.

pub mod coordinator;
pub mod manager;
pub mod model;
pub mod storage;
