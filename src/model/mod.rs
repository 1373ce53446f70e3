//! Version-Chain Model
//!
//! Value types shared by the coordinators and the stores.
//!
//! ## Core Concepts
//! - **Versions**: every write creates a new `ContentEnvelope` with a fresh `VersionId`
//!   and a pointer to the version it supersedes. The versions of one `ObjectAddress`
//!   form a chain.
//! - **Digests**: a replica summarises what it holds for an address as a `Digest`,
//!   newest first. Coordinators compare digests to detect divergent writes.
//! - **Statuses**: each replica answers every key of an operation with a
//!   `ReplicaStatus`; one attempt yields one `ReplicaResultSet`.

pub mod digest;
pub mod envelope;
pub mod parameters;
pub mod status;
pub mod types;

pub use digest::{Digest, DigestEntry, DigestMap};
pub use envelope::{ContentEnvelope, NO_EXPIRY};
pub use parameters::Parameters;
pub use status::{ReplicaResultSet, ReplicaStatus};
pub use types::{FullKey, ObjectAddress, ProtectionKey, ReplicaId, VersionId, now_ms};

#[cfg(test)]
mod tests;
