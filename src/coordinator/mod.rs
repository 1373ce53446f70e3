//! Operation Coordinators
//!
//! Each coordinator owns one in-flight logical operation against a
//! [`ReplicatedStore`](crate::storage::ReplicatedStore) and turns the
//! per-replica replies of possibly several attempts into a single verdict.
//!
//! ## Operations
//! - **Put**: quorum evaluation, bounded retry with compensation, digest
//!   verification and conflict resolution.
//! - **Remove**: removal verified by an empty digest, bounded retry.
//! - **Confirm**: quorum evaluation and bounded retry for the second phase of
//!   a two-phase write.
//! - **Get / Digest**: single-shot reads.
//!
//! Coordinators run as ordinary async functions, or as spawned tasks whose
//! terminal outcome is delivered through an [`OperationHandle`].

pub mod config;
pub mod confirm;
pub mod conflict;
pub mod error;
pub mod get;
pub mod handle;
pub mod put;
pub mod quorum;
pub mod remove;

pub use config::CoordinatorConfig;
pub use confirm::ConfirmCoordinator;
pub use conflict::{Resolution, resolve, we_version_wins};
pub use error::{ConfirmError, PutError, RemoveError};
pub use get::{DigestCoordinator, GetCoordinator};
pub use handle::{OperationHandle, PutListener};
pub use put::PutCoordinator;
pub use quorum::QuorumTally;
pub use remove::RemoveCoordinator;
