//! Conflict resolution between concurrently created versions.
//!
//! When a replica's digest shows that our version is neither its newest
//! version nor on its visible chain, some other writer built on the same
//! ancestor. `resolve` decides, from that single digest, whether our version
//! stays canonical. The decision is a pure function of the digest shape and
//! the two competing version ids, so every replica holding the same two
//! siblings yields the same answer.
//!
//! Several structurally different situations end in "we win": a genuine
//! precedence, a replica that never saw our parent, and a replica whose
//! chain looks corrupt. They are kept apart in `Resolution` so callers can
//! log them, but the verdict is the same.

use crate::model::{Digest, VersionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The replica does not hold our parent; its history is treated as diverged.
    ParentUnknown,
    /// Nothing superseded our parent on this replica.
    AncestorIsNewest,
    /// No sibling found and our parent is not the newest entry either.
    CorruptChain,
    /// The only version built on our parent is our own.
    SameVersion,
    /// A sibling exists and orders before our version.
    SuccessorOlder { successor: VersionId },
    /// A sibling exists and orders after our version.
    SuccessorNewer { successor: VersionId },
}

impl Resolution {
    pub fn we_win(self) -> bool {
        !matches!(self, Resolution::SuccessorNewer { .. })
    }

    /// Whether the verdict came from an unexpected replica state rather than
    /// from comparing two siblings.
    pub fn is_anomalous(self) -> bool {
        matches!(
            self,
            Resolution::ParentUnknown | Resolution::CorruptChain | Resolution::SameVersion
        )
    }
}

/// Decides whether `ours`, built on `our_parent`, survives against what
/// `digest` shows.
pub fn resolve(digest: &Digest, our_parent: Option<VersionId>, ours: VersionId) -> Resolution {
    let Some(parent) = our_parent.filter(|parent| digest.contains_version(*parent)) else {
        return Resolution::ParentUnknown;
    };

    match digest.successor_of(parent, ours) {
        None => {
            let newest_is_parent = digest
                .newest()
                .is_some_and(|newest| newest.version() == parent);
            if newest_is_parent {
                Resolution::AncestorIsNewest
            } else {
                Resolution::CorruptChain
            }
        }
        Some(successor) if successor.version() == ours => Resolution::SameVersion,
        Some(successor) if successor.version() < ours => Resolution::SuccessorOlder {
            successor: successor.version(),
        },
        Some(successor) => Resolution::SuccessorNewer {
            successor: successor.version(),
        },
    }
}

/// Boolean form of [`resolve`].
pub fn we_version_wins(digest: &Digest, our_parent: Option<VersionId>, ours: VersionId) -> bool {
    resolve(digest, our_parent, ours).we_win()
}
