use crate::model::{ObjectAddress, ReplicaId};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Chooses which replicas hold an object address.
///
/// Members are sorted by id, the address hash picks a starting position and
/// the next `replication_factor` members (wrapping around) own the address.
#[derive(Debug, Clone)]
pub struct ReplicaPlacement {
    replication_factor: usize,
}

impl ReplicaPlacement {
    pub fn new(replication_factor: usize) -> Self {
        Self {
            replication_factor: replication_factor.max(1),
        }
    }

    fn slot(&self, address: &ObjectAddress, member_count: usize) -> usize {
        if member_count == 0 {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        address.hash(&mut hasher);
        (hasher.finish() % member_count as u64) as usize
    }

    pub fn owners(&self, address: &ObjectAddress, members: &[ReplicaId]) -> Vec<ReplicaId> {
        if members.is_empty() {
            return vec![];
        }
        let mut sorted: Vec<ReplicaId> = members.to_vec();
        sorted.sort();
        sorted.dedup();

        let start = self.slot(address, sorted.len());
        let count = self.replication_factor.min(sorted.len());
        (0..count)
            .map(|offset| sorted[(start + offset) % sorted.len()].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(n: usize) -> Vec<ReplicaId> {
        (0..n).map(|i| ReplicaId(format!("replica-{}", i))).collect()
    }

    #[test]
    fn test_owners_are_deterministic() {
        let placement = ReplicaPlacement::new(3);
        let address = ObjectAddress::new("alice", "files", "chunk-7");

        let first = placement.owners(&address, &members(5));
        let mut reversed = members(5);
        reversed.reverse();
        let second = placement.owners(&address, &reversed);

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_owners_capped_by_member_count() {
        let placement = ReplicaPlacement::new(3);
        let address = ObjectAddress::new("alice", "files", "chunk-7");

        assert_eq!(placement.owners(&address, &members(2)).len(), 2);
        assert!(placement.owners(&address, &[]).is_empty());
    }
}
