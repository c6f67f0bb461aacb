//! Surroundings snapshots: the set of spots containing the user.

use indexmap::IndexSet;

use crate::id::SpotId;

/// Unordered set of spot ids reported by the surroundings provider.
///
/// Duplicates collapse on construction. Insertion order is preserved
/// only so that logs and reports are reproducible; membership is the
/// only semantic property. May contain ids unknown to the current
/// catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurroundingsSnapshot {
    ids: IndexSet<SpotId>,
}

impl SurroundingsSnapshot {
    /// An empty snapshot (the user is outside every zone).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `id` is part of the snapshot.
    pub fn contains(&self, id: SpotId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the snapshot has no ids.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate over the ids.
    pub fn iter(&self) -> impl Iterator<Item = SpotId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<SpotId> for SurroundingsSnapshot {
    fn from_iter<I: IntoIterator<Item = SpotId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<SpotId>> for SurroundingsSnapshot {
    fn from(ids: Vec<SpotId>) -> Self {
        ids.into_iter().collect()
    }
}

impl<const N: usize> From<[u64; N]> for SurroundingsSnapshot {
    fn from(ids: [u64; N]) -> Self {
        ids.into_iter().map(SpotId).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let snap = SurroundingsSnapshot::from([3, 1, 3, 2, 1]);
        assert_eq!(snap.len(), 3);
        assert!(snap.contains(SpotId(2)));
        assert!(!snap.contains(SpotId(4)));
    }

    #[test]
    fn empty_snapshot() {
        let snap = SurroundingsSnapshot::empty();
        assert!(snap.is_empty());
        assert_eq!(snap.iter().count(), 0);
    }
}
