//! Safe manipulation boundaries for a view.

use std::collections::BTreeSet;

/// The set of positions in a view at which events may be safely inserted
/// or removed without violating any enforced property.
///
/// Boundaries sit between atomic units: a tool loop, a batch of actions
/// sharing an `llm_response_id`, or a single event that is neither an
/// action nor an observation. A non-empty view always admits `0` and
/// `len(events)`; the empty view admits exactly `{0}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManipulationIndices(BTreeSet<usize>);

impl ManipulationIndices {
    /// Build from any collection of indices.
    #[must_use]
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        Self(indices.into_iter().collect())
    }

    /// Every boundary of a view with `len` events: `0..=len`.
    #[must_use]
    pub fn all_boundaries(len: usize) -> Self {
        Self((0..=len).collect())
    }

    /// Whether `index` is an admissible boundary.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    /// Number of admissible boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no boundary is admissible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the boundaries in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Boundaries admissible under both `self` and `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    /// The smallest boundary `>= threshold` (or `> threshold` when
    /// `strict`), or `threshold` itself if no such boundary exists.
    #[must_use]
    pub fn find_next(&self, threshold: usize, strict: bool) -> usize {
        let mut candidates = if strict {
            self.0.range(threshold + 1..)
        } else {
            self.0.range(threshold..)
        };
        candidates.next().copied().unwrap_or(threshold)
    }
}

impl FromIterator<usize> for ManipulationIndices {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_boundaries_is_inclusive() {
        let indices = ManipulationIndices::all_boundaries(3);
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn intersect_keeps_common_boundaries() {
        let a = ManipulationIndices::new([0, 1, 2, 4]);
        let b = ManipulationIndices::new([0, 2, 3, 4]);
        assert_eq!(a.intersect(&b), ManipulationIndices::new([0, 2, 4]));
    }

    #[test]
    fn find_next_non_strict_can_return_threshold() {
        let indices = ManipulationIndices::new([0, 2, 5]);
        assert_eq!(indices.find_next(2, false), 2);
        assert_eq!(indices.find_next(2, true), 5);
    }

    #[test]
    fn find_next_falls_back_to_threshold() {
        let indices = ManipulationIndices::new([0, 2]);
        assert_eq!(indices.find_next(3, false), 3);
        assert_eq!(indices.find_next(2, true), 2);
    }
}
