//! Per-read sets of forbidden overlap partners

use ahash::{AHashMap, AHashSet};

use crate::read_pool::ReadId;

/// Read pairs that must never be reported as candidates
///
/// Lookups are directional: `contains(query, target)` only checks the set
/// stored for `query`. Use [`DenyList::insert_pair`] to forbid both
/// directions at once.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    forbidden: AHashMap<ReadId, AHashSet<ReadId>>,
}

impl DenyList {
    /// Create an empty deny list
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbid `target` as a candidate of `query`; returns false if already present
    pub fn insert(&mut self, query: ReadId, target: ReadId) -> bool {
        self.forbidden.entry(query).or_default().insert(target)
    }

    /// Forbid the pair in both directions
    pub fn insert_pair(&mut self, a: ReadId, b: ReadId) {
        self.insert(a, b);
        self.insert(b, a);
    }

    /// Check whether `target` is forbidden for `query`
    #[inline]
    pub fn contains(&self, query: ReadId, target: ReadId) -> bool {
        self.forbidden
            .get(&query)
            .is_some_and(|targets| targets.contains(&target))
    }

    /// Number of directed entries
    pub fn len(&self) -> usize {
        self.forbidden.values().map(|targets| targets.len()).sum()
    }

    /// Check if nothing is forbidden
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_insert() {
        let mut deny = DenyList::new();
        assert!(deny.insert(5, 2));
        assert!(!deny.insert(5, 2));

        assert!(deny.contains(5, 2));
        assert!(!deny.contains(2, 5));
        assert_eq!(deny.len(), 1);
    }

    #[test]
    fn test_insert_pair() {
        let mut deny = DenyList::new();
        deny.insert_pair(1, 7);

        assert!(deny.contains(1, 7));
        assert!(deny.contains(7, 1));
        assert!(!deny.contains(1, 1));
        assert_eq!(deny.len(), 2);
    }

    #[test]
    fn test_len_counts_every_query() {
        let mut deny = DenyList::new();
        deny.insert(3, 1);
        deny.insert(3, 2);
        deny.insert(3, 2);
        deny.insert_pair(8, 9);

        assert_eq!(deny.len(), 4);
        assert!(!deny.is_empty());
    }

    #[test]
    fn test_empty() {
        let deny = DenyList::new();
        assert!(deny.is_empty());
        assert!(!deny.contains(0, 1));
    }
}
