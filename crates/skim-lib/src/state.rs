//! Run-wide mutable state
//!
//! The megahub set and the per-read counters live for a whole run and are
//! owned by the engine. They are mutated by a single writer only: scan
//! workers get a shared view of [`MegahubSet`], and every mutation is
//! applied afterwards, in increasing read id order, by the thread driving
//! the run.

use crate::read_pool::ReadId;

/// Reads excluded from candidate generation after crossing the raw-hit ceiling
///
/// The set only grows during a run.
#[derive(Debug, Clone, Default)]
pub struct MegahubSet {
    flags: Vec<bool>,
    count: usize,
}

impl MegahubSet {
    /// Create an empty set for a pool of `num_reads` reads
    pub fn new(num_reads: usize) -> Self {
        Self {
            flags: vec![false; num_reads],
            count: 0,
        }
    }

    /// Add a read; returns false if it was already a megahub
    pub fn insert(&mut self, id: ReadId) -> bool {
        let idx = id as usize;
        if idx >= self.flags.len() {
            self.flags.resize(idx + 1, false);
        }
        if self.flags[idx] {
            return false;
        }
        self.flags[idx] = true;
        self.count += 1;
        true
    }

    /// Check whether a read is a megahub
    #[inline]
    pub fn contains(&self, id: ReadId) -> bool {
        self.flags.get(id as usize).copied().unwrap_or(false)
    }

    /// Number of megahubs
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if no read has been flagged
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Megahub ids in increasing order
    pub fn iter(&self) -> impl Iterator<Item = ReadId> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &flag)| flag)
            .map(|(id, _)| id as ReadId)
    }
}

/// Per-read overlap and raw-hit counters
#[derive(Debug, Clone, Default)]
pub struct ReadCounters {
    overlaps: Vec<u32>,
    raw_hits: Vec<u64>,
}

impl ReadCounters {
    /// Create zeroed counters for a pool of `num_reads` reads
    pub fn new(num_reads: usize) -> Self {
        Self {
            overlaps: vec![0; num_reads],
            raw_hits: vec![0; num_reads],
        }
    }

    /// Count one accepted candidate for a read
    #[inline]
    pub fn bump_overlap(&mut self, id: ReadId) {
        let count = &mut self.overlaps[id as usize];
        *count = count.saturating_add(1);
    }

    /// Add raw (pre-filter) hits found while scanning a read
    #[inline]
    pub fn add_raw_hits(&mut self, id: ReadId, hits: u64) {
        self.raw_hits[id as usize] += hits;
    }

    /// Accepted candidates involving a read
    pub fn overlaps(&self, id: ReadId) -> u32 {
        self.overlaps[id as usize]
    }

    /// Raw hits recorded for a read as query
    pub fn raw_hits(&self, id: ReadId) -> u64 {
        self.raw_hits[id as usize]
    }

    /// All overlap counters, indexed by read id
    pub fn overlap_counts(&self) -> &[u32] {
        &self.overlaps
    }

    /// All raw-hit counters, indexed by read id
    pub fn raw_hit_counts(&self) -> &[u64] {
        &self.raw_hits
    }
}

/// Everything a run mutates besides the output channels
#[derive(Debug, Clone, Default)]
pub struct SkimState {
    /// Reads dropped for producing too many raw hits
    pub megahubs: MegahubSet,
    /// Overlap and raw-hit counters
    pub counters: ReadCounters,
}

impl SkimState {
    /// Fresh state for a pool of `num_reads` reads
    pub fn new(num_reads: usize) -> Self {
        Self {
            megahubs: MegahubSet::new(num_reads),
            counters: ReadCounters::new(num_reads),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_megahub_set_grows_monotonically() {
        let mut set = MegahubSet::new(10);
        assert!(set.is_empty());

        assert!(set.insert(7));
        assert!(set.insert(2));
        assert!(!set.insert(7));

        assert_eq!(set.len(), 2);
        assert!(set.contains(2));
        assert!(!set.contains(3));
        assert!(!set.contains(1000));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 7]);
    }

    #[test]
    fn test_megahub_set_beyond_initial_size() {
        let mut set = MegahubSet::new(0);
        assert!(set.insert(4));
        assert!(set.contains(4));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_read_counters() {
        let mut counters = ReadCounters::new(3);
        counters.bump_overlap(1);
        counters.bump_overlap(1);
        counters.add_raw_hits(2, 40);
        counters.add_raw_hits(2, 2);

        assert_eq!(counters.overlaps(1), 2);
        assert_eq!(counters.overlaps(0), 0);
        assert_eq!(counters.raw_hits(2), 42);
        assert_eq!(counters.overlap_counts(), &[0, 2, 0]);
        assert_eq!(counters.raw_hit_counts(), &[0, 0, 42]);
    }
}
