//! Partition planning
//!
//! The read id space is cut into contiguous partitions whose indexable
//! clipped bases fit the memory budget. Planning runs twice per skim run:
//! a dry run sizes the progress bar, and the real pass hands out the same
//! boundaries one at a time while partitions are processed. Both go through
//! [`PartitionPlanner::next_boundary`], so they cannot disagree.

use std::ops::Range;

use crate::config::SkimConfiguration;
use crate::constants::MAX_READ_LENGTH;
use crate::error::{Result, SkimError};
use crate::read_pool::{is_indexable, ReadId, ReadPool};

/// Outcome of the counting pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanSummary {
    /// Number of partitions
    pub num_partitions: usize,
    /// Progress units of the whole run: two per scanned query id and partition
    pub progress_total: u64,
}

/// Decides where partitions start and end
#[derive(Debug, Clone, Copy)]
pub struct PartitionPlanner {
    budget_bases: u64,
    only_against_rails: bool,
}

impl PartitionPlanner {
    /// Planner for a run configuration
    pub fn new(config: &SkimConfiguration) -> Self {
        Self::with_budget(config.partition_base_budget(), config.only_against_rails)
    }

    /// Planner with an explicit budget in clipped bases
    pub fn with_budget(budget_bases: u64, only_against_rails: bool) -> Self {
        Self {
            budget_bases: budget_bases.max(1),
            only_against_rails,
        }
    }

    /// End (exclusive) of the partition starting at `start`
    ///
    /// Indexable reads are accumulated until the next one would push the
    /// clipped base total over the budget. A partition always takes at least
    /// one indexable read, so an oversized read gets a partition of its own.
    /// Trailing reads that index nothing join the last partition. Returns
    /// `None` when no indexable read is left at or after `start`.
    ///
    /// # Errors
    /// Returns [`SkimError::ReadTooLong`] for an active read whose clipped
    /// length exceeds [`MAX_READ_LENGTH`]
    pub fn next_boundary<P: ReadPool + ?Sized>(
        &self,
        pool: &P,
        start: ReadId,
    ) -> Result<Option<ReadId>> {
        let num_reads = pool.num_reads() as ReadId;
        let mut total: u64 = 0;
        let mut taken_any = false;
        let mut id = start;

        while id < num_reads {
            if pool.is_active(id) {
                let length = pool.clipped_len(id);
                if length > MAX_READ_LENGTH {
                    return Err(SkimError::ReadTooLong {
                        read_id: id,
                        length,
                        max: MAX_READ_LENGTH,
                    });
                }
                if is_indexable(pool, id, self.only_against_rails) {
                    let length = length as u64;
                    if taken_any && total + length > self.budget_bases {
                        break;
                    }
                    total += length;
                    taken_any = true;
                }
            }
            id += 1;
        }

        Ok(taken_any.then_some(id))
    }

    /// First query id scanned against a partition starting at `start`
    ///
    /// A target must have a lower id than its query, so reads before the
    /// partition cannot hit it. Rail searches ignore id order.
    pub fn first_query(&self, start: ReadId) -> ReadId {
        if self.only_against_rails {
            0
        } else {
            start
        }
    }

    /// Progress units spent scanning against a partition starting at `start`
    pub fn progress_units<P: ReadPool + ?Sized>(&self, pool: &P, start: ReadId) -> u64 {
        2 * (pool.num_reads() as u64 - self.first_query(start) as u64)
    }

    /// Dry run: count partitions and progress units without building anything
    pub fn count<P: ReadPool + ?Sized>(&self, pool: &P) -> Result<PlanSummary> {
        let mut summary = PlanSummary::default();
        let mut start = 0;
        while let Some(end) = self.next_boundary(pool, start)? {
            summary.num_partitions += 1;
            summary.progress_total += self.progress_units(pool, start);
            start = end;
        }
        Ok(summary)
    }

    /// Real pass: all partition ranges in order
    pub fn plan<P: ReadPool + ?Sized>(&self, pool: &P) -> Result<Vec<Range<ReadId>>> {
        let mut partitions = Vec::new();
        let mut start = 0;
        while let Some(end) = self.next_boundary(pool, start)? {
            partitions.push(start..end);
            start = end;
        }
        Ok(partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_pool::ReadStore;

    fn store_with_lengths(lengths: &[usize]) -> ReadStore {
        let mut store = ReadStore::new();
        for (i, &len) in lengths.iter().enumerate() {
            store.add_read(format!("r{i}"), &vec![b'A'; len]).unwrap();
        }
        store
    }

    #[test]
    fn test_single_partition_when_budget_suffices() {
        let store = store_with_lengths(&[10, 20, 30]);
        let planner = PartitionPlanner::with_budget(1000, false);
        assert_eq!(planner.plan(&store).unwrap(), vec![0..3]);
    }

    #[test]
    fn test_partitions_respect_budget() {
        let store = store_with_lengths(&[40, 40, 40, 40, 40]);
        let planner = PartitionPlanner::with_budget(100, false);
        assert_eq!(planner.plan(&store).unwrap(), vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn test_oversized_read_gets_own_partition() {
        let store = store_with_lengths(&[10, 500, 10]);
        let planner = PartitionPlanner::with_budget(100, false);
        assert_eq!(planner.plan(&store).unwrap(), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_inactive_reads_do_not_count() {
        let mut store = store_with_lengths(&[60, 60, 60, 0]);
        store.set_used(1, false);
        let planner = PartitionPlanner::with_budget(100, false);
        // Read 1 weighs nothing; the empty read 3 trails into the last partition
        assert_eq!(planner.plan(&store).unwrap(), vec![0..2, 2..4]);
    }

    #[test]
    fn test_no_indexable_reads() {
        let mut store = store_with_lengths(&[10, 10]);
        store.set_valid(0, false);
        store.set_valid(1, false);
        let planner = PartitionPlanner::with_budget(100, false);
        assert!(planner.plan(&store).unwrap().is_empty());
        assert_eq!(planner.count(&store).unwrap(), PlanSummary::default());
        assert!(planner.plan(&ReadStore::new()).unwrap().is_empty());
    }

    #[test]
    fn test_rails_only_counts_rails() {
        let mut store = ReadStore::new();
        store.add_read("a", &[b'A'; 80]).unwrap();
        store.add_rail("r0", &[b'A'; 60]).unwrap();
        store.add_read("b", &[b'A'; 80]).unwrap();
        store.add_rail("r1", &[b'A'; 60]).unwrap();
        let planner = PartitionPlanner::with_budget(100, true);

        assert_eq!(planner.plan(&store).unwrap(), vec![0..3, 3..4]);
        // Every partition is scanned by all reads
        assert_eq!(planner.count(&store).unwrap().progress_total, 16);
    }

    #[test]
    fn test_count_matches_plan() {
        let store = store_with_lengths(&[30, 70, 20, 90, 10, 10, 50]);
        for budget in [1, 50, 100, 150, 10_000] {
            let planner = PartitionPlanner::with_budget(budget, false);
            let partitions = planner.plan(&store).unwrap();
            let summary = planner.count(&store).unwrap();

            assert_eq!(summary.num_partitions, partitions.len());
            let expected: u64 = partitions
                .iter()
                .map(|p| 2 * (store.num_reads() as u64 - p.start as u64))
                .sum();
            assert_eq!(summary.progress_total, expected);

            // Contiguous cover of the id space
            assert_eq!(partitions.first().unwrap().start, 0);
            assert_eq!(partitions.last().unwrap().end, store.num_reads() as ReadId);
            assert!(partitions.windows(2).all(|w| w[0].end == w[1].start));
        }
    }

    #[test]
    fn test_read_too_long() {
        let store = store_with_lengths(&[10, MAX_READ_LENGTH + 1]);
        let planner = PartitionPlanner::with_budget(u64::MAX, false);
        match planner.count(&store) {
            Err(SkimError::ReadTooLong { read_id, length, .. }) => {
                assert_eq!(read_id, 1);
                assert_eq!(length, MAX_READ_LENGTH + 1);
            }
            other => panic!("expected ReadTooLong, got {other:?}"),
        }
    }

    #[test]
    fn test_long_read_clipped_below_limit() {
        let mut store = store_with_lengths(&[MAX_READ_LENGTH + 10]);
        store.set_clip(0, 10, MAX_READ_LENGTH + 10);
        let planner = PartitionPlanner::with_budget(u64::MAX, false);
        assert_eq!(planner.plan(&store).unwrap(), vec![0..1]);
    }
}
