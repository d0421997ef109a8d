//! In-memory hash index of one partition

use std::ops::Range;

use tracing::debug;

use super::buckets::{bucket_key, BucketTable, IndexStatistics};
use super::records::{compute_hash_records, HashRecord};
use crate::config::SkimConfiguration;
use crate::constants::BUCKET_PREFIX_BASES;
use crate::error::Result;
use crate::read_pool::{ReadId, ReadPool};

/// Sorted hash records of a partition plus the bucket table over them
///
/// The index is immutable once built and dropped before the next partition
/// is built.
#[derive(Debug, Clone)]
pub struct PartitionIndex {
    reads: Range<ReadId>,
    bases_per_hash: usize,
    records: Vec<HashRecord>,
    buckets: BucketTable,
    num_indexed_reads: u64,
}

impl PartitionIndex {
    /// Build the index of the reads in `reads`
    ///
    /// Must be called inside the run's rayon thread pool to honour its size.
    pub fn build<P: ReadPool + Sync + ?Sized>(
        pool: &P,
        reads: Range<ReadId>,
        config: &SkimConfiguration,
    ) -> Result<Self> {
        let records = compute_hash_records(pool, reads.clone(), config)?;
        debug!("  Extracted {} hash records from reads {:?}", records.len(), reads);
        Ok(Self::from_sorted_records(reads, config.bases_per_hash, records))
    }

    /// Wrap records already sorted by [`HashRecord::sort_key`]
    pub fn from_sorted_records(
        reads: Range<ReadId>,
        bases_per_hash: usize,
        records: Vec<HashRecord>,
    ) -> Self {
        let buckets = BucketTable::from_sorted_records(&records);

        let mut read_ids: Vec<ReadId> = records.iter().map(|r| r.read_id).collect();
        read_ids.sort_unstable();
        read_ids.dedup();

        Self {
            reads,
            bases_per_hash,
            records,
            buckets,
            num_indexed_reads: read_ids.len() as u64,
        }
    }

    /// All records carrying exactly `hash`
    #[inline]
    pub fn lookup(&self, hash: u64) -> &[HashRecord] {
        let Some(range) = self.buckets.get(bucket_key(hash)) else {
            return &[];
        };
        let bucket = &self.records[range.begin..range.end];
        if self.bases_per_hash <= BUCKET_PREFIX_BASES {
            // The bucket key is the whole hash
            return bucket;
        }
        let lo = bucket.partition_point(|r| r.hash < hash);
        let hi = lo + bucket[lo..].partition_point(|r| r.hash == hash);
        &bucket[lo..hi]
    }

    /// Read id range covered by the partition
    pub fn reads(&self) -> Range<ReadId> {
        self.reads.clone()
    }

    /// Number of hash records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the index holds no record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Summary of the index layout
    pub fn statistics(&self) -> IndexStatistics {
        let mut stats = IndexStatistics::new();
        stats.num_reads = self.num_indexed_reads;
        for range in self.buckets.ranges() {
            stats.add_bucket(range);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_pool::ReadStore;

    fn config(bases_per_hash: usize) -> SkimConfiguration {
        SkimConfiguration {
            bases_per_hash,
            hash_save_stepping: 1,
            ..SkimConfiguration::default()
        }
    }

    #[test]
    fn test_lookup_short_hashes() {
        let mut store = ReadStore::new();
        store.add_read("r0", b"ACGTACGT").unwrap();
        store.add_read("r1", b"TTACGTTT").unwrap();
        let index = PartitionIndex::build(&store, 0..2, &config(4)).unwrap();

        let hits = index.lookup(0b00_01_10_11); // ACGT
        let origins: Vec<(ReadId, u16)> = hits.iter().map(|r| (r.read_id, r.position)).collect();
        assert_eq!(origins, vec![(0, 3), (0, 7), (1, 5)]);

        assert!(index.lookup(0b11_11_11_11).is_empty()); // TTTT
        assert!(index.lookup(0b10_10_10_10).is_empty()); // GGGG
    }

    #[test]
    fn test_lookup_long_hashes_share_bucket() {
        // Hashes differing only above the bucket key land in one bucket
        let low = 0x00AB_CDEF;
        let records = {
            let mut r = vec![
                HashRecord::new((1u64 << 30) | low, 0, 20),
                HashRecord::new((2u64 << 30) | low, 1, 21),
                HashRecord::new((1u64 << 30) | low, 2, 22),
                HashRecord::new(low, 3, 23),
            ];
            r.sort_unstable_by_key(HashRecord::sort_key);
            r
        };
        let index = PartitionIndex::from_sorted_records(0..4, 16, records);

        let hits = index.lookup((1u64 << 30) | low);
        assert_eq!(hits.len(), 2);
        assert_eq!((hits[0].read_id, hits[1].read_id), (0, 2));
        assert_eq!(index.lookup((2u64 << 30) | low).len(), 1);
        assert_eq!(index.lookup(low).len(), 1);
        assert!(index.lookup((3u64 << 30) | low).is_empty());
    }

    #[test]
    fn test_statistics() {
        let mut store = ReadStore::new();
        store.add_read("r0", b"AAAAAA").unwrap();
        store.add_read("r1", b"CCCCCC").unwrap();
        store.add_read("unused", b"GGGGGG").unwrap();
        store.set_used(2, false);
        let index = PartitionIndex::build(&store, 0..3, &config(4)).unwrap();

        let stats = index.statistics();
        assert_eq!(stats.num_reads, 2);
        assert_eq!(stats.num_records, 6);
        assert_eq!(stats.num_buckets, 2);
        assert_eq!(stats.max_bucket_size, 3);
        assert_eq!(index.len(), 6);
        assert_eq!(index.reads(), 0..3);
    }

    #[test]
    fn test_empty_index() {
        let index = PartitionIndex::from_sorted_records(0..0, 16, Vec::new());
        assert!(index.is_empty());
        assert!(index.lookup(42).is_empty());
        assert_eq!(index.statistics(), IndexStatistics::new());
    }
}
