//! Bucket table and index statistics
//!
//! Sorted hash records are grouped into buckets by their lowest
//! [`BUCKET_PREFIX_BITS`] bits. The table maps every non-empty bucket key to
//! its contiguous range in the record array.

use ahash::AHashMap;
use tracing::info;

use super::records::HashRecord;
use crate::constants::{BUCKET_PREFIX_BITS, BUCKET_PREFIX_MASK};

/// Bucket key of a hash
#[inline]
pub fn bucket_key(hash: u64) -> u32 {
    (hash & BUCKET_PREFIX_MASK) as u32
}

/// Contiguous range of records sharing a bucket key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRange {
    /// First record
    pub begin: usize,
    /// One past the last record
    pub end: usize,
}

impl BucketRange {
    /// Number of records in the bucket
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Check if the bucket holds no record
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// Map from bucket key to record range
#[derive(Debug, Clone, Default)]
pub struct BucketTable {
    ranges: AHashMap<u32, BucketRange>,
}

impl BucketTable {
    /// Build the table from records sorted by [`HashRecord::sort_key`]
    pub fn from_sorted_records(records: &[HashRecord]) -> Self {
        let mut ranges = AHashMap::new();
        let mut begin = 0;
        while begin < records.len() {
            let key = bucket_key(records[begin].hash);
            let mut end = begin + 1;
            while end < records.len() && bucket_key(records[end].hash) == key {
                end += 1;
            }
            ranges.insert(key, BucketRange { begin, end });
            begin = end;
        }
        Self { ranges }
    }

    /// Record range of a bucket
    #[inline]
    pub fn get(&self, key: u32) -> Option<BucketRange> {
        self.ranges.get(&key).copied()
    }

    /// Number of non-empty buckets
    pub fn num_buckets(&self) -> usize {
        self.ranges.len()
    }

    /// All bucket ranges, in no particular order
    pub fn ranges(&self) -> impl Iterator<Item = BucketRange> + '_ {
        self.ranges.values().copied()
    }
}

/// Statistics about one partition index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStatistics {
    /// Reads that contributed records
    pub num_reads: u64,

    /// Total number of hash records
    pub num_records: u64,

    /// Number of non-empty buckets
    pub num_buckets: u64,

    /// Buckets holding exactly one record
    pub num_singleton_buckets: u64,

    /// Largest bucket
    pub max_bucket_size: usize,
}

impl IndexStatistics {
    /// Create a new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record statistics for a bucket
    pub fn add_bucket(&mut self, bucket: BucketRange) {
        let size = bucket.len();
        self.num_buckets += 1;
        self.num_records += size as u64;
        if size == 1 {
            self.num_singleton_buckets += 1;
        }
        if size > self.max_bucket_size {
            self.max_bucket_size = size;
        }
    }

    /// Log statistics summary via tracing
    pub fn print_summary(&self) {
        info!("Index Statistics:");
        info!("  Indexed reads: {}", self.num_reads);
        info!("  Hash records: {}", self.num_records);
        info!("  Buckets ({} bit keys): {}", BUCKET_PREFIX_BITS, self.num_buckets);
        if self.num_buckets > 0 {
            info!(
                "  Singleton buckets: {} ({:.2}%)",
                self.num_singleton_buckets,
                (self.num_singleton_buckets as f64 * 100.0) / self.num_buckets as f64
            );
            info!(
                "  Average bucket size: {:.2}",
                self.num_records as f64 / self.num_buckets as f64
            );
        }
        info!("  Max bucket size: {}", self.max_bucket_size);
    }
}
