//! Partitioned k-mer hash index
//!
//! Reads are split into contiguous partitions sized by a memory budget
//! ([`planner`]). For each partition the subsampled hashes of its reads are
//! extracted and sorted ([`records`]), grouped into prefix buckets
//! ([`buckets`]), and served by exact-hash lookups ([`partition`]).

pub mod buckets;
pub mod partition;
pub mod planner;
pub mod records;

pub use buckets::{BucketRange, BucketTable, IndexStatistics};
pub use partition::PartitionIndex;
pub use planner::{PartitionPlanner, PlanSummary};
pub use records::HashRecord;
