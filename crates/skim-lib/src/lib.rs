// Skim: k-mer hash based overlap candidate search
//
// Finds, for every read of a large pool, the reads that plausibly overlap
// it, within a fixed memory budget and without all-pairs comparison.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod deny_list;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod index;
pub mod kmerizer;
pub mod parse;
pub mod read_pool;
pub mod reducer;
pub mod scanner;
pub mod sink;
pub mod state;

// Re-export common types at crate root
pub use config::SkimConfiguration;
pub use deny_list::DenyList;
pub use engine::{SkimEngine, SkimOutcome, SkimReport};
pub use error::{Result, SkimError};
pub use index::{PartitionIndex, PartitionPlanner, PlanSummary};
pub use read_pool::{ReadId, ReadPool, ReadStore, Strand};
pub use reducer::Candidate;
pub use sink::{CandidateSink, TsvSink};
pub use state::{MegahubSet, ReadCounters, SkimState};

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let (major, minor, patch) = version();
        assert_eq!(major, 0);
        assert_eq!(minor, 1);
        assert_eq!(patch, 0);
    }
}
