//! Hash record extraction for partition indexes
//!
//! Every indexable read of a partition contributes the subsampled k-mer
//! hashes of its clipped forward strand. Each hash becomes a
//! [`HashRecord`] carrying the read id and the position of the window's
//! last base.
//!
//! ## Parallelism
//!
//! Extraction is parallelized across reads using rayon. Each read is
//! processed independently, producing a local `Vec<HashRecord>`. Results
//! are concatenated in read order and sorted in parallel via
//! `par_sort_unstable_by_key()`. The sort key covers every field, so the
//! final order does not depend on the number of threads.

use std::ops::Range;

use rayon::prelude::*;

use super::buckets::bucket_key;
use crate::config::SkimConfiguration;
use crate::error::{Result, SkimError};
use crate::kmerizer::Kmerizer;
use crate::read_pool::{is_indexable, ReadId, ReadPool, Strand};

/// One indexed k-mer occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashRecord {
    /// K-mer hash
    pub hash: u64,
    /// Read the k-mer was taken from
    pub read_id: ReadId,
    /// Position of the window's last base in the clipped read
    pub position: u16,
}

impl HashRecord {
    /// Create a new hash record
    pub fn new(hash: u64, read_id: ReadId, position: u16) -> Self {
        Self {
            hash,
            read_id,
            position,
        }
    }

    /// Index order: bucket key first, then the full hash, then origin
    #[inline]
    pub fn sort_key(&self) -> (u32, u64, ReadId, u16) {
        (bucket_key(self.hash), self.hash, self.read_id, self.position)
    }
}

/// Extract the subsampled hash records of one read
pub fn read_hash_records<P: ReadPool + ?Sized>(
    pool: &P,
    read_id: ReadId,
    bases_per_hash: usize,
    stride: usize,
) -> Result<Vec<HashRecord>> {
    let sequence = pool.clipped_sequence(read_id, Strand::Forward);
    Kmerizer::new(&sequence, bases_per_hash, stride)
        .map(|kmer| {
            kmer.map(|k| HashRecord::new(k.hash, read_id, k.position))
                .map_err(|source| SkimError::Encoding { read_id, source })
        })
        .collect()
}

/// Compute the sorted hash records of all indexable reads in `range`
///
/// Must be called inside the run's rayon thread pool to honour its size.
pub fn compute_hash_records<P: ReadPool + Sync + ?Sized>(
    pool: &P,
    range: Range<ReadId>,
    config: &SkimConfiguration,
) -> Result<Vec<HashRecord>> {
    let per_read: Vec<Vec<HashRecord>> = range
        .into_par_iter()
        .filter(|&id| is_indexable(pool, id, config.only_against_rails))
        .map(|id| read_hash_records(pool, id, config.bases_per_hash, config.hash_save_stepping))
        .collect::<Result<Vec<_>>>()?;

    let total: usize = per_read.iter().map(Vec::len).sum();
    let mut records = Vec::with_capacity(total);
    for read_records in per_read {
        records.extend(read_records);
    }

    records.par_sort_unstable_by_key(HashRecord::sort_key);
    Ok(records)
}
