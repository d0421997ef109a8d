//! Constants and defaults for the skim engine
//!
//! Compile-time limits of the hash encoding plus the default values of the
//! tunable parameters in [`SkimConfiguration`](crate::config::SkimConfiguration).

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Largest k-mer width that still fits into a 64-bit hash (2 bits per base)
pub const MAX_BASES_PER_HASH: usize = 32;

/// Smallest supported k-mer width
pub const MIN_BASES_PER_HASH: usize = 1;

/// Number of bases covered by the bucket key of the partition index
pub const BUCKET_PREFIX_BASES: usize = 12;

/// Number of hash bits used as bucket key
pub const BUCKET_PREFIX_BITS: u32 = (BUCKET_PREFIX_BASES * 2) as u32;

/// Mask selecting the bucket key from a hash
pub const BUCKET_PREFIX_MASK: u64 = (1u64 << BUCKET_PREFIX_BITS) - 1;

/// Longest clipped read the engine accepts.
///
/// Hash positions are stored as `u16`, so every base position of an
/// accepted read must be representable.
pub const MAX_READ_LENGTH: usize = u16::MAX as usize;

/// Maximal offset jump (in bases) between consecutive hits of one cluster
pub const OFFSET_DRIFT_TOLERANCE: i32 = 10;

/// Default k-mer width
pub const DEFAULT_BASES_PER_HASH: usize = 16;

/// Default index subsampling stride
pub const DEFAULT_HASH_SAVE_STEPPING: usize = 4;

/// Default minimal percentage of the possible overlap covered by hits
pub const DEFAULT_PERCENT_REQUIRED: u8 = 50;

/// Default number of candidates kept per query read and strand
pub const DEFAULT_MAX_HITS_PER_READ: usize = 200;

/// Default memory budget of one partition, in hash records
pub const DEFAULT_MAX_MEMORY_HASHES: usize = 15_000_000;

/// Default raw-hit ceiling above which a read is declared a megahub
pub const DEFAULT_MEGAHUB_CAP: u32 = 100_000;

/// Number of consecutive query reads scanned as one parallel batch
pub const SCAN_CHUNK_READS: usize = 4096;

/// Mask keeping the low `2 * bases` bits of a rolling hash
#[inline]
pub const fn hash_mask(bases: usize) -> u64 {
    if bases >= MAX_BASES_PER_HASH {
        u64::MAX
    } else {
        (1u64 << (2 * bases)) - 1
    }
}

/// Check if a k-mer width is supported
#[inline]
pub const fn is_valid_bases_per_hash(bases: usize) -> bool {
    bases >= MIN_BASES_PER_HASH && bases <= MAX_BASES_PER_HASH
}
