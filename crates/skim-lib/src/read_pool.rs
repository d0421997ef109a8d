//! Read pool access
//!
//! The engine never owns reads. It sees them through the [`ReadPool`] trait:
//! random access by contiguous integer id, clip boundaries, and the
//! validity / usage / rail flags. [`ReadStore`] is the in-memory
//! implementation used by the command line tool and the tests.

use std::borrow::Cow;
use std::fmt;

use crate::encoding::{reverse_complement, validate_sequence};
use crate::error::{Result, SkimError};

/// Integer identifier of a read in a pool
pub type ReadId = u32;

/// Orientation in which a query read is scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    /// Clipped sequence as stored
    Forward,
    /// Reverse complement of the clipped sequence
    Reverse,
}

impl Strand {
    /// Both strands, in scan order
    pub const BOTH: [Strand; 2] = [Strand::Forward, Strand::Reverse];

    /// `+` or `-`
    pub const fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Random-access collection of reads consumed by the engine
pub trait ReadPool {
    /// Number of reads; ids run from `0` to `num_reads() - 1`
    fn num_reads(&self) -> usize;

    /// Whether the read carries usable sequence data
    fn is_valid(&self, id: ReadId) -> bool;

    /// Whether the read takes part in the current assembly pass
    fn is_used(&self, id: ReadId) -> bool;

    /// Whether the read is a backbone rail rather than a sequenced read
    fn is_rail(&self, id: ReadId) -> bool;

    /// Length of the clipped sequence
    fn clipped_len(&self, id: ReadId) -> usize;

    /// Clipped sequence in the requested orientation
    fn clipped_sequence(&self, id: ReadId, strand: Strand) -> Cow<'_, [u8]>;

    /// Valid and in use
    fn is_active(&self, id: ReadId) -> bool {
        self.is_valid(id) && self.is_used(id)
    }
}

/// Whether a read contributes hashes to partition indexes
pub fn is_indexable<P: ReadPool + ?Sized>(pool: &P, id: ReadId, only_against_rails: bool) -> bool {
    pool.is_active(id) && (!only_against_rails || pool.is_rail(id))
}

/// Whether a read is scanned as a query against partition indexes
pub fn is_scannable<P: ReadPool + ?Sized>(pool: &P, id: ReadId, only_against_rails: bool) -> bool {
    pool.is_active(id) && (!only_against_rails || !pool.is_rail(id))
}

/// One read held by a [`ReadStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadEntry {
    /// Read name
    pub name: String,
    /// Full (unclipped) sequence
    pub sequence: Vec<u8>,
    /// First base of the clipped sequence
    pub clip_left: usize,
    /// One past the last base of the clipped sequence
    pub clip_right: usize,
    /// Has usable data
    pub valid: bool,
    /// Takes part in the current pass
    pub used: bool,
    /// Backbone rail
    pub rail: bool,
}

impl ReadEntry {
    /// Clipped sequence, forward strand
    pub fn clipped(&self) -> &[u8] {
        &self.sequence[self.clip_left..self.clip_right]
    }
}

/// In-memory read pool
#[derive(Debug, Clone, Default)]
pub struct ReadStore {
    reads: Vec<ReadEntry>,
}

impl ReadStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sequenced read, unclipped and in use
    ///
    /// # Errors
    /// Returns an error if the sequence contains an unrecognised symbol
    pub fn add_read(&mut self, name: impl Into<String>, sequence: &[u8]) -> Result<ReadId> {
        self.push(name.into(), sequence, false)
    }

    /// Add a backbone rail, unclipped and in use
    ///
    /// # Errors
    /// Returns an error if the sequence contains an unrecognised symbol
    pub fn add_rail(&mut self, name: impl Into<String>, sequence: &[u8]) -> Result<ReadId> {
        self.push(name.into(), sequence, true)
    }

    fn push(&mut self, name: String, sequence: &[u8], rail: bool) -> Result<ReadId> {
        let read_id = self.reads.len() as ReadId;
        validate_sequence(sequence).map_err(|source| SkimError::Encoding { read_id, source })?;

        self.reads.push(ReadEntry {
            name,
            sequence: sequence.to_vec(),
            clip_left: 0,
            clip_right: sequence.len(),
            valid: !sequence.is_empty(),
            used: true,
            rail,
        });
        Ok(read_id)
    }

    /// Set clip boundaries; they are clamped to the sequence
    pub fn set_clip(&mut self, id: ReadId, left: usize, right: usize) {
        let read = &mut self.reads[id as usize];
        read.clip_right = right.min(read.sequence.len());
        read.clip_left = left.min(read.clip_right);
    }

    /// Mark a read as used or unused
    pub fn set_used(&mut self, id: ReadId, used: bool) {
        self.reads[id as usize].used = used;
    }

    /// Mark a read as valid or invalid
    pub fn set_valid(&mut self, id: ReadId, valid: bool) {
        self.reads[id as usize].valid = valid;
    }

    /// Mark a read as rail or ordinary read
    pub fn set_rail(&mut self, id: ReadId, rail: bool) {
        self.reads[id as usize].rail = rail;
    }

    /// Name of a read
    pub fn name(&self, id: ReadId) -> &str {
        &self.reads[id as usize].name
    }

    /// Number of reads
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Total clipped bases over all reads
    pub fn total_clipped_bases(&self) -> u64 {
        self.reads
            .iter()
            .map(|r| (r.clip_right - r.clip_left) as u64)
            .sum()
    }
}

impl ReadPool for ReadStore {
    fn num_reads(&self) -> usize {
        self.reads.len()
    }

    fn is_valid(&self, id: ReadId) -> bool {
        self.reads[id as usize].valid
    }

    fn is_used(&self, id: ReadId) -> bool {
        self.reads[id as usize].used
    }

    fn is_rail(&self, id: ReadId) -> bool {
        self.reads[id as usize].rail
    }

    fn clipped_len(&self, id: ReadId) -> usize {
        let read = &self.reads[id as usize];
        read.clip_right - read.clip_left
    }

    fn clipped_sequence(&self, id: ReadId, strand: Strand) -> Cow<'_, [u8]> {
        let clipped = self.reads[id as usize].clipped();
        match strand {
            Strand::Forward => Cow::Borrowed(clipped),
            Strand::Reverse => Cow::Owned(reverse_complement(clipped)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_reads_and_flags() {
        let mut store = ReadStore::new();
        let r0 = store.add_read("r0", b"ACGTACGT").unwrap();
        let r1 = store.add_rail("rail", b"TTTT").unwrap();
        let r2 = store.add_read("empty", b"").unwrap();

        assert_eq!((r0, r1, r2), (0, 1, 2));
        assert_eq!(store.num_reads(), 3);
        assert!(store.is_active(r0));
        assert!(store.is_rail(r1));
        assert!(!store.is_valid(r2));
        assert_eq!(store.name(r1), "rail");
    }

    #[test]
    fn test_invalid_symbol_rejected() {
        let mut store = ReadStore::new();
        store.add_read("ok", b"ACGT").unwrap();
        let err = store.add_read("bad", b"ACGTU").unwrap_err();
        match err {
            SkimError::Encoding { read_id, .. } => assert_eq!(read_id, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clipping() {
        let mut store = ReadStore::new();
        let id = store.add_read("r", b"NNACGTAANN").unwrap();
        store.set_clip(id, 2, 8);

        assert_eq!(store.clipped_len(id), 6);
        assert_eq!(&*store.clipped_sequence(id, Strand::Forward), b"ACGTAA");
        assert_eq!(&*store.clipped_sequence(id, Strand::Reverse), b"TTACGT");

        // Clamped to the sequence
        store.set_clip(id, 12, 40);
        assert_eq!(store.clipped_len(id), 0);
        assert_eq!(store.total_clipped_bases(), 0);
    }

    #[test]
    fn test_selection_predicates() {
        let mut store = ReadStore::new();
        let read = store.add_read("read", b"ACGT").unwrap();
        let rail = store.add_rail("rail", b"ACGT").unwrap();
        let unused = store.add_read("unused", b"ACGT").unwrap();
        store.set_used(unused, false);

        assert!(is_indexable(&store, read, false));
        assert!(is_indexable(&store, rail, false));
        assert!(!is_indexable(&store, read, true));
        assert!(is_indexable(&store, rail, true));
        assert!(!is_indexable(&store, unused, false));

        assert!(is_scannable(&store, read, true));
        assert!(!is_scannable(&store, rail, true));
        assert!(!is_scannable(&store, unused, false));
    }

    #[test]
    fn test_strand_display() {
        assert_eq!(Strand::Forward.to_string(), "+");
        assert_eq!(Strand::Reverse.to_string(), "-");
    }
}
