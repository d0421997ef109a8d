//! Rolling k-mer hash extraction
//!
//! A k-mer hash is the 2-bit encoding of `w` consecutive nucleotides packed
//! into a `u64`, the leftmost base in the most significant position. The
//! window rolls one base at a time; any ambiguity, mask or gap symbol resets
//! it, so no hash ever spans such a symbol.
//!
//! The position attached to a hash is the index of the last base of its
//! window within the sequence.

use crate::constants::hash_mask;
use crate::encoding::{classify_symbol, EncodingError, Symbol};

/// A k-mer hash and the position of its last base
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KmerHash {
    /// Packed 2-bit encoding of the window
    pub hash: u64,
    /// Index of the window's last base
    pub position: u16,
}

/// Iterator over the k-mer hashes of a sequence
///
/// With a stride `s > 1` only every `s`-th window of each contiguous valid
/// run is yielded, starting with the first complete window after a reset.
/// Probing uses stride 1.
///
/// # Example
/// ```
/// use skim_lib::kmerizer::Kmerizer;
///
/// let hashes: Vec<_> = Kmerizer::probing(b"ACGT", 2)
///     .map(|h| h.unwrap().position)
///     .collect();
/// assert_eq!(hashes, vec![1, 2, 3]);
/// ```
pub struct Kmerizer<'a> {
    sequence: &'a [u8],
    bases_per_hash: usize,
    stride: usize,
    mask: u64,
    pos: usize,
    hash: u64,
    valid_run: usize,
}

impl<'a> Kmerizer<'a> {
    /// Create an iterator keeping every `stride`-th window
    ///
    /// # Arguments
    /// * `sequence` - bases to hash; positions must fit into `u16`
    /// * `bases_per_hash` - window width, 1 to 32
    /// * `stride` - subsampling step, at least 1
    pub fn new(sequence: &'a [u8], bases_per_hash: usize, stride: usize) -> Self {
        debug_assert!(crate::constants::is_valid_bases_per_hash(bases_per_hash));
        debug_assert!(stride > 0);
        Self {
            sequence,
            bases_per_hash,
            stride: stride.max(1),
            mask: hash_mask(bases_per_hash),
            pos: 0,
            hash: 0,
            valid_run: 0,
        }
    }

    /// Create an iterator yielding every window
    pub fn probing(sequence: &'a [u8], bases_per_hash: usize) -> Self {
        Self::new(sequence, bases_per_hash, 1)
    }
}

impl Iterator for Kmerizer<'_> {
    type Item = Result<KmerHash, EncodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.sequence.len() {
            let position = self.pos;
            let symbol = self.sequence[position];
            self.pos += 1;

            match classify_symbol(symbol) {
                Some(Symbol::Base(code)) => {
                    self.hash = ((self.hash << 2) | code as u64) & self.mask;
                    self.valid_run += 1;
                    if self.valid_run >= self.bases_per_hash
                        && (self.valid_run - self.bases_per_hash) % self.stride == 0
                    {
                        return Some(Ok(KmerHash {
                            hash: self.hash,
                            position: position as u16,
                        }));
                    }
                }
                Some(Symbol::Ambiguous) => {
                    self.hash = 0;
                    self.valid_run = 0;
                }
                None => {
                    // Nothing after a bad symbol is trusted
                    self.pos = self.sequence.len();
                    return Some(Err(EncodingError::InvalidSymbol {
                        symbol: symbol as char,
                        position,
                    }));
                }
            }
        }
        None
    }
}
