//! Query scanning against a partition index
//!
//! Every hash of a query strand is looked up in the current partition
//! index. Each matching record that survives the filters becomes a
//! [`RawHit`] with the estimated relative offset `query_pos - target_pos`.
//!
//! Scanning only reads shared state: the pool, the index and a snapshot of
//! the megahub set. Whatever a scan concludes is applied later by the
//! engine, in read id order.

use crate::config::SkimConfiguration;
use crate::error::{Result, SkimError};
use crate::index::PartitionIndex;
use crate::kmerizer::Kmerizer;
use crate::read_pool::{is_scannable, ReadId, ReadPool, Strand};
use crate::state::MegahubSet;

/// One hash match between a query strand and a target read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHit {
    /// Indexed read
    pub target_read_id: ReadId,
    /// Query position minus target position
    pub estimated_offset: i32,
    /// Position of the last base of the query window
    pub query_hash_position: u16,
}

/// Result of scanning one query strand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Strand not scanned
    Skipped,
    /// Accepted matches, in scan order
    Hits(Vec<RawHit>),
    /// The strand crossed the raw-hit ceiling; its hits were discarded
    Megahub {
        /// Matches counted before stopping
        raw_hits: u64,
    },
}

/// Both strands of one query read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadScan {
    /// Query read
    pub query: ReadId,
    /// Forward strand outcome
    pub forward: ScanOutcome,
    /// Reverse complement outcome; skipped when the forward strand made the read a megahub
    pub reverse: ScanOutcome,
}

impl ReadScan {
    /// Check if either strand crossed the raw-hit ceiling
    pub fn crossed_cap(&self) -> bool {
        matches!(self.forward, ScanOutcome::Megahub { .. })
            || matches!(self.reverse, ScanOutcome::Megahub { .. })
    }
}

/// Looks query strands up in one partition index
pub struct CandidateScanner<'a, P: ?Sized> {
    pool: &'a P,
    index: &'a PartitionIndex,
    bases_per_hash: usize,
    megahub_cap: u64,
    only_against_rails: bool,
}

impl<'a, P: ReadPool + ?Sized> CandidateScanner<'a, P> {
    /// Create a scanner over `index`
    pub fn new(pool: &'a P, index: &'a PartitionIndex, config: &SkimConfiguration) -> Self {
        Self {
            pool,
            index,
            bases_per_hash: config.bases_per_hash,
            megahub_cap: config.megahub_cap as u64,
            only_against_rails: config.only_against_rails,
        }
    }

    /// Scan both strands of a query read
    pub fn scan_read(&self, query: ReadId, megahubs: &MegahubSet) -> Result<ReadScan> {
        let forward = self.scan(query, Strand::Forward, megahubs)?;
        let reverse = if matches!(forward, ScanOutcome::Megahub { .. }) {
            ScanOutcome::Skipped
        } else {
            self.scan(query, Strand::Reverse, megahubs)?
        };
        Ok(ReadScan {
            query,
            forward,
            reverse,
        })
    }

    /// Scan one strand of a query read
    ///
    /// Matches are dropped when the target is the query itself, when the
    /// target id is not lower than the query id (unless searching against
    /// rails), when both reads are rails, or when the target is a megahub.
    pub fn scan(
        &self,
        query: ReadId,
        strand: Strand,
        megahubs: &MegahubSet,
    ) -> Result<ScanOutcome> {
        if !is_scannable(self.pool, query, self.only_against_rails) || megahubs.contains(query) {
            return Ok(ScanOutcome::Skipped);
        }

        let sequence = self.pool.clipped_sequence(query, strand);
        let query_is_rail = self.pool.is_rail(query);
        let mut hits = Vec::new();

        for kmer in Kmerizer::probing(&sequence, self.bases_per_hash) {
            let kmer = kmer.map_err(|source| SkimError::Encoding {
                read_id: query,
                source,
            })?;

            for record in self.index.lookup(kmer.hash) {
                let target = record.read_id;
                if target == query
                    || (!self.only_against_rails && target > query)
                    || (query_is_rail && self.pool.is_rail(target))
                    || megahubs.contains(target)
                {
                    continue;
                }

                hits.push(RawHit {
                    target_read_id: target,
                    estimated_offset: kmer.position as i32 - record.position as i32,
                    query_hash_position: kmer.position,
                });
                if hits.len() as u64 > self.megahub_cap {
                    return Ok(ScanOutcome::Megahub {
                        raw_hits: hits.len() as u64,
                    });
                }
            }
        }

        Ok(ScanOutcome::Hits(hits))
    }
}
