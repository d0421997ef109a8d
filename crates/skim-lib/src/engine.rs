//! Skim run orchestration
//!
//! Drives the partition loop:
//! 1. Dry-run the partition planner to size the progress bar
//! 2. For each partition, build its hash index
//! 3. Scan every eligible query read against it, both strands
//! 4. Apply scan results in read id order: megahubs, counters, reduction, output
//!
//! Scanning runs in parallel on chunks of consecutive query ids, against a
//! snapshot of the megahub set taken at the start of each chunk. All state
//! changes happen in step 4 on the calling thread. Hits on targets flagged
//! after the snapshot are dropped there, and a read whose scan crossed the
//! megahub cap is scanned again against the current set, so every decision
//! matches a sequential scan. The output is the same for any number of
//! threads and any chunking.

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::SkimConfiguration;
use crate::constants::SCAN_CHUNK_READS;
use crate::deny_list::DenyList;
use crate::error::{Result, SkimError};
use crate::index::{PartitionIndex, PartitionPlanner};
use crate::read_pool::{ReadId, ReadPool, Strand};
use crate::reducer::CandidateReducer;
use crate::scanner::{CandidateScanner, ReadScan, ScanOutcome};
use crate::sink::{persist_reduction, CandidateSink};
use crate::state::SkimState;

/// Counters of one skim run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkimReport {
    /// Partitions built
    pub num_partitions: u64,
    /// Hash records indexed over all partitions
    pub num_indexed_records: u64,
    /// Query strands scanned
    pub strands_scanned: u64,
    /// Raw hits kept after scanning
    pub raw_hits: u64,
    /// Clusters below the required percentage
    pub below_threshold: u64,
    /// Clusters rejected by the deny list
    pub denied: u64,
    /// Accepted candidates dropped by the per-read cap
    pub truncated: u64,
    /// Records written to the forward channel
    pub forward_records: u64,
    /// Records written to the complement channel
    pub complement_records: u64,
    /// Reads declared megahubs during the run
    pub megahubs: u64,
}

impl SkimReport {
    /// Log the report via tracing
    pub fn print_summary(&self) {
        info!("Skim Summary:");
        info!("  Partitions: {}", self.num_partitions);
        info!("  Indexed hash records: {}", self.num_indexed_records);
        info!("  Strands scanned: {}", self.strands_scanned);
        info!("  Raw hits: {}", self.raw_hits);
        info!("  Clusters below threshold: {}", self.below_threshold);
        info!("  Clusters denied: {}", self.denied);
        info!("  Candidates truncated: {}", self.truncated);
        info!("  Forward records: {}", self.forward_records);
        info!("  Complement records: {}", self.complement_records);
        info!("  Megahubs: {}", self.megahubs);
    }
}

/// Final state and counters of a run
#[derive(Debug, Clone)]
pub struct SkimOutcome {
    /// Megahub set and per-read counters
    pub state: SkimState,
    /// Run counters
    pub report: SkimReport,
}

/// The overlap candidate search engine
pub struct SkimEngine {
    config: SkimConfiguration,
}

impl SkimEngine {
    /// Create an engine with the given configuration
    pub fn new(config: SkimConfiguration) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The run configuration
    pub fn config(&self) -> &SkimConfiguration {
        &self.config
    }

    /// Find candidate overlaps for every read of `pool`
    ///
    /// # Arguments
    /// * `pool` - reads to search; ids are stable for the whole run
    /// * `deny_list` - optional forbidden (query, target) pairs
    /// * `sink` - receives accepted candidates
    /// * `progress` - advanced by two units per query read and partition
    ///
    /// # Partitioning
    /// `max_hits_per_read` caps the candidates of one query strand within one
    /// partition sweep. With more partitions a query may therefore write more
    /// records. The accepted candidates and the overlap counters do not
    /// depend on the partitioning; capped candidates are counted in
    /// [`SkimReport::truncated`].
    ///
    /// # Parallelism
    /// The number of threads is controlled by `config.num_threads`:
    /// - `0`: use all available CPU cores (rayon default)
    /// - `N`: use exactly N threads
    ///
    /// # Errors
    /// Fails on the first unrecognised symbol, overlong read or write error;
    /// nothing is rolled back.
    pub fn run<P, S>(
        &self,
        pool: &P,
        deny_list: Option<&DenyList>,
        sink: &mut S,
        progress: &ProgressBar,
    ) -> Result<SkimOutcome>
    where
        P: ReadPool + Sync + ?Sized,
        S: CandidateSink + ?Sized,
    {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .build()
            .map_err(|e| SkimError::ThreadPool(e.to_string()))?;

        self.config.print();
        info!("Searching overlap candidates among {} reads", pool.num_reads());

        let planner = PartitionPlanner::new(&self.config);
        let plan = planner.count(pool)?;
        info!("  Planned {} partitions", plan.num_partitions);
        progress.set_length(plan.progress_total);

        let mut state = SkimState::new(pool.num_reads());
        let mut report = SkimReport::default();
        let reducer = CandidateReducer::new(pool, deny_list, &self.config);
        let num_reads = pool.num_reads() as ReadId;

        let mut start: ReadId = 0;
        while let Some(end) = planner.next_boundary(pool, start)? {
            report.num_partitions += 1;
            info!(
                "Partition {}/{}: reads {}..{}",
                report.num_partitions, plan.num_partitions, start, end
            );

            let index =
                thread_pool.install(|| PartitionIndex::build(pool, start..end, &self.config))?;
            index.statistics().print_summary();
            report.num_indexed_records += index.len() as u64;

            let scanner = CandidateScanner::new(pool, &index, &self.config);
            let mut chunk_start = planner.first_query(start);
            while chunk_start < num_reads {
                let chunk_end = chunk_start
                    .saturating_add(SCAN_CHUNK_READS as ReadId)
                    .min(num_reads);

                let megahubs = &state.megahubs;
                let snapshot_len = megahubs.len();
                let scans: Vec<ReadScan> = thread_pool.install(|| {
                    (chunk_start..chunk_end)
                        .into_par_iter()
                        .map(|query| scanner.scan_read(query, megahubs))
                        .collect::<Result<Vec<_>>>()
                })?;

                for mut scan in scans {
                    // A cap crossed partly on targets flagged later in the chunk
                    if scan.crossed_cap() && state.megahubs.len() > snapshot_len {
                        scan = scanner.scan_read(scan.query, &state.megahubs)?;
                    }
                    self.apply_scan(pool, scan, &reducer, &mut state, sink, &mut report)?;
                    progress.inc(2);
                }
                chunk_start = chunk_end;
            }

            debug!("  Megahubs so far: {}", state.megahubs.len());
            start = end;
        }

        sink.flush()?;
        progress.finish();
        report.print_summary();

        Ok(SkimOutcome { state, report })
    }

    /// Apply the scan of one query read, forward strand first
    fn apply_scan<P, S>(
        &self,
        pool: &P,
        scan: ReadScan,
        reducer: &CandidateReducer<'_, P>,
        state: &mut SkimState,
        sink: &mut S,
        report: &mut SkimReport,
    ) -> Result<()>
    where
        P: ReadPool + ?Sized,
        S: CandidateSink + ?Sized,
    {
        let query = scan.query;
        let strands = [(Strand::Forward, scan.forward), (Strand::Reverse, scan.reverse)];
        for (strand, outcome) in strands {
            match outcome {
                ScanOutcome::Skipped => {}
                ScanOutcome::Megahub { raw_hits } => {
                    report.strands_scanned += 1;
                    state.counters.add_raw_hits(query, raw_hits);
                    if state.megahubs.insert(query) {
                        report.megahubs += 1;
                        warn!(
                            "Read {} crossed {} raw hits on the {} strand, marked as megahub",
                            query, self.config.megahub_cap, strand
                        );
                    }
                }
                ScanOutcome::Hits(mut hits) => {
                    report.strands_scanned += 1;
                    // Targets flagged earlier in this chunk
                    hits.retain(|h| !state.megahubs.contains(h.target_read_id));
                    state.counters.add_raw_hits(query, hits.len() as u64);
                    report.raw_hits += hits.len() as u64;

                    let reduction = reducer.reduce(query, hits);
                    report.below_threshold += reduction.below_threshold;
                    report.denied += reduction.denied;
                    report.truncated += reduction.num_truncated() as u64;

                    let written = persist_reduction(
                        pool,
                        query,
                        strand,
                        &reduction,
                        &mut state.counters,
                        sink,
                    )?;
                    match strand {
                        Strand::Forward => report.forward_records += written,
                        Strand::Reverse => report.complement_records += written,
                    }
                }
            }
        }
        Ok(())
    }
}
