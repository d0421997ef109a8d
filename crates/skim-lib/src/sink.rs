//! Result output
//!
//! Accepted candidates go to one of two append-only channels depending on
//! the strand the query was scanned in. Each record is one tab-separated
//! line:
//!
//! ```text
//! target_id <TAB> query_id <TAB> -offset <TAB> percent_overlap <TAB> supporting_hashes
//! ```
//!
//! The offset is written negated, the sign convention downstream consumers
//! of these channels expect.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::read_pool::{ReadId, ReadPool, Strand};
use crate::reducer::{Candidate, Reduction};
use crate::state::ReadCounters;

/// Destination of accepted candidates
pub trait CandidateSink {
    /// Append one candidate found for `query` scanned in `strand`
    fn emit(&mut self, query: ReadId, candidate: &Candidate, strand: Strand) -> io::Result<()>;

    /// Flush buffered records
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Tab-separated output over two writers
pub struct TsvSink<W: Write> {
    forward: W,
    complement: W,
    forward_records: u64,
    complement_records: u64,
}

impl TsvSink<BufWriter<File>> {
    /// Create (truncating) the two channel files
    pub fn create<P: AsRef<Path>>(forward_path: P, complement_path: P) -> io::Result<Self> {
        let forward = BufWriter::new(File::create(forward_path)?);
        let complement = BufWriter::new(File::create(complement_path)?);
        Ok(Self::new(forward, complement))
    }
}

impl<W: Write> TsvSink<W> {
    /// Wrap two writers
    pub fn new(forward: W, complement: W) -> Self {
        Self {
            forward,
            complement,
            forward_records: 0,
            complement_records: 0,
        }
    }

    /// Records written to a channel so far
    pub fn records_written(&self, strand: Strand) -> u64 {
        match strand {
            Strand::Forward => self.forward_records,
            Strand::Reverse => self.complement_records,
        }
    }

    /// Unwrap the forward and complement writers
    pub fn into_inner(self) -> (W, W) {
        (self.forward, self.complement)
    }
}

impl<W: Write> CandidateSink for TsvSink<W> {
    fn emit(&mut self, query: ReadId, candidate: &Candidate, strand: Strand) -> io::Result<()> {
        let (out, count) = match strand {
            Strand::Forward => (&mut self.forward, &mut self.forward_records),
            Strand::Reverse => (&mut self.complement, &mut self.complement_records),
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            candidate.target_read_id,
            query,
            -(candidate.offset as i64),
            candidate.percent_overlap,
            candidate.supporting_hashes
        )?;
        *count += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.forward.flush()?;
        self.complement.flush()
    }
}

/// Write the selected candidates of one query strand and bump overlap counters
///
/// Every accepted candidate counts for both reads unless one of them is a
/// rail, whether or not the per-read cap let it through to the output.
/// Returns the number of records written.
pub fn persist_reduction<P, S>(
    pool: &P,
    query: ReadId,
    strand: Strand,
    reduction: &Reduction,
    counters: &mut ReadCounters,
    sink: &mut S,
) -> io::Result<u64>
where
    P: ReadPool + ?Sized,
    S: CandidateSink + ?Sized,
{
    let query_is_rail = pool.is_rail(query);
    let mut written = 0;
    for candidate in &reduction.candidates {
        if !query_is_rail && !pool.is_rail(candidate.target_read_id) {
            counters.bump_overlap(query);
            counters.bump_overlap(candidate.target_read_id);
        }
        if candidate.selected {
            sink.emit(query, candidate, strand)?;
            written += 1;
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_pool::ReadStore;

    fn candidate(target: ReadId, offset: i32, selected: bool) -> Candidate {
        Candidate {
            target_read_id: target,
            offset,
            percent_overlap: 83,
            supporting_hashes: 12,
            selected,
        }
    }

    #[test]
    fn test_tsv_format_and_channels() {
        let mut sink = TsvSink::new(Vec::new(), Vec::new());
        sink.emit(7, &candidate(3, -2, true), Strand::Forward).unwrap();
        sink.emit(9, &candidate(4, 15, true), Strand::Reverse).unwrap();
        sink.flush().unwrap();

        assert_eq!(sink.records_written(Strand::Forward), 1);
        assert_eq!(sink.records_written(Strand::Reverse), 1);
        let (forward, complement) = sink.into_inner();
        assert_eq!(String::from_utf8(forward).unwrap(), "3\t7\t2\t83\t12\n");
        assert_eq!(String::from_utf8(complement).unwrap(), "4\t9\t-15\t83\t12\n");
    }

    #[test]
    fn test_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let forward = dir.path().join("out.forward.tsv");
        let complement = dir.path().join("out.complement.tsv");
        {
            let mut sink = TsvSink::create(&forward, &complement).unwrap();
            sink.emit(1, &candidate(0, 0, true), Strand::Forward).unwrap();
            sink.flush().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&forward).unwrap(), "0\t1\t0\t83\t12\n");
        assert_eq!(std::fs::read_to_string(&complement).unwrap(), "");
    }

    #[test]
    fn test_persist_reduction() {
        let mut store = ReadStore::new();
        store.add_read("r0", b"ACGT").unwrap();
        store.add_rail("rail", b"ACGT").unwrap();
        store.add_read("r2", b"ACGT").unwrap();
        store.add_read("q", b"ACGT").unwrap();

        let reduction = Reduction {
            candidates: vec![candidate(0, 1, true), candidate(1, 2, true), candidate(2, 3, false)],
            ..Reduction::default()
        };
        let mut counters = ReadCounters::new(4);
        let mut sink = TsvSink::new(Vec::new(), Vec::new());

        let written =
            persist_reduction(&store, 3, Strand::Forward, &reduction, &mut counters, &mut sink)
                .unwrap();
        assert_eq!(written, 2);
        // The rail pair is written but not counted; the capped one is counted but not written
        assert_eq!(counters.overlap_counts(), &[1, 0, 1, 2]);

        let (forward, _) = sink.into_inner();
        let lines: Vec<String> = String::from_utf8(forward)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(lines, vec!["0\t3\t-1\t83\t12", "1\t3\t-2\t83\t12"]);
    }
}
