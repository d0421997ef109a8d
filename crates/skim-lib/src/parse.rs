//! FASTA/FASTQ and deny-list loading
//!
//! Reads sequences from FASTA or FASTQ files, with transparent gzip
//! decompression, into a [`ReadStore`]. Sequences may carry IUPAC ambiguity
//! codes, masks and gaps; any other symbol rejects the file.

use anyhow::{Context, Result};
use needletail::parse_fastx_file;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::deny_list::DenyList;
use crate::encoding::validate_sequence;
use crate::read_pool::{ReadId, ReadStore};

/// Parse a FASTA/FASTQ file and call a function for each sequence
///
/// # Arguments
/// * `path` - Path to input file (may be gzipped)
/// * `callback` - Function called for each sequence, receives (name, sequence)
///
/// # Errors
/// Returns error if:
/// - File cannot be opened
/// - File format is invalid
/// - Sequence contains unrecognised symbols
pub fn parse_sequences<P, F>(path: P, mut callback: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(&[u8], &[u8]) -> Result<()>,
{
    let path = path.as_ref();

    let mut reader = parse_fastx_file(path)
        .with_context(|| format!("Failed to open sequence file: {}", path.display()))?;

    while let Some(record) = reader.next() {
        let record = record
            .with_context(|| format!("Failed to parse sequence record in {}", path.display()))?;

        let seq = record.seq();
        validate_sequence(&seq).with_context(|| {
            format!(
                "Invalid sequence {} in {}",
                String::from_utf8_lossy(record.id()),
                path.display()
            )
        })?;

        callback(record.id(), &seq)?;
    }

    Ok(())
}

/// Read name: the first word of a FASTA/FASTQ header
pub fn read_name(header: &[u8]) -> String {
    let header = String::from_utf8_lossy(header);
    header.split_whitespace().next().unwrap_or_default().to_string()
}

/// Append every sequence of a file to `store`
///
/// Reads from a rail file are flagged as rails. Returns the number of
/// sequences added.
pub fn load_reads<P: AsRef<Path>>(path: P, store: &mut ReadStore, rails: bool) -> Result<usize> {
    let mut added = 0;
    parse_sequences(path, |header, seq| {
        let name = read_name(header);
        if rails {
            store.add_rail(name, seq)?;
        } else {
            store.add_read(name, seq)?;
        }
        added += 1;
        Ok(())
    })?;
    Ok(added)
}

/// Load a deny list of read id pairs
///
/// One pair per line, two read ids separated by whitespace. Blank lines and
/// lines starting with `#` are ignored. Each pair is forbidden in both
/// directions.
pub fn load_deny_list<P: AsRef<Path>>(path: P) -> Result<DenyList> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open deny list: {}", path.display()))?;

    let mut deny = DenyList::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let location = format!("{}:{}", path.display(), line_no + 1);
        let mut fields = line.split_whitespace();
        let (Some(a), Some(b), None) = (fields.next(), fields.next(), fields.next()) else {
            anyhow::bail!("{location}: expected two read ids");
        };
        let a: ReadId = a
            .parse()
            .with_context(|| format!("{location}: invalid read id {a:?}"))?;
        let b: ReadId = b
            .parse()
            .with_context(|| format!("{location}: invalid read id {b:?}"))?;
        deny.insert_pair(a, b);
    }
    Ok(deny)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_pool::ReadPool;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_name() {
        assert_eq!(read_name(b"read_1 some description"), "read_1");
        assert_eq!(read_name(b"read_2"), "read_2");
        assert_eq!(read_name(b""), "");
    }

    #[test]
    fn test_parse_fasta_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, ">seq1 first")?;
        writeln!(temp_file, "ACGTNN")?;
        writeln!(temp_file, ">seq2")?;
        writeln!(temp_file, "TGCA")?;
        temp_file.flush()?;

        let mut sequences = Vec::new();
        parse_sequences(temp_file.path(), |name, seq| {
            sequences.push((read_name(name), seq.to_vec()));
            Ok(())
        })?;

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].0, "seq1");
        assert_eq!(sequences[0].1, b"ACGTNN");
        assert_eq!(sequences[1].1, b"TGCA");

        Ok(())
    }

    #[test]
    fn test_parse_rejects_unknown_symbols() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, ">bad")?;
        writeln!(temp_file, "ACGU")?;
        temp_file.flush()?;

        assert!(parse_sequences(temp_file.path(), |_, _| Ok(())).is_err());
        Ok(())
    }

    #[test]
    fn test_load_reads_and_rails() -> Result<()> {
        let mut reads = NamedTempFile::new()?;
        writeln!(reads, "@r1\nACGT\n+\nIIII\n@r2\nGGCC\n+\nIIII")?;
        reads.flush()?;
        let mut rails = NamedTempFile::new()?;
        writeln!(rails, ">backbone\nACGTACGT")?;
        rails.flush()?;

        let mut store = ReadStore::new();
        assert_eq!(load_reads(reads.path(), &mut store, false)?, 2);
        assert_eq!(load_reads(rails.path(), &mut store, true)?, 1);

        assert_eq!(store.len(), 3);
        assert_eq!(store.name(1), "r2");
        assert!(!store.is_rail(0));
        assert!(store.is_rail(2));
        assert_eq!(store.clipped_len(2), 8);
        Ok(())
    }

    #[test]
    fn test_load_deny_list() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "# forbidden pairs")?;
        writeln!(temp_file, "1\t4")?;
        writeln!(temp_file)?;
        writeln!(temp_file, "7 2")?;
        temp_file.flush()?;

        let deny = load_deny_list(temp_file.path())?;
        assert!(deny.contains(1, 4));
        assert!(deny.contains(4, 1));
        assert!(deny.contains(2, 7));
        assert_eq!(deny.len(), 4);
        Ok(())
    }

    #[test]
    fn test_load_deny_list_malformed() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "1 2 3")?;
        temp_file.flush()?;
        assert!(load_deny_list(temp_file.path()).is_err());

        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "1 x")?;
        temp_file.flush()?;
        assert!(load_deny_list(temp_file.path()).is_err());
        Ok(())
    }
}
