use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use skim_lib::parse::{load_deny_list, load_reads};
use skim_lib::{
    PartitionPlanner, ReadPool, ReadStore, SkimConfiguration, SkimEngine, SkimOutcome, Strand,
    TsvSink,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "skim")]
#[command(version = "0.1.0")]
#[command(about = "Skim: k-mer hash based overlap candidate search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Read files (FASTA/FASTQ, may be gzipped)
    #[arg(short = 'i', long, required = true, num_args = 1..)]
    reads: Vec<PathBuf>,

    /// Rail files; their sequences are flagged as backbone rails
    #[arg(long, num_args = 1..)]
    rails: Vec<PathBuf>,

    /// Keep every N-th hash of a read when indexing
    #[arg(short = 's', long, default_value = "4")]
    stepping: usize,

    /// Memory budget of one partition, in hash records
    #[arg(long, default_value = "15000000")]
    max_memory_hashes: usize,

    /// Index rails only and search every read against them
    #[arg(long, default_value = "false")]
    only_against_rails: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search overlap candidates
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Output prefix
        #[arg(short, long)]
        output: PathBuf,

        /// K-mer length
        #[arg(short = 'k', long, default_value = "16")]
        bases_per_hash: usize,

        /// Minimal percentage of the possible overlap covered by hashes
        #[arg(short, long, default_value = "50")]
        percent: u8,

        /// Candidates kept per read and strand
        #[arg(long, default_value = "200")]
        max_hits: usize,

        /// Raw hits after which a read is dropped as a megahub
        #[arg(long, default_value = "100000")]
        megahub_cap: u32,

        /// Read id pairs that must not be reported
        #[arg(long)]
        deny: Option<PathBuf>,

        /// Number of threads (0 = all available cores)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Hide the progress bar
        #[arg(long, default_value = "false")]
        no_progress: bool,
    },

    /// Plan partitions without searching
    Plan {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            bases_per_hash,
            percent,
            max_hits,
            megahub_cap,
            deny,
            threads,
            no_progress,
        } => {
            let store = load_store(&input)?;
            let config = SkimConfiguration {
                bases_per_hash,
                hash_save_stepping: input.stepping,
                percent_required: percent,
                max_hits_per_read: max_hits,
                max_memory_hashes: input.max_memory_hashes,
                only_against_rails: input.only_against_rails,
                megahub_cap,
                num_threads: threads,
            };
            run_command(&store, config, deny.as_deref(), &output, no_progress)?;
        }
        Commands::Plan { input } => {
            plan_command(&input)?;
        }
    }

    Ok(())
}

/// Load reads and rails, in command line order
fn load_store(input: &InputArgs) -> anyhow::Result<ReadStore> {
    let mut store = ReadStore::new();
    for path in &input.reads {
        let added = load_reads(path, &mut store, false)?;
        info!("  Loaded {} reads from {}", added, path.display());
    }
    for path in &input.rails {
        let added = load_reads(path, &mut store, true)?;
        info!("  Loaded {} rails from {}", added, path.display());
    }
    info!("  Total: {} sequences, {} bases", store.len(), store.total_clipped_bases());
    Ok(store)
}

fn output_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Search candidates and write all output files
fn run_command(
    store: &ReadStore,
    config: SkimConfiguration,
    deny: Option<&Path>,
    prefix: &Path,
    no_progress: bool,
) -> anyhow::Result<()> {
    let deny_list = match deny {
        Some(path) => {
            let list = load_deny_list(path)?;
            info!("  Loaded {} denied pairs from {}", list.len() / 2, path.display());
            Some(list)
        }
        None => None,
    };

    let forward_path = output_path(prefix, ".forward.tsv");
    let complement_path = output_path(prefix, ".complement.tsv");
    let mut sink = TsvSink::create(&forward_path, &complement_path).with_context(|| {
        format!("Failed to create output files with prefix {}", prefix.display())
    })?;

    let progress = if no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ({eta})",
        )?);
        bar
    };

    let engine = SkimEngine::new(config)?;
    let outcome = engine.run(store, deny_list.as_ref(), &mut sink, &progress)?;

    info!(
        "{} forward candidates written to {}",
        sink.records_written(Strand::Forward),
        forward_path.display()
    );
    info!(
        "{} complement candidates written to {}",
        sink.records_written(Strand::Reverse),
        complement_path.display()
    );

    write_megahubs(store, &outcome, &output_path(prefix, ".megahubs.txt"))?;
    write_read_stats(store, &outcome, &output_path(prefix, ".readstats.tsv"))?;

    Ok(())
}

/// One megahub per line: id and name
fn write_megahubs(store: &ReadStore, outcome: &SkimOutcome, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for id in outcome.state.megahubs.iter() {
        writeln!(writer, "{}\t{}", id, store.name(id))?;
    }
    writer.flush()?;
    info!("{} megahubs written to {}", outcome.state.megahubs.len(), path.display());
    Ok(())
}

/// Per-read counters: id, name, overlaps, raw hits, megahub flag
fn write_read_stats(store: &ReadStore, outcome: &SkimOutcome, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "id\tname\toverlaps\traw_hits\tmegahub")?;
    let counters = &outcome.state.counters;
    for id in 0..store.num_reads() as u32 {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            id,
            store.name(id),
            counters.overlaps(id),
            counters.raw_hits(id),
            u8::from(outcome.state.megahubs.contains(id))
        )?;
    }
    writer.flush()?;
    info!("Read statistics written to {}", path.display());
    Ok(())
}

/// Dry run of the partition planner
fn plan_command(input: &InputArgs) -> anyhow::Result<()> {
    let store = load_store(input)?;
    let config = SkimConfiguration {
        hash_save_stepping: input.stepping,
        max_memory_hashes: input.max_memory_hashes,
        only_against_rails: input.only_against_rails,
        ..SkimConfiguration::default()
    };
    config.validate()?;

    let planner = PartitionPlanner::new(&config);
    let partitions = planner.plan(&store)?;
    let summary = planner.count(&store)?;

    info!("Partition plan:");
    info!("  Base budget per partition: {}", config.partition_base_budget());
    for (i, range) in partitions.iter().enumerate() {
        let bases: u64 = range
            .clone()
            .filter(|&id| skim_lib::read_pool::is_indexable(&store, id, config.only_against_rails))
            .map(|id| store.clipped_len(id) as u64)
            .sum();
        info!(
            "  Partition {}: reads {}..{} ({} reads, {} indexed bases)",
            i + 1,
            range.start,
            range.end,
            range.len(),
            bases
        );
    }
    info!("  Partitions: {}", summary.num_partitions);
    info!("  Progress units: {}", summary.progress_total);
    Ok(())
}
