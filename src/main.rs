//! snvmixtools: utilities for SNVMix genotype calls
//!
//! Usage: snvmixtools <COMMAND> [OPTIONS]

use clap::{ArgAction, Parser, Subcommand};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use snvmix_tools::bed::BedReader;
use snvmix_tools::commands::{
    CallCommand, FreqsCommand, GenerateCommand, IntersectCommand, Scorer, TrackProjector,
};
use snvmix_tools::snvmix::{Result, SnvmixError, SnvmixReader};
use snvmix_tools::streaming::write_count;

#[derive(Parser)]
#[command(name = "snvmixtools")]
#[command(version)]
#[command(about = "Summaries, tracks, interval filters and variant calls for SNVMix output", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Skip the chromosome/position order checks on streamed inputs
    #[arg(long, global = true)]
    assume_sorted: bool,

    /// Print run statistics to stderr
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Minor allele frequency histogram and minor count total
    Freqs {
        /// Input SNVMix file (use - for stdin)
        input: PathBuf,

        /// Histogram output (bin_start, bin_end, count)
        output: PathBuf,

        /// File receiving the total minor allele count
        log: PathBuf,

        /// Only count records with depth above this threshold
        #[arg(short = 't', long, default_value = "0")]
        threshold: u64,
    },

    /// Convert SNVMix records to a wiggle track
    #[command(name = "snvmix2wig")]
    Snvmix2Wig {
        /// Input SNVMix file (use - for stdin)
        input: PathBuf,

        /// Output wiggle file (use - for stdout)
        output: PathBuf,

        /// Records at or below this depth get value 0
        #[arg(short = 't', long, default_value = "0")]
        threshold: u64,

        /// Score function: min or min-norm
        #[arg(short = 'p', long = "score", default_value = "min")]
        score: String,

        /// Track name for the wiggle header
        #[arg(long)]
        name: Option<String>,
    },

    /// Keep records that fall inside sorted BED intervals
    Intersect {
        /// Input SNVMix file (use - for stdin)
        input: PathBuf,

        /// Sorted BED file of regions
        bed: PathBuf,

        /// Output SNVMix file (use - for stdout)
        output: PathBuf,

        /// Write the number of emitted records to this file
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Call variants with a binomial test on the minor allele count
    Call {
        /// Input SNVMix file (use - for stdin)
        input: PathBuf,

        /// Output SNVMix file (use - for stdout)
        output: PathBuf,

        /// Significance level
        #[arg(short = 'p', long = "p-value", default_value = "0.05")]
        p_value: f64,

        /// Per-read sequencing error rate
        #[arg(short = 'e', long = "error-rate", default_value = "0.01")]
        error_rate: f64,

        /// Divide the significance level by the number of records
        #[arg(long)]
        bonferroni: bool,

        /// Write the number of called variants to this file
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Generate sorted synthetic SNVMix records
    Generate {
        /// Output SNVMix file (use - for stdout)
        output: PathBuf,

        /// Number of records
        #[arg(short = 'n', long, default_value = "1000")]
        count: u64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    // Must be set before any stream is opened
    if cli.assume_sorted {
        snvmix_tools::config::set_assume_sorted(true);
    }

    let stats = cli.stats;
    let result = match cli.command {
        Commands::Freqs {
            input,
            output,
            log,
            threshold,
        } => run_freqs(&input, &output, &log, threshold, stats),

        Commands::Snvmix2Wig {
            input,
            output,
            threshold,
            score,
            name,
        } => run_snvmix2wig(&input, &output, threshold, &score, name, stats),

        Commands::Intersect {
            input,
            bed,
            output,
            log,
        } => run_intersect(&input, &bed, &output, log.as_deref(), stats),

        Commands::Call {
            input,
            output,
            p_value,
            error_rate,
            bonferroni,
            log,
        } => run_call(
            &input,
            &output,
            p_value,
            error_rate,
            bonferroni,
            log.as_deref(),
            stats,
        ),

        Commands::Generate {
            output,
            count,
            seed,
        } => run_generate(&output, count, seed, stats),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Open an SNVMix input, `-` meaning stdin.
fn open_records(path: &Path) -> Result<SnvmixReader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_stdio(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(path)?)
    };
    Ok(SnvmixReader::new(reader))
}

/// Create an output file, `-` meaning stdout.
fn create_output(path: &Path) -> Result<Box<dyn Write>> {
    if is_stdio(path) {
        Ok(Box::new(io::stdout().lock()))
    } else {
        Ok(Box::new(File::create(path)?))
    }
}

fn write_log(path: Option<&Path>, count: u64) -> Result<()> {
    if let Some(path) = path {
        let mut file = File::create(path)?;
        write_count(&mut file, count)?;
    }
    Ok(())
}

fn run_freqs(input: &Path, output: &Path, log: &Path, threshold: u64, stats: bool) -> Result<()> {
    let cmd = FreqsCommand::new().with_threshold(threshold);
    cmd.validate()?;

    let records = open_records(input)?;
    let output = create_output(output)?;
    let mut log_file = File::create(log)?;
    let summary = cmd.run(records.records(), output, &mut log_file)?;

    if stats {
        eprintln!("Freqs stats: {}", summary);
    }
    Ok(())
}

fn run_snvmix2wig(
    input: &Path,
    output: &Path,
    threshold: u64,
    score: &str,
    name: Option<String>,
    stats: bool,
) -> Result<()> {
    let mut projector = TrackProjector::new()
        .with_scorer(Scorer::from_name(score)?)
        .with_threshold(threshold);
    if let Some(name) = name {
        projector = projector.with_name(name);
    }

    let records = open_records(input)?;
    let output = create_output(output)?;
    let result = projector.run(records.records(), output)?;

    if stats {
        eprintln!("Track stats: {}", result);
    }
    Ok(())
}

fn run_intersect(
    input: &Path,
    bed: &Path,
    output: &Path,
    log: Option<&Path>,
    stats: bool,
) -> Result<()> {
    let records = open_records(input)?;
    let intervals = BedReader::from_path(bed)?;
    let output = create_output(output)?;

    let result = IntersectCommand::new().run(records, intervals.intervals(), output)?;
    write_log(log, result.records_written as u64)?;

    if stats {
        eprintln!("Intersect stats: {}", result);
    }
    Ok(())
}

fn run_call(
    input: &Path,
    output: &Path,
    p_value: f64,
    error_rate: f64,
    bonferroni: bool,
    log: Option<&Path>,
    stats: bool,
) -> Result<()> {
    let cmd = CallCommand::new()
        .with_p_value(p_value)
        .with_error_rate(error_rate)
        .with_bonferroni(bonferroni);
    cmd.validate()?;

    let result = if is_stdio(input) {
        if bonferroni {
            return Err(SnvmixError::Configuration(
                "--bonferroni needs a file input; stdin can only be read once".to_string(),
            ));
        }
        let records = open_records(input)?;
        cmd.run_stream(records.records(), create_output(output)?)?
    } else {
        cmd.run(input, create_output(output)?)?
    };
    write_log(log, result.variants as u64)?;

    if stats {
        eprintln!("Call stats: {}", result);
    }
    Ok(())
}

fn run_generate(output: &Path, count: u64, seed: u64, stats: bool) -> Result<()> {
    let cmd = GenerateCommand::new().with_count(count).with_seed(seed);
    let result = cmd.run(create_output(output)?)?;

    if stats {
        eprintln!("Generate stats: {}", result);
    }
    Ok(())
}
