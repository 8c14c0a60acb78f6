//! CLI definitions and argument types.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracecheck::MmioRegion;
use tracecheck::log::CandidateFormat;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "tracecheck")]
#[command(about = "Cross-validate ChampSim instruction traces against a Spike commit log")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a candidate trace against a reference commit log
    Check {
        /// Spike commit log (`--log-commits`)
        #[arg(value_name = "REFERENCE_LOG")]
        reference: PathBuf,

        /// Trace under test (text or binary ChampSim records)
        #[arg(value_name = "CANDIDATE_TRACE")]
        candidate: PathBuf,

        /// Maximum instructions to check (0 = all)
        #[arg(long, visible_alias = "max", default_value = "0")]
        max_instructions: usize,

        /// Stop at the first error
        #[arg(long)]
        stop_on_error: bool,

        /// Fail after this many consecutive sync skips (default: unbounded)
        #[arg(long, value_name = "N")]
        max_resync: Option<usize>,

        /// Candidate trace encoding
        #[arg(long, value_enum, default_value = "auto")]
        candidate_format: CandidateFormatArg,

        /// Additional MMIO region excluded from memory checks (hex START:END, end exclusive)
        #[arg(long = "mmio", value_name = "START:END")]
        mmio: Vec<MmioRegion>,

        /// Do not exclude the built-in QEMU virt device regions
        #[arg(long)]
        no_default_mmio: bool,

        /// Summary format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print a binary ChampSim trace as text
    Dump {
        /// Binary trace file
        #[arg(value_name = "TRACE")]
        input: PathBuf,

        /// Number of records to print (default: all)
        #[arg(long)]
        count: Option<u64>,

        /// Number of records to skip first
        #[arg(long, default_value = "0")]
        skip: u64,
    },
}

/// Candidate trace encoding.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CandidateFormatArg {
    /// Binary for `.bin`/`.champsimtrace`, text otherwise
    Auto,
    Text,
    Binary,
}

impl CandidateFormatArg {
    pub fn resolve(self, path: &Path) -> CandidateFormat {
        match self {
            Self::Auto => CandidateFormat::detect(path),
            Self::Text => CandidateFormat::Text,
            Self::Binary => CandidateFormat::Binary,
        }
    }
}

/// Output format for the summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
