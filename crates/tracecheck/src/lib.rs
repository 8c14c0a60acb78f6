//! Tracecheck - instruction trace cross-validation
//!
//! Checks a ChampSim trace produced by an instrumentation tool against a Spike
//! commit log of the same program: program-counter order, branch outcomes, and
//! the memory addresses each instruction touched.
//!
//! # Example
//!
//! ```ignore
//! use tracecheck::{CheckConfig, MmioMap, WriterSink, cross_validate};
//! use tracecheck::log::{CandidateFormat, parse_candidate_file, parse_reference_file};
//!
//! let reference = parse_reference_file("spike.log".as_ref())?;
//! let candidate = parse_candidate_file("debug.txt".as_ref(), CandidateFormat::Text)?;
//! let verdict = cross_validate(
//!     &reference,
//!     &candidate,
//!     &MmioMap::qemu_virt(),
//!     &CheckConfig::default(),
//!     WriterSink::new(std::io::stdout()),
//! );
//! assert!(verdict.passed());
//! ```

pub mod align;
pub mod check;
mod config;
pub mod dump;
pub mod metrics;
pub mod mmio;
pub mod report;

pub use align::Aligner;
pub use check::{check_pair, infer_taken};
pub use config::CheckConfig;
pub use mmio::{MmioMap, MmioRegion};
pub use report::{
    CollectSink, Diagnostic, DiagnosticKind, DiagnosticSink, ReportAggregator, Termination,
    Verdict, WriterSink,
};
pub use tracecheck_log as log;

use thiserror::Error;
use tracecheck_log::{CandidateInstruction, ReferenceInstruction};

/// Checker errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Log(#[from] tracecheck_log::LogError),
    #[error("invalid MMIO region '{0}': expected START:END in hex with END > START")]
    InvalidMmioRegion(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Check `candidate` against `reference`, streaming diagnostics into `sink`.
pub fn cross_validate<S: DiagnosticSink>(
    reference: &[ReferenceInstruction],
    candidate: &[CandidateInstruction],
    mmio: &MmioMap,
    config: &CheckConfig,
    sink: S,
) -> Verdict {
    let mut report = ReportAggregator::new(sink);
    let termination = Aligner::new(reference, candidate, mmio, config).run(&mut report);
    report.finish(termination)
}
