//! Instruction log parsers for trace cross-validation.
//!
//! Two formats are understood:
//! - Spike commit logs (`--log-commits`), the trusted reference
//! - ChampSim instruction traces, either the 64-byte binary records written by the
//!   tracer plugin or their text rendering (`ip=0x... branch=N taken=N ...`)
//!
//! Both parsers are lenient: lines that do not match the grammar are skipped, so
//! a log full of chatter parses to an empty record list rather than an error.

mod candidate;
mod champsim;
mod input;
mod record;
mod reference;

pub use candidate::{CandidateFormat, CandidateRecords, parse_candidate_file};
pub use champsim::{
    ChampSimRecord, ChampSimRecords, NUM_INSTR_DESTINATIONS, NUM_INSTR_SOURCES, RECORD_SIZE,
    TEXT_HEADER,
};
pub use input::{is_zstd, logical_name, open_input};
pub use record::{CandidateInstruction, ReferenceInstruction};
pub use reference::{ReferenceRecords, parse_reference_file};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Log parsing errors.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LogError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogError>;
