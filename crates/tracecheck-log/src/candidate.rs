//! Candidate (ChampSim) trace parsing.

use std::io::BufRead;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::champsim::{ChampSimRecord, ChampSimRecords};
use crate::input::{LossyLines, logical_name, open_input};
use crate::record::CandidateInstruction;
use crate::{LogError, Result};

static LINE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// On-disk encoding of a candidate trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateFormat {
    /// One `ip=0x... branch=N ...` line per instruction.
    Text,
    /// Raw 64-byte `input_instr` records.
    Binary,
}

impl CandidateFormat {
    /// Guess the format from the file name (`.zst` suffix ignored).
    ///
    /// `.bin` and `.champsimtrace` are binary; everything else is text.
    pub fn detect(path: &Path) -> Self {
        let name = logical_name(path).to_ascii_lowercase();
        if name.ends_with(".bin") || name.ends_with(".champsimtrace") {
            Self::Binary
        } else {
            Self::Text
        }
    }
}

impl ChampSimRecord {
    /// Parse the text rendering of a record.
    ///
    /// Returns `None` for comment lines and anything that does not match the grammar.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }

        let pattern = LINE_PATTERN.get_or_init(|| {
            Regex::new(concat!(
                r"^ip=0x([0-9a-fA-F]+)\s+",
                r"branch=(\d)\s+taken=(\d)\s+",
                r"dst_regs=\[(\d+),(\d+)\]\s+",
                r"src_regs=\[(\d+),(\d+),(\d+),(\d+)\]\s+",
                r"dst_mem=\[0x([0-9a-fA-F]+),0x([0-9a-fA-F]+)\]\s+",
                r"src_mem=\[0x([0-9a-fA-F]+),0x([0-9a-fA-F]+),0x([0-9a-fA-F]+),0x([0-9a-fA-F]+)\]",
            ))
            .unwrap()
        });
        let caps = pattern.captures(line)?;

        Some(Self {
            ip: hex(&caps, 1)?,
            is_branch: dec(&caps, 2)?,
            branch_taken: dec(&caps, 3)?,
            destination_registers: [dec(&caps, 4)?, dec(&caps, 5)?],
            source_registers: [
                dec(&caps, 6)?,
                dec(&caps, 7)?,
                dec(&caps, 8)?,
                dec(&caps, 9)?,
            ],
            destination_memory: [hex(&caps, 10)?, hex(&caps, 11)?],
            source_memory: [
                hex(&caps, 12)?,
                hex(&caps, 13)?,
                hex(&caps, 14)?,
                hex(&caps, 15)?,
            ],
        })
    }
}

fn hex(caps: &Captures<'_>, group: usize) -> Option<u64> {
    u64::from_str_radix(caps.get(group)?.as_str(), 16).ok()
}

fn dec(caps: &Captures<'_>, group: usize) -> Option<u8> {
    caps.get(group)?.as_str().parse().ok()
}

impl CandidateInstruction {
    /// Parse one line of a text trace.
    pub fn parse(line: &str) -> Option<Self> {
        ChampSimRecord::parse_line(line).map(|record| Self::from(&record))
    }
}

/// Forward-only iterator over the instructions of a text trace.
pub struct CandidateRecords<R> {
    lines: LossyLines<R>,
}

impl<R: BufRead> CandidateRecords<R> {
    pub const fn new(reader: R) -> Self {
        Self {
            lines: LossyLines::new(reader),
        }
    }
}

impl<R: BufRead> Iterator for CandidateRecords<R> {
    type Item = std::io::Result<CandidateInstruction>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    if let Some(insn) = CandidateInstruction::parse(&line) {
                        return Some(Ok(insn));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Parse a whole candidate trace into memory.
pub fn parse_candidate_file(
    path: &Path,
    format: CandidateFormat,
) -> Result<Vec<CandidateInstruction>> {
    let reader = open_input(path)?;
    let records = match format {
        CandidateFormat::Text => CandidateRecords::new(reader).collect::<std::io::Result<Vec<_>>>(),
        CandidateFormat::Binary => ChampSimRecords::new(reader)
            .map(|r| r.map(|record| CandidateInstruction::from(&record)))
            .collect(),
    }
    .map_err(|e| LogError::io(path, e))?;
    debug!(
        path = %path.display(),
        ?format,
        records = records.len(),
        "parsed candidate trace"
    );
    Ok(records)
}
