//! Spike commit log parsing.
//!
//! Spike (`--log-commits`) writes one line per retired instruction:
//!
//! ```text
//! core   0: 3 0x<PC> (0x<INSN>) [x<RD> 0x<VALUE>] [mem 0x<ADDR> [0x<DATA>]]
//! ```
//!
//! A `mem` clause with a single value is a load; with a data value it is a store.

use std::io::BufRead;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::input::{LossyLines, open_input};
use crate::record::ReferenceInstruction;
use crate::{LogError, Result};

static LINE_PATTERN: OnceLock<Regex> = OnceLock::new();
static MEM_PATTERN: OnceLock<Regex> = OnceLock::new();

impl ReferenceInstruction {
    /// Parse a commit log line, returning `None` for anything that is not a retired instruction.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let line_pattern = LINE_PATTERN.get_or_init(|| {
            Regex::new(r"^core\s+\d+:\s+\d+\s+0x([0-9a-fA-F]+)\s+\(0x([0-9a-fA-F]+)\)(.*)$")
                .unwrap()
        });
        let caps = line_pattern.captures(line)?;

        let pc = u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?;
        let insn = u32::from_str_radix(caps.get(2)?.as_str(), 16).ok()?;
        let rest = caps.get(3).map_or("", |m| m.as_str());

        // AMOs log both a read and a write; keep the first of each. Only taking the
        // first `mem` clause of the line would drop the AMO store.
        let mem_pattern = MEM_PATTERN.get_or_init(|| {
            Regex::new(r"\bmem\s+0x([0-9a-fA-F]+)(?:\s+0x([0-9a-fA-F]+))?").unwrap()
        });
        let mut load = None;
        let mut store = None;
        for mem in mem_pattern.captures_iter(rest) {
            let Some(addr) = mem
                .get(1)
                .and_then(|m| u64::from_str_radix(m.as_str(), 16).ok())
            else {
                continue;
            };
            if mem.get(2).is_some() {
                store.get_or_insert(addr);
            } else {
                load.get_or_insert(addr);
            }
        }

        Some(Self {
            pc,
            insn,
            load,
            store,
        })
    }
}

/// Forward-only iterator over the instructions of a commit log.
pub struct ReferenceRecords<R> {
    lines: LossyLines<R>,
}

impl<R: BufRead> ReferenceRecords<R> {
    pub const fn new(reader: R) -> Self {
        Self {
            lines: LossyLines::new(reader),
        }
    }
}

impl<R: BufRead> Iterator for ReferenceRecords<R> {
    type Item = std::io::Result<ReferenceInstruction>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    if let Some(insn) = ReferenceInstruction::parse(&line) {
                        return Some(Ok(insn));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Parse a whole commit log into memory.
pub fn parse_reference_file(path: &Path) -> Result<Vec<ReferenceInstruction>> {
    let reader = open_input(path)?;
    let records = ReferenceRecords::new(reader)
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| LogError::io(path, e))?;
    debug!(path = %path.display(), records = records.len(), "parsed reference log");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_plain_instruction() {
        let insn = ReferenceInstruction::parse("core   0: 3 0x0000000080000000 (0x0500006f)").unwrap();
        assert_eq!(insn.pc, 0x8000_0000);
        assert_eq!(insn.insn, 0x0500_006f);
        assert_eq!(insn.load, None);
        assert_eq!(insn.store, None);
    }

    #[test]
    fn test_parse_load() {
        let line = "core   0: 3 0x000000008000010c (0x0182b283) x5 0x0000000080000000 mem 0x0000000000001018";
        let insn = ReferenceInstruction::parse(line).unwrap();
        assert_eq!(insn.pc, 0x8000_010c);
        assert_eq!(insn.load, Some(0x1018));
        assert_eq!(insn.store, None);
    }

    #[test]
    fn test_parse_store() {
        let line = "core   0: 3 0x80000040 (0xfc3f2223) mem 0x80001000 0x00000001";
        let insn = ReferenceInstruction::parse(line).unwrap();
        assert_eq!(insn.pc, 0x8000_0040);
        assert_eq!(insn.load, None);
        assert_eq!(insn.store, Some(0x8000_1000));
    }

    #[test]
    fn test_parse_amo_has_load_and_store() {
        let line = "core   0: 3 0x80000200 (0x0c56a72f) x14 0x0000000000000001 \
                    mem 0x0000000080002000 mem 0x0000000080002000 0x0000000000000003";
        let insn = ReferenceInstruction::parse(line).unwrap();
        assert_eq!(insn.load, Some(0x8000_2000));
        assert_eq!(insn.store, Some(0x8000_2000));
    }

    #[test]
    fn test_parse_uppercase_hex() {
        let line = "core   0: 3 0x000000008000ABCC (0x00A2B023) mem 0x000000008000FF08 0x00000000000000AB";
        let insn = ReferenceInstruction::parse(line).unwrap();
        assert_eq!(insn.pc, 0x8000_abcc);
        assert_eq!(insn.insn, 0x00a2_b023);
        assert_eq!(insn.store, Some(0x8000_ff08));
    }

    #[test]
    fn test_parse_load_from_address_zero() {
        let line = "core   0: 3 0x80000010 (0x00002283) x5 0x0000000000000000 mem 0x0000000000000000";
        let insn = ReferenceInstruction::parse(line).unwrap();
        assert_eq!(insn.load, Some(0));
    }

    #[test]
    fn test_parse_compressed_and_other_privilege() {
        let insn = ReferenceInstruction::parse("core   1: 0 0x80000200 (0x4501) x10 0x0000000000000000").unwrap();
        assert_eq!(insn.pc, 0x8000_0200);
        assert_eq!(insn.insn, 0x4501);
    }

    #[test]
    fn test_csr_write_is_not_memory() {
        let line = "core   0: 3 0x800000dc (0x30529073) c773_mtvec 0x00000000800000e4";
        let insn = ReferenceInstruction::parse(line).unwrap();
        assert_eq!(insn.load, None);
        assert_eq!(insn.store, None);
    }

    #[test]
    fn test_chatter_is_skipped() {
        // Disassembly lines (no privilege field), thread markers and blank lines.
        assert!(ReferenceInstruction::parse("core   0: 0x0000000000001000 (0x00000297) auipc   t0, 0x0").is_none());
        assert!(ReferenceInstruction::parse("core   0: >>>>  _start").is_none());
        assert!(ReferenceInstruction::parse("").is_none());
        assert!(ReferenceInstruction::parse("bbl loader").is_none());
    }

    #[test]
    fn test_records_keep_file_order() {
        let log = "\
core   0: >>>>  _start
core   0: 3 0x0000000080000000 (0x00000297) x5 0x0000000080000000
core   0: 3 0x0000000080000004 (0x0182b283) x5 0x0000000000000000 mem 0x0000000080000018
random chatter
core   0: 3 0x0000000080000008 (0x0052a023) mem 0x0000000080001000 0x0000000000000000
";
        let records: Vec<_> = ReferenceRecords::new(Cursor::new(log))
            .map(|r| r.unwrap())
            .collect();
        let pcs: Vec<u64> = records.iter().map(|r| r.pc).collect();
        assert_eq!(pcs, vec![0x8000_0000, 0x8000_0004, 0x8000_0008]);
        assert_eq!(records[1].load, Some(0x8000_0018));
        assert_eq!(records[2].store, Some(0x8000_1000));
    }

    #[test]
    fn test_parse_reference_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.log");
        std::fs::write(&path, "not a commit log\n").unwrap();
        assert!(parse_reference_file(&path).unwrap().is_empty());
    }
}
