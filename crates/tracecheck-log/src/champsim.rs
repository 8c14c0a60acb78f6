//! ChampSim `input_instr` records.
//!
//! The tracer writes one fixed-size little-endian record per retired instruction:
//!
//! | Offset | Size | Field                      |
//! |--------|------|----------------------------|
//! | 0      | 8    | `ip`                       |
//! | 8      | 1    | `is_branch`                |
//! | 9      | 1    | `branch_taken`             |
//! | 10     | 2    | `destination_registers[2]` |
//! | 12     | 4    | `source_registers[4]`      |
//! | 16     | 16   | `destination_memory[2]`    |
//! | 32     | 32   | `source_memory[4]`         |
//!
//! A zero in any register or memory slot means the slot is unused.

use std::fmt;
use std::io::{ErrorKind, Read};

use tracing::warn;

pub const NUM_INSTR_DESTINATIONS: usize = 2;
pub const NUM_INSTR_SOURCES: usize = 4;

/// Size of one binary record in bytes.
pub const RECORD_SIZE: usize = 64;

/// Header line emitted before the text rendering of a trace.
pub const TEXT_HEADER: &str =
    "# ip branch taken dst_regs[0,1] src_regs[0,1,2,3] dst_mem[0,1] src_mem[0,1,2,3]";

const DST_MEM_OFFSET: usize = 16;
const SRC_MEM_OFFSET: usize = DST_MEM_OFFSET + 8 * NUM_INSTR_DESTINATIONS;

/// Raw ChampSim trace record, slots included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChampSimRecord {
    pub ip: u64,
    pub is_branch: u8,
    pub branch_taken: u8,
    pub destination_registers: [u8; NUM_INSTR_DESTINATIONS],
    pub source_registers: [u8; NUM_INSTR_SOURCES],
    pub destination_memory: [u64; NUM_INSTR_DESTINATIONS],
    pub source_memory: [u64; NUM_INSTR_SOURCES],
}

impl ChampSimRecord {
    /// Decode a binary record.
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut record = Self {
            ip: read_u64(bytes, 0),
            is_branch: bytes[8],
            branch_taken: bytes[9],
            ..Self::default()
        };
        record.destination_registers.copy_from_slice(&bytes[10..12]);
        record.source_registers.copy_from_slice(&bytes[12..16]);
        for (i, slot) in record.destination_memory.iter_mut().enumerate() {
            *slot = read_u64(bytes, DST_MEM_OFFSET + 8 * i);
        }
        for (i, slot) in record.source_memory.iter_mut().enumerate() {
            *slot = read_u64(bytes, SRC_MEM_OFFSET + 8 * i);
        }
        record
    }

    /// Encode as a binary record.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..8].copy_from_slice(&self.ip.to_le_bytes());
        bytes[8] = self.is_branch;
        bytes[9] = self.branch_taken;
        bytes[10..12].copy_from_slice(&self.destination_registers);
        bytes[12..16].copy_from_slice(&self.source_registers);
        for (i, addr) in self.destination_memory.iter().enumerate() {
            let at = DST_MEM_OFFSET + 8 * i;
            bytes[at..at + 8].copy_from_slice(&addr.to_le_bytes());
        }
        for (i, addr) in self.source_memory.iter().enumerate() {
            let at = SRC_MEM_OFFSET + 8 * i;
            bytes[at..at + 8].copy_from_slice(&addr.to_le_bytes());
        }
        bytes
    }
}

fn read_u64(bytes: &[u8; RECORD_SIZE], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(word)
}

/// Text rendering, one line per record, as produced by the tracer's debug output.
impl fmt::Display for ChampSimRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d0, d1] = self.destination_registers;
        let [s0, s1, s2, s3] = self.source_registers;
        let [dm0, dm1] = self.destination_memory;
        let [sm0, sm1, sm2, sm3] = self.source_memory;
        write!(
            f,
            "ip=0x{:016x} branch={} taken={} dst_regs=[{d0:02},{d1:02}] \
             src_regs=[{s0:02},{s1:02},{s2:02},{s3:02}] dst_mem=[0x{dm0:08x},0x{dm1:08x}] \
             src_mem=[0x{sm0:08x},0x{sm1:08x},0x{sm2:08x},0x{sm3:08x}]",
            self.ip, self.is_branch, self.branch_taken
        )
    }
}

/// Forward-only reader over binary records.
///
/// A trailing partial record (a trace cut short while the tracer was still
/// writing) is reported once and then treated as end of input.
pub struct ChampSimRecords<R> {
    reader: R,
    index: u64,
    done: bool,
}

impl<R: Read> ChampSimRecords<R> {
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            index: 0,
            done: false,
        }
    }

    /// Number of whole records read so far.
    pub const fn records_read(&self) -> u64 {
        self.index
    }
}

impl<R: Read> Iterator for ChampSimRecords<R> {
    type Item = std::io::Result<ChampSimRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        if filled < RECORD_SIZE {
            self.done = true;
            if filled > 0 {
                warn!(
                    record = self.index,
                    bytes = filled,
                    "ignoring truncated trailing trace record"
                );
            }
            return None;
        }

        self.index += 1;
        Some(Ok(ChampSimRecord::from_bytes(&buf)))
    }
}
