use crate::champsim::ChampSimRecord;

/// One instruction retired by the reference simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceInstruction {
    /// Program counter.
    pub pc: u64,
    /// Raw instruction word (16 bits for compressed encodings).
    pub insn: u32,
    /// Address read by the instruction, if any.
    pub load: Option<u64>,
    /// Address written by the instruction, if any.
    pub store: Option<u64>,
}

impl ReferenceInstruction {
    /// Instruction that touches no memory.
    pub const fn new(pc: u64, insn: u32) -> Self {
        Self {
            pc,
            insn,
            load: None,
            store: None,
        }
    }

    #[must_use]
    pub const fn with_load(self, addr: u64) -> Self {
        Self {
            load: Some(addr),
            ..self
        }
    }

    #[must_use]
    pub const fn with_store(self, addr: u64) -> Self {
        Self {
            store: Some(addr),
            ..self
        }
    }
}

/// One instruction as recorded by the trace under test.
///
/// Address lists only hold real accesses: the trace formats mark unused slots
/// with zero and those are dropped when the record is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateInstruction {
    pub pc: u64,
    pub is_branch: bool,
    pub taken: bool,
    /// Store addresses (at most two).
    pub stores: Vec<u64>,
    /// Load addresses (at most four).
    pub loads: Vec<u64>,
}

impl CandidateInstruction {
    /// Non-branch instruction that touches no memory.
    pub const fn new(pc: u64) -> Self {
        Self {
            pc,
            is_branch: false,
            taken: false,
            stores: Vec::new(),
            loads: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_branch(self, taken: bool) -> Self {
        Self {
            is_branch: true,
            taken,
            ..self
        }
    }

    #[must_use]
    pub fn with_loads(self, loads: &[u64]) -> Self {
        Self {
            loads: loads.to_vec(),
            ..self
        }
    }

    #[must_use]
    pub fn with_stores(self, stores: &[u64]) -> Self {
        Self {
            stores: stores.to_vec(),
            ..self
        }
    }
}

impl From<&ChampSimRecord> for CandidateInstruction {
    fn from(record: &ChampSimRecord) -> Self {
        let present = |slots: &[u64]| slots.iter().copied().filter(|&a| a != 0).collect();
        Self {
            pc: record.ip,
            is_branch: record.is_branch != 0,
            taken: record.branch_taken != 0,
            stores: present(&record.destination_memory),
            loads: present(&record.source_memory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_slots_are_dropped() {
        let record = ChampSimRecord {
            ip: 0x8000_0010,
            is_branch: 0,
            branch_taken: 0,
            destination_memory: [0, 0x8000_2000],
            source_memory: [0x1000, 0, 0, 0x1008],
            ..ChampSimRecord::default()
        };
        let insn = CandidateInstruction::from(&record);
        assert_eq!(insn.pc, 0x8000_0010);
        assert_eq!(insn.stores, vec![0x8000_2000]);
        assert_eq!(insn.loads, vec![0x1000, 0x1008]);
        assert!(!insn.is_branch);
    }

    #[test]
    fn test_nonzero_flags_are_true() {
        let record = ChampSimRecord {
            ip: 0x100,
            is_branch: 1,
            branch_taken: 1,
            ..ChampSimRecord::default()
        };
        let insn = CandidateInstruction::from(&record);
        assert!(insn.is_branch);
        assert!(insn.taken);
        assert!(insn.loads.is_empty());
        assert!(insn.stores.is_empty());
    }
}
