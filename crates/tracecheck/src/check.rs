//! Per-instruction semantic checks.
//!
//! Runs on a pair already matched by program counter. Checks are emitted in a
//! fixed order (branch, load, store) so stop-on-error halts on the same
//! diagnostic every run.

use tracecheck_log::{CandidateInstruction, ReferenceInstruction};

use crate::mmio::MmioMap;
use crate::report::{Diagnostic, DiagnosticKind};

/// Whether the reference control flow implies a taken branch at `pc`.
///
/// Spike logs carry no branch flag, so anything other than falling through to
/// the next 4-byte or 2-byte (compressed) instruction counts as taken. Falling
/// through says nothing about whether the instruction was a branch at all.
pub const fn infer_taken(pc: u64, next_pc: Option<u64>) -> bool {
    match next_pc {
        Some(next) => next != pc.wrapping_add(4) && next != pc.wrapping_add(2),
        None => false,
    }
}

/// Check one matched pair.
///
/// `next_pc` is the program counter of the reference instruction that follows
/// `reference`, if any. `index` is the checked count including this pair.
pub fn check_pair(
    reference: &ReferenceInstruction,
    next_pc: Option<u64>,
    candidate: &CandidateInstruction,
    mmio: &MmioMap,
    index: usize,
) -> Vec<Diagnostic> {
    let mut found = Vec::new();
    let mut report = |kind, message| {
        found.push(Diagnostic {
            kind,
            index,
            pc: reference.pc,
            message,
        });
    };

    // Only entries the candidate flags as branches carry a taken bit.
    let taken = infer_taken(reference.pc, next_pc);
    if candidate.is_branch && candidate.taken != taken {
        report(
            DiagnosticKind::BranchTaken,
            format!(
                "candidate taken={} but reference taken={}",
                u8::from(candidate.taken),
                u8::from(taken)
            ),
        );
    }

    if let Some(message) = check_access(reference.load, &candidate.loads, mmio, "load", "src_mem") {
        report(DiagnosticKind::SrcMem, message);
    }
    if let Some(message) = check_access(reference.store, &candidate.stores, mmio, "store", "dst_mem")
    {
        report(DiagnosticKind::DstMem, message);
    }

    found
}

/// Compare one reference access against the candidate's address list.
fn check_access(
    expected: Option<u64>,
    recorded: &[u64],
    mmio: &MmioMap,
    access: &str,
    field: &str,
) -> Option<String> {
    match expected {
        Some(addr) if mmio.contains(addr) => None,
        Some(addr) if recorded.contains(&addr) => None,
        Some(addr) => Some(format!(
            "reference {access}=0x{addr:08x} not in candidate {field}={}",
            format_addrs(recorded)
        )),
        None if recorded.is_empty() => None,
        None => Some(format!(
            "candidate has {field}={} but reference has no {access}",
            format_addrs(recorded)
        )),
    }
}

fn format_addrs(addrs: &[u64]) -> String {
    let parts: Vec<String> = addrs.iter().map(|a| format!("0x{a:x}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_infer_taken() {
        assert!(!infer_taken(0x100, Some(0x104)));
        assert!(!infer_taken(0x100, Some(0x102)));
        assert!(infer_taken(0x100, Some(0x200)));
        assert!(infer_taken(0x100, Some(0x100)));
        assert!(infer_taken(0x104, Some(0x100)));
        assert!(!infer_taken(0x100, None));
        assert!(!infer_taken(u64::MAX - 1, Some(2)));
    }

    #[test]
    fn test_matching_load_passes() {
        let r = ReferenceInstruction::new(0x100, 0).with_load(0x2000);
        let c = CandidateInstruction::new(0x100).with_loads(&[0x2000]);
        assert!(check_pair(&r, None, &c, &MmioMap::qemu_virt(), 1).is_empty());
    }

    #[test]
    fn test_load_from_address_zero_is_still_checked() {
        let r = ReferenceInstruction::new(0x100, 0).with_load(0);
        let c = CandidateInstruction::from(&tracecheck_log::ChampSimRecord {
            ip: 0x100,
            ..tracecheck_log::ChampSimRecord::default()
        });
        assert!(c.loads.is_empty());
        let found = check_pair(&r, None, &c, &MmioMap::qemu_virt(), 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::SrcMem]);
        assert!(found[0].message.contains("load=0x00000000"));
    }

    #[test]
    fn test_taken_claim_on_jump_passes() {
        let r = ReferenceInstruction::new(0x104, 0);
        let c = CandidateInstruction::new(0x104).with_branch(true);
        assert!(check_pair(&r, Some(0x200), &c, &MmioMap::default(), 2).is_empty());
    }

    #[test]
    fn test_not_taken_claim_on_jump_fails() {
        let r = ReferenceInstruction::new(0x104, 0);
        let c = CandidateInstruction::new(0x104).with_branch(false);
        let found = check_pair(&r, Some(0x200), &c, &MmioMap::default(), 2);
        assert_eq!(kinds(&found), vec![DiagnosticKind::BranchTaken]);
        assert_eq!(found[0].index, 2);
        assert_eq!(found[0].pc, 0x104);
        assert_eq!(found[0].message, "candidate taken=0 but reference taken=1");
    }

    #[test]
    fn test_taken_claim_on_fall_through_fails() {
        let r = ReferenceInstruction::new(0x100, 0);
        let c = CandidateInstruction::new(0x100).with_branch(true);
        let found = check_pair(&r, Some(0x104), &c, &MmioMap::default(), 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::BranchTaken]);
    }

    #[test]
    fn test_not_taken_claim_on_fall_through_passes() {
        let r = ReferenceInstruction::new(0x100, 0);
        let c = CandidateInstruction::new(0x100).with_branch(false);
        assert!(check_pair(&r, Some(0x104), &c, &MmioMap::default(), 1).is_empty());
    }

    #[test]
    fn test_non_branch_jump_is_not_checked() {
        // Only the candidate's own branch claim is validated.
        let r = ReferenceInstruction::new(0x100, 0);
        let c = CandidateInstruction::new(0x100);
        assert!(check_pair(&r, Some(0x400), &c, &MmioMap::default(), 1).is_empty());
    }

    #[test]
    fn test_missing_load() {
        let r = ReferenceInstruction::new(0x100, 0).with_load(0x8000_2000);
        let c = CandidateInstruction::new(0x100);
        let found = check_pair(&r, None, &c, &MmioMap::qemu_virt(), 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::SrcMem]);
        assert_eq!(
            found[0].message,
            "reference load=0x80002000 not in candidate src_mem=[]"
        );
    }

    #[test]
    fn test_wrong_load_address() {
        let r = ReferenceInstruction::new(0x100, 0).with_load(0x8000_2000);
        let c = CandidateInstruction::new(0x100).with_loads(&[0x8000_2008]);
        let found = check_pair(&r, None, &c, &MmioMap::default(), 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::SrcMem]);
    }

    #[test]
    fn test_extra_load() {
        let r = ReferenceInstruction::new(0x100, 0);
        let c = CandidateInstruction::new(0x100).with_loads(&[0x3000, 0x3008]);
        let found = check_pair(&r, None, &c, &MmioMap::default(), 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::SrcMem]);
        assert_eq!(
            found[0].message,
            "candidate has src_mem=[0x3000, 0x3008] but reference has no load"
        );
    }

    #[test]
    fn test_missing_and_extra_store() {
        let r = ReferenceInstruction::new(0x100, 0).with_store(0x8000_1000);
        let c = CandidateInstruction::new(0x100);
        let found = check_pair(&r, None, &c, &MmioMap::default(), 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::DstMem]);

        let r = ReferenceInstruction::new(0x100, 0);
        let c = CandidateInstruction::new(0x100).with_stores(&[0x8000_1000]);
        let found = check_pair(&r, None, &c, &MmioMap::default(), 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::DstMem]);
    }

    #[test]
    fn test_mmio_access_is_never_reported_missing() {
        let mmio = MmioMap::qemu_virt();
        let r = ReferenceInstruction::new(0x100, 0)
            .with_load(0x1000_0005)
            .with_store(0x0010_0000);
        let c = CandidateInstruction::new(0x100).with_loads(&[0x1234]);
        assert!(check_pair(&r, None, &c, &mmio, 1).is_empty());
    }

    #[test]
    fn test_mmio_does_not_affect_branch_check() {
        let mmio = MmioMap::qemu_virt();
        let r = ReferenceInstruction::new(0x1000_0000, 0);
        let c = CandidateInstruction::new(0x1000_0000).with_branch(true);
        let found = check_pair(&r, Some(0x1000_0004), &c, &mmio, 1);
        assert_eq!(kinds(&found), vec![DiagnosticKind::BranchTaken]);
    }

    #[test]
    fn test_all_checks_in_order() {
        let r = ReferenceInstruction::new(0x100, 0)
            .with_load(0x8000_2000)
            .with_store(0x8000_3000);
        let c = CandidateInstruction::new(0x100).with_branch(true);
        let found = check_pair(&r, Some(0x104), &c, &MmioMap::default(), 9);
        assert_eq!(
            kinds(&found),
            vec![
                DiagnosticKind::BranchTaken,
                DiagnosticKind::SrcMem,
                DiagnosticKind::DstMem
            ]
        );
        assert!(found.iter().all(|d| d.index == 9));
    }
}
