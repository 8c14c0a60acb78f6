//! Lockstep alignment of the reference and candidate streams.
//!
//! The reference is the minimal, authoritative sequence. The candidate may carry
//! extra instructions the reference never executed (boot ROM, injected setup
//! code), so resynchronization only ever skips forward on the candidate side.
//! If the candidate never catches up it is simply exhausted by sync skips.

use tracecheck_log::{CandidateInstruction, ReferenceInstruction};
use tracing::debug;

use crate::check::check_pair;
use crate::config::CheckConfig;
use crate::mmio::MmioMap;
use crate::report::{Diagnostic, DiagnosticKind, DiagnosticSink, ReportAggregator, Termination};

/// Walks both streams with one cursor each.
pub struct Aligner<'a> {
    reference: &'a [ReferenceInstruction],
    candidate: &'a [CandidateInstruction],
    mmio: &'a MmioMap,
    config: &'a CheckConfig,
    ref_idx: usize,
    cand_idx: usize,
    consecutive_skips: usize,
}

impl<'a> Aligner<'a> {
    pub const fn new(
        reference: &'a [ReferenceInstruction],
        candidate: &'a [CandidateInstruction],
        mmio: &'a MmioMap,
        config: &'a CheckConfig,
    ) -> Self {
        Self {
            reference,
            candidate,
            mmio,
            config,
            ref_idx: 0,
            cand_idx: 0,
            consecutive_skips: 0,
        }
    }

    /// Current `(reference, candidate)` cursor positions.
    pub const fn cursors(&self) -> (usize, usize) {
        (self.ref_idx, self.cand_idx)
    }

    pub const fn is_exhausted(&self) -> bool {
        self.ref_idx >= self.reference.len() || self.cand_idx >= self.candidate.len()
    }

    /// Run until a stream is exhausted or a limit stops the loop.
    pub fn run<S: DiagnosticSink>(&mut self, report: &mut ReportAggregator<S>) -> Termination {
        loop {
            if self.is_exhausted() {
                return Termination::Exhausted;
            }
            if let Some(limit) = self.config.max_instructions {
                if report.checked() >= limit {
                    return Termination::InstructionLimit;
                }
            }
            if let Some(termination) = self.step(report) {
                return termination;
            }
        }
    }

    /// Advance by one step: check a matched pair, or skip one candidate entry.
    ///
    /// Returns the termination reason if the run must stop here.
    pub fn step<S: DiagnosticSink>(
        &mut self,
        report: &mut ReportAggregator<S>,
    ) -> Option<Termination> {
        let (reference, candidate) = (self.reference, self.candidate);
        let (Some(r), Some(c)) = (reference.get(self.ref_idx), candidate.get(self.cand_idx)) else {
            return Some(Termination::Exhausted);
        };

        if r.pc != c.pc {
            return self.skip_candidate(r, c, report);
        }

        self.consecutive_skips = 0;
        report.record_checked();
        let next_pc = reference.get(self.ref_idx + 1).map(|n| n.pc);
        let found = check_pair(r, next_pc, c, self.mmio, report.checked());
        self.ref_idx += 1;
        self.cand_idx += 1;

        for diagnostic in &found {
            report.emit(diagnostic);
            if diagnostic.kind.is_error() && self.config.stop_on_error {
                return Some(Termination::StoppedOnError);
            }
        }
        None
    }

    fn skip_candidate<S: DiagnosticSink>(
        &mut self,
        r: &ReferenceInstruction,
        c: &CandidateInstruction,
        report: &mut ReportAggregator<S>,
    ) -> Option<Termination> {
        if let Some(limit) = self.config.max_resync {
            if self.consecutive_skips >= limit {
                return Some(Termination::ResyncLimit {
                    skipped: self.consecutive_skips,
                });
            }
        }

        debug!(
            ref_idx = self.ref_idx,
            cand_idx = self.cand_idx,
            "resync: skipping candidate 0x{:08x}",
            c.pc
        );
        let index = report.checked();
        report.emit(&Diagnostic {
            kind: DiagnosticKind::Sync,
            index,
            pc: r.pc,
            message: format!(
                "reference ip=0x{:08x} != candidate ip=0x{:08x}, skipping candidate entry",
                r.pc, c.pc
            ),
        });
        self.cand_idx += 1;
        self.consecutive_skips += 1;
        None
    }
}
