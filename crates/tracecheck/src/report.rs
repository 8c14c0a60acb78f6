//! Diagnostics, their sinks, and the final verdict.

use std::fmt;
use std::io::Write;

use tracing::warn;

/// Classification of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Streams misaligned; a candidate entry was skipped. Warning only.
    Sync,
    /// Candidate's taken flag disagrees with the reference control flow.
    BranchTaken,
    /// Load address missing from, or spuriously present in, the candidate.
    SrcMem,
    /// Store address missing from, or spuriously present in, the candidate.
    DstMem,
}

impl DiagnosticKind {
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Sync)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sync => "SYNC",
            Self::BranchTaken => "BRANCH_TAKEN",
            Self::SrcMem => "SRC_MEM",
            Self::DstMem => "DST_MEM",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Checked-instruction count at the point the diagnostic was raised.
    pub index: usize,
    /// Reference program counter involved.
    pub pc: u64,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] #{} ip=0x{:08x}: {}",
            self.kind, self.index, self.pc, self.message
        )
    }
}

/// Receives diagnostics as soon as they are raised.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Writes one line per diagnostic.
///
/// A failed write is reported once with `warn!`; later diagnostics are still
/// counted by the aggregator.
pub struct WriterSink<W> {
    writer: W,
    write_failed: bool,
}

impl<W: Write> WriterSink<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            write_failed: false,
        }
    }

    /// Whether any diagnostic line could not be written.
    pub const fn write_failed(&self) -> bool {
        self.write_failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        if let Err(e) = writeln!(self.writer, "{diagnostic}") {
            if !self.write_failed {
                warn!("failed to write diagnostics, further lines are lost: {e}");
            }
            self.write_failed = true;
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Why the checking loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// One of the two streams ran out.
    Exhausted,
    /// The checked-instruction cap was reached.
    InstructionLimit,
    /// An error was raised with stop-on-error enabled.
    StoppedOnError,
    /// Too many consecutive candidate entries had to be skipped.
    ResyncLimit { skipped: usize },
}

impl Termination {
    const fn tag(self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::InstructionLimit => "instruction-limit",
            Self::StoppedOnError => "stopped-on-error",
            Self::ResyncLimit { .. } => "resync-limit",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "end of input"),
            Self::InstructionLimit => write!(f, "instruction limit reached"),
            Self::StoppedOnError => write!(f, "stopped on first error"),
            Self::ResyncLimit { skipped } => {
                write!(f, "gave up after {skipped} consecutive sync skips")
            }
        }
    }
}

/// Outcome of a checking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub termination: Termination,
}

impl Verdict {
    pub const fn passed(&self) -> bool {
        self.errors == 0 && !matches!(self.termination, Termination::ResyncLimit { .. })
    }

    pub const fn result_label(&self) -> &'static str {
        if self.passed() { "PASS" } else { "FAIL" }
    }

    /// Write the human-readable summary block.
    pub fn write_summary<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w)?;
        writeln!(w, "{}", "=".repeat(60))?;
        writeln!(w, "Checked:  {} instructions", self.checked)?;
        writeln!(w, "Errors:   {}", self.errors)?;
        writeln!(w, "Warnings: {} (IP sync skips)", self.warnings)?;
        if self.termination != Termination::Exhausted {
            writeln!(w, "Stopped:  {}", self.termination)?;
        }
        writeln!(w, "Result:   {}", self.result_label())
    }

    /// Single-line JSON summary.
    pub fn to_json(&self) -> String {
        format!(
            r#"{{"checked":{},"errors":{},"warnings":{},"termination":"{}","result":"{}"}}"#,
            self.checked,
            self.errors,
            self.warnings,
            self.termination.tag(),
            self.result_label()
        )
    }
}

/// Tallies diagnostics and forwards each one to a sink as it arrives.
pub struct ReportAggregator<S> {
    sink: S,
    checked: usize,
    errors: usize,
    warnings: usize,
}

impl<S: DiagnosticSink> ReportAggregator<S> {
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            checked: 0,
            errors: 0,
            warnings: 0,
        }
    }

    /// Count one matched instruction pair.
    pub fn record_checked(&mut self) {
        self.checked += 1;
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic) {
        if diagnostic.kind.is_error() {
            self.errors += 1;
        } else {
            self.warnings += 1;
        }
        crate::metrics::record_diagnostic(diagnostic.kind);
        self.sink.emit(diagnostic);
    }

    pub const fn checked(&self) -> usize {
        self.checked
    }

    pub const fn errors(&self) -> usize {
        self.errors
    }

    pub const fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn finish(self, termination: Termination) -> Verdict {
        crate::metrics::record_checked(self.checked);
        Verdict {
            checked: self.checked,
            errors: self.errors,
            warnings: self.warnings,
            termination,
        }
    }
}
