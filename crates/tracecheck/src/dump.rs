//! Text rendering of binary ChampSim traces.
//!
//! The output is the same line format the candidate text parser reads, so a
//! dumped binary trace can be checked, diffed, or grepped directly.

use std::io::{Read, Write};

use tracecheck_log::{ChampSimRecords, TEXT_HEADER};

/// Counts reported after a dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpStats {
    /// Records read from the input (reading stops once `count` is reached).
    pub read: u64,
    pub printed: u64,
}

/// Write the header and the records of `reader` to `out`.
///
/// The first `skip` records are dropped and at most `count` are printed.
pub fn dump_trace<R: Read, W: Write>(
    reader: R,
    out: &mut W,
    skip: u64,
    count: Option<u64>,
) -> std::io::Result<DumpStats> {
    let limit = count.unwrap_or(u64::MAX);
    let mut stats = DumpStats::default();

    writeln!(out, "{TEXT_HEADER}")?;
    for record in ChampSimRecords::new(reader) {
        let record = record?;
        stats.read += 1;
        if stats.read <= skip {
            continue;
        }
        if stats.printed >= limit {
            break;
        }
        writeln!(out, "{record}")?;
        stats.printed += 1;
    }
    out.flush()?;
    Ok(stats)
}
