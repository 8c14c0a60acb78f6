use std::io::ErrorKind;
use std::path::Path;

use tracecheck::dump::dump_trace;
use tracecheck::log::open_input;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Print a binary trace as text on stdout.
pub fn cmd_dump(input: &Path, skip: u64, count: Option<u64>) -> i32 {
    let reader = match open_input(input) {
        Ok(r) => r,
        Err(e) => {
            terminal::error(&e.to_string());
            return EXIT_FAILURE;
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match dump_trace(reader, &mut out, skip, count) {
        Ok(stats) => {
            eprintln!(
                "total in file: {}  skipped: {}  printed: {}",
                stats.read, skip, stats.printed
            );
            if stats.read == 0 {
                terminal::warning(&format!("{} contains no records", input.display()));
            }
            EXIT_SUCCESS
        }
        // `tracecheck dump trace.bin | head` closes the pipe early.
        Err(e) if e.kind() == ErrorKind::BrokenPipe => EXIT_SUCCESS,
        Err(e) => {
            terminal::error(&format!("{}: {e}", input.display()));
            EXIT_FAILURE
        }
    }
}
