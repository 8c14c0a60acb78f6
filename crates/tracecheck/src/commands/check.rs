use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracecheck::log::{CandidateFormat, parse_candidate_file, parse_reference_file};
use tracecheck::{
    CheckConfig, MmioMap, MmioRegion, Termination, WriterSink, cross_validate, metrics,
};
use tracing::{debug, info, info_span, warn};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, OutputFormat};
use crate::terminal::{self, Spinner};

/// Arguments for the check command.
pub struct CheckArgs<'a> {
    pub reference: &'a Path,
    pub candidate: &'a Path,
    pub candidate_format: CandidateFormat,
    pub max_instructions: usize,
    pub stop_on_error: bool,
    pub max_resync: Option<usize>,
    pub extra_mmio: &'a [MmioRegion],
    pub default_mmio: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Cross-validate a candidate trace against a reference log.
pub fn cmd_check(args: &CheckArgs<'_>) -> i32 {
    let mut mmio = if args.default_mmio {
        MmioMap::qemu_virt()
    } else {
        MmioMap::default()
    };
    for region in args.extra_mmio {
        mmio.push(*region);
    }
    for region in mmio.regions() {
        debug!("MMIO exclusion {region}");
    }

    let Some(reference) = load("reference", args.reference, args.quiet, || {
        parse_reference_file(args.reference)
    }) else {
        return EXIT_FAILURE;
    };
    let Some(candidate) = load("candidate", args.candidate, args.quiet, || {
        parse_candidate_file(args.candidate, args.candidate_format)
    }) else {
        return EXIT_FAILURE;
    };

    let config = CheckConfig::default()
        .with_max_instructions(args.max_instructions)
        .with_stop_on_error(args.stop_on_error)
        .with_max_resync(args.max_resync);
    info!(
        reference = reference.len(),
        candidate = candidate.len(),
        ?config,
        "checking"
    );

    let start = Instant::now();
    let stdout = std::io::stdout();
    let mut sink = WriterSink::new(stdout.lock());
    let verdict = cross_validate(&reference, &candidate, &mmio, &config, &mut sink);
    metrics::record_check_time(start.elapsed().as_secs_f64());
    if sink.write_failed() {
        terminal::error("some diagnostics could not be written to stdout");
    }
    let mut out = sink.into_inner();

    if verdict.checked == 0 {
        warn!("no instructions were checked; the inputs may not describe the same run");
    }

    let written = match args.format {
        OutputFormat::Text => verdict.write_summary(&mut out),
        OutputFormat::Json => writeln!(out, "{}", verdict.to_json()),
    };
    if let Err(e) = written.and_then(|()| out.flush()) {
        terminal::error(&format!("failed to write summary: {e}"));
    }

    if verdict.passed() {
        if !args.quiet {
            terminal::success(&format!(
                "{} instructions checked, no errors",
                verdict.checked
            ));
        }
        EXIT_SUCCESS
    } else {
        let reason = match verdict.termination {
            Termination::ResyncLimit { .. } => verdict.termination.to_string(),
            _ => format!(
                "{} errors in {} checked instructions",
                verdict.errors, verdict.checked
            ),
        };
        terminal::error(&reason);
        EXIT_FAILURE
    }
}

/// Parse one input behind a spinner, recording its size and parse time.
fn load<T>(
    input: &'static str,
    path: &Path,
    quiet: bool,
    parse: impl FnOnce() -> tracecheck::log::Result<Vec<T>>,
) -> Option<Vec<T>> {
    let _span = info_span!("parse", input).entered();
    let spinner = (!quiet).then(|| Spinner::new(format!("Parsing {input} {}", path.display())));
    let start = Instant::now();

    match parse() {
        Ok(records) => {
            metrics::record_parse(input, records.len(), start.elapsed().as_secs_f64());
            if records.is_empty() {
                warn!(path = %path.display(), "no instructions found in {input}");
            }
            if let Some(spinner) = &spinner {
                spinner.finish_with_success(&format!(
                    "{input}: {} instructions ({})",
                    records.len(),
                    path.display()
                ));
            }
            Some(records)
        }
        Err(e) => {
            match &spinner {
                Some(spinner) => spinner.finish_with_failure(&e.to_string()),
                None => terminal::error(&e.to_string()),
            }
            None
        }
    }
}
