//! Tracecheck CLI - ChampSim trace vs. Spike log cross-validation

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let metrics_handle = if cli.metrics {
        tracecheck::metrics::CliRecorder::new().install()
    } else {
        None
    };
    tracecheck::metrics::init();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.silent {
        "warn"
    } else {
        "info"
    };
    let mut filter = EnvFilter::from_default_env();
    for target in ["tracecheck", "tracecheck_log"] {
        if let Ok(directive) = format!("{target}={default_level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::run_command(&cli);

    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
