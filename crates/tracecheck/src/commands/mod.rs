//! Command implementations.

mod check;
mod dump;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Check { .. } => handle_check(cli),
        Commands::Dump { input, count, skip } => dump::cmd_dump(input, *skip, *count),
    }
}

fn handle_check(cli: &Cli) -> i32 {
    let Commands::Check {
        reference,
        candidate,
        max_instructions,
        stop_on_error,
        max_resync,
        candidate_format,
        mmio,
        no_default_mmio,
        format,
    } = &cli.command
    else {
        unreachable!("check command variant mismatch");
    };

    check::cmd_check(&check::CheckArgs {
        reference,
        candidate,
        candidate_format: candidate_format.resolve(candidate),
        max_instructions: *max_instructions,
        stop_on_error: *stop_on_error,
        max_resync: *max_resync,
        extra_mmio: mmio,
        default_mmio: !*no_default_mmio,
        format: *format,
        quiet: cli.silent,
    })
}
