//! Executes a parsed command line.

use crate::cli::{Cli, Command};
use crate::error::{CliError, CliResult};
use crate::scenarios::{self, Outcome, Scenario};
use std::io::Write;
use tracing::{info, warn};

/// Runs the command described by `cli`, writing results to `out`.
///
/// With `--check`, every selected scenario still runs and is printed before
/// the first mismatching one is reported as an error.
pub fn execute(cli: &Cli, out: &mut impl Write) -> CliResult<()> {
    match &cli.command {
        Command::List => {
            for scenario in scenarios::all() {
                writeln!(out, "{:<14} {}", scenario.name, scenario.description)?;
            }
            Ok(())
        }
        Command::Run {
            names,
            all,
            check,
            json,
        } => {
            let selected = select(names, *all)?;
            let config = cli.runtime_config();
            let outcomes = selected
                .into_iter()
                .map(|scenario| scenarios::run(scenario, &config))
                .collect::<CliResult<Vec<_>>>()?;

            if *json {
                serde_json::to_writer_pretty(&mut *out, &outcomes)?;
                writeln!(out)?;
            } else {
                for outcome in &outcomes {
                    print_outcome(out, outcome, *check)?;
                }
            }

            if *check {
                if let Some(failed) = outcomes.iter().find(|outcome| !outcome.matches()) {
                    return Err(CliError::TranscriptMismatch {
                        name: failed.name.clone(),
                    });
                }
                info!(count = outcomes.len(), "all transcripts match");
            }
            Ok(())
        }
    }
}

fn select(names: &[String], all: bool) -> CliResult<Vec<&'static Scenario>> {
    if all {
        return Ok(scenarios::all().iter().collect());
    }
    if names.is_empty() {
        return Err(CliError::NothingToRun);
    }
    names
        .iter()
        .map(|name| scenarios::find(name).ok_or_else(|| CliError::UnknownScenario(name.clone())))
        .collect()
}

fn print_outcome(out: &mut impl Write, outcome: &Outcome, check: bool) -> CliResult<()> {
    writeln!(out, "== {} (t={}ms)", outcome.name, outcome.elapsed_ms)?;
    for line in &outcome.lines {
        writeln!(out, "  {line}")?;
    }
    if check && !outcome.matches() {
        warn!(scenario = %outcome.name, "transcript mismatch");
        writeln!(out, "  expected:")?;
        for line in &outcome.expected {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}
