//! Promise runtime CLI library
//!
//! Argument parsing, the scenario catalogue and the command runner behind
//! the `corten-promise` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runner;
pub mod scenarios;

pub use cli::{Cli, Command};
pub use error::{CliError, CliResult};
pub use runner::execute;
pub use scenarios::{Outcome, Scenario, Transcript};
