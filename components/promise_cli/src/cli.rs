//! Command-line arguments

use async_runtime::RuntimeConfig;
use clap::{ArgAction, Parser, Subcommand};

/// Runs the promise runtime's demonstration scenarios.
#[derive(Debug, Parser)]
#[command(name = "corten-promise", version, about)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Maximum microtasks per checkpoint; 0 disables the limit
    #[arg(long, global = true)]
    pub microtask_limit: Option<usize>,

    /// Do not report unhandled promise rejections
    #[arg(long, global = true)]
    pub no_rejection_tracking: bool,

    /// Stop at the first exception thrown by a host task
    #[arg(long, global = true)]
    pub strict: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// List available scenarios
    List,

    /// Run scenarios and print their transcripts
    Run {
        /// Scenario names
        names: Vec<String>,

        /// Run every scenario
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Fail if a transcript differs from the expected one
        #[arg(long)]
        check: bool,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Event loop settings derived from the flags.
    pub fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::default()
            .with_unhandled_rejection_reporting(!self.no_rejection_tracking)
            .with_abort_on_uncaught(self.strict);
        if let Some(limit) = self.microtask_limit {
            config = config.with_microtask_limit((limit > 0).then_some(limit));
        }
        config
    }

    /// Default log filter when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
