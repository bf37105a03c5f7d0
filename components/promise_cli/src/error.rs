//! Error types for the CLI

use async_runtime::RuntimeError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// A scenario name that is not in the catalogue
    #[error("unknown scenario '{0}' (run `corten-promise list`)")]
    UnknownScenario(String),

    /// `run` was given neither names nor `--all`
    #[error("no scenario selected; pass scenario names or --all")]
    NothingToRun,

    /// The event loop failed while running a scenario
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// `--check` found a transcript that differs from the expected one
    #[error("scenario '{name}' produced an unexpected transcript")]
    TranscriptMismatch {
        /// Scenario name
        name: String,
    },

    /// Writing output failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing `--json` output failed
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
