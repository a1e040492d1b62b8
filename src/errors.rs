//! Error types for puzzle loading, with error codes and helpful messages.
//!
//! Each variant has a unique code for documentation lookup:
//!
//! - P001: `EmptyStructure` (Structure input contains no grid)
//! - P002: `Io` (Failed to read an input file)
//!
//! Solver-side errors (`S0xx`) live in [`crate::solver::SolverError`].

use std::io;

/// Errors raised while loading or parsing puzzle inputs.
#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("empty structure: input contains no cells")]
    EmptyStructure,

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl PuzzleError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            PuzzleError::EmptyStructure => "P001",
            PuzzleError::Io { .. } => "P002",
        }
    }

    /// Returns a helpful suggestion for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            PuzzleError::EmptyStructure => {
                Some("A structure file needs at least one row; mark open cells with '_'")
            }
            PuzzleError::Io { .. } => None,
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        format_error_with_code_and_help(&self.to_string(), self.code(), self.help())
    }
}

/// Helper function to format error messages with code and optional help text
pub(crate) fn format_error_with_code_and_help(
    base_msg: &str,
    code: &str,
    help: Option<&str>,
) -> String {
    if let Some(help_text) = help {
        format!("{base_msg} ({code})\n{help_text}")
    } else {
        format!("{base_msg} ({code})")
    }
}
