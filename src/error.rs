//! Error types for cronkit.
//!
//! This module defines the error types used throughout the library: one
//! variant family for malformed cron text, and one for invalid arguments
//! passed to the public API. `NotFound` is deliberately absent here: per
//! the finder's contract it is represented as `None`, never as an error.

use thiserror::Error;

/// The main error type for cronkit operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CronError {
    /// A cron expression could not be parsed.
    #[error("invalid cron expression in field '{field}' at position {position}: {message}")]
    Parse {
        /// Name of the offending field (e.g. "day-of-month", "macro").
        field: String,
        /// Human-readable description of the problem.
        message: String,
        /// Byte offset into the original input where the problem starts.
        position: usize,
    },

    /// An argument to a public entry point was invalid.
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl CronError {
    pub(crate) fn parse(
        field: impl Into<String>,
        message: impl Into<String>,
        position: usize,
    ) -> Self {
        CronError::Parse { field: field.into(), message: message.into(), position }
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        CronError::Argument(message.into())
    }
}

/// Result type alias for cronkit operations.
pub type Result<T> = std::result::Result<T, CronError>;
