//! Error handling for index derivation and alignment operations.
//!
//! Cleaning-stage failures (`ParseFailure`) are recovered by the loaders,
//! which log and drop the offending row. Everything else is surfaced to the
//! caller and is fatal to the workflow that raised it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Required input not found: {path}")]
    MissingResource { path: PathBuf },

    #[error("Could not parse {context}: '{value}'")]
    ParseFailure { context: String, value: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("None of the date formats {formats:?} matched any of {sample_count} values")]
    NoMatchingFormat {
        formats: Vec<String>,
        sample_count: usize,
    },

    #[error("Invalid table in file: {path} - {reason}")]
    InvalidTable { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ProcessorError {
    /// Create an invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a parse failure for a single cell or line
    pub fn parse_failure(context: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ParseFailure {
            context: context.into(),
            value: value.into(),
        }
    }

    /// Create a table structure error
    pub fn invalid_table(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
