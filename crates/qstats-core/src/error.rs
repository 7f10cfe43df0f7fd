use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the question statistics pipeline.
#[derive(Error, Debug)]
pub enum QstatsError {
    /// The input data file does not exist.
    #[error("Data file not found: {0}")]
    NotFound(PathBuf),

    /// The input parsed to zero data rows.
    #[error("Data file is empty: {0}")]
    EmptyData(PathBuf),

    /// The input could not be parsed as a delimited table.
    #[error("Malformed input in {path}: {message}")]
    Format { path: PathBuf, message: String },

    /// A loading engine was selected that has no implementation yet.
    #[error("Loading engine '{0}' is not implemented; only 'csv' is supported")]
    EngineNotImplemented(String),

    /// The metrics engine received a table it cannot aggregate.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or serialized.
    #[error("Failed to process JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The spreadsheet writer rejected an operation.
    #[error("Excel error: {0}")]
    Excel(String),

    /// A chart could not be rendered.
    #[error("Chart error: {0}")]
    Chart(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the qstats crates.
pub type Result<T> = std::result::Result<T, QstatsError>;
