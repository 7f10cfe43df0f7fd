//! Shared domain types for the question statistics pipeline: table and
//! summary models, classification tables, parsing helpers, configuration and
//! the error type.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod progress;
pub mod settings;
pub mod summary;
pub mod taxonomy;

pub use error::{QstatsError, Result};
