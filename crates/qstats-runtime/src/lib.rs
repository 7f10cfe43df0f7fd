//! Runtime orchestration for the question statistics pipeline.
//!
//! Sequences loading, analysis and every export for one run.

pub mod pipeline;
pub mod progress;

pub use qstats_core as core;
pub use qstats_data as data;
pub use qstats_export as export;
