//! Data layer for the question statistics pipeline.
//!
//! Loads the dataset into a raw table, derives per-question features and
//! aggregates them into a [`DatasetSummary`](qstats_core::summary::DatasetSummary).

pub mod analysis;
pub mod enricher;
pub mod metrics;
pub mod reader;

pub use qstats_core as core;
