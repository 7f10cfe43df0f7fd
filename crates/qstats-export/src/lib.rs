//! Artifact writers for a computed [`DatasetSummary`](qstats_core::summary::DatasetSummary):
//! JSON documents, Excel workbooks and PNG charts.

pub mod chart;
pub mod excel;
pub mod json;
pub mod targets;
pub mod writer;

pub use chart::ChartExporter;
pub use excel::ExcelExporter;
pub use json::JsonExporter;
