//! Spreadsheet export.
//!
//! Sheets are first built as plain [`SheetTable`]s and only then written
//! through `rust_xlsxwriter`, so the table layout is testable without
//! opening a workbook.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use qstats_core::error::{QstatsError, Result};
use qstats_core::progress::ProgressObserver;
use qstats_core::summary::{
    DatasetSummary, Distribution, Matrix, MetricKey, MetricValue, OverviewStats, SummaryKey, Tally,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::targets::ExportTarget;
use crate::writer::write_atomic;

/// Excel's limit on worksheet name length.
pub const MAX_SHEET_NAME_LEN: usize = 31;

// ── SheetTable ────────────────────────────────────────────────────────────────

/// A single cell of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Text(String),
    Number(f64),
    Empty,
}

impl SheetCell {
    fn text(s: impl Into<String>) -> Self {
        SheetCell::Text(s.into())
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SheetCell::Empty,
            Value::Number(n) => n.as_f64().map(SheetCell::Number).unwrap_or(SheetCell::Empty),
            Value::String(s) => SheetCell::Text(s.clone()),
            other => SheetCell::Text(other.to_string()),
        }
    }
}

/// A named header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<SheetCell>>,
}

impl SheetTable {
    fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    fn with_header(name: impl Into<String>, header: &[&str]) -> Self {
        Self::new(name, header.iter().map(|h| h.to_string()).collect())
    }

    fn push(&mut self, row: Vec<SheetCell>) {
        self.rows.push(row);
    }

    fn write_to(&self, worksheet: &mut Worksheet, header_format: &Format) -> std::result::Result<(), XlsxError> {
        worksheet.set_name(&self.name)?;
        worksheet.set_column_width(0, 28)?;

        for (col, title) in self.header.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, title, header_format)?;
        }
        for (r, row) in self.rows.iter().enumerate() {
            let row_idx = (r + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    SheetCell::Text(s) => {
                        worksheet.write_string(row_idx, col as u16, s)?;
                    }
                    SheetCell::Number(n) => {
                        worksheet.write_number(row_idx, col as u16, *n)?;
                    }
                    SheetCell::Empty => {}
                }
            }
        }
        Ok(())
    }
}

/// `NN_key`, truncated to the worksheet name limit.
pub fn sheet_name(index: usize, key: &str) -> String {
    format!("{:02}_{}", index, key)
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect()
}

// ── Full report sheets ────────────────────────────────────────────────────────

/// The five sheets of the full report, in workbook order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSheet {
    Overview,
    DifficultyDistribution,
    TopTags,
    DifficultyAverages,
    DifficultyAlgorithm,
}

impl ReportSheet {
    pub const ALL: [ReportSheet; 5] = [
        ReportSheet::Overview,
        ReportSheet::DifficultyDistribution,
        ReportSheet::TopTags,
        ReportSheet::DifficultyAverages,
        ReportSheet::DifficultyAlgorithm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReportSheet::Overview => "01_Overview",
            ReportSheet::DifficultyDistribution => "02_Difficulty_Dist",
            ReportSheet::TopTags => "03_Top_Tags",
            ReportSheet::DifficultyAverages => "04_Difficulty_Averages",
            ReportSheet::DifficultyAlgorithm => "05_Difficulty_Algorithm",
        }
    }

    /// Build the sheet, or `None` when its source metric is absent.
    pub fn build(self, summary: &DatasetSummary) -> Option<SheetTable> {
        let metrics = &summary.metrics;
        match self {
            ReportSheet::Overview => Some(overview_table(self.name(), &summary.overview)),
            ReportSheet::DifficultyDistribution => metrics
                .get(MetricKey::DifficultyDistribution)?
                .as_distribution()
                .map(|d| distribution_table(self.name(), "Difficulty", d)),
            ReportSheet::TopTags => metrics
                .get(MetricKey::TopTagsDistribution)?
                .as_tally()
                .map(|t| tally_table(self.name(), "Tag", t)),
            ReportSheet::DifficultyAverages => {
                let desc = metrics.get(MetricKey::AvgDescriptionLengthByDifficulty)?.as_averages()?;
                let tests = metrics.get(MetricKey::AvgTestCasesByDifficulty)?.as_averages()?;
                let mut table = SheetTable::with_header(
                    self.name(),
                    &["Difficulty", "Avg_Desc_Length", "Avg_Test_Cases"],
                );
                let difficulties: BTreeSet<&String> = desc.keys().chain(tests.keys()).collect();
                for difficulty in difficulties {
                    table.push(vec![
                        SheetCell::text(difficulty.as_str()),
                        desc.get(difficulty).map_or(SheetCell::Empty, |v| SheetCell::Number(*v)),
                        tests.get(difficulty).map_or(SheetCell::Empty, |v| SheetCell::Number(*v)),
                    ]);
                }
                Some(table)
            }
            ReportSheet::DifficultyAlgorithm => metrics
                .get(MetricKey::DifficultyAlgorithmMatrix)?
                .as_matrix()
                .map(|m| transposed_matrix_table(self.name(), "Algorithm", m)),
        }
    }
}

fn overview_table(name: &str, overview: &OverviewStats) -> SheetTable {
    let mut table = SheetTable::with_header(name, &["Metric", "Value"]);
    for (field, value) in overview.entries() {
        table.push(vec![SheetCell::text(field), SheetCell::from_json(&value)]);
    }
    table
}

fn distribution_table(name: &str, label: &str, dist: &Distribution) -> SheetTable {
    let mut table = SheetTable::with_header(name, &[label, "Count", "Percentage"]);
    for (key, count) in &dist.counts {
        table.push(vec![
            SheetCell::text(key.as_str()),
            SheetCell::Number(*count as f64),
            dist.percentages
                .get(key)
                .map_or(SheetCell::Empty, |p| SheetCell::Number(*p)),
        ]);
    }
    table
}

fn tally_table(name: &str, label: &str, tally: &Tally) -> SheetTable {
    let mut table = SheetTable::with_header(name, &[label, "Count"]);
    for (key, count) in tally {
        table.push(vec![SheetCell::text(key.as_str()), SheetCell::Number(*count as f64)]);
    }
    table
}

fn matrix_table(name: &str, corner: &str, matrix: &Matrix) -> SheetTable {
    let columns: BTreeSet<&String> = matrix.values().flat_map(|r| r.keys()).collect();
    let mut header = vec![corner.to_string()];
    header.extend(columns.iter().map(|c| c.to_string()));
    let mut table = SheetTable::new(name, header);
    for (row_label, cells) in matrix {
        let mut row = vec![SheetCell::text(row_label.as_str())];
        row.extend(
            columns
                .iter()
                .map(|c| SheetCell::Number(cells.get(*c).copied().unwrap_or(0) as f64)),
        );
        table.push(row);
    }
    table
}

/// Matrix with its inner labels as rows and outer labels as columns.
fn transposed_matrix_table(name: &str, corner: &str, matrix: &Matrix) -> SheetTable {
    let mut transposed = Matrix::new();
    for (outer, cells) in matrix {
        for (inner, count) in cells {
            transposed
                .entry(inner.clone())
                .or_default()
                .insert(outer.clone(), *count);
        }
    }
    matrix_table(name, corner, &transposed)
}

/// Render any metric by its shape.
pub fn value_table(name: &str, key: &str, value: &MetricValue) -> SheetTable {
    match value {
        MetricValue::Distribution(d) => distribution_table(name, "Label", d),
        MetricValue::Tally(t) => tally_table(name, "Label", t),
        MetricValue::Averages(averages) => {
            let mut table = SheetTable::with_header(name, &["Difficulty", "Average"]);
            for (k, v) in averages {
                table.push(vec![SheetCell::text(k.as_str()), SheetCell::Number(*v)]);
            }
            table
        }
        MetricValue::PairedAverages(pairs) => {
            let mut table =
                SheetTable::with_header(name, &["Difficulty", "Num_Examples", "Num_Test_Cases"]);
            for (k, v) in pairs {
                table.push(vec![
                    SheetCell::text(k.as_str()),
                    SheetCell::Number(v.num_examples),
                    SheetCell::Number(v.num_test_cases),
                ]);
            }
            table
        }
        MetricValue::TimeSeries(series) => {
            let mut table = SheetTable::with_header(name, &["Date", "Count"]);
            for day in series {
                table.push(vec![
                    SheetCell::text(day.date.as_str()),
                    SheetCell::Number(day.count as f64),
                ]);
            }
            table
        }
        MetricValue::DifficultyOverTime(records) => {
            let difficulties: BTreeSet<&String> =
                records.iter().flat_map(|r| r.counts.keys()).collect();
            let mut header = vec!["Date".to_string()];
            header.extend(difficulties.iter().map(|d| d.to_string()));
            let mut table = SheetTable::new(name, header);
            for record in records {
                let mut row = vec![SheetCell::text(record.date.as_str())];
                row.extend(difficulties.iter().map(|d| {
                    SheetCell::Number(record.counts.get(*d).copied().unwrap_or(0) as f64)
                }));
                table.push(row);
            }
            table
        }
        MetricValue::Matrix(m) => matrix_table(name, "Difficulty", m),
        MetricValue::Scalar(n) => {
            let mut table = SheetTable::with_header(name, &["Metric", "Value"]);
            table.push(vec![SheetCell::text(key), SheetCell::Number(*n as f64)]);
            table
        }
    }
}

// ── ExcelExporter ─────────────────────────────────────────────────────────────

/// Writes `.xlsx` workbooks. Each call returns the written path or `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelExporter;

impl ExcelExporter {
    /// Write the five-sheet report. Sheets whose metric is missing are
    /// skipped; `progress` hears about every sheet slot either way.
    pub fn export(
        &self,
        summary: &DatasetSummary,
        path: &Path,
        progress: &mut dyn ProgressObserver,
    ) -> Option<PathBuf> {
        info!("Writing Excel report to {}", path.display());
        let tables: Vec<SheetTable> = ReportSheet::ALL
            .iter()
            .enumerate()
            .filter_map(|(idx, sheet)| {
                let table = sheet.build(summary);
                if table.is_none() {
                    warn!("Skipping sheet {}: source metric missing", sheet.name());
                }
                progress.on_step(idx + 1, ReportSheet::ALL.len(), &format!("Writing {}", sheet.name()));
                table
            })
            .collect();
        Self::finish(path, Self::save(&tables, path))
    }

    /// Write one sheet per resolvable key, in request order.
    pub fn export_subset<S: AsRef<str>>(
        &self,
        summary: &DatasetSummary,
        path: &Path,
        keys: &[S],
    ) -> Option<PathBuf> {
        let tables = subset_tables(summary, keys);
        if tables.is_empty() {
            warn!("No exportable keys for {}; skipping workbook", path.display());
            return None;
        }
        info!("Writing {} sheets to {}", tables.len(), path.display());
        Self::finish(path, Self::save(&tables, path))
    }

    /// Dispatch on the target's key list.
    pub fn export_target(
        &self,
        summary: &DatasetSummary,
        target: &ExportTarget,
        progress: &mut dyn ProgressObserver,
    ) -> Option<PathBuf> {
        let path = target.path();
        match &target.keys {
            Some(keys) => self.export_subset(summary, &path, keys.as_slice()),
            None => self.export(summary, &path, progress),
        }
    }

    fn save(tables: &[SheetTable], path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        for table in tables {
            if let Err(e) = table.write_to(workbook.add_worksheet(), &header) {
                error!("Failed to write sheet {} in {}: {}", table.name, path.display(), e);
            }
        }
        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| QstatsError::Excel(e.to_string()))?;
        write_atomic(path, &bytes)
    }

    fn finish(path: &Path, result: Result<()>) -> Option<PathBuf> {
        match result {
            Ok(()) => {
                info!("SUCCESS: Excel exported to {}", path.display());
                Some(path.to_path_buf())
            }
            Err(e) => {
                error!("Could not export Excel to {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Tables for a key subset; unknown or absent keys are skipped.
pub fn subset_tables<S: AsRef<str>>(summary: &DatasetSummary, keys: &[S]) -> Vec<SheetTable> {
    let mut tables = Vec::new();
    for key in keys {
        let key = key.as_ref();
        let name = sheet_name(tables.len() + 1, key);
        let table = match SummaryKey::resolve(key) {
            Some(SummaryKey::Metric(metric)) => summary
                .metrics
                .get(metric)
                .map(|value| value_table(&name, key, value)),
            Some(SummaryKey::Overview(field)) => {
                let mut table = SheetTable::with_header(name, &["Metric", "Value"]);
                table.push(vec![
                    SheetCell::text(key),
                    SheetCell::from_json(&summary.overview.field(field)),
                ]);
                Some(table)
            }
            None => None,
        };
        match table {
            Some(t) => tables.push(t),
            None => debug!(key, "workbook key not found in summary; skipping"),
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use qstats_core::summary::{DailyCount, Metrics, Percentages};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_summary() -> DatasetSummary {
        let mut counts = Tally::new();
        counts.insert("Easy".to_string(), 2);
        counts.insert("Hard".to_string(), 1);
        let mut percentages = Percentages::new();
        percentages.insert("Easy".to_string(), 66.67);
        percentages.insert("Hard".to_string(), 33.33);

        let mut matrix = Matrix::new();
        matrix.insert(
            "Easy".to_string(),
            BTreeMap::from([("Tree".to_string(), 2), ("Graph".to_string(), 0)]),
        );
        matrix.insert(
            "Hard".to_string(),
            BTreeMap::from([("Tree".to_string(), 0), ("Graph".to_string(), 1)]),
        );

        let mut metrics = Metrics::new();
        metrics.insert(
            MetricKey::DifficultyDistribution,
            MetricValue::Distribution(Distribution {
                counts,
                percentages,
            }),
        );
        metrics.insert(
            MetricKey::AvgDescriptionLengthByDifficulty,
            MetricValue::Averages(BTreeMap::from([
                ("Easy".to_string(), 120.5),
                ("Hard".to_string(), 300.0),
            ])),
        );
        metrics.insert(
            MetricKey::AvgTestCasesByDifficulty,
            MetricValue::Averages(BTreeMap::from([("Easy".to_string(), 1.5)])),
        );
        metrics.insert(MetricKey::DifficultyAlgorithmMatrix, MetricValue::Matrix(matrix));
        metrics.insert(
            MetricKey::ProblemsPerDay,
            MetricValue::TimeSeries(vec![DailyCount {
                date: "2024-01-01".to_string(),
                count: 3,
            }]),
        );

        DatasetSummary::new(
            OverviewStats {
                total_questions: 3,
                distinct_difficulties: 2,
                earliest_created_at: "2024-01-01T00:00:00".to_string(),
                latest_created_at: "2024-01-01T00:00:00".to_string(),
                days_span: 0,
            },
            metrics,
        )
    }

    fn is_xlsx(path: &Path) -> bool {
        std::fs::read(path)
            .map(|bytes| bytes.starts_with(b"PK"))
            .unwrap_or(false)
    }

    #[test]
    fn test_report_sheet_names_in_order() {
        let names: Vec<&str> = ReportSheet::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "01_Overview",
                "02_Difficulty_Dist",
                "03_Top_Tags",
                "04_Difficulty_Averages",
                "05_Difficulty_Algorithm",
            ]
        );
    }

    #[test]
    fn test_overview_sheet_rows() {
        let table = ReportSheet::Overview.build(&sample_summary()).unwrap();
        assert_eq!(table.header, vec!["Metric", "Value"]);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(
            table.rows[0],
            vec![SheetCell::text("total_questions"), SheetCell::Number(3.0)]
        );
    }

    #[test]
    fn test_missing_metric_skips_sheet() {
        assert!(ReportSheet::TopTags.build(&sample_summary()).is_none());
    }

    #[test]
    fn test_averages_sheet_unions_difficulties() {
        let table = ReportSheet::DifficultyAverages.build(&sample_summary()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], SheetCell::text("Hard"));
        assert_eq!(table.rows[1][1], SheetCell::Number(300.0));
        assert_eq!(table.rows[1][2], SheetCell::Empty);
    }

    #[test]
    fn test_algorithm_matrix_is_transposed() {
        let table = ReportSheet::DifficultyAlgorithm.build(&sample_summary()).unwrap();
        assert_eq!(table.header, vec!["Algorithm", "Easy", "Hard"]);
        assert_eq!(
            table.rows[0],
            vec![
                SheetCell::text("Graph"),
                SheetCell::Number(0.0),
                SheetCell::Number(1.0)
            ]
        );
        assert_eq!(table.rows[1][0], SheetCell::text("Tree"));
    }

    #[test]
    fn test_sheet_name_truncated() {
        let name = sheet_name(3, "description_length_bucket_distribution");
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(name.starts_with("03_description"));
    }

    #[test]
    fn test_subset_tables_render_by_shape() {
        let tables = subset_tables(
            &sample_summary(),
            &["days_span", "missing_key", "problems_per_day", "top_tags_distribution"],
        );
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "01_days_span");
        assert_eq!(tables[1].name, "02_problems_per_day");
        assert_eq!(tables[1].header, vec!["Date", "Count"]);
        assert_eq!(
            tables[1].rows[0],
            vec![SheetCell::text("2024-01-01"), SheetCell::Number(3.0)]
        );
    }

    #[test]
    fn test_export_writes_workbook_and_reports_progress() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("xlsx").join("summary.xlsx");
        let mut steps: Vec<(usize, usize, String)> = Vec::new();
        let mut observer = |c: usize, t: usize, l: &str| steps.push((c, t, l.to_string()));

        let written = ExcelExporter.export(&sample_summary(), &path, &mut observer);
        assert_eq!(written, Some(path.clone()));
        assert!(is_xlsx(&path));

        assert_eq!(steps.len(), 5);
        assert!(steps.iter().all(|(_, total, _)| *total == 5));
        assert_eq!(steps[0].0, 1);
        assert_eq!(steps[2].2, "Writing 03_Top_Tags");
        assert_eq!(steps[4].0, 5);
    }

    #[test]
    fn test_export_subset_writes_workbook() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("overview.xlsx");
        let written =
            ExcelExporter.export_subset(&sample_summary(), &path, &["total_questions", "difficulty_distribution"]);
        assert_eq!(written, Some(path.clone()));
        assert!(is_xlsx(&path));
    }

    #[test]
    fn test_export_subset_without_known_keys_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.xlsx");
        assert!(ExcelExporter
            .export_subset(&sample_summary(), &path, &["nope"])
            .is_none());
        assert!(!path.exists());
    }
}
