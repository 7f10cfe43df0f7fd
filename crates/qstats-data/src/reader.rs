//! Table loading for the statistics pipeline.
//!
//! A [`TableSource`] turns a file into a [`RawTable`]. Only the CSV engine
//! has an implementation; the other engines can be named in configuration
//! but fail at selection time.

use std::path::Path;

use qstats_core::data_processors::TimestampProcessor;
use qstats_core::error::{QstatsError, Result};
use qstats_core::models::{CellValue, RawTable};
use qstats_core::settings::Engine;
use tracing::{debug, info, warn};

use crate::enricher::{DESCRIPTION_COLUMNS, DIFFICULTY_COLUMNS, TITLE_COLUMNS};

/// Columns converted to timestamps at load time when present.
pub const DATE_COLUMNS: &[&str] = &["created_at", "updated_at", "CreatedAt"];

/// Columns the analysis expects, with the spellings accepted for each.
/// Their absence is logged, never fatal.
pub const SOFT_REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("title", TITLE_COLUMNS),
    ("description", DESCRIPTION_COLUMNS),
    ("difficulty_level", DIFFICULTY_COLUMNS),
];

// ── TableSource ───────────────────────────────────────────────────────────────

/// A loader producing a [`RawTable`] from a path.
pub trait TableSource {
    /// Short engine name used in log lines.
    fn name(&self) -> &'static str;

    fn load(&self, path: &Path) -> Result<RawTable>;
}

/// Return the loader for `engine`.
///
/// # Errors
///
/// [`QstatsError::EngineNotImplemented`] for every engine except CSV.
pub fn select_source(engine: Engine) -> Result<Box<dyn TableSource>> {
    match engine {
        Engine::Csv => Ok(Box::new(CsvSource::default())),
        Engine::Json | Engine::Db => Err(QstatsError::EngineNotImplemented(
            engine.as_str().to_string(),
        )),
    }
}

/// Select the engine, load `path` and log the soft-required column check.
pub fn load_table(path: &Path, engine: Engine) -> Result<RawTable> {
    let source = select_source(engine)?;
    info!(
        "Loading dataset from {} (engine: {})",
        path.display(),
        source.name()
    );
    let table = source.load(path)?;
    check_required_columns(&table);
    Ok(table)
}

/// Log each soft-required column as FOUND or MISSING. Returns the number found.
pub fn check_required_columns(table: &RawTable) -> usize {
    let mut found = 0;
    for (column, candidates) in SOFT_REQUIRED_COLUMNS {
        match table.resolve_column(candidates) {
            Some(index) => {
                info!("Required column '{}': FOUND as '{}'", column, table.columns()[index]);
                found += 1;
            }
            None => warn!("Required column '{}': MISSING", column),
        }
    }
    found
}

// ── CsvSource ─────────────────────────────────────────────────────────────────

/// Comma-separated file with a header row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    date_columns: Vec<String>,
}

impl Default for CsvSource {
    fn default() -> Self {
        Self::with_date_columns(DATE_COLUMNS)
    }
}

impl CsvSource {
    pub fn with_date_columns(columns: &[&str]) -> Self {
        Self {
            date_columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl TableSource for CsvSource {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn load(&self, path: &Path) -> Result<RawTable> {
        if !path.exists() {
            return Err(QstatsError::NotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if columns.is_empty() {
            return Err(QstatsError::EmptyData(path.to_path_buf()));
        }

        let is_date: Vec<bool> = columns
            .iter()
            .map(|c| self.date_columns.iter().any(|d| d == c))
            .collect();

        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        let mut unparsed_dates = 0usize;

        for record in reader.records() {
            let record = record.map_err(|e| csv_error(path, e))?;
            let row = record
                .iter()
                .zip(is_date.iter())
                .map(|(field, &date_col)| {
                    if field.is_empty() {
                        return CellValue::Null;
                    }
                    if date_col {
                        if let Some(ts) = TimestampProcessor::parse_str(field) {
                            return CellValue::Timestamp(ts);
                        }
                        unparsed_dates += 1;
                    }
                    CellValue::Text(field.to_string())
                })
                .collect();
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(QstatsError::EmptyData(path.to_path_buf()));
        }

        if unparsed_dates > 0 {
            debug!(
                "{} date cells in {} could not be parsed and were kept as text",
                unparsed_dates,
                path.display()
            );
        }

        info!(
            "Loaded {} rows with {} columns from {}",
            rows.len(),
            columns.len(),
            path.display()
        );

        Ok(RawTable::new(columns, rows))
    }
}

fn csv_error(path: &Path, err: csv::Error) -> QstatsError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => QstatsError::FileRead {
            path: path.to_path_buf(),
            source,
        },
        _ => QstatsError::Format {
            path: path.to_path_buf(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_basic_csv() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            &tmp,
            "q.csv",
            "title,description,difficulty_level\nTwo Sum,Given an array,easy\nPath,,hard\n",
        );
        let table = CsvSource::default().load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), ["title", "description", "difficulty_level"]);
        assert_eq!(table.cell(0, 0), &CellValue::Text("Two Sum".to_string()));
        assert_eq!(table.cell(1, 1), &CellValue::Null);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = CsvSource::default()
            .load(&tmp.path().join("absent.csv"))
            .unwrap_err();
        assert!(matches!(err, QstatsError::NotFound(_)));
    }

    #[test]
    fn test_empty_file_is_empty_data() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "empty.csv", "");
        let err = CsvSource::default().load(&path).unwrap_err();
        assert!(matches!(err, QstatsError::EmptyData(_)));
    }

    #[test]
    fn test_header_only_is_empty_data() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "header.csv", "title,difficulty_level\n");
        let err = CsvSource::default().load(&path).unwrap_err();
        assert!(matches!(err, QstatsError::EmptyData(_)));
    }

    #[test]
    fn test_ragged_rows_are_format_errors() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "ragged.csv", "a,b\n1,2\n3,4,5\n");
        let err = CsvSource::default().load(&path).unwrap_err();
        assert!(matches!(err, QstatsError::Format { .. }));
    }

    #[test]
    fn test_date_columns_are_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            &tmp,
            "dates.csv",
            "title,created_at,updated_at\nA,2024-01-01 10:00:00,someday\n",
        );
        let table = CsvSource::default().load(&path).unwrap();
        assert!(matches!(table.cell(0, 1), CellValue::Timestamp(_)));
        assert_eq!(table.cell(0, 2), &CellValue::Text("someday".to_string()));
    }

    #[test]
    fn test_quoted_json_cells_stay_text() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            &tmp,
            "json.csv",
            "title,test_cases\nA,\"[{\"\"expected_output\"\": -1}]\"\n",
        );
        let table = CsvSource::default().load(&path).unwrap();
        assert_eq!(
            table.cell(0, 1),
            &CellValue::Text(r#"[{"expected_output": -1}]"#.to_string())
        );
    }

    #[test]
    fn test_select_source() {
        assert_eq!(select_source(Engine::Csv).unwrap().name(), "csv");
        assert!(matches!(
            select_source(Engine::Json),
            Err(QstatsError::EngineNotImplemented(ref e)) if e == "json"
        ));
        assert!(matches!(
            select_source(Engine::Db),
            Err(QstatsError::EngineNotImplemented(_))
        ));
    }

    #[test]
    fn test_load_table_fails_fast_for_unimplemented_engine() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "q.csv", "title\nA\n");
        let err = load_table(&path, Engine::Db).unwrap_err();
        assert!(matches!(err, QstatsError::EngineNotImplemented(_)));
    }

    #[test]
    fn test_check_required_columns_counts_found() {
        let table = RawTable::new(
            vec!["title".to_string(), "other".to_string()],
            vec![vec![CellValue::Null, CellValue::Null]],
        );
        assert_eq!(check_required_columns(&table), 1);
    }

    #[test]
    fn test_check_required_columns_accepts_canonical_headers() {
        let table = RawTable::new(
            vec![
                "Title".to_string(),
                "Description".to_string(),
                "difficulty_level".to_string(),
            ],
            vec![],
        );
        assert_eq!(check_required_columns(&table), 3);
    }
}
