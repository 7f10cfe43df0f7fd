use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// A single cell of a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing value (empty CSV field).
    Null,
    /// Raw textual value.
    Text(String),
    /// A date-like column value parsed at load time.
    Timestamp(NaiveDateTime),
    /// An already-decoded array (sources that carry structured cells).
    List(Vec<Value>),
}

impl CellValue {
    /// Render the cell as a plain string; `Null` becomes `None`.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            CellValue::List(items) => Some(Value::Array(items.clone()).to_string()),
        }
    }
}

/// The loaded dataset: ordered headers plus rows of cells.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

static NULL_CELL: CellValue = CellValue::Null;

impl RawTable {
    /// Build a table, padding short rows with `Null` and dropping surplus cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of the first candidate column present in the table.
    ///
    /// Candidates are ordered canonical name first, legacy alternates after.
    pub fn resolve_column(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|name| self.column_index(name))
    }

    /// Cell at `(row, col)`; out-of-range coordinates read as `Null`.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(|r| r.as_slice())
    }
}

/// One question with all derived analysis features attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub title: String,
    pub description: String,
    /// Title-cased difficulty; `"Unknown"` when missing.
    pub difficulty_level: String,
    /// Character count of `description`.
    pub description_length: usize,
    pub examples_parsed: Vec<Value>,
    pub test_cases_parsed: Vec<Value>,
    pub constraints_parsed: Vec<Value>,
    pub num_examples: usize,
    pub num_test_cases: usize,
    pub constraints_count: usize,
    /// Title and description joined with a space.
    pub combined_text: String,
    pub algorithm_category: String,
    pub input_type: String,
    /// Never empty; `["uncategorized"]` when no keyword group matched.
    pub problem_tags: Vec<String>,
    pub output_type: String,
    pub returns_negative_one: bool,
    pub created_at: Option<NaiveDateTime>,
    pub created_date: Option<NaiveDate>,
}

/// The enriched dataset handed to the metrics engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedTable {
    pub rows: Vec<EnrichedRow>,
}

impl EnrichedTable {
    pub fn new(rows: Vec<EnrichedRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedRow> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pads_short_rows() {
        let table = RawTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![CellValue::Text("x".to_string())]],
        );
        assert_eq!(table.cell(0, 1), &CellValue::Null);
    }

    #[test]
    fn test_cell_out_of_range_is_null() {
        let table = RawTable::default();
        assert_eq!(table.cell(5, 5), &CellValue::Null);
    }

    #[test]
    fn test_resolve_column_prefers_first_candidate() {
        let table = RawTable::new(
            vec!["examples".to_string(), "Examples".to_string()],
            vec![],
        );
        assert_eq!(table.resolve_column(&["Examples", "examples"]), Some(1));
        assert_eq!(table.resolve_column(&["missing", "examples"]), Some(0));
        assert_eq!(table.resolve_column(&["missing"]), None);
    }
}
