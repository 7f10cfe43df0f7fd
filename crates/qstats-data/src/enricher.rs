//! Row-level feature derivation.
//!
//! [`enrich`] turns each loaded row into an [`EnrichedRow`]: normalized text
//! fields, decoded JSON arrays and their sizes, keyword classifications, the
//! inferred output type and the creation date. Bad cells degrade to defaults;
//! enrichment itself never fails.

use qstats_core::data_processors::{JsonArrayDecoder, TextNormalizer, TimestampProcessor};
use qstats_core::models::{CellValue, EnrichedRow, EnrichedTable, RawTable};
use qstats_core::taxonomy::{
    group_matches, KeywordGroup, ALGORITHM_CATEGORY_KEYWORDS, DEFAULT_NA_VALUE,
    INPUT_TYPE_KEYWORDS, MIXED_INPUT_TYPE, OUTPUT_TYPE_MAPPINGS, TAG_KEYWORDS, UNCATEGORIZED,
    UNCATEGORIZED_TAG,
};
use serde_json::Value;
use tracing::{info, warn};

/// Column name candidates, canonical spelling first.
pub const TITLE_COLUMNS: &[&str] = &["Title", "title"];
pub const DESCRIPTION_COLUMNS: &[&str] = &["Description", "description"];
pub const DIFFICULTY_COLUMNS: &[&str] = &["difficulty_level"];
pub const EXAMPLES_COLUMNS: &[&str] = &["Examples", "examples"];
pub const TEST_CASES_COLUMNS: &[&str] = &["Test Cases", "test_cases"];
pub const CONSTRAINTS_COLUMNS: &[&str] = &["Constraints", "constraints"];
pub const CREATED_AT_COLUMNS: &[&str] = &["CreatedAt", "created_at"];

/// Resolved column indexes for one table.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    title: Option<usize>,
    description: Option<usize>,
    difficulty: Option<usize>,
    examples: Option<usize>,
    test_cases: Option<usize>,
    constraints: Option<usize>,
    created_at: Option<usize>,
}

impl ColumnMap {
    fn resolve(table: &RawTable) -> Self {
        Self {
            title: table.resolve_column(TITLE_COLUMNS),
            description: table.resolve_column(DESCRIPTION_COLUMNS),
            difficulty: table.resolve_column(DIFFICULTY_COLUMNS),
            examples: table.resolve_column(EXAMPLES_COLUMNS),
            test_cases: table.resolve_column(TEST_CASES_COLUMNS),
            constraints: table.resolve_column(CONSTRAINTS_COLUMNS),
            created_at: table.resolve_column(CREATED_AT_COLUMNS),
        }
    }
}

static NULL: CellValue = CellValue::Null;

/// Derive analysis features for every row of `table`.
///
/// The output has exactly one row per input row, in input order.
pub fn enrich(table: &RawTable) -> EnrichedTable {
    info!("Starting enrichment of {} rows", table.len());
    let columns = ColumnMap::resolve(table);

    let rows = (0..table.len())
        .map(|idx| enrich_row(table, idx, &columns))
        .collect::<Vec<_>>();

    info!("Enrichment complete");
    EnrichedTable::new(rows)
}

fn cell_at(table: &RawTable, idx: usize, col: Option<usize>) -> &CellValue {
    match col {
        Some(c) => table.cell(idx, c),
        None => &NULL,
    }
}

fn enrich_row(table: &RawTable, idx: usize, columns: &ColumnMap) -> EnrichedRow {
    let cell = |col: Option<usize>| cell_at(table, idx, col);

    let title = TextNormalizer::text_or_empty(cell(columns.title));
    let description = TextNormalizer::text_or_empty(cell(columns.description));
    let difficulty_level = TextNormalizer::difficulty(cell(columns.difficulty));

    let examples_parsed = decode_array(idx, "examples", cell(columns.examples));
    let test_cases_parsed = decode_array(idx, "test_cases", cell(columns.test_cases));
    let constraints_parsed = decode_array(idx, "constraints", cell(columns.constraints));

    let combined_text = combine_text(&title, &description);
    let text_lower = combined_text.to_lowercase();

    let created_at = TimestampProcessor::parse_cell(cell(columns.created_at));

    EnrichedRow {
        description_length: description.chars().count(),
        num_examples: examples_parsed.len(),
        num_test_cases: test_cases_parsed.len(),
        constraints_count: constraints_parsed.len(),
        algorithm_category: first_match(ALGORITHM_CATEGORY_KEYWORDS, &text_lower)
            .unwrap_or(UNCATEGORIZED)
            .to_string(),
        input_type: first_match(INPUT_TYPE_KEYWORDS, &text_lower)
            .unwrap_or(MIXED_INPUT_TYPE)
            .to_string(),
        problem_tags: extract_tags(&text_lower),
        output_type: infer_output_type(&test_cases_parsed),
        returns_negative_one: flags_negative_one(&combined_text, &test_cases_parsed),
        created_date: created_at.map(|ts| ts.date()),
        created_at,
        title,
        description,
        difficulty_level,
        examples_parsed,
        test_cases_parsed,
        constraints_parsed,
        combined_text,
    }
}

fn decode_array(idx: usize, column: &str, cell: &CellValue) -> Vec<Value> {
    match JsonArrayDecoder::try_decode(cell) {
        Ok(items) => items,
        Err(reason) => {
            warn!("Row {}: could not decode {}: {}", idx, column, reason);
            Vec::new()
        }
    }
}

// ── Classification helpers ────────────────────────────────────────────────────

/// Non-empty title and description joined with a single space.
pub fn combine_text(title: &str, description: &str) -> String {
    [title, description]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Label of the first group with a keyword contained in `text_lower`.
pub fn first_match(groups: &[KeywordGroup], text_lower: &str) -> Option<&'static str> {
    groups
        .iter()
        .find(|group| group_matches(group, text_lower))
        .map(|group| group.0)
}

/// Every matching tag in table order, or `["uncategorized"]`.
pub fn extract_tags(text_lower: &str) -> Vec<String> {
    let tags: Vec<String> = TAG_KEYWORDS
        .iter()
        .filter(|group| group_matches(group, text_lower))
        .map(|group| group.0.to_string())
        .collect();
    if tags.is_empty() {
        vec![UNCATEGORIZED_TAG.to_string()]
    } else {
        tags
    }
}

/// Type label of the first test case carrying a non-null `expected_output`.
pub fn infer_output_type(test_cases: &[Value]) -> String {
    test_cases
        .iter()
        .filter_map(|case| case.as_object()?.get("expected_output"))
        .find(|expected| !expected.is_null())
        .and_then(|expected| {
            OUTPUT_TYPE_MAPPINGS
                .iter()
                .find(|(kind, _)| kind.matches(expected))
                .map(|(_, label)| *label)
        })
        .unwrap_or(DEFAULT_NA_VALUE)
        .to_string()
}

/// `true` when the text mentions `-1` or any test case expects exactly -1.
pub fn flags_negative_one(combined_text: &str, test_cases: &[Value]) -> bool {
    if combined_text.contains("-1") {
        return true;
    }
    test_cases.iter().any(|case| {
        case.as_object()
            .and_then(|obj| obj.get("expected_output"))
            .and_then(Value::as_f64)
            .is_some_and(|v| v == -1.0)
    })
}
