//! Export destinations and the scope policy deciding which keys each file
//! receives.
//!
//! Targets are built once per run from the static tab tables below and are
//! never mutated afterwards.

use std::path::{Path, PathBuf};

use qstats_core::settings::{AnalysisScope, ArtifactPaths};

/// File name of the full (or scope-filtered) summary document.
pub const SUMMARY_FILENAME: &str = "summary.json";

/// Keys written to `summary.json` under the basic scope.
pub const BASIC_SCOPE_KEYS: &[&str] = &[
    "total_questions",
    "difficulty_distribution",
    "problems_per_day",
];

/// One front-end tab: a file name and the summary keys it carries.
#[derive(Debug, Clone, Copy)]
pub struct TabTable {
    pub filename: &'static str,
    pub keys: &'static [&'static str],
}

pub const OVERVIEW_TAB: TabTable = TabTable {
    filename: "overview.json",
    keys: &[
        "total_questions",
        "days_span",
        "earliest_created_at",
        "latest_created_at",
        "difficulty_distribution",
        "problems_per_day",
    ],
};

pub const DIFFICULTY_VOLUME_TAB: TabTable = TabTable {
    filename: "difficulty_volume.json",
    keys: &[
        "difficulty_distribution",
        "avg_description_length_by_difficulty",
        "avg_test_cases_by_difficulty",
        "problems_per_day",
        "difficulty_over_time",
    ],
};

pub const TAGS_CATEGORIES_TAB: TabTable = TabTable {
    filename: "tags_categories.json",
    keys: &[
        "algorithm_category_distribution",
        "input_type_distribution",
        "top_tags_distribution",
    ],
};

pub const STRUCTURE_CONSTRAINTS_TAB: TabTable = TabTable {
    filename: "structure_constraints.json",
    keys: &[
        "example_count_distribution",
        "test_case_count_distribution",
        "description_length_bucket_distribution",
        "constraints_count_distribution",
    ],
};

/// Every front-end tab in display order.
pub const FRONTEND_TABS: [TabTable; 4] = [
    OVERVIEW_TAB,
    DIFFICULTY_VOLUME_TAB,
    TAGS_CATEGORIES_TAB,
    STRUCTURE_CONSTRAINTS_TAB,
];

// ── ExportTarget ──────────────────────────────────────────────────────────────

/// One artifact to produce: where, under what name, and which keys.
///
/// `keys == None` means the full summary document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub dir: PathBuf,
    pub filename: String,
    pub scope: AnalysisScope,
    pub keys: Option<Vec<String>>,
}

impl ExportTarget {
    pub fn full(dir: impl Into<PathBuf>, filename: impl Into<String>, scope: AnalysisScope) -> Self {
        Self {
            dir: dir.into(),
            filename: filename.into(),
            scope,
            keys: None,
        }
    }

    pub fn subset<S: AsRef<str>>(
        dir: impl Into<PathBuf>,
        filename: impl Into<String>,
        scope: AnalysisScope,
        keys: &[S],
    ) -> Self {
        Self {
            dir: dir.into(),
            filename: filename.into(),
            scope,
            keys: Some(keys.iter().map(|k| k.as_ref().to_string()).collect()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }

    /// File name without its extension: `overview.json` → `overview`.
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }

    /// Spreadsheet counterpart in `dir`: `overview.json` → `overview.xlsx`.
    pub fn as_workbook(&self, dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            filename: format!("{}.xlsx", self.stem()),
            ..self.clone()
        }
    }
}

/// Where a JSON target lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Artifacts,
    Frontend,
}

impl Destination {
    pub fn label(self) -> &'static str {
        match self {
            Destination::Artifacts => "Artifacts",
            Destination::Frontend => "Frontend",
        }
    }
}

// ── Scope policy ──────────────────────────────────────────────────────────────

/// Targets for one directory under `scope`.
///
/// * full: the complete `summary.json` plus every tab file.
/// * basic: a three-key `summary.json` plus `overview.json`.
/// * custom: a `summary.json` holding `custom_keys`.
pub fn default_frontend_targets<S: AsRef<str>>(
    scope: AnalysisScope,
    dir: &Path,
    custom_keys: &[S],
) -> Vec<ExportTarget> {
    match scope {
        AnalysisScope::Full => {
            let mut targets = vec![ExportTarget::full(dir, SUMMARY_FILENAME, scope)];
            targets.extend(
                FRONTEND_TABS
                    .iter()
                    .map(|tab| ExportTarget::subset(dir, tab.filename, scope, tab.keys)),
            );
            targets
        }
        AnalysisScope::Basic => vec![
            ExportTarget::subset(dir, SUMMARY_FILENAME, scope, BASIC_SCOPE_KEYS),
            ExportTarget::subset(dir, OVERVIEW_TAB.filename, scope, OVERVIEW_TAB.keys),
        ],
        AnalysisScope::Custom => vec![ExportTarget::subset(
            dir,
            SUMMARY_FILENAME,
            scope,
            custom_keys,
        )],
    }
}

/// Every JSON target of a run: the backend mirror first, then each
/// front-end directory.
pub fn resolve_json_targets<S: AsRef<str>>(
    scope: AnalysisScope,
    paths: &ArtifactPaths,
    custom_keys: &[S],
) -> Vec<(Destination, ExportTarget)> {
    let mut targets: Vec<(Destination, ExportTarget)> =
        default_frontend_targets(scope, &paths.json_dir, custom_keys)
            .into_iter()
            .map(|t| (Destination::Artifacts, t))
            .collect();

    for dir in &paths.frontend_dirs {
        targets.extend(
            default_frontend_targets(scope, dir, custom_keys)
                .into_iter()
                .map(|t| (Destination::Frontend, t)),
        );
    }
    targets
}

/// Spreadsheet targets of a run, written to the xlsx directory only.
pub fn resolve_excel_targets<S: AsRef<str>>(
    scope: AnalysisScope,
    xlsx_dir: &Path,
    custom_keys: &[S],
) -> Vec<ExportTarget> {
    default_frontend_targets(scope, xlsx_dir, custom_keys)
        .iter()
        .map(|t| t.as_workbook(xlsx_dir))
        .collect()
}
