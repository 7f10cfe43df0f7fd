//! The computed result of one pipeline run.
//!
//! [`DatasetSummary`] owns the [`OverviewStats`] and a typed [`Metrics`]
//! mapping. Exporters never see an untyped bag: every metric name is a
//! [`MetricKey`] and every result shape a [`MetricValue`] variant.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Ordered `label → count` mapping. Serialization keeps insertion order.
pub type Tally = IndexMap<String, u64>;

/// Ordered `label → percent` mapping paired with a [`Tally`].
pub type Percentages = IndexMap<String, f64>;

/// Nested `row label → column label → count` cross-tabulation.
pub type Matrix = BTreeMap<String, BTreeMap<String, u64>>;

// ── OverviewStats ─────────────────────────────────────────────────────────────

/// Dataset-level overview figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    pub total_questions: usize,
    pub distinct_difficulties: usize,
    /// ISO-8601 timestamp or `"N/A"`.
    pub earliest_created_at: String,
    /// ISO-8601 timestamp or `"N/A"`.
    pub latest_created_at: String,
    /// Whole days between earliest and latest; 0 when either is missing.
    pub days_span: i64,
}

/// Field names of [`OverviewStats`], addressable from subset key lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewField {
    TotalQuestions,
    DistinctDifficulties,
    EarliestCreatedAt,
    LatestCreatedAt,
    DaysSpan,
}

impl OverviewField {
    pub const ALL: [OverviewField; 5] = [
        OverviewField::TotalQuestions,
        OverviewField::DistinctDifficulties,
        OverviewField::EarliestCreatedAt,
        OverviewField::LatestCreatedAt,
        OverviewField::DaysSpan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OverviewField::TotalQuestions => "total_questions",
            OverviewField::DistinctDifficulties => "distinct_difficulties",
            OverviewField::EarliestCreatedAt => "earliest_created_at",
            OverviewField::LatestCreatedAt => "latest_created_at",
            OverviewField::DaysSpan => "days_span",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl OverviewStats {
    /// JSON value of a single overview field.
    pub fn field(&self, field: OverviewField) -> Value {
        match field {
            OverviewField::TotalQuestions => Value::from(self.total_questions),
            OverviewField::DistinctDifficulties => Value::from(self.distinct_difficulties),
            OverviewField::EarliestCreatedAt => Value::from(self.earliest_created_at.clone()),
            OverviewField::LatestCreatedAt => Value::from(self.latest_created_at.clone()),
            OverviewField::DaysSpan => Value::from(self.days_span),
        }
    }

    /// `(name, value)` pairs in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, Value)> {
        OverviewField::ALL
            .into_iter()
            .map(|f| (f.as_str(), self.field(f)))
            .collect()
    }
}

// ── MetricKey ─────────────────────────────────────────────────────────────────

/// Closed set of metric names produced by the metrics engine.
///
/// Declaration order is the order metrics appear in serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    DifficultyDistribution,
    AlgorithmCategoryDistribution,
    InputTypeDistribution,
    OutputTypeDistribution,
    NegativeOneOutputProblemsRatio,
    TopTagsDistribution,
    AvgDescriptionLengthByDifficulty,
    AvgTestCasesByDifficulty,
    ExampleTestcaseByDifficulty,
    ExampleCountDistribution,
    TestCaseCountDistribution,
    DescriptionLengthBucketDistribution,
    ConstraintsCountDistribution,
    ProblemsPerDay,
    DifficultyOverTime,
    DifficultyAlgorithmMatrix,
    DifficultyInputTypeMatrix,
    DuplicateTitleCount,
    DescriptionTemplateUsage,
}

impl MetricKey {
    pub const ALL: [MetricKey; 19] = [
        MetricKey::DifficultyDistribution,
        MetricKey::AlgorithmCategoryDistribution,
        MetricKey::InputTypeDistribution,
        MetricKey::OutputTypeDistribution,
        MetricKey::NegativeOneOutputProblemsRatio,
        MetricKey::TopTagsDistribution,
        MetricKey::AvgDescriptionLengthByDifficulty,
        MetricKey::AvgTestCasesByDifficulty,
        MetricKey::ExampleTestcaseByDifficulty,
        MetricKey::ExampleCountDistribution,
        MetricKey::TestCaseCountDistribution,
        MetricKey::DescriptionLengthBucketDistribution,
        MetricKey::ConstraintsCountDistribution,
        MetricKey::ProblemsPerDay,
        MetricKey::DifficultyOverTime,
        MetricKey::DifficultyAlgorithmMatrix,
        MetricKey::DifficultyInputTypeMatrix,
        MetricKey::DuplicateTitleCount,
        MetricKey::DescriptionTemplateUsage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::DifficultyDistribution => "difficulty_distribution",
            MetricKey::AlgorithmCategoryDistribution => "algorithm_category_distribution",
            MetricKey::InputTypeDistribution => "input_type_distribution",
            MetricKey::OutputTypeDistribution => "output_type_distribution",
            MetricKey::NegativeOneOutputProblemsRatio => "negative_one_output_problems_ratio",
            MetricKey::TopTagsDistribution => "top_tags_distribution",
            MetricKey::AvgDescriptionLengthByDifficulty => "avg_description_length_by_difficulty",
            MetricKey::AvgTestCasesByDifficulty => "avg_test_cases_by_difficulty",
            MetricKey::ExampleTestcaseByDifficulty => "example_testcase_by_difficulty",
            MetricKey::ExampleCountDistribution => "example_count_distribution",
            MetricKey::TestCaseCountDistribution => "test_case_count_distribution",
            MetricKey::DescriptionLengthBucketDistribution => {
                "description_length_bucket_distribution"
            }
            MetricKey::ConstraintsCountDistribution => "constraints_count_distribution",
            MetricKey::ProblemsPerDay => "problems_per_day",
            MetricKey::DifficultyOverTime => "difficulty_over_time",
            MetricKey::DifficultyAlgorithmMatrix => "difficulty_algorithm_matrix",
            MetricKey::DifficultyInputTypeMatrix => "difficulty_input_type_matrix",
            MetricKey::DuplicateTitleCount => "duplicate_title_count",
            MetricKey::DescriptionTemplateUsage => "description_template_usage",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── SummaryKey ────────────────────────────────────────────────────────────────

/// A name resolvable against the merged metrics + overview pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKey {
    Metric(MetricKey),
    Overview(OverviewField),
}

impl SummaryKey {
    /// Resolve a key name. Metric names take precedence over overview fields
    /// should the two namespaces ever share a name.
    pub fn resolve(name: &str) -> Option<Self> {
        MetricKey::from_name(name)
            .map(SummaryKey::Metric)
            .or_else(|| OverviewField::from_name(name).map(SummaryKey::Overview))
    }
}

// ── Metric value shapes ───────────────────────────────────────────────────────

/// Category counts plus their share of the total, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub counts: Tally,
    pub percentages: Percentages,
}

/// Mean example and test-case counts for one difficulty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleTestcaseAverage {
    pub num_examples: f64,
    pub num_test_cases: f64,
}

/// Number of questions created on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

/// Per-difficulty question counts created on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyOnDate {
    pub date: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

/// Result shape of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Distribution(Distribution),
    Tally(Tally),
    Averages(BTreeMap<String, f64>),
    PairedAverages(BTreeMap<String, ExampleTestcaseAverage>),
    TimeSeries(Vec<DailyCount>),
    DifficultyOverTime(Vec<DifficultyOnDate>),
    Matrix(Matrix),
    Scalar(u64),
}

impl MetricValue {
    pub fn as_distribution(&self) -> Option<&Distribution> {
        match self {
            MetricValue::Distribution(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_tally(&self) -> Option<&Tally> {
        match self {
            MetricValue::Tally(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_averages(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            MetricValue::Averages(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            MetricValue::Matrix(m) => Some(m),
            _ => None,
        }
    }

}

// ── Metrics ───────────────────────────────────────────────────────────────────

/// Typed mapping from metric name to result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<MetricKey, MetricValue>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MetricKey, value: MetricValue) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: MetricKey) -> Option<&MetricValue> {
        self.0.get(&key)
    }

    pub fn contains(&self, key: MetricKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, &MetricValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

// ── DatasetSummary ────────────────────────────────────────────────────────────

/// Overview plus metrics for one pipeline run. Read-only once computed.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub overview: OverviewStats,
    pub metrics: Metrics,
}

/// Serialized form of a full summary: `{overview, metrics, timestamp}`.
#[derive(Debug, Serialize)]
pub struct SummaryDocument<'a> {
    pub overview: &'a OverviewStats,
    pub metrics: &'a Metrics,
    pub timestamp: String,
}

/// Metadata block heading every subset document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryInfo {
    pub generated_at: String,
}

/// A name resolved against the merged pool. Metrics stay borrowed and typed
/// so ordered tallies serialize in their computed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryEntry<'a> {
    Metric(&'a MetricValue),
    Overview(Value),
}

impl SummaryEntry<'_> {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Serialized form of a key subset: `{summary_info, metrics}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsetDocument<'a> {
    pub summary_info: SummaryInfo,
    pub metrics: IndexMap<String, SummaryEntry<'a>>,
}

impl DatasetSummary {
    pub fn new(overview: OverviewStats, metrics: Metrics) -> Self {
        Self { overview, metrics }
    }

    /// Full document stamped with `timestamp`.
    pub fn to_document(&self, timestamp: impl Into<String>) -> SummaryDocument<'_> {
        SummaryDocument {
            overview: &self.overview,
            metrics: &self.metrics,
            timestamp: timestamp.into(),
        }
    }

    /// Full document as a JSON value.
    pub fn to_value(&self, timestamp: impl Into<String>) -> Result<Value> {
        Ok(serde_json::to_value(self.to_document(timestamp))?)
    }

    /// Look a name up in the merged metrics + overview pool.
    pub fn lookup(&self, name: &str) -> Option<SummaryEntry<'_>> {
        match SummaryKey::resolve(name)? {
            SummaryKey::Metric(key) => self.metrics.get(key).map(SummaryEntry::Metric),
            SummaryKey::Overview(field) => Some(SummaryEntry::Overview(self.overview.field(field))),
        }
    }

    /// Extract the named keys, in request order, skipping unknown names.
    pub fn subset<S: AsRef<str>>(&self, keys: &[S], generated_at: impl Into<String>) -> SubsetDocument<'_> {
        let mut metrics = IndexMap::new();
        for key in keys {
            let name = key.as_ref();
            match self.lookup(name) {
                Some(value) => {
                    metrics.insert(name.to_string(), value);
                }
                None => tracing::debug!(key = name, "subset key not found in summary; skipping"),
            }
        }
        SubsetDocument {
            summary_info: SummaryInfo {
                generated_at: generated_at.into(),
            },
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_summary() -> DatasetSummary {
        let mut counts = Tally::new();
        counts.insert("Easy".to_string(), 2);
        counts.insert("Hard".to_string(), 1);
        let mut percentages = Percentages::new();
        percentages.insert("Easy".to_string(), 66.67);
        percentages.insert("Hard".to_string(), 33.33);

        let mut metrics = Metrics::new();
        metrics.insert(
            MetricKey::DifficultyDistribution,
            MetricValue::Distribution(Distribution {
                counts,
                percentages,
            }),
        );
        metrics.insert(MetricKey::DuplicateTitleCount, MetricValue::Scalar(1));

        DatasetSummary::new(
            OverviewStats {
                total_questions: 3,
                distinct_difficulties: 2,
                earliest_created_at: "2024-01-01T00:00:00".to_string(),
                latest_created_at: "2024-01-03T00:00:00".to_string(),
                days_span: 2,
            },
            metrics,
        )
    }

    #[test]
    fn test_metric_key_names_round_trip() {
        for key in MetricKey::ALL {
            assert_eq!(MetricKey::from_name(key.as_str()), Some(key));
            let serialized = serde_json::to_value(key).unwrap();
            assert_eq!(serialized, json!(key.as_str()));
        }
    }

    #[test]
    fn test_overview_field_names_round_trip() {
        for field in OverviewField::ALL {
            assert_eq!(OverviewField::from_name(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_summary_key_namespaces_do_not_collide() {
        for field in OverviewField::ALL {
            assert!(MetricKey::from_name(field.as_str()).is_none());
        }
    }

    #[test]
    fn test_summary_key_resolve() {
        assert_eq!(
            SummaryKey::resolve("days_span"),
            Some(SummaryKey::Overview(OverviewField::DaysSpan))
        );
        assert_eq!(
            SummaryKey::resolve("problems_per_day"),
            Some(SummaryKey::Metric(MetricKey::ProblemsPerDay))
        );
        assert_eq!(SummaryKey::resolve("nope"), None);
    }

    #[test]
    fn test_to_value_has_exactly_three_keys() {
        let value = sample_summary().to_value("2024-05-01T00:00:00Z").unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert!(obj.contains_key("overview"));
        assert!(obj.contains_key("metrics"));
        assert_eq!(obj["timestamp"], json!("2024-05-01T00:00:00Z"));
        assert_eq!(obj["overview"]["total_questions"], json!(3));
        assert_eq!(
            obj["metrics"]["difficulty_distribution"]["counts"]["Easy"],
            json!(2)
        );
        assert_eq!(obj["metrics"]["duplicate_title_count"], json!(1));
    }

    #[test]
    fn test_subset_skips_unknown_keys() {
        let summary = sample_summary();
        let doc = summary.subset(
            &["total_questions", "difficulty_distribution", "nonexistent_key"],
            "now",
        );
        assert_eq!(doc.metrics.len(), 2);
        assert_eq!(doc.metrics["total_questions"].to_value().unwrap(), json!(3));
        assert!(doc.metrics.contains_key("difficulty_distribution"));
        assert!(!doc.metrics.contains_key("nonexistent_key"));
        assert_eq!(doc.summary_info.generated_at, "now");
    }

    #[test]
    fn test_subset_keeps_request_order() {
        let summary = sample_summary();
        let doc = summary.subset(&["duplicate_title_count", "days_span"], "t");
        let keys: Vec<&str> = doc.metrics.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["duplicate_title_count", "days_span"]);
    }

    #[test]
    fn test_subset_skips_known_but_absent_metric() {
        let summary = sample_summary();
        let doc = summary.subset(&["top_tags_distribution"], "t");
        assert!(doc.metrics.is_empty());
    }

    #[test]
    fn test_difficulty_on_date_flattens_counts() {
        let mut counts = BTreeMap::new();
        counts.insert("Easy".to_string(), 1);
        counts.insert("Hard".to_string(), 0);
        let row = DifficultyOnDate {
            date: "2024-01-01".to_string(),
            counts,
        };
        assert_eq!(
            serde_json::to_value(row).unwrap(),
            json!({"date": "2024-01-01", "Easy": 1, "Hard": 0})
        );
    }

    #[test]
    fn test_tally_serializes_in_insertion_order() {
        let mut tally = Tally::new();
        tally.insert("zeta".to_string(), 5);
        tally.insert("alpha".to_string(), 3);
        let text = serde_json::to_string(&MetricValue::Tally(tally)).unwrap();
        assert_eq!(text, r#"{"zeta":5,"alpha":3}"#);
    }

    #[test]
    fn test_subset_keeps_tally_order() {
        let mut tags = Tally::new();
        tags.insert("zeta".to_string(), 5);
        tags.insert("alpha".to_string(), 3);
        let mut summary = sample_summary();
        summary
            .metrics
            .insert(MetricKey::TopTagsDistribution, MetricValue::Tally(tags));

        let doc = summary.subset(&["top_tags_distribution", "difficulty_distribution"], "t");
        let text = serde_json::to_string(&doc.metrics).unwrap();
        assert!(text.starts_with(r#"{"top_tags_distribution":{"zeta":5,"alpha":3}"#), "{text}");
        assert!(text.contains(r#""counts":{"Easy":2,"Hard":1}"#), "{text}");
    }
}
