//! Metrics engine entry point.
//!
//! Computes the [`OverviewStats`] and every metric of a [`DatasetSummary`]
//! from an [`EnrichedTable`].

use std::collections::{BTreeMap, HashSet};

use qstats_core::data_processors::TimestampProcessor;
use qstats_core::error::{QstatsError, Result};
use qstats_core::formatting::mean;
use qstats_core::models::{EnrichedTable, RawTable};
use qstats_core::summary::{
    DatasetSummary, ExampleTestcaseAverage, MetricKey, MetricValue, Metrics, OverviewStats,
};
use qstats_core::taxonomy::{
    CONSTRAINTS_BUCKETS, DESCRIPTION_LENGTH_BUCKETS, EXAMPLE_BUCKETS, TEST_CASE_BUCKETS,
};
use tracing::{error, info};

use crate::enricher::enrich;
use crate::metrics::{MetricsAggregator, ROUND_DECIMALS, TOP_TAGS_LIMIT};

/// Placeholder for a missing creation timestamp.
pub const NOT_AVAILABLE: &str = "N/A";

// ── Public functions ──────────────────────────────────────────────────────────

/// Enrich `table` and compute its statistics.
pub fn analyze(table: &RawTable) -> Result<DatasetSummary> {
    compute_statistics(&enrich(table))
}

/// Compute the overview and all metrics of `table`.
///
/// # Errors
///
/// [`QstatsError::InvalidInput`] when the table has no rows.
pub fn compute_statistics(table: &EnrichedTable) -> Result<DatasetSummary> {
    if table.is_empty() {
        error!("Input table is empty");
        return Err(QstatsError::InvalidInput(
            "cannot compute statistics for an empty table".to_string(),
        ));
    }

    info!("Computing statistics for {} questions", table.len());

    let overview = compute_overview(table);
    let metrics = compute_metrics(table);

    info!("Finished computing {} metrics", metrics.len());
    Ok(DatasetSummary::new(overview, metrics))
}

/// Dataset-level figures.
pub fn compute_overview(table: &EnrichedTable) -> OverviewStats {
    let distinct: HashSet<&str> = table.iter().map(|r| r.difficulty_level.as_str()).collect();

    let earliest = table.iter().filter_map(|r| r.created_at).min();
    let latest = table.iter().filter_map(|r| r.created_at).max();

    let render = |ts: Option<chrono::NaiveDateTime>| {
        ts.map(|t| TimestampProcessor::format_iso(&t))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    let days_span = match (earliest, latest) {
        (Some(first), Some(last)) => (last - first).num_days(),
        _ => 0,
    };

    OverviewStats {
        total_questions: table.len(),
        distinct_difficulties: distinct.len(),
        earliest_created_at: render(earliest),
        latest_created_at: render(latest),
        days_span,
    }
}

/// Every [`MetricKey`] computed over `table`.
pub fn compute_metrics(table: &EnrichedTable) -> Metrics {
    let rows = &table.rows;
    let mut metrics = Metrics::new();

    // ── Distributions ─────────────────────────────────────────────────────────
    metrics.insert(
        MetricKey::DifficultyDistribution,
        MetricValue::Distribution(MetricsAggregator::distribution(
            rows.iter().map(|r| r.difficulty_level.as_str()),
        )),
    );
    metrics.insert(
        MetricKey::AlgorithmCategoryDistribution,
        MetricValue::Distribution(MetricsAggregator::distribution(
            rows.iter().map(|r| r.algorithm_category.as_str()),
        )),
    );
    metrics.insert(
        MetricKey::InputTypeDistribution,
        MetricValue::Distribution(MetricsAggregator::distribution(
            rows.iter().map(|r| r.input_type.as_str()),
        )),
    );
    metrics.insert(
        MetricKey::OutputTypeDistribution,
        MetricValue::Distribution(MetricsAggregator::distribution(
            rows.iter().map(|r| r.output_type.as_str()),
        )),
    );
    metrics.insert(
        MetricKey::NegativeOneOutputProblemsRatio,
        MetricValue::Distribution(MetricsAggregator::distribution(
            rows.iter()
                .map(|r| if r.returns_negative_one { "true" } else { "false" }),
        )),
    );
    metrics.insert(
        MetricKey::TopTagsDistribution,
        MetricValue::Tally(MetricsAggregator::top_tags(
            rows.iter().map(|r| r.problem_tags.as_slice()),
            TOP_TAGS_LIMIT,
        )),
    );

    // ── Averages ──────────────────────────────────────────────────────────────
    metrics.insert(
        MetricKey::AvgDescriptionLengthByDifficulty,
        MetricValue::Averages(MetricsAggregator::grouped_mean(
            rows.iter()
                .map(|r| (r.difficulty_level.as_str(), r.description_length as f64)),
        )),
    );
    metrics.insert(
        MetricKey::AvgTestCasesByDifficulty,
        MetricValue::Averages(MetricsAggregator::grouped_mean(
            rows.iter()
                .map(|r| (r.difficulty_level.as_str(), r.num_test_cases as f64)),
        )),
    );
    metrics.insert(
        MetricKey::ExampleTestcaseByDifficulty,
        MetricValue::PairedAverages(example_testcase_by_difficulty(table)),
    );

    // ── Buckets ───────────────────────────────────────────────────────────────
    metrics.insert(
        MetricKey::ExampleCountDistribution,
        MetricValue::Tally(MetricsAggregator::bucket_counts(
            rows.iter().map(|r| r.num_examples as f64),
            &EXAMPLE_BUCKETS,
        )),
    );
    metrics.insert(
        MetricKey::TestCaseCountDistribution,
        MetricValue::Tally(MetricsAggregator::bucket_counts(
            rows.iter().map(|r| r.num_test_cases as f64),
            &TEST_CASE_BUCKETS,
        )),
    );
    metrics.insert(
        MetricKey::DescriptionLengthBucketDistribution,
        MetricValue::Tally(MetricsAggregator::bucket_counts(
            rows.iter().map(|r| r.description_length as f64),
            &DESCRIPTION_LENGTH_BUCKETS,
        )),
    );
    metrics.insert(
        MetricKey::ConstraintsCountDistribution,
        MetricValue::Tally(MetricsAggregator::bucket_counts(
            rows.iter().map(|r| r.constraints_count as f64),
            &CONSTRAINTS_BUCKETS,
        )),
    );

    // ── Time series ───────────────────────────────────────────────────────────
    metrics.insert(
        MetricKey::ProblemsPerDay,
        MetricValue::TimeSeries(MetricsAggregator::per_day(
            rows.iter().map(|r| r.created_date),
        )),
    );
    metrics.insert(
        MetricKey::DifficultyOverTime,
        MetricValue::DifficultyOverTime(MetricsAggregator::difficulty_over_time(
            rows.iter()
                .map(|r| (r.created_date, r.difficulty_level.as_str())),
        )),
    );

    // ── Matrices ──────────────────────────────────────────────────────────────
    metrics.insert(
        MetricKey::DifficultyAlgorithmMatrix,
        MetricValue::Matrix(MetricsAggregator::crosstab(rows.iter().map(|r| {
            (r.difficulty_level.as_str(), r.algorithm_category.as_str())
        }))),
    );
    metrics.insert(
        MetricKey::DifficultyInputTypeMatrix,
        MetricValue::Matrix(MetricsAggregator::crosstab(
            rows.iter()
                .map(|r| (r.difficulty_level.as_str(), r.input_type.as_str())),
        )),
    );

    // ── Other ─────────────────────────────────────────────────────────────────
    metrics.insert(
        MetricKey::DuplicateTitleCount,
        MetricValue::Scalar(MetricsAggregator::duplicate_titles(
            rows.iter().map(|r| r.title.as_str()),
        )),
    );
    metrics.insert(
        MetricKey::DescriptionTemplateUsage,
        MetricValue::Tally(MetricsAggregator::template_usage(
            rows.iter().map(|r| r.description.as_str()),
        )),
    );

    metrics
}

fn example_testcase_by_difficulty(table: &EnrichedTable) -> BTreeMap<String, ExampleTestcaseAverage> {
    let mut groups: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in table.iter() {
        let (examples, tests) = groups.entry(row.difficulty_level.as_str()).or_default();
        examples.push(row.num_examples as f64);
        tests.push(row.num_test_cases as f64);
    }
    groups
        .into_iter()
        .map(|(difficulty, (examples, tests))| {
            (
                difficulty.to_string(),
                ExampleTestcaseAverage {
                    num_examples: mean(&examples, ROUND_DECIMALS),
                    num_test_cases: mean(&tests, ROUND_DECIMALS),
                },
            )
        })
        .collect()
}
