//! Column-level aggregation helpers used by the metrics engine.
//!
//! Every helper is deterministic: ties and map keys are ordered so the same
//! input always serializes to the same output.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use indexmap::IndexMap;
use qstats_core::formatting::{mean, percentage};
use qstats_core::summary::{DailyCount, DifficultyOnDate, Distribution, Matrix, Tally};
use qstats_core::taxonomy::{description_templates, BucketSpec};

/// Number of tags kept by [`MetricsAggregator::top_tags`] by default.
pub const TOP_TAGS_LIMIT: usize = 10;

/// Decimal places used for percentages and averages.
pub const ROUND_DECIMALS: u32 = 2;

// ── MetricsAggregator ─────────────────────────────────────────────────────────

/// Stateless helper grouping enriched values into metric shapes.
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Counts and percentages of each distinct label.
    ///
    /// Ordered by count descending, then label ascending.
    pub fn distribution<'a, I>(values: I) -> Distribution
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for value in values {
            *counts.entry(value).or_insert(0) += 1;
        }
        let total: u64 = counts.values().sum();

        let mut ordered: Vec<(&str, u64)> = counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        let mut tally = Tally::new();
        let mut percentages = IndexMap::new();
        for (label, count) in ordered {
            tally.insert(label.to_string(), count);
            percentages.insert(
                label.to_string(),
                percentage(count as f64, total as f64, ROUND_DECIMALS),
            );
        }
        Distribution {
            counts: tally,
            percentages,
        }
    }

    /// Histogram over `spec`; every label is present, in bucket order.
    pub fn bucket_counts<I>(values: I, spec: &BucketSpec) -> Tally
    where
        I: IntoIterator<Item = f64>,
    {
        let mut tally: Tally = spec.labels.iter().map(|l| (l.to_string(), 0)).collect();
        for value in values {
            if let Some(label) = spec.label_for(value) {
                if let Some(count) = tally.get_mut(label) {
                    *count += 1;
                }
            }
        }
        tally
    }

    /// The `limit` most frequent tags.
    ///
    /// Equal counts keep the order in which tags were first encountered.
    pub fn top_tags<'a, I>(tag_lists: I, limit: usize) -> Tally
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut counter: IndexMap<&str, u64> = IndexMap::new();
        for tags in tag_lists {
            for tag in tags {
                *counter.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        let mut ordered: Vec<(&str, u64)> = counter.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));
        ordered
            .into_iter()
            .take(limit)
            .map(|(tag, count)| (tag.to_string(), count))
            .collect()
    }

    /// Mean of each group's values, rounded, keyed lexicographically.
    pub fn grouped_mean<'a, I>(pairs: I) -> BTreeMap<String, f64>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (key, value) in pairs {
            groups.entry(key).or_default().push(value);
        }
        groups
            .into_iter()
            .map(|(key, values)| (key.to_string(), mean(&values, ROUND_DECIMALS)))
            .collect()
    }

    /// Questions per creation date, ascending. Undated rows are skipped.
    pub fn per_day<I>(dates: I) -> Vec<DailyCount>
    where
        I: IntoIterator<Item = Option<NaiveDate>>,
    {
        let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for date in dates.into_iter().flatten() {
            *counts.entry(date).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(date, count)| DailyCount {
                date: date.to_string(),
                count,
            })
            .collect()
    }

    /// Per-date difficulty counts, ascending by date.
    ///
    /// Each record carries every difficulty seen on any dated row, with zero
    /// for difficulties absent on that date.
    pub fn difficulty_over_time<'a, I>(rows: I) -> Vec<DifficultyOnDate>
    where
        I: IntoIterator<Item = (Option<NaiveDate>, &'a str)>,
    {
        let mut difficulties: BTreeSet<&str> = BTreeSet::new();
        let mut by_date: BTreeMap<NaiveDate, BTreeMap<&str, u64>> = BTreeMap::new();
        for (date, difficulty) in rows {
            let Some(date) = date else { continue };
            difficulties.insert(difficulty);
            *by_date.entry(date).or_default().entry(difficulty).or_insert(0) += 1;
        }

        by_date
            .into_iter()
            .map(|(date, seen)| DifficultyOnDate {
                date: date.to_string(),
                counts: difficulties
                    .iter()
                    .map(|d| (d.to_string(), seen.get(d).copied().unwrap_or(0)))
                    .collect(),
            })
            .collect()
    }

    /// Cross-tabulation of row label × column label over observed labels.
    pub fn crosstab<'a, I>(pairs: I) -> Matrix
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
        let columns: BTreeSet<&str> = pairs.iter().map(|(_, c)| *c).collect();

        let mut matrix = Matrix::new();
        for (row, col) in pairs {
            let cells = matrix
                .entry(row.to_string())
                .or_insert_with(|| columns.iter().map(|c| (c.to_string(), 0)).collect());
            if let Some(count) = cells.get_mut(col) {
                *count += 1;
            }
        }
        matrix
    }

    /// Rows whose lower-cased, trimmed title already appeared earlier.
    pub fn duplicate_titles<'a, I>(titles: I) -> u64
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        titles
            .into_iter()
            .filter(|title| !seen.insert(title.to_lowercase().trim().to_string()))
            .count() as u64
    }

    /// Number of descriptions matching each template pattern.
    pub fn template_usage<'a, I>(descriptions: I) -> Tally
    where
        I: IntoIterator<Item = &'a str>,
    {
        let templates = description_templates();
        let mut tally: Tally = templates.iter().map(|(name, _)| (name.to_string(), 0)).collect();
        for description in descriptions {
            for (name, pattern) in templates {
                if pattern.is_match(description) {
                    if let Some(count) = tally.get_mut(*name) {
                        *count += 1;
                    }
                }
            }
        }
        tally
    }
}
