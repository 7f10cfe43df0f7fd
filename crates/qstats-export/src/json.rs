use std::path::{Path, PathBuf};

use chrono::Utc;
use qstats_core::error::Result;
use qstats_core::summary::DatasetSummary;
use serde::Serialize;
use tracing::{error, info};

use crate::targets::ExportTarget;
use crate::writer::write_atomic;

/// Serialize `value` as UTF-8 JSON indented with four spaces.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

// ── JsonExporter ──────────────────────────────────────────────────────────────

/// Writes summary documents as JSON files.
///
/// Every call produces one file and returns its path, or `None` after
/// logging the failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExporter;

impl JsonExporter {
    /// Write the full `{overview, metrics, timestamp}` document to `path`.
    pub fn export(&self, summary: &DatasetSummary, path: &Path) -> Option<PathBuf> {
        info!("Writing full summary to {}", path.display());
        let document = summary.to_document(Utc::now().to_rfc3339());
        Self::finish(path, Self::write(&document, path))
    }

    /// Write `{summary_info, metrics}` holding only `keys`, in request order.
    pub fn export_subset<S: AsRef<str>>(
        &self,
        summary: &DatasetSummary,
        path: &Path,
        keys: &[S],
    ) -> Option<PathBuf> {
        info!("Writing {} keys to {}", keys.len(), path.display());
        let document = summary.subset(keys, Utc::now().to_rfc3339());
        Self::finish(path, Self::write(&document, path))
    }

    /// Dispatch on the target's key list.
    pub fn export_target(&self, summary: &DatasetSummary, target: &ExportTarget) -> Option<PathBuf> {
        let path = target.path();
        match &target.keys {
            Some(keys) => self.export_subset(summary, &path, keys.as_slice()),
            None => self.export(summary, &path),
        }
    }

    fn write<T: Serialize>(document: &T, path: &Path) -> Result<()> {
        let bytes = to_pretty_json(document)?;
        write_atomic(path, &bytes)
    }

    fn finish(path: &Path, result: Result<()>) -> Option<PathBuf> {
        match result {
            Ok(()) => {
                info!("SUCCESS: JSON exported to {}", path.display());
                Some(path.to_path_buf())
            }
            Err(e) => {
                error!("Failed to export JSON to {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qstats_core::summary::{
        Distribution, MetricKey, MetricValue, Metrics, OverviewStats, Percentages, Tally,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn sample_summary() -> DatasetSummary {
        let mut counts = Tally::new();
        counts.insert("Easy".to_string(), 1);
        let mut percentages = Percentages::new();
        percentages.insert("Easy".to_string(), 100.0);

        let mut metrics = Metrics::new();
        metrics.insert(
            MetricKey::DifficultyDistribution,
            MetricValue::Distribution(Distribution {
                counts,
                percentages,
            }),
        );
        metrics.insert(MetricKey::DuplicateTitleCount, MetricValue::Scalar(0));

        DatasetSummary::new(
            OverviewStats {
                total_questions: 1,
                distinct_difficulties: 1,
                earliest_created_at: "N/A".to_string(),
                latest_created_at: "N/A".to_string(),
                days_span: 0,
            },
            metrics,
        )
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_to_pretty_json_uses_four_spaces() {
        let bytes = to_pretty_json(&json!({"a": {"b": 1}})).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n    \"a\": {\n        \"b\": 1"));
    }

    #[test]
    fn test_to_pretty_json_keeps_non_ascii() {
        let bytes = to_pretty_json(&json!({"title": "난이도"})).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("난이도"));
    }

    #[test]
    fn test_export_round_trips_summary() {
        let tmp = TempDir::new().unwrap();
        let summary = sample_summary();
        let path = tmp.path().join("summary.json");

        let written = JsonExporter.export(&summary, &path).unwrap();
        assert_eq!(written, path);

        let parsed = read_json(&path);
        let timestamp = parsed["timestamp"].as_str().unwrap().to_string();
        assert_eq!(parsed, summary.to_value(timestamp).unwrap());
    }

    #[test]
    fn test_export_subset_structure() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("basic.json");
        JsonExporter
            .export_subset(
                &sample_summary(),
                &path,
                &["total_questions", "difficulty_distribution", "nonexistent_key"],
            )
            .unwrap();

        let parsed = read_json(&path);
        let obj = parsed.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(parsed["summary_info"]["generated_at"].is_string());
        let metrics = parsed["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["total_questions"], json!(1));
        assert!(!metrics.contains_key("nonexistent_key"));
    }

    #[test]
    fn test_export_into_directory_returns_none() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("summary.json");
        std::fs::create_dir(&dir).unwrap();
        assert!(JsonExporter.export(&sample_summary(), &dir).is_none());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_export_target_dispatches_on_keys() {
        use qstats_core::settings::AnalysisScope;

        let tmp = TempDir::new().unwrap();
        let summary = sample_summary();
        let full = ExportTarget::full(tmp.path(), "full.json", AnalysisScope::Full);
        let subset = ExportTarget::subset(tmp.path(), "sub.json", AnalysisScope::Full, &["days_span"]);

        JsonExporter.export_target(&summary, &full).unwrap();
        JsonExporter.export_target(&summary, &subset).unwrap();

        assert!(read_json(&full.path()).get("overview").is_some());
        assert_eq!(read_json(&subset.path())["metrics"], json!({"days_span": 0}));
    }

    #[test]
    fn test_export_subset_keeps_tally_order_on_disk() {
        let tmp = TempDir::new().unwrap();
        let mut summary = sample_summary();
        let mut tags = Tally::new();
        tags.insert("zeta".to_string(), 5);
        tags.insert("alpha".to_string(), 3);
        summary
            .metrics
            .insert(MetricKey::TopTagsDistribution, MetricValue::Tally(tags));

        let path = tmp.path().join("tags_categories.json");
        JsonExporter
            .export_subset(&summary, &path, &["top_tags_distribution"])
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let zeta = text.find("\"zeta\"").unwrap();
        let alpha = text.find("\"alpha\"").unwrap();
        assert!(zeta < alpha, "{text}");
    }
}
