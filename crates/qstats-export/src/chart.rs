//! PNG chart rendering.
//!
//! Chart data is prepared into plain series first ([`chart_jobs`]); only the
//! final step touches `plotters`. A chart whose metric is absent or empty is
//! skipped.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use plotters::prelude::*;
use plotters::style::FontStyle;
use qstats_core::error::{QstatsError, Result};
use qstats_core::summary::{DatasetSummary, MetricKey, Tally};
use tracing::{debug, error, info, warn};

pub const DIFFICULTY_CHART: &str = "difficulty_distribution.png";
pub const ALGORITHM_CHART: &str = "algorithm_distribution.png";
pub const TOP_TAGS_CHART: &str = "top_tags.png";
pub const AVERAGES_CHART: &str = "difficulty_averages.png";

/// Categories shown on the algorithm chart.
pub const ALGORITHM_TOP_N: usize = 15;

const CHART_SIZE: (u32, u32) = (1200, 720);
const FONT_FAMILY: &str = "sans-serif";

/// Searched in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn chart_err<E: Display>(e: E) -> QstatsError {
    QstatsError::Chart(e.to_string())
}

// ── Series ────────────────────────────────────────────────────────────────────

/// Labelled counts for a bar chart, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub title: &'static str,
    pub x_desc: &'static str,
    pub y_desc: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl BarSeries {
    fn from_tally(
        title: &'static str,
        x_desc: &'static str,
        y_desc: &'static str,
        tally: &Tally,
        limit: usize,
    ) -> Option<Self> {
        if tally.is_empty() {
            return None;
        }
        let (labels, values) = tally
            .iter()
            .take(limit)
            .map(|(k, v)| (k.clone(), *v))
            .unzip();
        Some(Self {
            title,
            x_desc,
            y_desc,
            labels,
            values,
        })
    }

    fn max_value(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(0)
    }
}

/// Per-difficulty description length and test-case averages.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragesSeries {
    pub labels: Vec<String>,
    pub description_length: Vec<f64>,
    pub test_cases: Vec<f64>,
}

/// One chart to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Bars(BarSeries),
    HorizontalBars(BarSeries),
    Averages(AveragesSeries),
}

/// Every chart with data, paired with its file name.
pub fn chart_jobs(summary: &DatasetSummary) -> Vec<(&'static str, ChartSpec)> {
    let metrics = &summary.metrics;
    let mut jobs = Vec::new();

    if let Some(dist) = metrics
        .get(MetricKey::DifficultyDistribution)
        .and_then(|v| v.as_distribution())
    {
        if let Some(series) = BarSeries::from_tally(
            "Problem Count by Difficulty Level",
            "Difficulty",
            "Count",
            &dist.counts,
            usize::MAX,
        ) {
            jobs.push((DIFFICULTY_CHART, ChartSpec::Bars(series)));
        }
    }

    if let Some(dist) = metrics
        .get(MetricKey::AlgorithmCategoryDistribution)
        .and_then(|v| v.as_distribution())
    {
        if let Some(series) = BarSeries::from_tally(
            "Top Algorithm Categories",
            "Count",
            "Category",
            &dist.counts,
            ALGORITHM_TOP_N,
        ) {
            jobs.push((ALGORITHM_CHART, ChartSpec::HorizontalBars(series)));
        }
    }

    if let Some(tally) = metrics
        .get(MetricKey::TopTagsDistribution)
        .and_then(|v| v.as_tally())
    {
        if let Some(series) =
            BarSeries::from_tally("Top 15 Problem Tags", "Frequency", "Tag", tally, usize::MAX)
        {
            jobs.push((TOP_TAGS_CHART, ChartSpec::HorizontalBars(series)));
        }
    }

    let desc = metrics
        .get(MetricKey::AvgDescriptionLengthByDifficulty)
        .and_then(|v| v.as_averages());
    let tests = metrics
        .get(MetricKey::AvgTestCasesByDifficulty)
        .and_then(|v| v.as_averages());
    if let (Some(desc), Some(tests)) = (desc, tests) {
        if !desc.is_empty() {
            // BTreeMap keys are already sorted.
            let labels: Vec<String> = desc.keys().cloned().collect();
            let test_cases = labels
                .iter()
                .map(|k| tests.get(k).copied().unwrap_or(0.0))
                .collect();
            jobs.push((
                AVERAGES_CHART,
                ChartSpec::Averages(AveragesSeries {
                    description_length: desc.values().copied().collect(),
                    labels,
                    test_cases,
                }),
            ));
        }
    }

    jobs
}

// ── Font ──────────────────────────────────────────────────────────────────────

/// The configured font, or the first system font found.
///
/// A configured path that does not exist is an error; it never falls back.
pub fn locate_font(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(QstatsError::Chart(format!(
                "configured chart font not found: {}",
                path.display()
            )))
        };
    }
    SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| {
            QstatsError::Chart("no usable system font found; pass --chart-font".to_string())
        })
}

/// Font files already read this process, keyed by path.
///
/// plotters holds a `'static` reference to registered font data, so each file
/// is leaked exactly once and reused on later exports.
fn loaded_fonts() -> &'static Mutex<HashMap<PathBuf, &'static [u8]>> {
    static FONTS: OnceLock<Mutex<HashMap<PathBuf, &'static [u8]>>> = OnceLock::new();
    FONTS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn font_bytes(path: &Path) -> Result<&'static [u8]> {
    let mut fonts = loaded_fonts()
        .lock()
        .map_err(|_| QstatsError::Chart("font cache lock poisoned".to_string()))?;
    if let Some(bytes) = fonts.get(path) {
        return Ok(bytes);
    }
    let bytes = std::fs::read(path).map_err(|source| QstatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    fonts.insert(path.to_path_buf(), bytes);
    Ok(bytes)
}

fn register_font(path: &Path) -> Result<()> {
    let bytes = font_bytes(path)?;
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| QstatsError::Chart(format!("invalid font file: {}", path.display())))?;
    debug!("Registered chart font {}", path.display());
    Ok(())
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

fn headroom(max: u64) -> u64 {
    max + max / 10 + 1
}

fn draw_bars(path: &Path, series: &BarSeries) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let n = series.labels.len();
    let mut chart = ChartBuilder::on(&root)
        .caption(series.title, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), 0u64..headroom(series.max_value()))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(series.x_desc)
        .y_desc(series.y_desc)
        .x_labels(n)
        .x_label_formatter(&|v| segment_label(&series.labels, v))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(series.values.iter().enumerate().map(|(i, v)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), *v)],
                Palette99::pick(i).mix(0.9).filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Largest value is drawn on top.
fn draw_horizontal_bars(path: &Path, series: &BarSeries) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let labels: Vec<String> = series.labels.iter().rev().cloned().collect();
    let values: Vec<u64> = series.values.iter().rev().copied().collect();
    let n = labels.len();

    let mut chart = ChartBuilder::on(&root)
        .caption(series.title, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(220)
        .build_cartesian_2d(0u64..headroom(series.max_value()), (0..n).into_segmented())
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(series.x_desc)
        .y_desc(series.y_desc)
        .y_labels(n)
        .y_label_formatter(&|v| segment_label(&labels, v))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            let mut bar = Rectangle::new(
                [(0, SegmentValue::Exact(i)), (*v, SegmentValue::Exact(i + 1))],
                Palette99::pick(i).mix(0.9).filled(),
            );
            bar.set_margin(4, 4, 0, 0);
            bar
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Description length bars on the left axis, test cases as a line on the right.
fn draw_averages(path: &Path, series: &AveragesSeries) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let n = series.labels.len();
    let desc_top = series.description_length.iter().copied().fold(0.0, f64::max) * 1.1 + 1.0;
    let tests_top = series.test_cases.iter().copied().fold(0.0, f64::max) * 1.1 + 1.0;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Averages by Difficulty: Description Length vs Test Cases",
            (FONT_FAMILY, 28),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .right_y_label_area_size(80)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..desc_top)
        .map_err(chart_err)?
        .set_secondary_coord(0f64..n as f64, 0f64..tests_top);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Difficulty")
        .y_desc("Avg Description Length")
        .x_labels(n)
        .x_label_formatter(&|v| segment_label(&series.labels, v))
        .draw()
        .map_err(chart_err)?;

    chart
        .configure_secondary_axes()
        .y_desc("Avg Test Case Count")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(series.description_length.iter().enumerate().map(|(i, v)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                BLUE.mix(0.6).filled(),
            );
            bar.set_margin(0, 0, 15, 15);
            bar
        }))
        .map_err(chart_err)?
        .label("Avg Description Length")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], BLUE.mix(0.6).filled()));

    let points: Vec<(f64, f64)> = series
        .test_cases
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 0.5, *v))
        .collect();

    chart
        .draw_secondary_series(LineSeries::new(points.clone(), RED.stroke_width(2)))
        .map_err(chart_err)?
        .label("Avg Test Case Count")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], RED.stroke_width(2)));

    chart
        .draw_secondary_series(points.into_iter().map(|p| Circle::new(p, 5, RED.filled())))
        .map_err(chart_err)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

impl ChartSpec {
    pub fn render(&self, path: &Path) -> Result<()> {
        match self {
            ChartSpec::Bars(series) => draw_bars(path, series),
            ChartSpec::HorizontalBars(series) => draw_horizontal_bars(path, series),
            ChartSpec::Averages(series) => draw_averages(path, series),
        }
    }
}

// ── ChartExporter ─────────────────────────────────────────────────────────────

/// Renders the fixed chart set into one directory.
#[derive(Debug, Default, Clone)]
pub struct ChartExporter {
    font_path: Option<PathBuf>,
}

impl ChartExporter {
    pub fn new(font_path: Option<PathBuf>) -> Self {
        Self { font_path }
    }

    /// Render every chart with data into `dir` and return the written paths.
    ///
    /// PNG files are written in place; a failed chart may leave a partial
    /// image behind while the others still render.
    pub fn export(&self, summary: &DatasetSummary, dir: &Path) -> Vec<PathBuf> {
        let jobs = chart_jobs(summary);
        if jobs.is_empty() {
            warn!("No chart data available; skipping charts");
            return Vec::new();
        }

        if let Err(e) = std::fs::create_dir_all(dir) {
            error!("Could not create chart directory {}: {}", dir.display(), e);
            return Vec::new();
        }

        if let Err(e) = locate_font(self.font_path.as_deref()).and_then(|p| register_font(&p)) {
            error!("Charts skipped: {}", e);
            return Vec::new();
        }

        let mut written = Vec::with_capacity(jobs.len());
        for (filename, spec) in jobs {
            let path = dir.join(filename);
            match spec.render(&path) {
                Ok(()) => {
                    info!("SUCCESS: Chart saved to {}", path.display());
                    written.push(path);
                }
                Err(e) => error!("Could not render chart {}: {}", path.display(), e),
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qstats_core::summary::{Distribution, MetricValue, Metrics, OverviewStats, Percentages};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn distribution(pairs: &[(&str, u64)]) -> MetricValue {
        let counts: Tally = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let percentages: Percentages = pairs.iter().map(|(k, _)| (k.to_string(), 0.0)).collect();
        MetricValue::Distribution(Distribution {
            counts,
            percentages,
        })
    }

    fn summary_with(metrics: Metrics) -> DatasetSummary {
        DatasetSummary::new(
            OverviewStats {
                total_questions: 3,
                distinct_difficulties: 2,
                earliest_created_at: "N/A".to_string(),
                latest_created_at: "N/A".to_string(),
                days_span: 0,
            },
            metrics,
        )
    }

    fn full_metrics() -> Metrics {
        let mut metrics = Metrics::new();
        metrics.insert(
            MetricKey::DifficultyDistribution,
            distribution(&[("Easy", 2), ("Hard", 1)]),
        );
        let categories: Vec<(String, u64)> =
            (0..20).map(|i| (format!("Cat{i:02}"), 20 - i as u64)).collect();
        let categories: Vec<(&str, u64)> =
            categories.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        metrics.insert(
            MetricKey::AlgorithmCategoryDistribution,
            distribution(&categories),
        );
        metrics.insert(
            MetricKey::TopTagsDistribution,
            MetricValue::Tally(Tally::from_iter([
                ("array".to_string(), 3),
                ("graph".to_string(), 1),
            ])),
        );
        metrics.insert(
            MetricKey::AvgDescriptionLengthByDifficulty,
            MetricValue::Averages(BTreeMap::from([
                ("Hard".to_string(), 300.0),
                ("Easy".to_string(), 100.0),
            ])),
        );
        metrics.insert(
            MetricKey::AvgTestCasesByDifficulty,
            MetricValue::Averages(BTreeMap::from([("Easy".to_string(), 2.5)])),
        );
        metrics
    }

    #[test]
    fn test_chart_jobs_cover_all_charts() {
        let jobs = chart_jobs(&summary_with(full_metrics()));
        let names: Vec<&str> = jobs.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![DIFFICULTY_CHART, ALGORITHM_CHART, TOP_TAGS_CHART, AVERAGES_CHART]
        );
    }

    #[test]
    fn test_algorithm_chart_keeps_top_categories() {
        let jobs = chart_jobs(&summary_with(full_metrics()));
        let ChartSpec::HorizontalBars(series) = &jobs[1].1 else {
            panic!("expected horizontal bars");
        };
        assert_eq!(series.labels.len(), ALGORITHM_TOP_N);
        assert_eq!(series.labels[0], "Cat00");
        assert_eq!(series.values[0], 20);
    }

    #[test]
    fn test_averages_series_sorted_with_missing_as_zero() {
        let jobs = chart_jobs(&summary_with(full_metrics()));
        let ChartSpec::Averages(series) = &jobs[3].1 else {
            panic!("expected averages");
        };
        assert_eq!(series.labels, vec!["Easy", "Hard"]);
        assert_eq!(series.description_length, vec![100.0, 300.0]);
        assert_eq!(series.test_cases, vec![2.5, 0.0]);
    }

    #[test]
    fn test_missing_metrics_skip_charts() {
        let mut metrics = Metrics::new();
        metrics.insert(
            MetricKey::AvgDescriptionLengthByDifficulty,
            MetricValue::Averages(BTreeMap::from([("Easy".to_string(), 1.0)])),
        );
        metrics.insert(MetricKey::DifficultyDistribution, distribution(&[]));
        assert!(chart_jobs(&summary_with(metrics)).is_empty());
    }

    #[test]
    fn test_segment_label_lookup() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "b");
        assert_eq!(segment_label(&labels, &SegmentValue::Exact(5)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::Last), "");
    }

    #[test]
    fn test_locate_font_rejects_missing_configured_path() {
        let err = locate_font(Some(Path::new("/definitely/not/a/font.ttf"))).unwrap_err();
        assert!(matches!(err, QstatsError::Chart(_)));
    }

    #[test]
    fn test_font_bytes_read_once_per_path() {
        let tmp = TempDir::new().unwrap();
        let font = tmp.path().join("cached.ttf");
        std::fs::write(&font, b"font data").unwrap();

        let first = font_bytes(&font).unwrap();
        std::fs::remove_file(&font).unwrap();
        let second = font_bytes(&font).unwrap();

        assert_eq!(first, b"font data");
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_export_without_data_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("charts");
        let written = ChartExporter::default().export(&summary_with(Metrics::new()), &dir);
        assert!(written.is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn test_export_with_bad_font_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let font = tmp.path().join("broken.ttf");
        std::fs::write(&font, b"not a font").unwrap();
        let exporter = ChartExporter::new(Some(font));
        let written = exporter.export(&summary_with(full_metrics()), tmp.path());
        assert!(written.is_empty());
    }

    #[test]
    fn test_export_renders_pngs_when_font_available() {
        if locate_font(None).is_err() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let written = ChartExporter::default().export(&summary_with(full_metrics()), tmp.path());
        assert_eq!(written.len(), 4);
        for path in written {
            let bytes = std::fs::read(&path).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"), "{}", path.display());
        }
    }
}
