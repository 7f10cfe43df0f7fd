//! One linear analysis run.
//!
//! `ensure dirs → load → validate → analyze → charts → JSON → Excel → report`.
//! Failures before analysis completes abort the run with nothing written;
//! failures of single artifacts are logged by the exporters and skipped.

use std::path::{Path, PathBuf};

use qstats_core::error::{QstatsError, Result};
use qstats_core::models::RawTable;
use qstats_core::settings::{OutputKind, PipelineConfig};
use qstats_core::summary::DatasetSummary;
use qstats_data::analysis::analyze;
use qstats_data::reader::load_table;
use qstats_export::targets::{resolve_excel_targets, resolve_json_targets, Destination};
use qstats_export::{ChartExporter, ExcelExporter, JsonExporter};
use tracing::{error, info};

use crate::progress::{log_banner, BarProgress, StepLogger};

const TOTAL_STEPS: usize = 6;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Paths written during a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactReport {
    pub json: Vec<(Destination, PathBuf)>,
    pub excel: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
}

impl ArtifactReport {
    pub fn total(&self) -> usize {
        self.json.len() + self.excel.len() + self.charts.len()
    }

    pub fn json_in(&self, destination: Destination) -> impl Iterator<Item = &Path> {
        self.json
            .iter()
            .filter(move |(d, _)| *d == destination)
            .map(|(_, p)| p.as_path())
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(ArtifactReport),
    /// Stopped before any artifact was written.
    Aborted(String),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

// ── AnalysisPipeline ──────────────────────────────────────────────────────────

/// Runs the statistics pipeline for one [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: PipelineConfig,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the run. Never panics on bad input; fatal problems come back
    /// as [`RunOutcome::Aborted`].
    pub fn run(&self) -> RunOutcome {
        self.run_with(&mut StepLogger::new(TOTAL_STEPS))
    }

    fn run_with(&self, steps: &mut StepLogger) -> RunOutcome {
        let config = &self.config;
        log_banner("Question dataset analysis", '=');
        info!(
            "Data file: {} | engine: {} | scope: {}",
            config.data_file.display(),
            config.engine.as_str(),
            config.scope
        );

        steps.step("Preparing output directories");
        if let Err(e) = self.ensure_directories() {
            return Self::abort(e);
        }

        steps.step(&format!("Loading dataset from {}", config.data_file.display()));
        let table = match self.load() {
            Ok(table) => table,
            Err(e) => return Self::abort(e),
        };

        steps.step("Computing statistics");
        let summary = match analyze(&table) {
            Ok(summary) => summary,
            Err(e) => return Self::abort(e),
        };

        let mut report = ArtifactReport::default();

        steps.step("Generating charts");
        if config.wants(OutputKind::Charts) {
            report.charts = ChartExporter::new(config.chart_font.clone())
                .export(&summary, &config.paths.charts_dir);
        } else {
            info!("Charts not requested; skipping");
        }

        steps.step("Writing JSON artifacts");
        if config.wants(OutputKind::Json) {
            report.json = self.write_json(&summary);
        } else {
            info!("JSON not requested; skipping");
        }

        steps.step("Writing Excel reports");
        if config.wants(OutputKind::Excel) {
            report.excel = self.write_excel(&summary);
        } else {
            info!("Excel not requested; skipping");
        }

        self.log_completion(&report);
        RunOutcome::Completed(report)
    }

    fn ensure_directories(&self) -> Result<()> {
        for dir in self.config.paths.all_dirs() {
            std::fs::create_dir_all(dir).map_err(|source| QstatsError::FileWrite {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn load(&self) -> Result<RawTable> {
        let table = load_table(&self.config.data_file, self.config.engine)?;
        if table.is_empty() {
            return Err(QstatsError::EmptyData(self.config.data_file.clone()));
        }
        info!("Loaded {} rows", table.len());
        Ok(table)
    }

    fn write_json(&self, summary: &DatasetSummary) -> Vec<(Destination, PathBuf)> {
        let config = &self.config;
        let exporter = JsonExporter;
        resolve_json_targets(config.scope, &config.paths, &config.custom_keys)
            .into_iter()
            .filter_map(|(destination, target)| {
                exporter.export_target(summary, &target).map(|path| {
                    info!("[{}] {}", destination.label(), path.display());
                    (destination, path)
                })
            })
            .collect()
    }

    fn write_excel(&self, summary: &DatasetSummary) -> Vec<PathBuf> {
        let config = &self.config;
        let exporter = ExcelExporter;
        resolve_excel_targets(config.scope, &config.paths.xlsx_dir, &config.custom_keys)
            .iter()
            .filter_map(|target| {
                let mut progress = BarProgress::new(target.filename.as_str());
                exporter.export_target(summary, target, &mut progress)
            })
            .collect()
    }

    fn log_completion(&self, report: &ArtifactReport) {
        let paths = &self.config.paths;
        log_banner("Analysis complete", '=');
        info!(
            "JSON saved: {} file(s) under {}",
            report.json_in(Destination::Artifacts).count(),
            paths.json_dir.display()
        );
        for dir in &paths.frontend_dirs {
            let copies = report.json_in(Destination::Frontend).filter(|p| p.starts_with(dir)).count();
            info!("JSON saved: {} file(s) under {}", copies, dir.display());
        }
        info!(
            "Charts saved: {} file(s) under {}",
            report.charts.len(),
            paths.charts_dir.display()
        );
        info!(
            "Excel saved: {} file(s) under {}",
            report.excel.len(),
            paths.xlsx_dir.display()
        );
        log_banner(&format!("Finished: {} artifact(s) written", report.total()), '-');
    }

    fn abort(e: QstatsError) -> RunOutcome {
        error!("FATAL: {}", e);
        log_banner("Analysis failed: no artifacts written", '!');
        RunOutcome::Aborted(e.to_string())
    }
}
