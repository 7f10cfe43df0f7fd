use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::{QstatsError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Descriptive statistics for coding-question datasets
#[derive(Parser, Debug, Clone)]
#[command(
    name = "qstats",
    about = "Descriptive statistics, reports and charts for coding-question datasets",
    version
)]
pub struct Settings {
    /// CSV file to analyse
    #[arg(
        long,
        default_value = "data/coding-questions-dataset/questions_dataset.csv"
    )]
    pub data_file: PathBuf,

    /// Data loading engine
    #[arg(long, default_value = "csv", value_parser = ["csv", "json", "db"])]
    pub engine: String,

    /// Analysis scope controlling which summary files are produced
    #[arg(long, default_value = "full", value_parser = ["full", "basic", "custom"])]
    pub scope: String,

    /// Artifact kinds to produce (comma separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["json", "excel", "charts"],
        value_parser = ["json", "excel", "charts"]
    )]
    pub outputs: Vec<String>,

    /// Summary keys exported by the custom scope (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub custom_keys: Vec<String>,

    /// Project root; artifacts are written under `<root>/artifacts`
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Front-end data directory to mirror JSON into (repeatable)
    #[arg(long = "frontend-dir")]
    pub frontend_dirs: Vec<PathBuf>,

    /// Do not write any front-end JSON copies
    #[arg(long)]
    pub no_frontend: bool,

    /// TrueType font used for chart text
    #[arg(long)]
    pub chart_font: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Effective log level, honouring `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Resolve the CLI values into an immutable [`PipelineConfig`].
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let engine = Engine::parse(&self.engine)?;
        let scope = AnalysisScope::parse(&self.scope)?;
        let outputs = self
            .outputs
            .iter()
            .map(|o| OutputKind::parse(o))
            .collect::<Result<BTreeSet<_>>>()?;

        let frontend_dirs = if self.no_frontend {
            Vec::new()
        } else if self.frontend_dirs.is_empty() {
            ArtifactPaths::default_frontend_dirs(&self.root)
        } else {
            self.frontend_dirs.clone()
        };

        let custom_keys = if self.custom_keys.is_empty() {
            DEFAULT_CUSTOM_KEYS.iter().map(|k| k.to_string()).collect()
        } else {
            self.custom_keys.clone()
        };

        Ok(PipelineConfig {
            data_file: self.data_file.clone(),
            engine,
            scope,
            outputs,
            custom_keys,
            paths: ArtifactPaths::under(&self.root, frontend_dirs),
            chart_font: self.chart_font.clone(),
        })
    }
}

// ── Option enums ───────────────────────────────────────────────────────────────

/// Table loading engine. Only CSV has an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Csv,
    Json,
    Db,
}

impl Engine {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Engine::Csv),
            "json" => Ok(Engine::Json),
            "db" => Ok(Engine::Db),
            other => Err(QstatsError::Config(format!("unknown engine: {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Csv => "csv",
            Engine::Json => "json",
            Engine::Db => "db",
        }
    }
}

/// Named policy selecting which subset of metrics each file receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisScope {
    Full,
    Basic,
    Custom,
}

impl AnalysisScope {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(AnalysisScope::Full),
            "basic" => Ok(AnalysisScope::Basic),
            "custom" => Ok(AnalysisScope::Custom),
            other => Err(QstatsError::Config(format!("unknown analysis scope: {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisScope::Full => "full",
            AnalysisScope::Basic => "basic",
            AnalysisScope::Custom => "custom",
        }
    }
}

impl std::fmt::Display for AnalysisScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact kinds the pipeline can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputKind {
    Json,
    Excel,
    Charts,
}

impl OutputKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputKind::Json),
            "excel" | "xlsx" => Ok(OutputKind::Excel),
            "charts" => Ok(OutputKind::Charts),
            other => Err(QstatsError::Config(format!("unknown output kind: {other}"))),
        }
    }
}

/// Keys exported by the custom scope when none are configured.
pub const DEFAULT_CUSTOM_KEYS: &[&str] = &["top_tags_distribution"];

// ── Paths ──────────────────────────────────────────────────────────────────────

/// Output directory layout for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub root: PathBuf,
    pub json_dir: PathBuf,
    pub charts_dir: PathBuf,
    pub xlsx_dir: PathBuf,
    /// Front-end asset directories receiving copies of the JSON targets.
    pub frontend_dirs: Vec<PathBuf>,
}

impl ArtifactPaths {
    /// Standard layout: `<project_root>/artifacts/{json,charts,xlsx}`.
    pub fn under(project_root: &Path, frontend_dirs: Vec<PathBuf>) -> Self {
        let root = project_root.join("artifacts");
        Self {
            json_dir: root.join("json"),
            charts_dir: root.join("charts"),
            xlsx_dir: root.join("xlsx"),
            root,
            frontend_dirs,
        }
    }

    /// `<project_root>/../front/{public/data, src/shared/data}`.
    pub fn default_frontend_dirs(project_root: &Path) -> Vec<PathBuf> {
        let front = project_root.join("..").join("front");
        vec![
            front.join("public").join("data"),
            front.join("src").join("shared").join("data"),
        ]
    }

    /// Every directory the pipeline may write into.
    pub fn all_dirs(&self) -> Vec<&Path> {
        let mut dirs = vec![
            self.root.as_path(),
            self.json_dir.as_path(),
            self.charts_dir.as_path(),
            self.xlsx_dir.as_path(),
        ];
        dirs.extend(self.frontend_dirs.iter().map(|p| p.as_path()));
        dirs
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Immutable configuration consumed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub data_file: PathBuf,
    pub engine: Engine,
    pub scope: AnalysisScope,
    pub outputs: BTreeSet<OutputKind>,
    pub custom_keys: Vec<String>,
    pub paths: ArtifactPaths,
    pub chart_font: Option<PathBuf>,
}

impl PipelineConfig {
    /// CSV engine, full scope, every output kind, no front-end copies.
    pub fn new(data_file: impl Into<PathBuf>, project_root: &Path) -> Self {
        Self {
            data_file: data_file.into(),
            engine: Engine::Csv,
            scope: AnalysisScope::Full,
            outputs: [OutputKind::Json, OutputKind::Excel, OutputKind::Charts]
                .into_iter()
                .collect(),
            custom_keys: DEFAULT_CUSTOM_KEYS.iter().map(|k| k.to_string()).collect(),
            paths: ArtifactPaths::under(project_root, Vec::new()),
            chart_font: None,
        }
    }

    pub fn wants(&self, kind: OutputKind) -> bool {
        self.outputs.contains(&kind)
    }
}
