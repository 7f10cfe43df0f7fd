//! Human-readable progress lines for a pipeline run.

use qstats_core::formatting::{banner, progress_bar};
use qstats_core::progress::ProgressObserver;
use tracing::info;

const BANNER_WIDTH: usize = 60;
const BAR_WIDTH: usize = 30;

/// Numbered step lines: `[2/6] Loading dataset`.
#[derive(Debug, Clone)]
pub struct StepLogger {
    current: usize,
    total: usize,
}

impl StepLogger {
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Advance one step and log it. Returns the logged line.
    pub fn step(&mut self, message: &str) -> String {
        self.current = (self.current + 1).min(self.total);
        let line = format!("[{}/{}] {}", self.current, self.total, message);
        info!("{}", line);
        line
    }

    pub fn current(&self) -> usize {
        self.current
    }
}

/// Logs each workbook sheet as a bar: `summary.xlsx [######----]  40.0% Writing 02_...`.
#[derive(Debug, Clone)]
pub struct BarProgress {
    prefix: String,
    last_line: Option<String>,
}

impl BarProgress {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_line: None,
        }
    }

    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }
}

impl ProgressObserver for BarProgress {
    fn on_step(&mut self, current: usize, total: usize, label: &str) {
        let line = format!(
            "{} {} {}",
            self.prefix,
            progress_bar(current, total, BAR_WIDTH),
            label
        );
        info!("{}", line);
        self.last_line = Some(line);
    }
}

/// Log `title` framed by `rule` lines.
pub fn log_banner(title: &str, rule: char) {
    for line in banner(title, rule, BANNER_WIDTH).lines() {
        info!("{}", line);
    }
}
