//! Report rendering and persistence.
//!
//! Results arrive in completion order, which varies from run to run. The
//! renderer groups them by check name and sorts, so the displayed report is
//! stable for the same set of results.
//!
//! ## Example Output
//!
//! ```text
//! # Pre-commit check report
//!
//! | Check      | Status | Errors | Warnings |
//! | ---------- | ------ | ------ | -------- |
//! | TODO/FIXME | WARN   | 0      | 1        |
//! | ruff       | FAIL   | 1      | 0        |
//!
//! ## Details
//!
//! ### TODO/FIXME
//!
//! - WARN
//!     src/main.cpp:12: // TODO: handle EOF
//!   Fix: Resolve the marked items or move them to the issue tracker
//! ```

use crate::checker::{CheckResult, Status};
use crate::ui::Table;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Markdown-compatible text
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Per-name aggregate shown in the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub status: Status,
    pub errors: usize,
    pub warnings: usize,
}

/// Group results by name, alphabetically.
pub fn summarize(results: &[CheckResult]) -> BTreeMap<&str, Summary> {
    let mut map: BTreeMap<&str, Summary> = BTreeMap::new();
    for r in results {
        let entry = map.entry(r.name.as_str()).or_insert(Summary {
            status: r.status,
            errors: 0,
            warnings: 0,
        });
        if r.status.severity() > entry.status.severity() {
            entry.status = r.status;
        }
        match r.status {
            Status::Fail => entry.errors += 1,
            Status::Warn => entry.warnings += 1,
            Status::Pass | Status::Skip => {}
        }
    }
    map
}

/// Render results as the text report.
pub fn render(results: &[CheckResult]) -> String {
    let mut out = String::from("# Pre-commit check report\n\n");

    let mut table = Table::new(&["Check", "Status", "Errors", "Warnings"]);
    for (name, s) in summarize(results) {
        table.add_row(vec![
            name.to_string(),
            s.status.to_string(),
            s.errors.to_string(),
            s.warnings.to_string(),
        ]);
    }
    out.push_str(&table.render());

    let mut grouped: BTreeMap<&str, Vec<&CheckResult>> = BTreeMap::new();
    for r in results
        .iter()
        .filter(|r| matches!(r.status, Status::Fail | Status::Warn))
    {
        grouped.entry(r.name.as_str()).or_default().push(r);
    }

    if grouped.is_empty() {
        return out;
    }

    out.push_str("\n## Details\n");
    for (name, mut entries) in grouped {
        entries.sort_by(|a, b| {
            b.status
                .severity()
                .cmp(&a.status.severity())
                .then_with(|| a.detail.cmp(&b.detail))
        });

        out.push_str(&format!("\n### {}\n\n", name));
        for r in entries {
            out.push_str(&format!("- {}\n", r.status));
            for line in r.detail.lines() {
                out.push_str(&format!("    {}\n", line));
            }
            if let Some(fix) = &r.fix_suggestion {
                out.push_str(&format!("  Fix: {}\n", fix));
            }
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    passed: bool,
    results: Vec<CheckResult>,
}

impl Report {
    pub fn new(results: Vec<CheckResult>) -> Self {
        let passed = !results.iter().any(CheckResult::is_failure);
        Self { passed, results }
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn has_failures(&self) -> bool {
        !self.passed
    }

    pub fn count(&self, status: Status) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn render(&self) -> String {
        render(&self.results)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    /// Overwrite `path` with the report in `format`.
    pub fn write(&self, path: &Path, format: ReportFormat) -> Result<()> {
        let content = match format {
            ReportFormat::Text => self.render(),
            ReportFormat::Json => self.to_json()?,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}
