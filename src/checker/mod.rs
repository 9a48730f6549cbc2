//! Checks and their results.
//!
//! A check is one independent unit of verification or formatting. It sees the
//! selected files, the probed tools and the configuration through a
//! [`CheckContext`], and produces exactly one [`CheckResult`].
//!
//! ## Submodules
//!
//! - [`external`] - formatters and linters driven as subprocesses
//! - [`scan`] - built-in text and size scanners
//! - [`runner`] - the parallel aggregator

pub mod external;
pub mod runner;
pub mod scan;

use crate::config::GateConfig;
use crate::probe::ToolAvailability;
use crate::selection::FileSet;
use serde::Serialize;
use std::fmt;
use std::path::Path;

pub use runner::{Aggregator, SCRIPT_ERROR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Warn,
    Fail,
    Skip,
}

impl Status {
    /// Ranking used when several results share a name: FAIL > WARN > PASS > SKIP.
    pub fn severity(self) -> u8 {
        match self {
            Status::Skip => 0,
            Status::Pass => 1,
            Status::Warn => 2,
            Status::Fail => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
            Status::Skip => "SKIP",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: Status,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_suggestion: Option<String>,
}

// The remediation hint is presentation only.
impl PartialEq for CheckResult {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.status == other.status && self.detail == other.detail
    }
}

impl Eq for CheckResult {}

impl CheckResult {
    pub fn new(name: impl Into<String>, status: Status, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
            fix_suggestion: None,
        }
    }

    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Status::Pass, detail)
    }

    pub fn warn(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Status::Warn, detail)
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Status::Fail, detail)
    }

    pub fn skip(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Status::Skip, detail)
    }

    pub fn with_fix(mut self, hint: impl Into<String>) -> Self {
        self.fix_suggestion = Some(hint.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == Status::Fail
    }
}

/// Checks in [`Phase::Format`] rewrite files in place and are joined before
/// any [`Phase::Analyze`] check starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Format,
    Analyze,
}

/// Read-only inputs shared by every check in a run.
pub struct CheckContext<'a> {
    /// Repository work tree; file paths are relative to it.
    pub root: &'a Path,
    pub files: &'a FileSet,
    pub tools: &'a ToolAvailability,
    pub config: &'a GateConfig,
}

pub trait Check: Send + Sync {
    fn name(&self) -> &str;

    fn phase(&self) -> Phase {
        Phase::Analyze
    }

    /// Tool the check drives, if any. Checks whose tool was not found are
    /// skipped at schedule time.
    fn tool(&self) -> Option<&str> {
        None
    }

    /// Run the check. Expected outcomes, including tool failures, come back as
    /// `Ok`; an `Err` is an unexpected fault and becomes a `Script Error`.
    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult>;
}

type CheckFn = dyn Fn(&CheckContext<'_>) -> anyhow::Result<CheckResult> + Send + Sync;

/// A check backed by a closure, for ad-hoc or project-local checks.
pub struct FnCheck {
    name: String,
    phase: Phase,
    f: Box<CheckFn>,
}

impl FnCheck {
    pub fn new<F>(name: impl Into<String>, phase: Phase, f: F) -> Self
    where
        F: Fn(&CheckContext<'_>) -> anyhow::Result<CheckResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            phase,
            f: Box::new(f),
        }
    }
}

impl Check for FnCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult> {
        (self.f)(ctx)
    }
}

/// The full, environment-independent list of checks.
///
/// Which of them actually run is decided later from the probe results.
pub fn registry() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(external::ToolCheck::clang_format()),
        Box::new(external::ToolCheck::black()),
        Box::new(external::ClangTidyCheck),
        Box::new(external::ToolCheck::ruff()),
        Box::new(external::ToolCheck::mypy()),
        Box::new(external::CompileDbCheck),
        Box::new(scan::MarkerScan),
        Box::new(scan::LicenseScan),
        Box::new(scan::LargeFileScan),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_fix_suggestion() {
        let a = CheckResult::fail("ruff", "E501").with_fix("run ruff --fix");
        let b = CheckResult::fail("ruff", "E501");
        assert_eq!(a, b);
        assert_ne!(a, CheckResult::warn("ruff", "E501"));
    }

    #[test]
    fn test_severity_ranking() {
        assert!(Status::Fail.severity() > Status::Warn.severity());
        assert!(Status::Warn.severity() > Status::Pass.severity());
        assert!(Status::Pass.severity() > Status::Skip.severity());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&CheckResult::skip("mypy", "")).unwrap();
        assert!(json.contains("\"status\":\"SKIP\""));
        assert!(!json.contains("fix_suggestion"));
    }

    #[test]
    fn test_registry_phases() {
        let checks = registry();
        let formatters: Vec<&str> = checks
            .iter()
            .filter(|c| c.phase() == Phase::Format)
            .map(|c| c.name())
            .collect();
        assert_eq!(formatters, vec!["clang-format", "black"]);
        assert_eq!(checks.len(), 9);
    }
}
