//! The pre-commit run: select files, probe tools, then run the formatters and
//! the analyzers as two joined parallel phases.

use crate::checker::{self, Aggregator, Check, CheckContext, CheckResult, Phase};
use crate::config::GateConfig;
use crate::error::CheckError;
use crate::probe::ToolAvailability;
use crate::report::Report;
use crate::selection::{self, FileSet, SelectionMode};
use anyhow::Result;
use git2::Repository;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct GateOptions {
    pub mode: SelectionMode,
    /// Overrides `jobs` from the config when set.
    pub jobs: Option<usize>,
    /// Directories searched for tools, normally `$PATH`.
    pub search_path: Vec<PathBuf>,
    pub show_progress: bool,
}

pub struct GateRun {
    pub files: FileSet,
    pub report: Report,
    pub elapsed: Duration,
}

/// Split checks into those that may run and SKIP results for those whose
/// tool is missing.
pub fn gate_checks<'c>(
    checks: impl IntoIterator<Item = &'c (dyn Check + 'static)>,
    tools: &ToolAvailability,
) -> (Vec<&'c dyn Check>, Vec<CheckResult>) {
    let mut runnable: Vec<&'c dyn Check> = Vec::new();
    let mut skipped = Vec::new();
    for check in checks {
        match check.tool().map(|t| tools.resolve(t)) {
            Some(Err(err @ CheckError::ToolUnavailable { .. })) => {
                tracing::debug!("{} gated: {}", check.name(), err);
                skipped.push(CheckResult::skip(check.name(), err.to_string()));
            }
            _ => runnable.push(check),
        }
    }
    (runnable, skipped)
}

fn phase_progress(phase: Phase, len: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(match phase {
        Phase::Format => "Formatting...",
        Phase::Analyze => "Analyzing...",
    });
    pb
}

/// Run `checks` against an already classified file set.
///
/// Formatters rewrite files in place, so the analyze phase only starts once
/// every formatter has finished.
pub fn run_checks(
    checks: &[Box<dyn Check>],
    root: &Path,
    files: &FileSet,
    config: &GateConfig,
    opts: &GateOptions,
) -> Result<Vec<CheckResult>> {
    let tools = ToolAvailability::probe(&opts.search_path);
    let mut results = tools.results(config);

    let ctx = CheckContext {
        root,
        files,
        tools: &tools,
        config,
    };
    let aggregator = Aggregator::new(opts.jobs.or(config.jobs))?;

    for phase in [Phase::Format, Phase::Analyze] {
        let (runnable, skipped) = gate_checks(
            checks
                .iter()
                .map(|c| c.as_ref())
                .filter(|c| c.phase() == phase),
            &tools,
        );
        results.extend(skipped);

        let pb = phase_progress(phase, runnable.len(), opts.show_progress);
        results.extend(aggregator.run_with_progress(&runnable, &ctx, &pb));
        pb.finish_and_clear();
    }

    Ok(results)
}

/// Full gate run over the repository's selected files.
pub fn run_gate(
    repo: &Repository,
    root: &Path,
    config: &GateConfig,
    opts: &GateOptions,
) -> Result<GateRun> {
    let start = Instant::now();

    let paths = selection::git_files(repo, opts.mode, &config.exclude)?;
    let files = FileSet::classify(root, paths, &config.extensions);
    tracing::debug!(
        "{} mode: {} file(s), {} C/C++, {} Python",
        opts.mode,
        files.all.len(),
        files.cpp.len(),
        files.python.len()
    );

    let results = run_checks(&checker::registry(), root, &files, config, opts)?;

    Ok(GateRun {
        files,
        report: Report::new(results),
        elapsed: start.elapsed(),
    })
}
