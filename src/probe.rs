//! Tool availability probe.
//!
//! Resolves each registered tool against the search path without spawning
//! anything. Checks consult the resulting [`ToolAvailability`] to decide
//! whether they may invoke their tool at all.

use crate::checker::CheckResult;
use crate::config::GateConfig;
use crate::error::CheckError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CLANG_FORMAT: &str = "clang-format";
pub const CLANG_TIDY: &str = "clang-tidy";
pub const BLACK: &str = "black";
pub const RUFF: &str = "ruff";
pub const MYPY: &str = "mypy";
pub const AUTOPEP8: &str = "autopep8";

/// Every tool the gate knows how to drive, in probe order.
pub const TOOLS: &[&str] = &[CLANG_FORMAT, CLANG_TIDY, BLACK, RUFF, MYPY, AUTOPEP8];

/// Split the `PATH` environment variable into entries.
pub fn env_search_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// First executable named `tool` in `search_path`.
pub fn resolve_tool_path(tool: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    let names: Vec<String> = if cfg!(windows) {
        vec![format!("{}.exe", tool), tool.to_string()]
    } else {
        vec![tool.to_string()]
    };

    search_path
        .iter()
        .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
        .find(|candidate| is_executable(candidate))
}

/// Outcome of probing every tool in [`TOOLS`].
#[derive(Debug, Clone, Default)]
pub struct ToolAvailability {
    tools: BTreeMap<String, Option<PathBuf>>,
}

impl ToolAvailability {
    pub fn probe(search_path: &[PathBuf]) -> Self {
        Self::probe_tools(TOOLS, search_path)
    }

    pub fn probe_tools(tools: &[&str], search_path: &[PathBuf]) -> Self {
        let tools = tools
            .iter()
            .map(|&tool| {
                let found = resolve_tool_path(tool, search_path);
                match &found {
                    Some(p) => tracing::debug!("{} -> {}", tool, p.display()),
                    None => tracing::debug!("{} not found", tool),
                }
                (tool.to_string(), found)
            })
            .collect();
        Self { tools }
    }

    pub fn is_available(&self, tool: &str) -> bool {
        matches!(self.tools.get(tool), Some(Some(_)))
    }

    /// Resolved path of `tool`, or [`CheckError::ToolUnavailable`].
    pub fn resolve(&self, tool: &str) -> Result<&Path, CheckError> {
        match self.tools.get(tool) {
            Some(Some(path)) => Ok(path.as_path()),
            _ => Err(CheckError::ToolUnavailable {
                tool: tool.to_string(),
            }),
        }
    }

    /// One result per probed tool. A missing tool is a FAIL unless the config
    /// lists it as optional.
    pub fn results(&self, config: &GateConfig) -> Vec<CheckResult> {
        self.tools
            .iter()
            .map(|(tool, path)| match path {
                Some(p) => CheckResult::pass(tool, p.display().to_string()),
                None if config.is_optional_tool(tool) => {
                    CheckResult::skip(tool, "not installed / not in PATH (optional)")
                }
                None => CheckResult::fail(tool, "not installed / not in PATH")
                    .with_fix(format!("Install {} and make sure it is on PATH", tool)),
            })
            .collect()
    }
}
