//! Check-level error taxonomy.
//!
//! Errors here never escape a check: each variant is either mapped onto a
//! [`CheckResult`](crate::checker::CheckResult) by the check that produced it,
//! or caught by the runner and turned into a `Script Error` result.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    /// The tool could not be found on the search path.
    #[error("{tool} is not installed or not in PATH")]
    ToolUnavailable { tool: String },

    /// The tool ran and exited with a nonzero status.
    #[error("{tool} exited with {}", describe_code(.code))]
    ToolInvocationFailed {
        tool: String,
        code: Option<i32>,
        output: String,
    },

    /// Something the check needs (e.g. a compilation database) is missing.
    #[error("{what} not found")]
    PrerequisiteMissing { what: String, hint: String },

    /// The tool was located but the process could not be started.
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// A file selected for scanning could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
