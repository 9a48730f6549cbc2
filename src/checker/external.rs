//! Formatters and linters run as subprocesses.
//!
//! Every check here follows the same contract: no input files or no tool
//! means SKIP, exit code 0 means PASS, anything else is a FAIL carrying the
//! tool's output verbatim.

use super::{Check, CheckContext, CheckResult, Phase};
use crate::error::CheckError;
use crate::probe::{BLACK, CLANG_FORMAT, CLANG_TIDY, MYPY, RUFF};
use crate::selection::Language;
use std::path::{Path, PathBuf};
use std::process::Command;

const COMPILE_DB_HINT: &str = "Generate it with `cmake -B build -DCMAKE_EXPORT_COMPILE_COMMANDS=ON` \
     (or `bear -- make`), or list its location under `compile_db` in commitgate.toml";

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Non-empty streams, stdout first.
    pub fn combined(&self) -> String {
        join_streams(&self.stdout, &self.stderr)
    }
}

fn join_streams(stdout: &str, stderr: &str) -> String {
    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run `program [args] files...` from `cwd`.
///
/// A nonzero exit is reported as [`CheckError::ToolInvocationFailed`] with the
/// captured output.
pub fn run_tool(
    program: &Path,
    tool: &str,
    args: &[String],
    files: &[PathBuf],
    cwd: &Path,
) -> Result<ToolOutput, CheckError> {
    tracing::debug!("{} {} ({} files)", tool, args.join(" "), files.len());

    let output = Command::new(program)
        .args(args)
        .args(files)
        .current_dir(cwd)
        .output()
        .map_err(|source| CheckError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        Ok(ToolOutput { stdout, stderr })
    } else {
        Err(CheckError::ToolInvocationFailed {
            tool: tool.to_string(),
            code: output.status.code(),
            output: join_streams(&stdout, &stderr),
        })
    }
}

/// Map a tool run onto a result. Spawn and read failures stay errors so the
/// runner reports them as faults.
fn settle(
    name: &str,
    outcome: Result<ToolOutput, CheckError>,
    pass_detail: String,
    fix: &str,
) -> anyhow::Result<CheckResult> {
    match outcome {
        Ok(out) => {
            let extra = out.combined();
            if extra.is_empty() {
                Ok(CheckResult::pass(name, pass_detail))
            } else {
                Ok(CheckResult::pass(name, format!("{}\n{}", pass_detail, extra)))
            }
        }
        Err(err @ CheckError::ToolInvocationFailed { .. }) => {
            let detail = match &err {
                CheckError::ToolInvocationFailed { output, .. } if !output.is_empty() => {
                    output.clone()
                }
                _ => err.to_string(),
            };
            Ok(CheckResult::fail(name, detail).with_fix(fix))
        }
        Err(CheckError::ToolUnavailable { tool }) => Ok(CheckResult::skip(
            name,
            format!("{} is not installed or not in PATH", tool),
        )),
        Err(CheckError::PrerequisiteMissing { what, hint }) => {
            Ok(CheckResult::fail(name, format!("{} not found", what)).with_fix(hint))
        }
        Err(err) => Err(err.into()),
    }
}

/// A plain `tool [flags] file...` invocation over one language bucket.
#[derive(Debug, Clone)]
pub struct ToolCheck {
    name: &'static str,
    tool: &'static str,
    phase: Phase,
    language: Language,
    args: &'static [&'static str],
    verb: &'static str,
    fix: &'static str,
}

impl ToolCheck {
    pub fn clang_format() -> Self {
        Self {
            name: CLANG_FORMAT,
            tool: CLANG_FORMAT,
            phase: Phase::Format,
            language: Language::Cpp,
            args: &["-i", "-style=file"],
            verb: "formatted",
            fix: "Fix the reported clang-format errors (is .clang-format valid?) and re-stage",
        }
    }

    pub fn black() -> Self {
        Self {
            name: BLACK,
            tool: BLACK,
            phase: Phase::Format,
            language: Language::Python,
            args: &["--quiet"],
            verb: "formatted",
            fix: "Fix the syntax errors black reported, then re-stage",
        }
    }

    pub fn ruff() -> Self {
        Self {
            name: RUFF,
            tool: RUFF,
            phase: Phase::Analyze,
            language: Language::Python,
            args: &["check"],
            verb: "checked",
            fix: "Run `ruff check --fix` and address the remaining findings",
        }
    }

    pub fn mypy() -> Self {
        Self {
            name: MYPY,
            tool: MYPY,
            phase: Phase::Analyze,
            language: Language::Python,
            args: &["--strict"],
            verb: "type-checked",
            fix: "Add or correct type annotations until `mypy --strict` passes",
        }
    }
}

impl Check for ToolCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn tool(&self) -> Option<&str> {
        Some(self.tool)
    }

    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult> {
        let files = ctx.files.bucket(self.language);
        if files.is_empty() {
            return Ok(CheckResult::skip(self.name, "no matching files"));
        }

        let outcome = ctx.tools.resolve(self.tool).and_then(|program| {
            let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
            run_tool(program, self.tool, &args, files, ctx.root)
        });

        settle(
            self.name,
            outcome,
            format!("{} {} file(s)", self.verb, files.len()),
            self.fix,
        )
    }
}

/// First candidate (relative to `root`) that exists as a file.
pub fn find_compile_db(root: &Path, candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|c| root.join(c).is_file())
        .cloned()
}

/// Directory to hand to `clang-tidy -p`.
fn compile_db_dir(db: &Path) -> PathBuf {
    match db.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `clang-tidy` over C/C++ files, driven by the compilation database.
#[derive(Debug, Clone, Copy)]
pub struct ClangTidyCheck;

impl Check for ClangTidyCheck {
    fn name(&self) -> &str {
        CLANG_TIDY
    }

    fn tool(&self) -> Option<&str> {
        Some(CLANG_TIDY)
    }

    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult> {
        let files = ctx.files.bucket(Language::Cpp);
        if files.is_empty() {
            return Ok(CheckResult::skip(CLANG_TIDY, "no matching files"));
        }

        let outcome = ctx.tools.resolve(CLANG_TIDY).and_then(|program| {
            let db = find_compile_db(ctx.root, &ctx.config.compile_db).ok_or_else(|| {
                CheckError::PrerequisiteMissing {
                    what: "compile_commands.json".to_string(),
                    hint: COMPILE_DB_HINT.to_string(),
                }
            })?;
            let tidy = &ctx.config.clang_tidy;
            let args = vec![
                "-quiet".to_string(),
                format!("-checks={}", tidy.checks),
                format!("-warnings-as-errors={}", tidy.warnings_as_errors),
                "-p".to_string(),
                compile_db_dir(&db).display().to_string(),
            ];
            run_tool(program, CLANG_TIDY, &args, files, ctx.root)
        });

        settle(
            CLANG_TIDY,
            outcome,
            format!("analyzed {} file(s)", files.len()),
            "Fix the reported diagnostics; warnings in the error set block the commit",
        )
    }
}

/// Reports whether a compilation database is present, regardless of which
/// files were selected.
#[derive(Debug, Clone, Copy)]
pub struct CompileDbCheck;

pub const COMPILE_DB_CHECK: &str = "compile_commands.json";

impl Check for CompileDbCheck {
    fn name(&self) -> &str {
        COMPILE_DB_CHECK
    }

    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult> {
        match find_compile_db(ctx.root, &ctx.config.compile_db) {
            Some(db) => Ok(CheckResult::pass(COMPILE_DB_CHECK, db.display().to_string())),
            None if ctx.config.require_compile_db => {
                Ok(CheckResult::fail(COMPILE_DB_CHECK, "not found").with_fix(COMPILE_DB_HINT))
            }
            None => Ok(CheckResult::skip(COMPILE_DB_CHECK, "not found (not required)")),
        }
    }
}
