//! Built-in scanners that need no external tool.

use super::{Check, CheckContext, CheckResult};
use crate::error::CheckError;
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};

pub const MARKER_CHECK: &str = "TODO/FIXME";
pub const LICENSE_CHECK: &str = "SPDX license header";
pub const LARGE_FILE_CHECK: &str = "Large file check";

/// Case-insensitive, whole-word alternation of `words`. Blank words are
/// ignored; with none left the pattern matches nothing.
pub fn marker_regex(words: &[String]) -> Result<Regex, regex::Error> {
    let words: Vec<&str> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Regex::new(r"[^\s\S]");
    }
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .case_insensitive(true)
        .build()
}

/// `(line number, trimmed line)` for every line matching `pattern`.
pub fn scan_markers(text: &str, pattern: &Regex) -> Vec<(usize, String)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(i, line)| (i + 1, line.trim().to_string()))
        .collect()
}

/// Whether one of the first `lines` lines matches `pattern`.
pub fn has_license_header(text: &str, pattern: &Regex, lines: usize) -> bool {
    text.lines().take(lines).any(|l| pattern.is_match(l))
}

/// Read a file as text, replacing invalid UTF-8.
fn read_lossy(root: &Path, path: &Path) -> Result<String, CheckError> {
    let bytes = fs::read(root.join(path)).map_err(|source| CheckError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Size with a binary unit, two decimals above bytes.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

/// Flags leftover TODO/FIXME/BUG markers. Never blocks.
#[derive(Debug, Clone, Copy)]
pub struct MarkerScan;

impl Check for MarkerScan {
    fn name(&self) -> &str {
        MARKER_CHECK
    }

    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult> {
        let files = ctx.files.sources();
        if files.is_empty() {
            return Ok(CheckResult::skip(MARKER_CHECK, "no source files"));
        }
        if ctx.config.markers.iter().all(|m| m.trim().is_empty()) {
            return Ok(CheckResult::skip(MARKER_CHECK, "no markers configured"));
        }

        let pattern = marker_regex(&ctx.config.markers)?;
        let per_file = files
            .par_iter()
            .map(|path| -> Result<Vec<String>, CheckError> {
                let text = read_lossy(ctx.root, path)?;
                Ok(scan_markers(&text, &pattern)
                    .into_iter()
                    .map(|(line, content)| format!("{}:{}: {}", path.display(), line, content))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, CheckError>>()?;

        let issues: Vec<String> = per_file.into_iter().flatten().collect();
        if issues.is_empty() {
            Ok(CheckResult::pass(
                MARKER_CHECK,
                format!("no markers in {} file(s)", files.len()),
            ))
        } else {
            Ok(CheckResult::warn(MARKER_CHECK, issues.join("\n"))
                .with_fix("Resolve the marked items or move them to the issue tracker"))
        }
    }
}

/// Requires the license identifier near the top of every source file.
#[derive(Debug, Clone, Copy)]
pub struct LicenseScan;

impl Check for LicenseScan {
    fn name(&self) -> &str {
        LICENSE_CHECK
    }

    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult> {
        let files = ctx.files.sources();
        if files.is_empty() {
            return Ok(CheckResult::skip(LICENSE_CHECK, "no source files"));
        }

        let config = ctx.config;
        let pattern = RegexBuilder::new(&regex::escape(&config.license_pattern))
            .case_insensitive(true)
            .build()?;

        let missing = files
            .par_iter()
            .map(|path| -> Result<Option<PathBuf>, CheckError> {
                let text = read_lossy(ctx.root, path)?;
                Ok((!has_license_header(&text, &pattern, config.license_lines)).then(|| path.clone()))
            })
            .collect::<Result<Vec<Option<PathBuf>>, CheckError>>()?;
        let missing: Vec<String> = missing
            .into_iter()
            .flatten()
            .map(|p| p.display().to_string())
            .collect();

        if missing.is_empty() {
            Ok(CheckResult::pass(
                LICENSE_CHECK,
                format!("{} file(s) carry a header", files.len()),
            ))
        } else {
            Ok(CheckResult::fail(LICENSE_CHECK, missing.join("\n")).with_fix(format!(
                "Add a `{} <license>` comment within the first {} lines",
                config.license_pattern, config.license_lines
            )))
        }
    }
}

/// Blocks files above the size threshold from being committed directly.
#[derive(Debug, Clone, Copy)]
pub struct LargeFileScan;

impl Check for LargeFileScan {
    fn name(&self) -> &str {
        LARGE_FILE_CHECK
    }

    fn run(&self, ctx: &CheckContext<'_>) -> anyhow::Result<CheckResult> {
        let files = &ctx.files.all;
        if files.is_empty() {
            return Ok(CheckResult::skip(LARGE_FILE_CHECK, "no files selected"));
        }

        let threshold = ctx.config.large_file_threshold;
        let mut offenders = Vec::new();
        for path in files {
            let size = fs::metadata(ctx.root.join(path))
                .map_err(|source| CheckError::Read {
                    path: path.clone(),
                    source,
                })?
                .len();
            if size > threshold {
                offenders.push(format!("{} ({})", path.display(), human_size(size)));
            }
        }

        if offenders.is_empty() {
            Ok(CheckResult::pass(
                LARGE_FILE_CHECK,
                format!("{} file(s) under {}", files.len(), human_size(threshold)),
            ))
        } else {
            Ok(CheckResult::fail(LARGE_FILE_CHECK, offenders.join("\n"))
                .with_fix("Track large binaries with Git LFS (`git lfs track \"<pattern>\"`)"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Status;
    use crate::config::GateConfig;
    use crate::probe::ToolAvailability;
    use crate::selection::FileSet;

    struct Fixture {
        dir: tempfile::TempDir,
        files: FileSet,
        tools: ToolAvailability,
        config: GateConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                files: FileSet::default(),
                tools: ToolAvailability::default(),
                config: GateConfig::default(),
            }
        }

        fn source(&mut self, name: &str, content: &str) {
            fs::write(self.dir.path().join(name), content).unwrap();
            self.files.cpp.push(PathBuf::from(name));
            self.files.all.push(PathBuf::from(name));
        }

        fn run(&self, check: &dyn Check) -> CheckResult {
            let ctx = CheckContext {
                root: self.dir.path(),
                files: &self.files,
                tools: &self.tools,
                config: &self.config,
            };
            check.run(&ctx).unwrap()
        }
    }

    #[test]
    fn test_marker_itemized_as_path_line_content() {
        let mut fx = Fixture::new();
        fx.source("a.cpp", "int x;\n  // TODO: fix\n");

        let result = fx.run(&MarkerScan);
        assert_eq!(result.status, Status::Warn);
        assert_eq!(result.detail, "a.cpp:2: // TODO: fix");
    }

    #[test]
    fn test_marker_is_case_insensitive_whole_word() {
        let pattern = marker_regex(&GateConfig::default().markers).unwrap();
        assert!(pattern.is_match("# fixme later"));
        assert!(pattern.is_match("/* Bug: off by one */"));
        assert!(!pattern.is_match("let debugger = 1;"));
        assert!(!pattern.is_match("TODOS"));
    }

    #[test]
    fn test_marker_scan_skips_without_markers() {
        let mut fx = Fixture::new();
        fx.source("a.cpp", "int main() {\n  return 0; // TODO\n}\n");
        fx.config.markers = Vec::new();

        let result = fx.run(&MarkerScan);
        assert_eq!(result.status, Status::Skip);
        assert_eq!(result.detail, "no markers configured");

        fx.config.markers = vec!["  ".to_string()];
        assert_eq!(fx.run(&MarkerScan).status, Status::Skip);
    }

    #[test]
    fn test_empty_marker_list_matches_nothing() {
        let pattern = marker_regex(&[]).unwrap();
        assert!(scan_markers("int main() {\n  return 0;\n}\n", &pattern).is_empty());
        let pattern = marker_regex(&["".to_string(), "TODO".to_string()]).unwrap();
        assert_eq!(scan_markers("x\n// todo\n", &pattern), vec![(2, "// todo".to_string())]);
    }

    #[test]
    fn test_marker_tolerates_invalid_utf8() {
        let mut fx = Fixture::new();
        fx.source("a.c", "");
        fs::write(fx.dir.path().join("a.c"), b"\xff\xfe\n// FIXME bad bytes\n").unwrap();

        let result = fx.run(&MarkerScan);
        assert_eq!(result.status, Status::Warn);
        assert_eq!(result.detail, "a.c:2: // FIXME bad bytes");
    }

    #[test]
    fn test_clean_sources_pass() {
        let mut fx = Fixture::new();
        fx.source(
            "a.cpp",
            "// SPDX-License-Identifier: MIT\nint main() { return 0; }\n",
        );

        assert_eq!(fx.run(&MarkerScan).status, Status::Pass);
        assert_eq!(fx.run(&LicenseScan).status, Status::Pass);
    }

    #[test]
    fn test_license_only_first_five_lines_count() {
        let mut fx = Fixture::new();
        fx.source("ok.h", "\n\n\n\n// spdx-license-identifier: Apache-2.0\n");
        fx.source("late.h", "\n\n\n\n\n// SPDX-License-Identifier: MIT\n");
        fx.source("none.h", "#pragma once\n");

        let result = fx.run(&LicenseScan);
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.detail, "late.h\nnone.h");
    }

    #[test]
    fn test_large_file_threshold_is_strict() {
        let mut fx = Fixture::new();
        let limit = fx.config.large_file_threshold as usize;
        fx.source("exact.bin", "");
        fx.source("over.bin", "");
        fs::write(fx.dir.path().join("exact.bin"), vec![0u8; limit]).unwrap();
        fs::write(fx.dir.path().join("over.bin"), vec![0u8; limit + 1]).unwrap();

        let result = fx.run(&LargeFileScan);
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.detail, "over.bin (5.00 MiB)");
        assert!(result.fix_suggestion.unwrap().contains("Git LFS"));
    }

    #[test]
    fn test_scanners_skip_empty_input() {
        let fx = Fixture::new();
        for check in [&MarkerScan as &dyn Check, &LicenseScan, &LargeFileScan] {
            assert_eq!(fx.run(check).status, Status::Skip);
        }
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.00 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.00 MiB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }
}
