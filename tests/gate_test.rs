//! End-to-end tests for a gate run over a scratch git repository.
//!
//! Tools are looked up in a private directory instead of `$PATH`, so the
//! results do not depend on what the host has installed.

use commitgate::checker::{CheckResult, SCRIPT_ERROR, Status};
use commitgate::config::GateConfig;
use commitgate::gate::{self, GateOptions};
use commitgate::probe::TOOLS;
use commitgate::selection::SelectionMode;
use git2::Repository;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Scratch {
    dir: TempDir,
    bin: TempDir,
    repo: Repository,
}

impl Scratch {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create repo dir");
        let bin = tempfile::tempdir().expect("Failed to create tool dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repo");
        Self { dir, bin, repo }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn stage(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(rel)).unwrap();
        index.write().unwrap();
    }

    #[cfg(unix)]
    fn tool(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.bin.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn run(&self, config: &GateConfig) -> Vec<CheckResult> {
        self.gate(config).report.results().to_vec()
    }

    fn gate(&self, config: &GateConfig) -> gate::GateRun {
        let opts = GateOptions {
            mode: SelectionMode::Staged,
            jobs: Some(4),
            search_path: vec![self.bin.path().to_path_buf()],
            show_progress: false,
        };
        gate::run_gate(&self.repo, self.root(), config, &opts).expect("gate run failed")
    }
}

fn find<'a>(results: &'a [CheckResult], name: &str) -> Vec<&'a CheckResult> {
    results.iter().filter(|r| r.name == name).collect()
}

fn permissive() -> GateConfig {
    GateConfig {
        optional_tools: TOOLS.iter().map(|t| t.to_string()).collect(),
        require_compile_db: false,
        ..GateConfig::default()
    }
}

#[test]
fn test_nothing_staged_only_probe_and_compile_db_decide() {
    let scratch = Scratch::new();
    let results = scratch.run(&GateConfig::default());

    let mut deciding: Vec<&str> = results
        .iter()
        .filter(|r| r.status != Status::Skip)
        .map(|r| r.name.as_str())
        .collect();
    deciding.sort();
    let mut expected: Vec<&str> = TOOLS.to_vec();
    expected.push("compile_commands.json");
    expected.sort();
    assert_eq!(deciding, expected);

    assert!(results.iter().all(|r| r.status != Status::Pass));
    assert!(results.iter().any(CheckResult::is_failure));
    assert!(find(&results, SCRIPT_ERROR).is_empty());
}

#[test]
fn test_nothing_staged_with_permissive_config_passes() {
    let scratch = Scratch::new();
    let results = scratch.run(&permissive());

    assert!(!results.iter().any(CheckResult::is_failure));
    // probe results, then one per registered check
    assert_eq!(results.len(), TOOLS.len() + 9);
}

#[test]
fn test_staged_sources_are_scanned() {
    let scratch = Scratch::new();
    scratch.stage("src/main.cpp", "int main() {\n  // TODO: parse args\n  return 0;\n}\n");
    scratch.stage(
        "tools/gen.py",
        "# SPDX-License-Identifier: MIT\nprint('ok')\n",
    );
    let results = scratch.run(&permissive());

    let markers = find(&results, "TODO/FIXME");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].status, Status::Warn);
    assert_eq!(markers[0].detail, "src/main.cpp:2: // TODO: parse args");

    let license = find(&results, "SPDX license header");
    assert_eq!(license[0].status, Status::Fail);
    assert_eq!(license[0].detail, "src/main.cpp");

    assert_eq!(find(&results, "Large file check")[0].status, Status::Pass);
    // no tools on the search path
    for tool in ["clang-tidy", "ruff", "mypy"] {
        assert!(find(&results, tool).iter().all(|r| r.status == Status::Skip));
    }
}

#[test]
fn test_helper_scripts_are_excluded_by_default() {
    let scratch = Scratch::new();
    scratch.stage("download_dep.py", "# TODO: no license here\n");
    scratch.stage("scripts/rebuild.py", "# FIXME\n");
    scratch.stage("src/main.c", "// SPDX-License-Identifier: MIT\nint main(void) { return 0; }\n");

    let run = scratch.gate(&permissive());
    assert!(!run.files.is_empty());
    assert_eq!(run.files.all, vec![PathBuf::from("src/main.c")]);
    assert!(run.files.python.is_empty());
    assert!(!run.report.has_failures());
    assert_eq!(find(run.report.results(), "TODO/FIXME")[0].status, Status::Pass);
}

#[test]
fn test_unstaged_files_are_ignored_in_staged_mode() {
    let scratch = Scratch::new();
    fs::write(scratch.root().join("loose.c"), "// FIXME\n").unwrap();
    let run = scratch.gate(&permissive());
    assert!(run.files.is_empty());
    let results = run.report.results();

    assert_eq!(find(results, "TODO/FIXME")[0].status, Status::Skip);
}

#[cfg(unix)]
#[test]
fn test_formatter_output_is_seen_by_scanners() {
    let scratch = Scratch::new();
    scratch.stage("lib.h", "#pragma once\n");
    // Prepends a license line to every file argument.
    scratch.tool(
        "clang-format",
        r#"for f in "$@"; do
  case "$f" in
    -*) ;;
    *) { printf '// SPDX-License-Identifier: MIT\n'; cat "$f"; } > "$f.tmp" && mv "$f.tmp" "$f" ;;
  esac
done"#,
    );
    let results = scratch.run(&permissive());

    let formatter: Vec<&CheckResult> = find(&results, "clang-format");
    assert!(formatter.iter().all(|r| r.status == Status::Pass));
    assert!(formatter.iter().any(|r| r.detail == "formatted 1 file(s)"));
    assert_eq!(find(&results, "SPDX license header")[0].status, Status::Pass);
}

#[cfg(unix)]
#[test]
fn test_failing_linter_output_is_captured() {
    let scratch = Scratch::new();
    scratch.stage("app.py", "# SPDX-License-Identifier: MIT\nimport os\n");
    scratch.tool("ruff", "echo \"app.py:2:8: F401 'os' imported but unused\"\nexit 1");
    let results = scratch.run(&permissive());

    let ruff: Vec<&CheckResult> = find(&results, "ruff")
        .into_iter()
        .filter(|r| r.status == Status::Fail)
        .collect();
    assert_eq!(ruff.len(), 1);
    assert!(ruff[0].detail.contains("F401 'os' imported but unused"));
    assert!(ruff[0].fix_suggestion.is_some());
}

#[test]
fn test_compile_db_is_located_under_build() {
    let scratch = Scratch::new();
    let build = scratch.root().join("build");
    fs::create_dir_all(&build).unwrap();
    fs::write(build.join("compile_commands.json"), "[]").unwrap();

    let results = scratch.run(&GateConfig::default());
    let db = find(&results, "compile_commands.json");
    assert_eq!(db[0].status, Status::Pass);
    assert_eq!(PathBuf::from(&db[0].detail), PathBuf::from("build/compile_commands.json"));
}
