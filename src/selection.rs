//! File selection.
//!
//! Turns a [`SelectionMode`] into the list of repository-relative paths a run
//! targets, then routes them into language buckets for the external tools.
//!
//! | Mode     | Equivalent git command          |
//! |----------|---------------------------------|
//! | `tree`   | `git ls-files`                  |
//! | `edited` | `git diff HEAD --name-only`     |
//! | `staged` | `git diff --cached --name-only` |

use crate::config::ExtensionConfig;
use anyhow::{Context, Result};
use git2::{ErrorCode, Repository, Tree};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Every tracked file.
    Tree,
    /// Files changed relative to `HEAD`, staged or not.
    Edited,
    /// Files staged for the next commit.
    #[default]
    Staged,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionMode::Tree => "tree",
            SelectionMode::Edited => "edited",
            SelectionMode::Staged => "staged",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Cpp,
    Python,
}

/// Open the repository containing `start` and return it with its work tree.
pub fn open_repo(start: &Path) -> Result<(Repository, PathBuf)> {
    let repo = Repository::discover(start).with_context(|| {
        format!(
            "{} is not inside a git repository.\n\n\
            💡 Tip: run commitgate from your project checkout (or 'git init' first).",
            start.display()
        )
    })?;
    let root = repo
        .workdir()
        .context("Bare repositories have no files to check")?
        .to_path_buf();
    Ok((repo, root))
}

/// List repository-relative paths for `mode`, minus any whose file name is in
/// `exclude`. Order follows git's (path-sorted); duplicates are dropped.
pub fn git_files(repo: &Repository, mode: SelectionMode, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let raw = match mode {
        SelectionMode::Tree => {
            let index = repo.index().context("Failed to read git index")?;
            index
                .iter()
                .map(|entry| PathBuf::from(String::from_utf8_lossy(&entry.path).into_owned()))
                .collect()
        }
        SelectionMode::Edited => {
            let head = head_tree(repo)?;
            let diff = repo
                .diff_tree_to_workdir_with_index(head.as_ref(), None)
                .context("Failed to diff HEAD against the working tree")?;
            diff_paths(&diff)
        }
        SelectionMode::Staged => {
            let head = head_tree(repo)?;
            let index = repo.index().context("Failed to read git index")?;
            let diff = repo
                .diff_tree_to_index(head.as_ref(), Some(&index), None)
                .context("Failed to diff HEAD against the index")?;
            diff_paths(&diff)
        }
    };

    Ok(filter_excluded(raw, exclude))
}

/// `None` for an unborn branch, so a first commit diffs against nothing.
fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree().context("HEAD does not point at a tree")?)),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(e).context("Failed to resolve HEAD"),
    }
}

fn diff_paths(diff: &git2::Diff<'_>) -> Vec<PathBuf> {
    diff.deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(Path::to_path_buf)
        })
        .collect()
}

fn filter_excluded(paths: Vec<PathBuf>, exclude: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default();
            !exclude.iter().any(|e| *e == name)
        })
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Selected files that still exist on disk, split by language.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    pub all: Vec<PathBuf>,
    pub cpp: Vec<PathBuf>,
    pub python: Vec<PathBuf>,
}

impl FileSet {
    /// Bucket `paths` (relative to `root`) by extension. Paths that are gone
    /// from the working tree, e.g. deletions in a diff, are dropped.
    pub fn classify(root: &Path, paths: Vec<PathBuf>, extensions: &ExtensionConfig) -> Self {
        let mut set = FileSet::default();
        for path in paths {
            if !root.join(&path).is_file() {
                tracing::debug!("skipping {} (not on disk)", path.display());
                continue;
            }
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            if extensions.cpp.iter().any(|e| *e == ext) {
                set.cpp.push(path.clone());
            } else if extensions.python.iter().any(|e| *e == ext) {
                set.python.push(path.clone());
            }
            set.all.push(path);
        }
        set
    }

    pub fn bucket(&self, language: Language) -> &[PathBuf] {
        match language {
            Language::Cpp => &self.cpp,
            Language::Python => &self.python,
        }
    }

    /// C/C++ and Python files together, the input for the text scanners.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.cpp.iter().chain(&self.python).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
