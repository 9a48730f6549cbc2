use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-repository configuration file.
pub const CONFIG_FILE: &str = "commitgate.toml";

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// File names skipped wherever they live in the tree. Defaults to the
    /// repository's own helper scripts.
    pub exclude: Vec<String>,
    /// Worker pool size; `None` uses the host's available parallelism.
    pub jobs: Option<usize>,
    pub report: PathBuf,
    pub markers: Vec<String>,
    pub license_pattern: String,
    pub license_lines: usize,
    pub large_file_threshold: u64,
    pub compile_db: Vec<PathBuf>,
    pub require_compile_db: bool,
    /// Tools whose absence is reported as SKIP instead of FAIL.
    pub optional_tools: Vec<String>,
    pub clang_tidy: ClangTidyConfig,
    pub extensions: ExtensionConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ClangTidyConfig {
    pub checks: String,
    pub warnings_as_errors: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionConfig {
    pub cpp: Vec<String>,
    pub python: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            exclude: vec!["download_dep.py".into(), "rebuild.py".into()],
            jobs: None,
            report: PathBuf::from("check_result.md"),
            markers: vec!["TODO".into(), "FIXME".into(), "BUG".into()],
            license_pattern: "SPDX-License-Identifier:".to_string(),
            license_lines: 5,
            large_file_threshold: 5 * 1024 * 1024,
            compile_db: vec![
                PathBuf::from("compile_commands.json"),
                PathBuf::from("build/compile_commands.json"),
            ],
            require_compile_db: true,
            optional_tools: Vec::new(),
            clang_tidy: ClangTidyConfig::default(),
            extensions: ExtensionConfig::default(),
        }
    }
}

impl Default for ClangTidyConfig {
    fn default() -> Self {
        Self {
            checks: "-*,clang-analyzer-*,bugprone-*,modernize-*,performance-*".to_string(),
            warnings_as_errors: "clang-analyzer-*,bugprone-*".to_string(),
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            cpp: ["c", "cc", "cpp", "h", "hpp"].map(String::from).to_vec(),
            python: vec!["py".to_string()],
        }
    }
}

impl GateConfig {
    pub fn is_optional_tool(&self, tool: &str) -> bool {
        self.optional_tools.iter().any(|t| t == tool)
    }
}

/// Parse a configuration file.
pub fn load_config_file(path: &Path) -> Result<GateConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse {} - check for unknown keys or syntax errors",
            path.display()
        )
    })
}

/// Resolve the configuration for a repository rooted at `root`.
///
/// Lookup order: the explicit path (which must exist), `commitgate.toml` in the
/// repository root, the user-level `commitgate/config.toml`, then defaults.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<GateConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }
        return load_config_file(path);
    }

    let repo_config = root.join(CONFIG_FILE);
    if repo_config.is_file() {
        tracing::debug!("using repository config {}", repo_config.display());
        return load_config_file(&repo_config);
    }

    if let Some(user_config) = user_config_path()
        && user_config.is_file()
    {
        tracing::debug!("using user config {}", user_config.display());
        return load_config_file(&user_config);
    }

    tracing::debug!("no config file found, using defaults");
    Ok(GateConfig::default())
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("commitgate").join("config.toml"))
}
