use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::paths::{expand_tilde, paths, resolve_project_dir};
use crate::prereq::{self, PackageManager};

pub const DEFAULT_MESSAGE: &str = "Initial commit";
pub const DEFAULT_BRANCH: &str = "main";

/// Defaults loaded from a config file.
///
/// Every key is optional. Example JSON:
/// ```json
/// {
///   "project": "~/work/app",
///   "message": "Initial import",
///   "branch": "main",
///   "remote_url": "git@github.com:me/app.git",
///   "package_manager": "apt"
/// }
/// ```
/// The same keys are accepted from YAML (`.yaml`/`.yml`) and TOML (`.toml`).
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub project: Option<PathBuf>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub package_manager: Option<String>,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub project: Option<PathBuf>,
    pub message: Option<String>,
    pub branch: Option<String>,
    pub remote_url: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project: PathBuf,
    pub message: String,
    pub branch: String,
    pub remote_url: Option<String>,
    pub package_manager: PackageManager,
    pub log_file: PathBuf,
    pub ssh_dir: PathBuf,
}

/// Load a config file, picking the format from its extension.
///
/// # Errors
/// - The file exists but cannot be read.
/// - The file cannot be parsed in the format its extension names.
///
/// # Notes
/// - A missing file or an unknown extension is a warning, not an error; the
///   run continues with built-in defaults.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let path = expand_tilde(path);
    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(FileConfig::default());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let txt = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;

    let cfg = match ext.as_str() {
        "json" => serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str::<Option<FileConfig>>(&txt)
            .with_context(|| format!("failed to parse {}", path.display()))?
            .unwrap_or_default(),
        "toml" => {
            toml::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))?
        }
        other => {
            warn!(path = %path.display(), extension = other, "unsupported config file extension");
            FileConfig::default()
        }
    };
    Ok(cfg)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Merge command line overrides, file config and built-in defaults.
///
/// Precedence is CLI > config file > defaults. The package manager comes
/// from the config file or is auto-detected.
///
/// # Errors
/// - The project path does not exist or is not a directory.
/// - The config names an unsupported package manager.
pub fn resolve(cli: Overrides, file: FileConfig) -> Result<Settings> {
    let p = paths();

    let project_raw = cli
        .project
        .or(file.project)
        .unwrap_or_else(|| PathBuf::from("."));
    let project = resolve_project_dir(&project_raw)?;

    let package_manager = match non_empty(file.package_manager) {
        Some(name) => name
            .parse::<PackageManager>()
            .context("invalid package_manager in config")?,
        None => prereq::detect(),
    };

    Ok(Settings {
        project,
        message: non_empty(cli.message)
            .or(non_empty(file.message))
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        branch: non_empty(cli.branch)
            .or(non_empty(file.branch))
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        remote_url: non_empty(cli.remote_url).or(non_empty(file.remote_url)),
        package_manager,
        log_file: cli
            .log_file
            .map(|l| expand_tilde(&l))
            .unwrap_or(p.log_file),
        ssh_dir: p.ssh_dir,
    })
}
