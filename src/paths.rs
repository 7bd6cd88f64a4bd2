use anyhow::{Context, Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// File name of the default log file placed in the user's home directory.
const LOG_FILE_NAME: &str = ".git-onboard.log";

/// Well-known locations used by git-onboard outside of the project itself.
#[derive(Clone, Debug)]
pub struct Paths {
    pub ssh_dir: PathBuf,
    pub log_file: PathBuf,
}

/// Resolve the current user's home directory from `$HOME`.
///
/// Falls back to the current directory when `$HOME` is unset, so logging and
/// key lookup still have a deterministic place to go.
pub fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn paths() -> Paths {
    let home = home_dir();
    Paths {
        ssh_dir: home.join(".ssh"),
        log_file: home.join(LOG_FILE_NAME),
    }
}

/// Expand a leading `~` or `~/` against `home`.
fn expand_with(home: &Path, p: &Path) -> PathBuf {
    match p.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => p.to_path_buf(),
    }
}

/// Expand `~` in a user supplied path using `$HOME`.
pub fn expand_tilde(p: &Path) -> PathBuf {
    expand_with(&home_dir(), p)
}

/// Turn a user supplied project path into an absolute, existing directory.
///
/// # Errors
/// - The path does not exist or cannot be canonicalized.
/// - The path exists but is not a directory.
pub fn resolve_project_dir(p: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(p);
    let abs = fs::canonicalize(&expanded)
        .with_context(|| format!("project path not found: {}", expanded.display()))?;
    if !abs.is_dir() {
        bail!("project path is not a directory: {}", abs.display());
    }
    Ok(abs)
}
