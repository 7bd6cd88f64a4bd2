use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::git2_backend;
use super::process::{Git, GitError, GitOutput};

/// Name used for the single remote git-onboard manages.
pub const REMOTE_NAME: &str = "origin";

/// A project directory driven through git subcommands.
///
/// Every mutation goes through the injected [`Git`] runner; the only direct
/// filesystem read is the metadata check in [`LocalRepo::is_initialized`].
pub struct LocalRepo<'g, G: Git + ?Sized> {
    root: PathBuf,
    git: &'g G,
}

impl<'g, G: Git + ?Sized> LocalRepo<'g, G> {
    pub fn new(root: impl Into<PathBuf>, git: &'g G) -> Self {
        Self {
            root: root.into(),
            git,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        self.git.run(Some(&self.root), args)
    }

    pub fn is_initialized(&self) -> bool {
        git2_backend::is_repository(&self.root)
    }

    /// Run `git init` and point the unborn HEAD at `branch`.
    ///
    /// Failing to set the branch name keeps git's own default and is only a
    /// warning.
    pub fn init(&self, branch: &str) -> Result<(), GitError> {
        self.git(&["init"])?;
        let head = format!("refs/heads/{}", branch);
        if let Err(e) = self.git(&["symbolic-ref", "HEAD", &head]) {
            warn!(branch, error = %e, "could not set default branch, keeping git's default");
        }
        info!(root = %self.root.display(), branch, "initialized repository");
        Ok(())
    }

    /// Stage a single path.
    pub fn add(&self, path: &str) -> Result<(), GitError> {
        self.git(&["add", "--", path]).map(|_| ())
    }

    /// Stage the whole working tree.
    pub fn add_all(&self) -> Result<(), GitError> {
        self.git(&["add", "."]).map(|_| ())
    }

    /// Paths currently staged for commit.
    pub fn staged_files(&self) -> Result<Vec<String>, GitError> {
        let out = self.git(&["diff", "--cached", "--name-only"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.git(&["commit", "-m", message]).map(|_| ())
    }

    pub fn has_commits(&self) -> bool {
        self.git(&["rev-parse", "--verify", "HEAD"]).is_ok()
    }

    /// Current branch name, or `None` on a detached HEAD.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let out = self.git(&["branch", "--show-current"])?;
        Ok(out.lines().next().map(str::to_string))
    }

    /// Force-rename the current branch.
    pub fn rename_branch(&self, name: &str) -> Result<(), GitError> {
        self.git(&["branch", "-M", name]).map(|_| ())
    }

    /// Create `name` from the current branch and switch to it.
    pub fn create_and_checkout(&self, name: &str) -> Result<(), GitError> {
        self.git(&["branch", name])?;
        self.git(&["checkout", name]).map(|_| ())
    }

    /// Point `origin` at `url`, adding the remote if it does not exist yet.
    pub fn set_remote(&self, url: &str) -> Result<(), GitError> {
        match self.git(&["remote", "add", REMOTE_NAME, url]) {
            Ok(_) => Ok(()),
            Err(add_err) => {
                warn!(error = %add_err, "remote add failed, trying set-url");
                self.git(&["remote", "set-url", REMOTE_NAME, url]).map(|_| ())
            }
        }
    }

    pub fn push(&self, branch: &str, force: bool) -> Result<(), GitError> {
        let mut args = vec!["push", "-u", REMOTE_NAME, branch];
        if force {
            args.push("--force");
        }
        self.git(&args).map(|_| ())
    }

    /// Fetch and merge the remote branch, tolerating unrelated histories.
    ///
    /// The merge mode is explicit: git refuses to reconcile diverged
    /// histories when `pull.rebase` is unset.
    pub fn pull(&self, branch: &str) -> Result<(), GitError> {
        self.git(&[
            "pull",
            "--no-edit",
            "--no-rebase",
            "--allow-unrelated-histories",
            REMOTE_NAME,
            branch,
        ])
        .map(|_| ())
    }
}

/// Shallow-clone `url` into `dest` (which must be empty or absent).
pub fn clone_shallow<G: Git + ?Sized>(git: &G, url: &str, dest: &Path) -> Result<(), GitError> {
    let dest = dest.to_string_lossy();
    git.run(None, &["clone", "--depth", "1", "--quiet", url, &dest])
        .map(|_| ())
}
