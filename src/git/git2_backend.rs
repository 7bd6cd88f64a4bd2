use anyhow::{Context, Result};
use git2::Repository;
use std::collections::BTreeSet;
use std::path::Path;

/// Whether `root` holds its own, openable repository metadata directory.
///
/// A `.git` entry that git2 cannot open (empty directory, stray file) does
/// not count, and neither does a parent repository further up the tree.
pub fn is_repository(root: &Path) -> bool {
    let meta = root.join(".git");
    if !meta.is_dir() {
        return false;
    }
    Repository::open(root).is_ok()
}

/// Whether the repository at `root` has at least one commit on HEAD.
pub fn has_commits(root: &Path) -> bool {
    let Ok(repo) = Repository::open(root) else {
        return false;
    };
    repo.head()
        .ok()
        .and_then(|h| h.peel_to_commit().ok())
        .is_some()
}

/// Branch HEAD points at, even when the branch is unborn.
///
/// A fresh clone of an empty remote still has `HEAD -> refs/heads/<name>`,
/// so this reads the symbolic target instead of resolving a commit.
pub fn head_branch(root: &Path) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let head = repo.find_reference("HEAD").ok()?;
    head.symbolic_target()
        .and_then(|t| t.strip_prefix("refs/heads/"))
        .map(str::to_string)
}

/// Paths tracked in the repository's index, relative and `/`-separated.
///
/// This is the authoritative file list of a clone: it never contains the
/// metadata directory and ignores untracked files lying around the worktree.
///
/// # Errors
/// Returns an error if the repository or its index cannot be opened.
pub fn tracked_files(root: &Path) -> Result<BTreeSet<String>> {
    let repo = Repository::open(root)
        .with_context(|| format!("not a git repository: {}", root.display()))?;
    let index = repo
        .index()
        .with_context(|| format!("cannot read index of {}", root.display()))?;

    Ok(index
        .iter()
        .map(|e| String::from_utf8_lossy(&e.path).into_owned())
        .collect())
}
