//! Git integration layer.
//!
//! Mutations and network operations go through the `git` binary via the
//! [`Git`] trait (`process`), so every failure comes back as a typed
//! [`GitError`] carrying the exit code and stderr of that one invocation.
//! Read-only inspection of repository metadata (is this a repository, what
//! does the index track, where does HEAD point) uses `git2` directly
//! (`git2_backend`).

mod git2_backend;
mod process;
mod repo;

pub use git2_backend::{has_commits, head_branch, is_repository, tracked_files};
pub use process::{Git, GitError, GitErrorKind, GitOutput, SystemGit, classify_stderr};
pub use repo::{LocalRepo, REMOTE_NAME, clone_shallow};
