//! Compare a local project tree against a shallow clone of its remote.

mod fingerprint;
mod ignore;
mod walk;

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use crate::git::tracked_files;

pub use fingerprint::{FileRecord, Fingerprint};
pub use ignore::{IGNORE_FILE, IgnoreRuleSet};
pub use walk::{METADATA_DIR, local_files};

/// Relative paths partitioned by how the local tree differs from the remote.
///
/// The three sets are disjoint: `modified` paths exist on both sides, `new`
/// only locally, `deleted` only remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub modified: BTreeSet<String>,
    pub new: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
}

impl ChangeSet {
    /// Every path treated as new, as for a project with no remote at all.
    pub fn all_new(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            new: paths.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.modified.len() + self.new.len() + self.deleted.len()
    }

    /// Paths that need staging: `modified ∪ new`, in path order.
    ///
    /// Deletions are left to the working tree.
    pub fn to_stage(&self) -> Vec<&str> {
        self.modified
            .union(&self.new)
            .map(String::as_str)
            .collect()
    }
}

/// Diff the project at `local_root` against the clone at `clone_root`.
///
/// The remote side is the clone's tracked file list (not a filesystem walk),
/// the local side is every regular file outside `.git` that the project's
/// ignore file does not exclude. Paths present on both sides are compared by
/// content fingerprint.
///
/// Never fails: an unreadable clone index is logged and treated as an empty
/// remote, unreadable files fingerprint to the empty sentinel.
pub fn diff(local_root: &Path, clone_root: &Path) -> ChangeSet {
    let remote = tracked_files(clone_root).unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "cannot list tracked files of remote clone");
        BTreeSet::new()
    });

    let rules = IgnoreRuleSet::load(local_root);
    let local: BTreeSet<String> = local_files(local_root)
        .into_iter()
        .filter(|p| !rules.is_ignored(p))
        .collect();

    info!(
        local = local.len(),
        remote = remote.len(),
        ignore_patterns = rules.patterns().len(),
        "comparing local files against remote"
    );

    let changes = partition(&local, &remote, |rel| {
        FileRecord::read(local_root, rel).differs_from(&FileRecord::read(clone_root, rel))
    });

    info!(
        modified = changes.modified.len(),
        new = changes.new.len(),
        deleted = changes.deleted.len(),
        "diff complete"
    );
    changes
}

/// Split two path sets into a [`ChangeSet`], asking `differs` about every
/// path present on both sides.
fn partition(
    local: &BTreeSet<String>,
    remote: &BTreeSet<String>,
    mut differs: impl FnMut(&str) -> bool,
) -> ChangeSet {
    let modified = local
        .intersection(remote)
        .filter(|p| differs(p))
        .cloned()
        .collect();
    ChangeSet {
        modified,
        new: local.difference(remote).cloned().collect(),
        deleted: remote.difference(local).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Repository;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// Build a "clone": a repository whose index tracks `files`.
    fn fake_clone(files: &[(&str, &str)]) -> TempDir {
        let td = tempdir().unwrap();
        let repo = Repository::init(td.path()).unwrap();
        let mut index = repo.index().unwrap();
        for (rel, content) in files {
            let p = td.path().join(rel);
            if let Some(parent) = p.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&p, content).unwrap();
            index.add_path(Path::new(rel)).unwrap();
        }
        index.write().unwrap();
        td
    }

    fn local_tree(files: &[(&str, &str)]) -> TempDir {
        let td = tempdir().unwrap();
        for (rel, content) in files {
            let p = td.path().join(rel);
            if let Some(parent) = p.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&p, content).unwrap();
        }
        td
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn modified_readme_and_remote_only_file() {
        let local = local_tree(&[("README.md", "A")]);
        let clone = fake_clone(&[("README.md", "B"), ("extra.txt", "x")]);

        let cs = diff(local.path(), clone.path());
        assert_eq!(cs.modified, set(&["README.md"]));
        assert!(cs.new.is_empty());
        assert_eq!(cs.deleted, set(&["extra.txt"]));
    }

    #[test]
    fn identical_files_are_unchanged() {
        let local = local_tree(&[("a.txt", "same"), ("dir/b.txt", "same too")]);
        let clone = fake_clone(&[("a.txt", "same"), ("dir/b.txt", "same too")]);

        let cs = diff(local.path(), clone.path());
        assert!(cs.is_empty());
    }

    #[test]
    fn local_only_files_are_new_unless_ignored() {
        let local = local_tree(&[
            ("a.txt", "1"),
            ("b.txt", "2"),
            (".gitignore", "node_modules/\n*.log\n"),
            ("node_modules/pkg/index.js", ""),
            ("debug.log", ""),
        ]);
        let clone = fake_clone(&[("a.txt", "1")]);

        let cs = diff(local.path(), clone.path());
        assert_eq!(cs.new, set(&[".gitignore", "b.txt"]));
        assert!(cs.modified.is_empty());
        assert!(cs.deleted.is_empty());
    }

    #[test]
    fn ignored_local_copy_of_tracked_file_counts_as_deleted() {
        let local = local_tree(&[(".gitignore", "*.lock\n"), ("Cargo.lock", "x")]);
        let clone = fake_clone(&[("Cargo.lock", "x"), (".gitignore", "*.lock\n")]);

        let cs = diff(local.path(), clone.path());
        assert_eq!(cs.deleted, set(&["Cargo.lock"]));
        assert!(cs.modified.is_empty());
        assert!(cs.new.is_empty());
    }

    #[test]
    fn clone_metadata_is_never_reported() {
        let local = local_tree(&[("a.txt", "1")]);
        let clone = fake_clone(&[("a.txt", "1")]);
        let cs = diff(local.path(), clone.path());
        assert!(cs.deleted.iter().all(|p| !p.starts_with(".git/")));
        assert!(cs.is_empty());
    }

    #[test]
    fn unreadable_clone_index_treats_everything_as_new() {
        let local = local_tree(&[("a.txt", "1")]);
        let not_a_repo = tempdir().unwrap();
        let cs = diff(local.path(), not_a_repo.path());
        assert_eq!(cs.new, set(&["a.txt"]));
    }

    #[test]
    fn partition_sets_are_disjoint_and_cover_both_sides() {
        let local = set(&["a", "b", "c"]);
        let remote = set(&["b", "c", "d"]);
        let cs = partition(&local, &remote, |p| p == "c");

        assert_eq!(cs.modified, set(&["c"]));
        assert_eq!(cs.new, set(&["a"]));
        assert_eq!(cs.deleted, set(&["d"]));
        assert!(cs.modified.is_disjoint(&cs.new));
        assert!(cs.modified.is_disjoint(&cs.deleted));
        assert!(cs.new.is_disjoint(&cs.deleted));
        assert_eq!(cs.len(), 3);
    }

    #[test]
    fn to_stage_merges_modified_and_new_in_order() {
        let cs = ChangeSet {
            modified: set(&["m.txt"]),
            new: set(&["a.txt", "z.txt"]),
            deleted: set(&["gone.txt"]),
        };
        assert_eq!(cs.to_stage(), vec!["a.txt", "m.txt", "z.txt"]);
    }
}
