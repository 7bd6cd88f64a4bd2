//! Decide which path a project directory takes before anything is changed.

use std::path::Path;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::console::{Console, Tone};
use crate::git::{self, Git, GitError};
use crate::progress::with_spinner;

/// A remote repository URL and the branch it treats as default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescriptor {
    pub url: String,
    pub default_branch: String,
}

/// Outcome of classifying a project without repository metadata.
#[derive(Debug)]
pub enum RecoveryScenario {
    /// No usable remote; recover into a purely local repository.
    LocalOnly,
    /// The remote answered a verification clone.
    ///
    /// `clone` owns the shallow clone; dropping it removes the directory.
    RemoteExists {
        remote: RemoteDescriptor,
        clone: TempDir,
    },
    /// The user cancelled after the remote could not be verified.
    Unknown,
}

#[derive(Debug)]
pub enum ProjectState {
    /// The project already has valid repository metadata.
    AlreadyInitialized { has_commits: bool },
    /// Files but no metadata directory.
    Detached(RecoveryScenario),
}

/// Shallow-clone `url` into a fresh temporary directory.
///
/// On failure the temporary directory is removed before returning.
pub fn verify_remote<G: Git + ?Sized>(git: &G, url: &str) -> Result<TempDir, GitError> {
    let dir = tempfile::Builder::new()
        .prefix("onboard_temp_clone_")
        .tempdir()
        .map_err(|e| {
            GitError::new(
                git::GitErrorKind::Spawn,
                &["clone", "--depth", "1", url],
                format!("cannot create temporary directory: {}", e),
            )
        })?;

    with_spinner(&format!("verifying {}", url), || {
        git::clone_shallow(git, url, dir.path())
    })?;
    info!(url, clone = %dir.path().display(), "remote verified");
    Ok(dir)
}

/// Classify `project`.
///
/// `remote_url` is the URL already resolved from the command line or the
/// config file; when it is absent the user is asked (an empty answer means
/// "no remote"). `fallback_branch` names the default branch when the clone's
/// HEAD cannot be read.
pub fn classify<G, C>(
    project: &Path,
    remote_url: Option<&str>,
    fallback_branch: &str,
    git: &G,
    console: &C,
) -> ProjectState
where
    G: Git + ?Sized,
    C: Console + ?Sized,
{
    if git::is_repository(project) {
        let has_commits = git::has_commits(project);
        info!(project = %project.display(), has_commits, "repository already initialized");
        return ProjectState::AlreadyInitialized { has_commits };
    }

    console.say(
        Tone::Warn,
        "Detected detached repository (missing .git directory).",
    );

    let url = match remote_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) => u.to_string(),
        None => prompt_remote_url(console),
    };

    if url.is_empty() {
        console.say(
            Tone::Success,
            "No remote URL provided. Proceeding with local-only recovery.",
        );
        return ProjectState::Detached(RecoveryScenario::LocalOnly);
    }

    console.say(Tone::Info, &format!("Verifying remote repository: {}", url));
    match verify_remote(git, &url) {
        Ok(clone) => {
            let default_branch =
                git::head_branch(clone.path()).unwrap_or_else(|| fallback_branch.to_string());
            console.say(Tone::Success, "Remote repository verified successfully!");
            console.say(
                Tone::Info,
                &format!("Remote default branch: {}", default_branch),
            );
            ProjectState::Detached(RecoveryScenario::RemoteExists {
                remote: RemoteDescriptor {
                    url,
                    default_branch,
                },
                clone,
            })
        }
        Err(e) => {
            warn!(url, error = %e, "remote verification failed");
            console.say(Tone::Warn, "Could not access remote repository.");
            console.say(Tone::Warn, &format!("  {}", e.kind));
            console.say(
                Tone::Warn,
                "The repository may not exist, you may lack access, the URL may be wrong, or the network is down.",
            );
            if console.confirm("Proceed as local-only repository?", true) {
                ProjectState::Detached(RecoveryScenario::LocalOnly)
            } else {
                console.say(Tone::Error, "Recovery cancelled by user.");
                ProjectState::Detached(RecoveryScenario::Unknown)
            }
        }
    }
}

fn prompt_remote_url<C: Console + ?Sized>(console: &C) -> String {
    console.say(
        Tone::Heading,
        "Please provide information about your repository:",
    );
    console.say(
        Tone::Info,
        "If you have a remote repository URL, enter it below; otherwise press Enter.",
    );
    console
        .ask(
            "Enter repository clone URL (HTTPS or SSH) or press Enter if no remote exists",
            "",
        )
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitErrorKind;
    use crate::test_support::{FakeGit, ScriptedConsole};
    use git2::Repository;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn no_metadata_and_no_url_is_local_only() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("a.txt"), "a").unwrap();
        let git = FakeGit::new();
        let console = ScriptedConsole::new(&[""]);

        let state = classify(td.path(), None, "main", &git, &console);

        assert!(matches!(
            state,
            ProjectState::Detached(RecoveryScenario::LocalOnly)
        ));
        assert_eq!(console.prompts().len(), 1);
        assert!(git.calls().is_empty());
    }

    #[test]
    fn empty_directory_without_url_is_local_only() {
        let td = tempdir().unwrap();
        let git = FakeGit::new();
        let console = ScriptedConsole::new(&[]);
        let state = classify(td.path(), Some("   "), "main", &git, &console);
        assert!(matches!(
            state,
            ProjectState::Detached(RecoveryScenario::LocalOnly)
        ));
    }

    #[test]
    fn existing_repository_is_already_initialized() {
        let td = tempdir().unwrap();
        Repository::init(td.path()).unwrap();
        let git = FakeGit::new();
        let console = ScriptedConsole::new(&[]);

        let state = classify(td.path(), Some("https://x/y.git"), "main", &git, &console);

        assert!(matches!(
            state,
            ProjectState::AlreadyInitialized { has_commits: false }
        ));
        assert!(git.calls().is_empty());
        assert!(console.prompts().is_empty());
    }

    #[test]
    fn verified_remote_keeps_clone_until_dropped() {
        let td = tempdir().unwrap();
        let git = FakeGit::new();
        let console = ScriptedConsole::new(&[]);

        let state = classify(td.path(), Some("https://x/y.git"), "trunk", &git, &console);

        let ProjectState::Detached(RecoveryScenario::RemoteExists { remote, clone }) = state else {
            panic!("expected RemoteExists");
        };
        assert_eq!(remote.url, "https://x/y.git");
        // The fake clone wrote nothing, so HEAD cannot be read.
        assert_eq!(remote.default_branch, "trunk");
        let dir = clone.path().to_path_buf();
        assert!(dir.exists());
        assert!(git.calls()[0].starts_with("clone --depth 1 --quiet https://x/y.git "));

        drop(clone);
        assert!(!dir.exists());
    }

    #[test]
    fn failed_verification_can_degrade_to_local_only() {
        let td = tempdir().unwrap();
        let git = FakeGit::new();
        git.fail(&["clone"], GitErrorKind::NotFound, "Repository not found.");
        let console = ScriptedConsole::new(&[""]);

        let state = classify(td.path(), Some("https://x/y.git"), "main", &git, &console);

        assert!(matches!(
            state,
            ProjectState::Detached(RecoveryScenario::LocalOnly)
        ));
        assert_eq!(console.prompts(), vec!["Proceed as local-only repository?"]);
    }

    #[test]
    fn failed_verification_declined_is_unknown() {
        let td = tempdir().unwrap();
        let git = FakeGit::new();
        git.fail(&["clone"], GitErrorKind::Network, "Could not resolve host");
        let console = ScriptedConsole::new(&["n"]);

        let state = classify(td.path(), Some("https://x/y.git"), "main", &git, &console);

        assert!(matches!(
            state,
            ProjectState::Detached(RecoveryScenario::Unknown)
        ));
    }

    #[test]
    fn verify_remote_removes_directory_on_failure() {
        let git = FakeGit::new();
        git.fail(&["clone"], GitErrorKind::Auth, "Permission denied");

        let err = verify_remote(&git, "git@x:y.git").unwrap_err();
        assert_eq!(err.kind, GitErrorKind::Auth);

        let dest = git.calls()[0].rsplit(' ').next().unwrap().to_string();
        assert!(!Path::new(&dest).exists());
    }
}
