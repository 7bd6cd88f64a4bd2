use regex::Regex;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Captured stdout of a successful git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub stdout: String,
}

impl GitOutput {
    /// Non-empty, trimmed stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Why a git invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitErrorKind {
    /// The git binary could not be started.
    Spawn,
    /// The remote has commits the local branch lacks.
    Rejected,
    Auth,
    Network,
    /// The remote repository does not exist or is not a repository.
    NotFound,
    Failed,
}

impl fmt::Display for GitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GitErrorKind::Spawn => "could not run git",
            GitErrorKind::Rejected => "rejected by remote",
            GitErrorKind::Auth => "authentication failed",
            GitErrorKind::Network => "network error",
            GitErrorKind::NotFound => "repository not found",
            GitErrorKind::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("`git {args}` {kind}: {message}")]
pub struct GitError {
    pub kind: GitErrorKind,
    pub args: String,
    pub message: String,
    pub code: Option<i32>,
}

impl GitError {
    pub fn new(kind: GitErrorKind, args: &[&str], message: impl Into<String>) -> Self {
        Self {
            kind,
            args: args.join(" "),
            message: message.into(),
            code: None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.kind == GitErrorKind::Rejected
    }
}

static REJECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)rejected.*(fetch first|non-fast-forward)|remote contains work that you do").unwrap()
});
static AUTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)permission denied|authentication failed|could not read (username|password)|host key verification failed").unwrap()
});
static NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)repository not found|does not appear to be a git repository|repository '.*' does not exist|not found").unwrap()
});
static NETWORK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)could not resolve host|connection (refused|timed out|reset)|network is unreachable|unable to access|operation timed out").unwrap()
});

/// Derive a failure kind from a failed invocation's stderr.
///
/// Rejection is checked first: a rejected push may also mention the remote
/// URL, which would otherwise look like a network message.
pub fn classify_stderr(stderr: &str) -> GitErrorKind {
    if REJECTED.is_match(stderr) {
        GitErrorKind::Rejected
    } else if AUTH.is_match(stderr) {
        GitErrorKind::Auth
    } else if NOT_FOUND.is_match(stderr) {
        GitErrorKind::NotFound
    } else if NETWORK.is_match(stderr) {
        GitErrorKind::Network
    } else {
        GitErrorKind::Failed
    }
}

/// Something that can run git subcommands.
///
/// Implemented by [`SystemGit`] for real use and by a recording fake in tests.
pub trait Git {
    /// Run `git <args>` in `cwd` (or the process cwd when `None`).
    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError>;
}

/// Runs the `git` binary found on `PATH`.
///
/// Git never prompts on the terminal: HTTPS remotes that need credentials
/// must be served by a credential helper, otherwise the call fails as
/// [`GitErrorKind::Auth`].
#[derive(Debug, Clone, Default)]
pub struct SystemGit {
    envs: Vec<(String, String)>,
}

impl SystemGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable on every spawned git process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn command(&self, cwd: Option<&Path>, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args);
        // Never block on a credential or editor prompt behind a spinner.
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.env("GIT_MERGE_AUTOEDIT", "no");
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Git for SystemGit {
    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError> {
        debug!(args = %args.join(" "), cwd = ?cwd, "running git");

        let out = self
            .command(cwd, args)
            .output()
            .map_err(|e| GitError::new(GitErrorKind::Spawn, args, e.to_string()))?;

        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&out.stderr).into_owned();

        if out.status.success() {
            if !stderr.trim().is_empty() {
                debug!(args = %args.join(" "), stderr = %stderr.trim(), "git diagnostics");
            }
            Ok(GitOutput { stdout })
        } else {
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            Err(GitError {
                kind: classify_stderr(&stderr),
                args: args.join(" "),
                message,
                code: out.status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_detects_fetch_first_rejection() {
        let stderr = "To github.com:me/app.git\n ! [rejected]        main -> main (fetch first)\n\
                      error: failed to push some refs to 'github.com:me/app.git'\n\
                      hint: Updates were rejected because the remote contains work that you do";
        assert_eq!(classify_stderr(stderr), GitErrorKind::Rejected);
    }

    #[test]
    fn classify_detects_non_fast_forward() {
        let stderr = " ! [rejected]        main -> main (non-fast-forward)\n";
        assert_eq!(classify_stderr(stderr), GitErrorKind::Rejected);
    }

    #[test]
    fn classify_other_failures() {
        assert_eq!(
            classify_stderr("git@github.com: Permission denied (publickey)."),
            GitErrorKind::Auth
        );
        assert_eq!(
            classify_stderr("remote: Repository not found.\nfatal: repository 'https://x/y.git/' not found"),
            GitErrorKind::NotFound
        );
        assert_eq!(
            classify_stderr("fatal: unable to access 'https://x/': Could not resolve host: x"),
            GitErrorKind::Network
        );
        assert_eq!(
            classify_stderr("fatal: pathspec 'nope' did not match any files"),
            GitErrorKind::Failed
        );
    }

    #[test]
    fn output_lines_skips_blanks() {
        let out = GitOutput {
            stdout: "a.txt\n\n  b.txt \n".into(),
        };
        assert_eq!(out.lines().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn spawned_git_never_prompts_and_caller_envs_win() {
        let git = SystemGit::new().env("GIT_MERGE_AUTOEDIT", "yes");
        let cmd = git.command(Some(Path::new("/p")), &["push", "-u", "origin", "main"]);

        let envs: Vec<(String, Option<String>)> = cmd
            .get_envs()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.map(|v| v.to_string_lossy().into_owned()),
                )
            })
            .collect();
        assert!(envs.contains(&("GIT_TERMINAL_PROMPT".into(), Some("0".into()))));
        assert!(envs.contains(&("GIT_MERGE_AUTOEDIT".into(), Some("yes".into()))));
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/p")));
        assert_eq!(
            cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect::<Vec<_>>(),
            vec!["push", "-u", "origin", "main"]
        );
    }

    #[test]
    fn error_display_names_command_and_kind() {
        let e = GitError::new(GitErrorKind::Rejected, &["push", "-u", "origin", "main"], "denied");
        assert_eq!(e.to_string(), "`git push -u origin main` rejected by remote: denied");
        assert!(e.is_rejection());
    }
}
