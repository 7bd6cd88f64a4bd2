//! Stage → commit → push, with recovery when the remote is ahead.
//!
//! The orchestrator is an explicit state machine over [`Stage`]:
//!
//! ```text
//! Init → Stage → Commit → Push → Done
//!                          ├─(rejected)→ PullRetry → Push → Done
//!                          ├─(rejected)→ ForcePush → Done
//!                          └─(rejected)→ Cancelled
//! ```
//!
//! Every stage it enters is recorded in [`PushReport::stages`], and every
//! push invocation is counted, so callers (and tests) can see exactly which
//! path was taken.

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::classify::RemoteDescriptor;
use crate::console::{Console, Tone};
use crate::diff::ChangeSet;
use crate::git::{Git, LocalRepo};
use crate::progress::with_spinner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Stage,
    Commit,
    Push,
    PullRetry,
    ForcePush,
    Done,
    Cancelled,
}

/// What to commit and where to push it.
#[derive(Debug, Clone, Copy)]
pub struct PushPlan<'a> {
    pub message: &'a str,
    /// Branch to push; also the initial branch of a freshly created repository.
    pub branch: &'a str,
    /// Without a remote the run ends after committing.
    pub remote: Option<&'a RemoteDescriptor>,
    /// Stage exactly `modified ∪ new` when present, everything otherwise.
    pub changes: Option<&'a ChangeSet>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The branch reached the remote.
    Pushed { branch: String, forced: bool },
    /// Committed locally; there was no remote to push to.
    Committed,
    /// Nothing was staged and there is nothing to push.
    UpToDate,
    /// The user declined a destructive or recovery step.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub outcome: PushOutcome,
    /// Whether this run created a commit.
    pub committed: bool,
    pub push_attempts: usize,
    pub stages: Vec<Stage>,
}

/// What to do after the remote rejected a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionChoice {
    PullThenRetry,
    Force,
    Cancel,
}

impl RejectionChoice {
    fn parse(answer: &str) -> Self {
        match answer.trim() {
            "1" => RejectionChoice::PullThenRetry,
            "2" => RejectionChoice::Force,
            _ => RejectionChoice::Cancel,
        }
    }
}

pub struct PushOrchestrator<'a, G: Git + ?Sized, C: Console + ?Sized> {
    repo: LocalRepo<'a, G>,
    console: &'a C,
    stages: Vec<Stage>,
    push_attempts: usize,
    committed: bool,
}

impl<'a, G: Git + ?Sized, C: Console + ?Sized> PushOrchestrator<'a, G, C> {
    pub fn new(repo: LocalRepo<'a, G>, console: &'a C) -> Self {
        Self {
            repo,
            console,
            stages: Vec::new(),
            push_attempts: 0,
            committed: false,
        }
    }

    fn enter(&mut self, stage: Stage) {
        info!(?stage, "push orchestrator");
        self.stages.push(stage);
    }

    fn finish(mut self, outcome: PushOutcome) -> PushReport {
        let last = match outcome {
            PushOutcome::Cancelled => Stage::Cancelled,
            _ => Stage::Done,
        };
        self.enter(last);
        PushReport {
            outcome,
            committed: self.committed,
            push_attempts: self.push_attempts,
            stages: self.stages,
        }
    }

    /// Drive `plan` to a terminal state.
    ///
    /// # Errors
    /// Failures on the critical path: init, commit, remote configuration,
    /// a push failing for any reason other than rejection, a failed pull, or
    /// a failed retry/force push.
    pub fn run(mut self, plan: PushPlan<'_>) -> Result<PushReport> {
        self.enter(Stage::Init);
        self.init(plan.branch)?;

        self.enter(Stage::Stage);
        let staged = self.stage(plan.changes)?;

        self.enter(Stage::Commit);
        if staged.is_empty() {
            self.console
                .say(Tone::Warn, "No changes to commit after staging.");
        } else {
            self.commit(plan.message, staged.len())?;
        }

        let Some(remote) = plan.remote else {
            let outcome = if self.committed {
                PushOutcome::Committed
            } else {
                PushOutcome::UpToDate
            };
            return Ok(self.finish(outcome));
        };

        self.repo
            .set_remote(&remote.url)
            .context("Failed to configure remote repository")?;

        if !self.committed && !self.repo.has_commits() {
            self.console
                .say(Tone::Info, "Nothing to push: the repository has no commits.");
            return Ok(self.finish(PushOutcome::UpToDate));
        }

        self.enter(Stage::Push);
        self.push(plan.branch)
    }

    fn init(&mut self, branch: &str) -> Result<()> {
        if self.repo.is_initialized() {
            info!(root = %self.repo.root().display(), "repository already initialized");
            return Ok(());
        }
        self.console.print(&format!(
            "Initializing new git repository in {}...",
            self.repo.root().display()
        ));
        self.repo
            .init(branch)
            .context("Failed to initialize git repository")?;
        self.console
            .say(Tone::Success, "Git repository initialized successfully.");
        Ok(())
    }

    /// Stage the plan's paths (or everything) and return what git reports as
    /// staged afterwards.
    fn stage(&mut self, changes: Option<&ChangeSet>) -> Result<Vec<String>> {
        match changes {
            Some(cs) => {
                self.console.print("Staging changed files...");
                for rel in cs.to_stage() {
                    if !self.repo.root().join(rel).exists() {
                        warn!(path = rel, "skipping vanished file");
                        continue;
                    }
                    match self.repo.add(rel) {
                        Ok(()) => self.console.print(&format!("  Staged: {}", rel)),
                        Err(e) => {
                            warn!(path = rel, error = %e, "failed to stage file");
                            self.console
                                .say(Tone::Error, &format!("  Failed to stage: {}", rel));
                        }
                    }
                }
            }
            None => {
                self.console.print("Staging all files...");
                self.repo.add_all().context("Failed to stage files")?;
            }
        }

        let staged = self
            .repo
            .staged_files()
            .context("Failed to read staged files")?;
        if !staged.is_empty() {
            self.console
                .print(&format!("Successfully staged {} files.", staged.len()));
        }
        Ok(staged)
    }

    fn commit(&mut self, message: &str, files: usize) -> Result<()> {
        self.console
            .print(&format!("Creating commit: {}", message));
        self.repo.commit(message).context(
            "Failed to create commit (check that git user.name and user.email are configured)",
        )?;
        self.committed = true;
        info!(message, files, "commit created");
        self.console.say(Tone::Success, "Commit created successfully.");
        Ok(())
    }

    /// Make sure the repository is on `target` before pushing.
    ///
    /// Creating the target branch is best effort: on failure the current
    /// branch is pushed instead, with a warning.
    fn resolve_branch(&mut self, target: &str) -> Result<String> {
        let current = match self.repo.current_branch() {
            Ok(Some(b)) => b,
            Ok(None) | Err(_) => {
                self.repo
                    .rename_branch(target)
                    .context("Failed to determine current branch")?;
                target.to_string()
            }
        };
        if current == target {
            return Ok(current);
        }

        self.console.say(
            Tone::Warn,
            &format!(
                "Current branch is '{}', target branch is '{}'",
                current, target
            ),
        );
        match self.repo.create_and_checkout(target) {
            Ok(()) => {
                self.console
                    .say(Tone::Info, &format!("Created branch '{}'.", target));
                Ok(target.to_string())
            }
            Err(e) => {
                warn!(target, current = %current, error = %e, "branch switch failed");
                self.console.say(
                    Tone::Warn,
                    &format!(
                        "Failed to create branch '{}'. Pushing current branch '{}'.",
                        target, current
                    ),
                );
                Ok(current)
            }
        }
    }

    fn push_once(&mut self, branch: &str, force: bool) -> Result<(), crate::git::GitError> {
        self.push_attempts += 1;
        let label = if force {
            format!("force pushing {}", branch)
        } else {
            format!("pushing {}", branch)
        };
        with_spinner(&label, || self.repo.push(branch, force))
    }

    fn push(mut self, target: &str) -> Result<PushReport> {
        let branch = self.resolve_branch(target)?;

        self.console.print(&format!(
            "Pushing branch '{}' to remote origin...",
            branch
        ));
        let err = match self.push_once(&branch, false) {
            Ok(()) => {
                self.console.say(Tone::Success, "Successfully pushed to remote!");
                return Ok(self.finish(PushOutcome::Pushed {
                    branch,
                    forced: false,
                }));
            }
            Err(e) => e,
        };

        if !err.is_rejection() {
            return Err(anyhow!(err).context(
                "Failed to push to remote. Check your authentication and network connection",
            ));
        }

        warn!(branch = %branch, "push rejected: remote is ahead");
        match self.ask_rejection_choice() {
            RejectionChoice::PullThenRetry => {
                self.enter(Stage::PullRetry);
                self.console.print("Pulling remote changes...");
                with_spinner(&format!("pulling {}", branch), || self.repo.pull(&branch))
                    .context(
                        "Failed to pull remote changes. You may need to resolve conflicts manually",
                    )?;
                self.console
                    .print("Remote changes pulled successfully. Pushing again...");

                self.enter(Stage::Push);
                self.push_once(&branch, false)
                    .context("Push after pull failed")?;
                self.console.say(Tone::Success, "Successfully pushed to remote!");
                Ok(self.finish(PushOutcome::Pushed {
                    branch,
                    forced: false,
                }))
            }
            RejectionChoice::Force => {
                if !self.console.confirm(
                    "Are you sure you want to overwrite remote content? This will lose any remote changes.",
                    false,
                ) {
                    self.console.say(Tone::Warn, "Force push cancelled.");
                    return Ok(self.finish(PushOutcome::Cancelled));
                }
                self.enter(Stage::ForcePush);
                self.console.print("Force pushing...");
                self.push_once(&branch, true).context("Force push failed")?;
                self.console
                    .say(Tone::Success, "Successfully force pushed to remote!");
                Ok(self.finish(PushOutcome::Pushed {
                    branch,
                    forced: true,
                }))
            }
            RejectionChoice::Cancel => {
                self.console.say(Tone::Warn, "Push cancelled by user.");
                Ok(self.finish(PushOutcome::Cancelled))
            }
        }
    }

    fn ask_rejection_choice(&self) -> RejectionChoice {
        let c = self.console;
        c.say(
            Tone::Warn,
            "Push rejected: Remote repository has changes that you don't have locally.",
        );
        c.say(Tone::Heading, "Options:");
        c.print("1. Pull remote changes first (recommended)");
        c.print("2. Force push (overwrites remote content)");
        c.print("3. Cancel and exit");
        RejectionChoice::parse(&c.ask("Choose an option (1/2/3)", "1"))
    }
}
