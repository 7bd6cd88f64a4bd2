//! Top-level run as an explicit sequence of steps.
//!
//! ```text
//! Classify ─┬─ AlreadyInitialized ─→ Onboard ────────┐
//!           ├─ LocalOnly ──────────→ RecoverLocal ───┼─→ Finished(Success | Cancelled)
//!           ├─ RemoteExists ───────→ RecoverRemote ──┘
//!           └─ Unknown ────────────→ Finished(Cancelled)
//! ```
//!
//! Every step either yields the next one or fails; a failure ends the run
//! with `Err`.

use anyhow::{Result, bail};
use tempfile::TempDir;
use tracing::info;

use super::recover;
use crate::classify::{ProjectState, RecoveryScenario, RemoteDescriptor, classify};
use crate::config::Settings;
use crate::console::{Console, Tone};
use crate::git::{Git, LocalRepo};
use crate::push::{PushOrchestrator, PushOutcome, PushPlan};
use crate::ssh::{Keygen, ensure_ssh_key, is_ssh_url};

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Cancelled,
}

/// External collaborators of a run.
pub struct Env<'a> {
    pub git: &'a dyn Git,
    pub console: &'a dyn Console,
    pub keygen: &'a dyn Keygen,
}

#[derive(Debug)]
enum Step {
    Classify,
    Onboard { has_commits: bool },
    RecoverLocal,
    RecoverRemote {
        remote: RemoteDescriptor,
        clone: TempDir,
    },
    Finished(Outcome),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Classify => "classify",
            Step::Onboard { .. } => "onboard",
            Step::RecoverLocal => "recover-local",
            Step::RecoverRemote { .. } => "recover-remote",
            Step::Finished(_) => "finished",
        }
    }
}

/// Drive one project from classification to a terminal state.
pub fn run(settings: &Settings, env: &Env<'_>) -> Result<Outcome> {
    let mut step = Step::Classify;
    loop {
        info!(step = step.name(), "onboarding");
        step = match step {
            Step::Classify => from_state(classify(
                &settings.project,
                settings.remote_url.as_deref(),
                &settings.branch,
                env.git,
                env.console,
            )),
            Step::Onboard { has_commits } => Step::Finished(onboard(settings, env, has_commits)?),
            Step::RecoverLocal => Step::Finished(recover::local_only(settings, env)?),
            Step::RecoverRemote { remote, clone } => {
                Step::Finished(recover::remote(settings, env, &remote, clone)?)
            }
            Step::Finished(outcome) => return Ok(outcome),
        };
    }
}

fn from_state(state: ProjectState) -> Step {
    match state {
        ProjectState::AlreadyInitialized { has_commits } => Step::Onboard { has_commits },
        ProjectState::Detached(RecoveryScenario::LocalOnly) => Step::RecoverLocal,
        ProjectState::Detached(RecoveryScenario::RemoteExists { remote, clone }) => {
            Step::RecoverRemote { remote, clone }
        }
        ProjectState::Detached(RecoveryScenario::Unknown) => Step::Finished(Outcome::Cancelled),
    }
}

pub(super) fn outcome_of(push: &PushOutcome) -> Outcome {
    match push {
        PushOutcome::Cancelled => Outcome::Cancelled,
        _ => Outcome::Success,
    }
}

/// Normal path for a project that already has repository metadata.
fn onboard(settings: &Settings, env: &Env<'_>, has_commits: bool) -> Result<Outcome> {
    let console = env.console;
    if has_commits {
        console.say(Tone::Warn, "Repository already has commits.");
        if !console.confirm("Continue with normal onboarding flow?", false) {
            console.say(Tone::Warn, "Onboarding cancelled by user.");
            return Ok(Outcome::Cancelled);
        }
    }

    let url = match settings.remote_url.as_deref() {
        Some(u) => u.to_string(),
        None => console
            .ask("Enter repository clone URL (HTTPS or SSH)", "")
            .trim()
            .to_string(),
    };
    if url.is_empty() {
        bail!("No remote URL provided");
    }

    if is_ssh_url(&url) {
        ensure_ssh_key(&settings.ssh_dir, env.keygen, console)?;
    }

    let remote = RemoteDescriptor {
        url,
        default_branch: settings.branch.clone(),
    };
    let report = PushOrchestrator::new(LocalRepo::new(&settings.project, env.git), console).run(
        PushPlan {
            message: &settings.message,
            branch: &settings.branch,
            remote: Some(&remote),
            changes: None,
        },
    )?;
    info!(outcome = ?report.outcome, attempts = report.push_attempts, "onboarding finished");
    Ok(outcome_of(&report.outcome))
}
