//! Recovery of a project directory that lost its repository metadata.

use anyhow::{Context, Result, bail};
use tempfile::TempDir;
use tracing::info;

use super::flow::{Env, Outcome, outcome_of};
use crate::classify::RemoteDescriptor;
use crate::config::Settings;
use crate::console::Tone;
use crate::diff::{self, ChangeSet, IGNORE_FILE};
use crate::git::LocalRepo;
use crate::push::{PushOrchestrator, PushOutcome, PushPlan};
use crate::report;

/// Commit message used when local changes are pushed on top of a remote.
pub const RECOVERY_MESSAGE: &str = "Recover and push local changes";

/// Files that local-only recovery commits: everything but metadata and
/// ignore files, in path order.
fn recoverable_files(settings: &Settings) -> Vec<String> {
    diff::local_files(&settings.project)
        .into_iter()
        .filter(|rel| rel.rsplit('/').next() != Some(IGNORE_FILE))
        .collect()
}

/// Turn the project into a fresh local repository holding every file.
pub fn local_only(settings: &Settings, env: &Env<'_>) -> Result<Outcome> {
    let console = env.console;
    console.say(Tone::Heading, "Starting local-only recovery...");
    console.print("This will create a new git repository with all your local files.");

    let files = recoverable_files(settings);
    if files.is_empty() {
        console.say(Tone::Warn, "No files found in project directory.");
        return Ok(Outcome::Success);
    }

    report::local_listing(&files, console);
    if !console.confirm("Initialize git repository and create initial commit?", true) {
        console.say(Tone::Warn, "Recovery cancelled by user.");
        return Ok(Outcome::Cancelled);
    }

    let changes = ChangeSet::all_new(files);
    let report = PushOrchestrator::new(LocalRepo::new(&settings.project, env.git), console).run(
        PushPlan {
            message: &settings.message,
            branch: &settings.branch,
            remote: None,
            changes: Some(&changes),
        },
    )?;
    if report.outcome != PushOutcome::Committed {
        bail!("No files were successfully staged. Cannot create commit");
    }

    console.say(Tone::Success, "Successfully recovered local repository!");
    console.say(
        Tone::Warn,
        "This is a local-only repository. Create a remote repository, then run: git remote add origin <URL>",
    );
    info!(files = changes.len(), "local-only recovery completed");
    Ok(Outcome::Success)
}

/// Reconnect the project to `remote` and push whatever differs from it.
///
/// Takes ownership of the verification clone so it is removed when this
/// returns, whichever way.
pub fn remote(
    settings: &Settings,
    env: &Env<'_>,
    remote: &RemoteDescriptor,
    clone: TempDir,
) -> Result<Outcome> {
    let console = env.console;
    console.say(Tone::Heading, "Starting remote repository recovery...");

    let changes = diff::diff(&settings.project, clone.path());
    drop(clone);

    let repo = LocalRepo::new(&settings.project, env.git);
    if changes.is_empty() {
        console.say(
            Tone::Success,
            "No local changes detected; the project is already up to date on the remote.",
        );
        console.say(Tone::Warn, "Local .git directory is missing. Initializing repository...");
        if !repo.is_initialized() {
            repo.init(&remote.default_branch)
                .context("Failed to initialize git repository")?;
        }
        repo.set_remote(&remote.url)
            .context("Failed to configure remote repository")?;
        console.say(Tone::Success, "Git repository initialized successfully!");
        console.say(Tone::Info, "Your project is now connected to the remote repository.");
        info!(url = %remote.url, "recovery completed without changes");
        return Ok(Outcome::Success);
    }

    report::change_summary(&changes, console);
    if !console.confirm(
        &format!("Commit and push these {} changes to the remote?", changes.len()),
        false,
    ) {
        console.say(Tone::Warn, "Recovery cancelled by user.");
        return Ok(Outcome::Cancelled);
    }

    let report = PushOrchestrator::new(repo, console).run(PushPlan {
        message: RECOVERY_MESSAGE,
        branch: &remote.default_branch,
        remote: Some(remote),
        changes: Some(&changes),
    })?;
    match report.outcome {
        PushOutcome::Pushed { .. } => {
            console.say(Tone::Success, "Successfully recovered and pushed local changes!")
        }
        PushOutcome::UpToDate => console.say(
            Tone::Info,
            "No files to stage. Recovery completed without changes.",
        ),
        _ => {}
    }
    info!(outcome = ?report.outcome, attempts = report.push_attempts, "remote recovery finished");
    Ok(outcome_of(&report.outcome))
}
