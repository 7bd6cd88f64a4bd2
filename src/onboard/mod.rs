mod flow;
mod recover;

use anyhow::Result;
use tracing::info;

use crate::config::Settings;
use crate::console::{Console, Tone};
use crate::git::SystemGit;
use crate::prereq::{SystemHost, ensure_prerequisites};
use crate::ssh::SshKeygen;
use crate::{gitignore, report};

pub use flow::{Env, Outcome, run};
pub use recover::RECOVERY_MESSAGE;

/// Onboard `settings.project` against the real machine.
///
/// Shows the resolved settings, bootstraps the ignore file, checks
/// prerequisites and then runs the classify / recover / push flow.
pub fn cmd_onboard(settings: &Settings, console: &dyn Console) -> Result<Outcome> {
    info!(project = %settings.project.display(), "starting onboarding");
    report::settings_summary(settings, console);
    gitignore::bootstrap(&settings.project, console);
    ensure_prerequisites(settings.package_manager, &SystemHost, console)?;

    let git = SystemGit::new();
    let env = Env {
        git: &git,
        console,
        keygen: &SshKeygen,
    };
    let outcome = run(settings, &env)?;
    match outcome {
        Outcome::Success => console.say(Tone::Success, "Onboarding complete!"),
        Outcome::Cancelled => console.say(Tone::Warn, "Onboarding cancelled."),
    }
    info!(?outcome, "onboarding finished");
    Ok(outcome)
}
