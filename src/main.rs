//! # git-onboard
//!
//! **git-onboard** puts a project directory under version control and pushes
//! it to a remote.
//!
//! Features:
//! - Bootstraps a `.gitignore` and checks that `git` and `ssh-keygen` exist
//! - Recovers projects whose `.git` directory is missing, either as a fresh
//!   local repository or by diffing against the existing remote
//! - Commits and pushes, offering pull or force push when the remote is ahead
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use clap::{ArgAction, Parser};
use colored::Colorize;
use git_onboard::logging::{self, LogOptions};
use git_onboard::paths::{expand_tilde, paths};
use git_onboard::{
    AcceptDefaults, Console, FileConfig, Outcome, Overrides, Terminal, cmd_onboard, load_config,
    resolve,
};
use std::path::PathBuf;
use std::process::ExitCode;

const CREDENTIALS_NOTE: &str = "\
Git runs with terminal prompts disabled. HTTPS remotes that need credentials
must be served by a git credential helper (or use an SSH URL); otherwise the
clone or push fails with an authentication error instead of asking.";

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "git-onboard",
    version,
    about = "git-onboard - put a project under git and push it to a remote",
    after_help = CREDENTIALS_NOTE
)]
struct Cli {
    /// Project directory (default: current directory)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Commit message (default: "Initial commit")
    #[arg(short, long)]
    message: Option<String>,

    /// Branch to push (default: main)
    #[arg(short, long)]
    branch: Option<String>,

    /// Config file with defaults (.json, .yaml, .yml or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (default: ~/.git-onboard.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Remote repository URL; asked for when omitted. HTTPS credentials
    /// come from a git credential helper, never from a prompt
    #[arg(short, long)]
    remote_url: Option<String>,

    /// Accept the default answer to every prompt
    #[arg(short, long)]
    yes: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let file = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    let settings = resolve(
        Overrides {
            project: cli.project,
            message: cli.message,
            branch: cli.branch,
            remote_url: cli.remote_url,
            log_file: cli.log_file,
        },
        file,
    )?;

    let console: Box<dyn Console> = if cli.yes {
        Box::new(AcceptDefaults)
    } else {
        Box::new(Terminal)
    };
    cmd_onboard(&settings, console.as_ref())
}

/// CLI entry point.
///
/// Any failure is printed as one line and mapped to exit status 1, as is a
/// cancelled run.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(|| paths().log_file);
    let _guard = logging::init(LogOptions {
        file: Some(log_file),
        verbosity: cli.verbose,
    });
    tracing::info!("git-onboard starting");

    match run(cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Cancelled) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "onboarding failed");
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}
