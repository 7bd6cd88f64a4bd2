//! Crate entry point for **git-onboard**.
//!
//! This library provides the implementation behind the `git-onboard` CLI.
//! Each submodule owns one responsibility (classifying a project, diffing it
//! against a remote, driving commit and push, prompting the user, etc.).
//! The `pub use` re-exports make the command and its inputs reachable from
//! the crate root.

pub mod classify;
pub mod config;
pub mod console;
pub mod diff;
pub mod git;
pub mod gitignore;
pub mod logging;
pub mod onboard;
pub mod paths;
pub mod prereq;
pub mod progress;
pub mod push;
pub mod report;
pub mod ssh;

#[cfg(test)]
mod test_support;

pub use config::{FileConfig, Overrides, Settings, load_config, resolve};
pub use console::{AcceptDefaults, Console, Terminal, Tone};
pub use onboard::{Outcome, cmd_onboard};
