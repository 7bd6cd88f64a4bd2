use std::collections::BTreeSet;

use crate::config::Settings;
use crate::console::{Console, Tone};
use crate::diff::ChangeSet;

/// Paths shown per category before eliding the rest.
const SAMPLE: usize = 5;
/// More new files than this usually means ignore rules are missing.
const MANY_NEW_FILES: usize = 100;
/// Local listings up to this size are shown in full.
const FULL_LISTING: usize = 10;

fn row(label: &str, value: &str) -> String {
    format!("  {:<16} {}", label, value)
}

pub fn settings_summary<C: Console + ?Sized>(settings: &Settings, console: &C) {
    console.say(Tone::Heading, "Configuration Summary");
    console.print(&row("Project path", &settings.project.display().to_string()));
    console.print(&row("Commit message", &settings.message));
    console.print(&row("Branch", &settings.branch));
    console.print(&row("Package manager", settings.package_manager.name()));
    console.print(&row(
        "Remote",
        settings.remote_url.as_deref().unwrap_or("(ask)"),
    ));
    console.print(&row("Log file", &settings.log_file.display().to_string()));
}

fn sample<C: Console + ?Sized>(
    console: &C,
    tone: Tone,
    title: &str,
    paths: &BTreeSet<String>,
) {
    if paths.is_empty() {
        return;
    }
    console.say(
        tone,
        &format!(
            "{} files (showing first {} of {}):",
            title,
            SAMPLE.min(paths.len()),
            paths.len()
        ),
    );
    for p in paths.iter().take(SAMPLE) {
        console.print(&format!("  • {}", p));
    }
    if paths.len() > SAMPLE {
        console.print(&format!("  ... and {} more", paths.len() - SAMPLE));
    }
}

pub fn change_summary<C: Console + ?Sized>(changes: &ChangeSet, console: &C) {
    console.say(Tone::Heading, "File Changes Summary");
    if changes.is_empty() {
        console.say(Tone::Success, "No changes detected.");
        return;
    }

    for (label, n, what) in [
        ("Modified", changes.modified.len(), "changed in both local and remote"),
        ("New", changes.new.len(), "added locally"),
        ("Deleted", changes.deleted.len(), "removed locally"),
    ] {
        if n > 0 {
            console.print(&format!("  {:<10} {:>6}  {}", label, n, what));
        }
    }

    sample(console, Tone::Warn, "Modified", &changes.modified);
    sample(console, Tone::Success, "New", &changes.new);
    sample(console, Tone::Error, "Deleted", &changes.deleted);

    if changes.new.len() > MANY_NEW_FILES {
        console.say(
            Tone::Warn,
            &format!("Warning: {} new files detected!", changes.new.len()),
        );
        console.say(
            Tone::Warn,
            "This may include files that should be ignored (like node_modules). Check your .gitignore.",
        );
    }
}

/// List the files about to be committed by local-only recovery.
pub fn local_listing<C: Console + ?Sized>(files: &[String], console: &C) {
    console.say(
        Tone::Info,
        &format!("Found {} files in local directory:", files.len()),
    );
    let shown = if files.len() <= FULL_LISTING {
        files.len()
    } else {
        SAMPLE
    };
    for f in &files[..shown] {
        console.print(&format!("  • {}", f));
    }
    if files.len() > shown {
        console.print(&format!("  ... and {} more files", files.len() - shown));
    }
}
