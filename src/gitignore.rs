use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::console::{Console, Tone};
use crate::diff::IGNORE_FILE;

/// Patterns written to a fresh ignore file, grouped by section.
const DEFAULT_PATTERNS: &[(&str, &[&str])] = &[
    (
        "Dependencies",
        &["node_modules/", "npm-debug.log*", "yarn-debug.log*", "yarn-error.log*"],
    ),
    ("Build outputs", &["dist/", "build/", ".next/", "out/"]),
    (
        "Environment files",
        &[
            ".env",
            ".env.local",
            ".env.development.local",
            ".env.test.local",
            ".env.production.local",
        ],
    ),
    ("IDE files", &[".vscode/", ".idea/", "*.swp", "*.swo", "*~"]),
    ("OS files", &[".DS_Store", "Thumbs.db"]),
    ("Logs", &["*.log", "logs/"]),
    ("Runtime data", &["pids", "*.pid", "*.seed", "*.pid.lock"]),
    ("Coverage", &["coverage/"]),
    ("Temporary folders", &["tmp/", "temp/"]),
    (
        "Python",
        &[
            "__pycache__/",
            "*.py[cod]",
            "*$py.class",
            "*.so",
            ".Python",
            "env/",
            "venv/",
            "ENV/",
            "env.bak/",
            "venv.bak/",
        ],
    ),
    ("Java", &["*.class", "*.jar", "target/"]),
    ("Go", &["*.exe", "*.exe~", "*.dll", "*.dylib"]),
    ("Docker", &[".dockerignore"]),
    ("Git", &[".git/", ".gitignore"]),
];

const SUGGESTIONS: &[(&str, &str)] = &[
    ("node_modules", "Node.js dependencies"),
    ("dist", "Build output directory"),
    ("build", "Build output directory"),
    (".env", "Environment variables"),
    ("*.log", "Log files"),
    ("coverage", "Test coverage reports"),
    ("tmp", "Temporary files"),
    ("__pycache__", "Python cache files"),
    ("target", "Java or Rust build output"),
    (".DS_Store", "macOS system files"),
    ("Thumbs.db", "Windows system files"),
    (".vscode", "VS Code settings"),
    (".idea", "IntelliJ IDEA settings"),
];

fn has_content(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(s) => !s.trim().is_empty(),
        Err(e) => {
            if path.exists() {
                warn!(path = %path.display(), error = %e, "cannot read existing ignore file");
            }
            false
        }
    }
}

/// Render the ignore file body.
pub fn render(custom: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for (section, patterns) in DEFAULT_PATTERNS {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("# {}", section));
        lines.extend(patterns.iter().map(|p| p.to_string()));
    }
    if !custom.is_empty() {
        lines.push(String::new());
        lines.push("# Custom patterns".to_string());
        lines.extend(custom.iter().cloned());
    }
    lines.join("\n") + "\n"
}

fn prompt_custom_patterns<C: Console + ?Sized>(console: &C) -> Vec<String> {
    console.say(Tone::Heading, "Gitignore Configuration");
    console.print("Choose which files and folders to keep out of the repository.");
    console.say(Tone::Heading, "Common patterns to ignore:");
    for (pattern, what) in SUGGESTIONS {
        console.print(&format!("  • {} - {}", pattern, what));
    }

    if !console.confirm("Configure custom .gitignore patterns?", false) {
        return Vec::new();
    }
    console.print("Enter patterns to ignore, one per prompt. An empty answer finishes.");

    let mut patterns: Vec<String> = Vec::new();
    loop {
        let p = console.ask("Pattern (or press Enter to finish)", "");
        let p = p.trim();
        if p.is_empty() {
            break;
        }
        if patterns.iter().any(|x| x == p) {
            console.say(Tone::Warn, &format!("Pattern already added: {}", p));
        } else {
            console.say(Tone::Success, &format!("Added: {}", p));
            patterns.push(p.to_string());
        }
    }
    patterns
}

/// Create `.gitignore` in `project` unless a non-empty one already exists.
///
/// Returns whether a file was written. Write failures are logged and shown
/// as a warning.
pub fn bootstrap<C: Console + ?Sized>(project: &Path, console: &C) -> bool {
    let path = project.join(IGNORE_FILE);
    if has_content(&path) {
        console.say(Tone::Success, "Found existing .gitignore file.");
        console.say(Tone::Info, "Skipping .gitignore configuration.");
        return false;
    }

    let custom = prompt_custom_patterns(console);
    match fs::write(&path, render(&custom)) {
        Ok(()) => {
            info!(path = %path.display(), custom = custom.len(), "wrote ignore file");
            console.say(Tone::Success, "Created .gitignore file.");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to write ignore file");
            console.say(Tone::Warn, &format!("Could not create .gitignore: {}", e));
            false
        }
    }
}
