use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

pub const IGNORE_FILE: &str = ".gitignore";

/// Patterns read from a project's ignore file.
///
/// Matching is a deliberate simplification of real ignore semantics, with
/// three rules:
/// - `dir/` ignores paths starting with `dir` or having a `dir` component
/// - `*tail` ignores paths ending with `tail`
/// - anything else ignores paths containing it as a substring
///
/// There is no anchoring, negation, `**` or character-class support.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRuleSet {
    patterns: Vec<String>,
}

impl IgnoreRuleSet {
    /// One pattern per non-empty line; lines starting with `#` are comments.
    pub fn parse(text: &str) -> Self {
        let patterns = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { patterns }
    }

    /// Load `<root>/.gitignore`. A missing file is an empty set; an
    /// unreadable one is logged and also treated as empty.
    pub fn load(root: &Path) -> Self {
        let path = root.join(IGNORE_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read ignore file");
                Self::default()
            }
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether the relative, `/`-separated `path` is ignored.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| matches(p, path))
    }
}

fn matches(pattern: &str, path: &str) -> bool {
    if let Some(dir) = pattern.strip_suffix('/') {
        path.starts_with(dir) || path.split('/').any(|c| c == dir)
    } else if let Some(tail) = pattern.strip_prefix('*') {
        path.ends_with(tail)
    } else {
        path.contains(pattern)
    }
}
