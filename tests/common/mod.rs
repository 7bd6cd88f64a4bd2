//! Real-git fixtures shared by the integration tests.
#![allow(dead_code)]

use git2::{Repository, Sort};
use git_onboard::console::{Console, Tone};
use git_onboard::git::{Git, SystemGit};
use std::fs;
use std::path::{Path, PathBuf};

pub fn git_available() -> bool {
    if which::which("git").is_err() {
        eprintln!("git not found on PATH, skipping");
        return false;
    }
    true
}

/// `git` with a fixed identity and no system or user config.
pub fn git() -> SystemGit {
    SystemGit::new()
        .env("GIT_AUTHOR_NAME", "Onboard Test")
        .env("GIT_AUTHOR_EMAIL", "onboard@example.com")
        .env("GIT_COMMITTER_NAME", "Onboard Test")
        .env("GIT_COMMITTER_EMAIL", "onboard@example.com")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
}

/// Create `<dir>/remote.git` whose `main` holds one commit with `files`.
pub fn bare_remote(git: &SystemGit, dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    let bare = dir.join("remote.git");
    let seed = dir.join("seed");
    fs::create_dir_all(&bare).unwrap();
    fs::create_dir_all(&seed).unwrap();

    git.run(Some(&bare), &["init", "--bare", "--quiet"]).unwrap();
    git.run(Some(&bare), &["symbolic-ref", "HEAD", "refs/heads/main"])
        .unwrap();

    git.run(Some(&seed), &["init", "--quiet"]).unwrap();
    git.run(Some(&seed), &["symbolic-ref", "HEAD", "refs/heads/main"])
        .unwrap();
    for (rel, content) in files {
        fs::write(seed.join(rel), content).unwrap();
    }
    git.run(Some(&seed), &["add", "."]).unwrap();
    git.run(Some(&seed), &["commit", "-m", "Seed remote"]).unwrap();
    let url = bare.to_string_lossy();
    git.run(Some(&seed), &["push", "--quiet", &url, "main"]).unwrap();
    fs::remove_dir_all(&seed).unwrap();
    bare
}

/// Commit messages reachable from `branch`, newest first.
pub fn history(repo_dir: &Path, branch: &str) -> Vec<String> {
    let repo = Repository::open(repo_dir).unwrap();
    let mut walk = repo.revwalk().unwrap();
    walk.set_sorting(Sort::TOPOLOGICAL).unwrap();
    walk.push_ref(&format!("refs/heads/{}", branch)).unwrap();
    walk.map(|oid| {
        let commit = repo.find_commit(oid.unwrap()).unwrap();
        commit.message().unwrap_or_default().trim_end().to_string()
    })
    .collect()
}

/// Says yes to every confirmation and takes the default of every question.
pub struct Approve;

impl Console for Approve {
    fn say(&self, _tone: Tone, msg: &str) {
        println!("{}", msg);
    }

    fn ask(&self, _prompt: &str, default: &str) -> String {
        default.to_string()
    }

    fn confirm(&self, _prompt: &str, _default: bool) -> bool {
        true
    }
}
