//! Scripted stand-ins for the console and the git binary.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;

use crate::console::{Console, Tone, parse_yes_no};
use crate::git::{Git, GitError, GitErrorKind, GitOutput};

/// Console that answers prompts from a queue and records everything shown.
///
/// An exhausted queue answers with the prompt's default.
#[derive(Default)]
pub struct ScriptedConsole {
    answers: RefCell<VecDeque<String>>,
    output: RefCell<Vec<(Tone, String)>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn printed(&self, needle: &str) -> bool {
        self.output.borrow().iter().any(|(_, m)| m.contains(needle))
    }

    pub fn unanswered(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next_answer(&self, prompt: &str) -> String {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or_default()
    }
}

impl Console for ScriptedConsole {
    fn say(&self, tone: Tone, msg: &str) {
        self.output.borrow_mut().push((tone, msg.to_string()));
    }

    fn ask(&self, prompt: &str, default: &str) -> String {
        let a = self.next_answer(prompt);
        if a.trim().is_empty() {
            default.to_string()
        } else {
            a
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        let a = self.next_answer(prompt);
        parse_yes_no(&a, default)
    }
}

type Reply = Result<GitOutput, GitError>;

struct Rule {
    prefix: Vec<String>,
    replies: VecDeque<Reply>,
}

/// Git runner that records invocations and replays scripted results.
///
/// Rules match on an argument prefix; the most recently added matching rule
/// wins. Each rule replays its replies in order and keeps returning the last
/// one. Unmatched invocations succeed with empty output.
#[derive(Default)]
pub struct FakeGit {
    calls: RefCell<Vec<String>>,
    rules: RefCell<Vec<Rule>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_reply(&self, prefix: &[&str], reply: Reply) {
        let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        let mut rules = self.rules.borrow_mut();
        if let Some(rule) = rules.iter_mut().find(|r| r.prefix == prefix) {
            rule.replies.push_back(reply);
        } else {
            rules.push(Rule {
                prefix,
                replies: VecDeque::from([reply]),
            });
        }
    }

    /// Queue a successful reply with `stdout`.
    pub fn reply(&self, prefix: &[&str], stdout: &str) -> &Self {
        self.push_reply(
            prefix,
            Ok(GitOutput {
                stdout: stdout.to_string(),
            }),
        );
        self
    }

    /// Queue a failure.
    pub fn fail(&self, prefix: &[&str], kind: GitErrorKind, message: &str) -> &Self {
        self.push_reply(prefix, Err(GitError::new(kind, prefix, message)));
        self
    }

    /// Every invocation so far, as space-joined argument strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl Git for FakeGit {
    fn run(&self, _cwd: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError> {
        self.calls.borrow_mut().push(args.join(" "));

        let mut rules = self.rules.borrow_mut();
        let rule = rules.iter_mut().rev().find(|r| {
            r.prefix.len() <= args.len() && r.prefix.iter().zip(args).all(|(p, a)| p == a)
        });
        match rule {
            Some(r) if r.replies.len() > 1 => r.replies.pop_front().unwrap_or(Ok(GitOutput::default())),
            Some(r) => r.replies.front().cloned().unwrap_or(Ok(GitOutput::default())),
            None => Ok(GitOutput::default()),
        }
    }
}
