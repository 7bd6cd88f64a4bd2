//! User-facing output and prompting.
//!
//! Every component that talks to the user receives a `&dyn Console` (or a
//! generic `C: Console`) instead of reaching for stdin/stdout directly. The
//! binary wires in [`Terminal`] (or [`AcceptDefaults`] for `--yes`); tests use
//! a scripted fake.

use colored::Colorize;
use std::io::{self, BufRead, Write};

/// How a line of output should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Info,
    Success,
    Warn,
    Error,
    Heading,
}

pub trait Console {
    /// Print one message.
    fn say(&self, tone: Tone, msg: &str);

    /// Ask a free-form question. An empty answer yields `default`.
    fn ask(&self, prompt: &str, default: &str) -> String;

    /// Ask a yes/no question. An empty answer yields `default`.
    fn confirm(&self, prompt: &str, default: bool) -> bool;

    fn print(&self, msg: &str) {
        self.say(Tone::Plain, msg);
    }
}

fn paint(tone: Tone, msg: &str) -> String {
    match tone {
        Tone::Plain => msg.to_string(),
        Tone::Info => msg.blue().to_string(),
        Tone::Success => msg.green().bold().to_string(),
        Tone::Warn => msg.yellow().to_string(),
        Tone::Error => msg.red().to_string(),
        Tone::Heading => msg.bold().to_string(),
    }
}

fn ask_prompt(prompt: &str, default: &str) -> String {
    if default.is_empty() {
        format!("{} ", prompt)
    } else {
        format!("{} [{}] ", prompt, default)
    }
}

fn confirm_prompt(prompt: &str, default: bool) -> String {
    let hint = if default { "(Y/n)" } else { "(y/N)" };
    format!("{} {} ", prompt, hint)
}

/// Interpret a yes/no answer; anything that is not clearly yes or no falls
/// back to `default`.
pub fn parse_yes_no(answer: &str, default: bool) -> bool {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => default,
        a if a.starts_with('y') => true,
        a if a.starts_with('n') => false,
        _ => default,
    }
}

/// Interactive console on the controlling terminal.
///
/// Reads block on stdin without a timeout. EOF or a read error is treated as
/// an empty answer.
#[derive(Debug, Default)]
pub struct Terminal;

impl Terminal {
    fn read_line(&self, prompt: &str) -> String {
        let mut out = io::stdout().lock();
        let _ = out.write_all(prompt.as_bytes());
        let _ = out.flush();
        drop(out);

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => line.trim_end_matches(['\r', '\n']).to_string(),
            Err(_) => String::new(),
        }
    }
}

impl Console for Terminal {
    fn say(&self, tone: Tone, msg: &str) {
        println!("{}", paint(tone, msg));
    }

    fn ask(&self, prompt: &str, default: &str) -> String {
        let answer = self.read_line(&ask_prompt(prompt, default));
        if answer.trim().is_empty() {
            default.to_string()
        } else {
            answer
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        let answer = self.read_line(&confirm_prompt(prompt, default));
        parse_yes_no(&answer, default)
    }
}

/// Non-interactive console: prints normally, answers every prompt with its
/// default and echoes the decision.
#[derive(Debug, Default)]
pub struct AcceptDefaults;

impl Console for AcceptDefaults {
    fn say(&self, tone: Tone, msg: &str) {
        println!("{}", paint(tone, msg));
    }

    fn ask(&self, prompt: &str, default: &str) -> String {
        println!("{}{}", ask_prompt(prompt, default), default.dimmed());
        default.to_string()
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        let shown = if default { "y" } else { "n" };
        println!("{}{}", confirm_prompt(prompt, default), shown.dimmed());
        default
    }
}
