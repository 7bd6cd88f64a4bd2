use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner style used while an external command is running.
/// - Yellow spinner with animated braille-style frames.
/// - Displays the current message (`{wide_msg}`) next to the spinner.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Style used when the command finished successfully.
pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Style used when the command failed.
pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Run `f` behind a spinner labelled `msg`.
///
/// The spinner draws to stderr and is hidden automatically when stderr is
/// not a terminal, so this is safe to use from tests.
pub fn with_spinner<T, E>(msg: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));

    let res = f();
    match &res {
        Ok(_) => {
            pb.set_style(ok_style());
            pb.finish_with_message(msg.to_string());
        }
        Err(_) => {
            pb.set_style(err_style());
            pb.finish_with_message(format!("{} (failed)", msg));
        }
    }
    res
}
