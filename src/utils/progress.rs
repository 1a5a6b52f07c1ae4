//! Terminal spinners for long-running operations.
//!
//! Spinners are hidden when `HOSTSHIP_NO_PROGRESS` is set or when stderr is
//! not a terminal (for example under systemd), so service logs stay clean.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

fn is_progress_disabled() -> bool {
    std::env::var("HOSTSHIP_NO_PROGRESS").is_ok() || !std::io::stderr().is_terminal()
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}

/// A spinner with a message, cleared or finished when the work is done.
#[derive(Clone)]
pub struct Spinner {
    inner: IndicatifBar,
}

impl Spinner {
    /// Start a spinner showing `msg`.
    pub fn start(msg: impl Into<String>) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(msg.into());
        Self {
            inner: bar,
        }
    }

    /// Stop and erase the spinner.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}
