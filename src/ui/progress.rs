//! Progress indicators with CI fallback

use super::context::UiContext;
use super::output::Tone;
use crate::lifecycle::EntryOutcome;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner around one long step; a pair of lines when output is plain
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    fancy: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            fancy: ctx.fancy(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.fancy {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", Tone::Ok.tag(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", Tone::Fail.tag(), message),
        }
    }
}

/// Per-entry install progress
///
/// An indicatif bar in interactive mode; one line per entry otherwise.
pub struct InstallBar {
    bar: Option<ProgressBar>,
}

impl InstallBar {
    /// Progress over `total` entries
    pub fn new(ctx: &UiContext, label: &str, total: usize) -> Self {
        let bar = if ctx.fancy() {
            let bar = ProgressBar::new(total as u64);
            if let Ok(bar_style) = ProgressStyle::default_bar().template(
                "  {spinner:.cyan} Installing {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}",
            ) {
                bar.set_style(bar_style.progress_chars("━╸─"));
            }
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Installing {} ({} entries)...", label, total);
            None
        };
        Self { bar }
    }

    /// Record one settled entry
    pub fn on_entry(&self, outcome: &EntryOutcome) {
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.set_message(outcome.path().to_string());
            }
            None => println!("  {}", describe(outcome)),
        }
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn describe(outcome: &EntryOutcome) -> String {
    match outcome {
        EntryOutcome::Reused { path, from } if path == from => format!("reuse  {}", path),
        EntryOutcome::Reused { path, from } => format!("reuse  {} (from {})", path, from),
        EntryOutcome::Fetched { path, bytes } => format!("fetch  {} ({} bytes)", path, bytes),
        EntryOutcome::Refetched { path, bytes } => {
            format!("fetch  {} ({} bytes, missing from previous pack)", path, bytes)
        }
        EntryOutcome::Failed { path, reason } => {
            format!("{} {}: {}", style("FAIL").red(), path, reason)
        }
    }
}
