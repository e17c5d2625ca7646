//! Line output for commands
//!
//! Each line carries a [`Tone`]. A terminal gets the cliclack log framing;
//! piped and CI output gets a bracketed tag instead.

use super::context::UiContext;
use console::{style, StyledObject};
use std::io;

/// Severity of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Ok,
    Info,
    Warn,
    Fail,
}

impl Tone {
    pub(super) fn tag(self) -> StyledObject<&'static str> {
        match self {
            Self::Ok => style("[OK]").green(),
            Self::Info => style("[INFO]").cyan(),
            Self::Warn => style("[WARN]").yellow(),
            Self::Fail => style("[FAIL]").red(),
        }
    }

    fn log(self, text: String) -> io::Result<()> {
        match self {
            Self::Ok => cliclack::log::success(text),
            Self::Info => cliclack::log::info(text),
            Self::Warn => cliclack::log::warning(text),
            Self::Fail => cliclack::log::error(text),
        }
    }

    fn paint(self, text: &str) -> StyledObject<&str> {
        match self {
            Self::Ok => style(text).green().bold(),
            Self::Info => style(text).cyan().bold(),
            Self::Warn => style(text).yellow().bold(),
            Self::Fail => style(text).red().bold(),
        }
    }
}

/// Opening line of a multi-step command
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.fancy() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
    }
}

/// Closing line of a command
pub fn outro(ctx: &UiContext, tone: Tone, message: &str) {
    if ctx.fancy() {
        cliclack::outro(tone.paint(message)).ok();
    } else {
        println!("{} {}", tone.tag(), message);
    }
}

/// One progress line
pub fn step(ctx: &UiContext, tone: Tone, message: &str) {
    emit(ctx, tone, message.to_string());
}

/// One progress line with a dimmed trailer
pub fn step_with(ctx: &UiContext, tone: Tone, message: &str, detail: &str) {
    emit(ctx, tone, format!("{} ({})", message, style(detail).dim()));
}

fn emit(ctx: &UiContext, tone: Tone, text: String) {
    if ctx.fancy() {
        tone.log(text).ok();
    } else {
        println!("  {} {}", tone.tag(), text);
    }
}

/// Aligned `key: value` row
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    let key = if ctx.fancy() { style(key).dim() } else { style(key) };
    println!("  {}: {}", key, value);
}

/// First 12 characters of a fingerprint
pub fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

/// Byte count in B, KB, MB or GB
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
