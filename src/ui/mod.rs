//! Terminal output
//!
//! Uses `cliclack` framing, spinners and prompts in interactive terminals,
//! with plain line output in CI and when piped.
//!
//! ```rust,ignore
//! use swpack::ui::{self, TaskSpinner, Tone, UiContext};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Hashing 12 inputs...");
//! spinner.stop("Built pack 3f9a0c1d2e4b");
//! ui::step_with(&ctx, Tone::Warn, "No pack installed", "swpack install sw-pack.json");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{format_bytes, intro, key_value, outro, short_fingerprint, step, step_with, Tone};
pub use progress::{InstallBar, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, SwPackTheme};
