//! cliclack theme

use cliclack::ThemeState;
use console::Style;

/// Blue-accented theme for interactive output
#[derive(Debug, Clone, Default)]
pub struct SwPackTheme;

impl cliclack::Theme for SwPackTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().blue(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().blue().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().blue(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Install the theme globally
pub fn init_theme() {
    cliclack::set_theme(SwPackTheme);
}
