//! Terminal detection

use std::io::IsTerminal;

/// Variables whose presence marks a CI run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// How commands talk to the user
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    fancy: bool,
    auto_yes: bool,
}

impl UiContext {
    /// Fancy output only when both stdin and stdout are terminals outside CI
    pub fn detect() -> Self {
        let on_terminal = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();
        let in_ci = CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            fancy: on_terminal && !in_ci,
            auto_yes: false,
        }
    }

    /// Tagged line output and no prompts
    pub fn plain() -> Self {
        Self {
            fancy: false,
            auto_yes: false,
        }
    }

    /// `--yes`
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    /// Spinners, bars, cliclack framing and prompts
    pub fn fancy(&self) -> bool {
        self.fancy
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }
}
