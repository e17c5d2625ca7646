//! Confirmation prompt

use super::context::UiContext;
use crate::error::{SwPackError, SwPackResult};

/// Ask a yes/no question
///
/// `--yes` answers yes. Without a terminal `default` is taken silently.
pub async fn confirm(ctx: &UiContext, question: &str, default: bool) -> SwPackResult<bool> {
    if ctx.auto_yes() {
        println!("  {} yes (--yes)", question);
        return Ok(true);
    }
    if !ctx.fancy() {
        return Ok(default);
    }

    let question = question.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(question).initial_value(default).interact()
    })
    .await
    .map_err(|e| SwPackError::Internal(format!("prompt task: {}", e)))?
    .map_err(|e| SwPackError::User(format!("prompt: {}", e)))
}
