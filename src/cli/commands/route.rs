//! Route command - resolve a request through the router

use super::open_controller;
use crate::cli::args::RouteArgs;
use crate::config::Config;
use crate::error::SwPackResult;
use crate::lifecycle::{Request, RouteOutcome};
use crate::ui::{self, Tone, UiContext};
use console::style;

/// Execute the route command
pub async fn execute(args: RouteArgs, config: &Config) -> SwPackResult<()> {
    let ctx = UiContext::detect();
    let controller = open_controller(config)?;

    let request = if args.navigate {
        Request::navigation(&args.url)?
    } else {
        Request::get(&args.url)?
    };

    match controller.on_request(&request).await {
        RouteOutcome::Passthrough => {
            println!("{} {}", style("passthrough").dim(), args.url);
        }
        RouteOutcome::Responded {
            response,
            source,
            cache_miss,
        } => {
            println!("{} {}", style(source).cyan(), response.url);
            ui::key_value(&ctx, "Status", &response.status.to_string());
            ui::key_value(&ctx, "Size", &ui::format_bytes(response.len() as u64));
            if let Some(content_type) = &response.content_type {
                ui::key_value(&ctx, "Content-Type", content_type);
            }
            if cache_miss {
                ui::step(&ctx, Tone::Warn, "Cache miss: answered from the network");
            }
        }
    }

    Ok(())
}
