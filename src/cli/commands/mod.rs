//! CLI command implementations

pub mod activate;
pub mod build;
pub mod completions;
pub mod config;
pub mod install;
pub mod purge;
pub mod route;
pub mod status;

pub use activate::execute as activate;
pub use build::execute as build;
pub use completions::execute as completions;
pub use config::execute as config;
pub use install::execute as install;
pub use purge::execute as purge;
pub use route::execute as route;
pub use status::execute as status;

use crate::audit::AuditLog;
use crate::config::{Config, ConfigManager};
use crate::error::SwPackResult;
use crate::fetch::HttpFetcher;
use crate::lifecycle::{PackController, RouteSettings};
use crate::store::DiskStorage;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Controller over the on-disk stores for the configured origin
pub(crate) fn open_controller(config: &Config) -> SwPackResult<PackController> {
    let fetcher = HttpFetcher::new(
        &config.origin.base_url,
        Duration::from_secs(config.fetch.timeout_secs),
    )?;

    let routes = RouteSettings {
        origin: fetcher.origin().clone(),
        entry_point: config.origin.entry_point.clone(),
        manifest_path: config.origin.manifest_path.clone(),
        navigation: config.origin.navigation.clone(),
    };

    let root = ConfigManager::store_root(config);
    debug!("Store root: {}", root.display());

    Ok(
        PackController::new(Arc::new(DiskStorage::new(root)), Arc::new(fetcher), routes)
            .with_size_ceiling(config.retention.max_archive_bytes())
            .with_journal(AuditLog::new(config)),
    )
}
