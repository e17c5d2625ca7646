//! swpack - versioned, content-addressed resource packs
//!
//! Builds pack manifests, installs them into named stores with per-entry
//! reuse, answers requests from the active pack and sweeps stores that
//! fall out of the retention window.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod pack;
pub mod store;
pub mod ui;

pub use error::{SwPackError, SwPackResult};
