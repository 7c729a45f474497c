//! `live-catalog`: indexes Ableton Live Sets into a queryable local
//! SQLite catalog, keeping it in sync via a one-shot scan or a live
//! filesystem watch.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod hash;
pub mod project;
pub mod query;
pub mod reconcile;
pub mod scan;
pub mod version;
pub mod watcher;
pub mod xml;

/// Initializes structured logging from `RUST_LOG`, defaulting to `info`
/// when unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
