//! `live-catalog watch`: startup scan followed by a live `notify`-driven
//! watch loop, until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::db::Catalog;
use crate::error::CatalogEngineError;
use crate::watcher::{watch as run_watcher, WatcherConfig};

pub async fn run(catalog: Arc<Mutex<Catalog>>, roots: Vec<PathBuf>) -> Result<(), CatalogEngineError> {
    let config = WatcherConfig {
        roots,
        debounce: Duration::from_secs(1),
    };
    run_watcher(catalog, config).await
}
