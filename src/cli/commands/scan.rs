//! `live-catalog scan`: a one-shot reconciliation pass over one or more
//! roots, with no watcher left running afterward.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::db::Catalog;
use crate::error::CatalogEngineError;
use crate::reconcile::reconcile;
use crate::scan::ProjectPathScanner;

pub async fn run(
    catalog: Arc<Mutex<Catalog>>,
    roots: Vec<PathBuf>,
    force: bool,
) -> Result<usize, CatalogEngineError> {
    let scanner = ProjectPathScanner::new();
    let mut reconciled = 0usize;

    for root in roots {
        let paths = scanner.scan_directory(&root)?;
        info!("{}: {} project(s) found", root.display(), paths.len());
        for path in paths {
            let mut guard = catalog.lock().await;
            match reconcile(&mut guard, &path, force) {
                Ok(outcome) => {
                    info!("{}: {outcome:?}", path.display());
                    reconciled += 1;
                }
                Err(e) => warn!("{}: reconciliation failed: {e}", path.display()),
            }
        }
    }

    Ok(reconciled)
}
