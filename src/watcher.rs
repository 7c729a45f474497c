//! Filesystem watcher (C8): one dispatch task per `watch` invocation,
//! regardless of how many roots are registered, so reconciliation is
//! trivially serialized — no two paths are ever reconciled concurrently.
//!
//! Startup does a full scan of every root (the same pass `scan` runs),
//! then the watcher switches to live `notify` events. Rename/move pairs
//! arrive as separate create/remove events a few milliseconds apart; a
//! short debounce window coalesces them so a rename reconciles once
//! instead of as a delete-then-insert.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

use crate::db::Catalog;
use crate::error::CatalogEngineError;
use crate::reconcile::reconcile;
use crate::scan::ProjectPathScanner;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub roots: Vec<PathBuf>,
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            debounce: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
enum PendingChange {
    Changed,
    Removed,
}

/// Runs the startup scan, then watches `config.roots` until a Ctrl-C
/// signal arrives. On shutdown, any debounced events still pending are
/// flushed before returning, so a rename that straddles shutdown doesn't
/// get silently dropped.
pub async fn watch(catalog: Arc<Mutex<Catalog>>, config: WatcherConfig) -> Result<(), CatalogEngineError> {
    info!("starting catalog watcher over {} root(s)", config.roots.len());
    startup_scan(&catalog, &config.roots).await?;

    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = raw_tx.send(event);
            }
            Err(e) => error!("watch error: {e}"),
        },
        notify::Config::default(),
    )?;

    for root in &config.roots {
        watcher.watch(root, RecursiveMode::Recursive)?;
    }

    let mut pending: HashMap<PathBuf, (PendingChange, Instant)> = HashMap::new();

    loop {
        let next_deadline = pending.values().map(|(_, at)| *at).min();

        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested, draining {} pending event(s)", pending.len());
                flush_all(&catalog, &mut pending).await;
                break;
            }

            Some(event) = raw_rx.recv() => {
                handle_event(event, &mut pending, config.debounce);
            }

            _ = sleep_until_or_forever(next_deadline) => {
                flush_ready(&catalog, &mut pending).await;
            }
        }
    }

    Ok(())
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

fn handle_event(event: Event, pending: &mut HashMap<PathBuf, (PendingChange, Instant)>, debounce: Duration) {
    let change = match event.kind {
        EventKind::Remove(_) => PendingChange::Removed,
        EventKind::Create(_) | EventKind::Modify(_) => PendingChange::Changed,
        _ => return,
    };

    for path in event.paths {
        if path.extension().and_then(|e| e.to_str()) != Some("als") {
            continue;
        }
        pending.insert(path, (change.clone(), Instant::now() + debounce));
    }
}

async fn flush_ready(catalog: &Arc<Mutex<Catalog>>, pending: &mut HashMap<PathBuf, (PendingChange, Instant)>) {
    let now = Instant::now();
    let ready: Vec<PathBuf> = pending
        .iter()
        .filter(|(_, (_, at))| *at <= now)
        .map(|(path, _)| path.clone())
        .collect();

    let mut drained = Vec::with_capacity(ready.len());
    for path in ready {
        if let Some((change, _)) = pending.remove(&path) {
            drained.push((path, change));
        }
    }
    apply_batch(catalog, drained).await;
}

async fn flush_all(catalog: &Arc<Mutex<Catalog>>, pending: &mut HashMap<PathBuf, (PendingChange, Instant)>) {
    let drained: Vec<(PathBuf, PendingChange)> = pending
        .drain()
        .map(|(path, (change, _))| (path, change))
        .collect();
    apply_batch(catalog, drained).await;
}

/// Applies one debounce-flush batch, `Changed` entries before `Removed`
/// ones. A same-batch rename arrives as a `Removed(old)` + `Changed(new)`
/// pair with no ordering guarantee from the `HashMap` they were drained
/// from; reconciling `new` first lets `reconcile.rs`'s by-hash rebind find
/// the existing row and move it onto the new path, so the `Removed(old)`
/// delete that follows is a no-op (the row's path no longer matches
/// `old`) instead of deleting the row out from under the rebind and
/// forcing a fresh insert with a new identifier/uuid.
async fn apply_batch(catalog: &Arc<Mutex<Catalog>>, mut batch: Vec<(PathBuf, PendingChange)>) {
    batch.sort_by_key(|(_, change)| matches!(change, PendingChange::Removed));
    for (path, change) in batch {
        apply_change(catalog, &path, change).await;
    }
}

async fn apply_change(catalog: &Arc<Mutex<Catalog>>, path: &PathBuf, change: PendingChange) {
    let path = path.clone();
    match change {
        PendingChange::Removed => {
            let catalog = Arc::clone(catalog);
            let path_for_task = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let guard = catalog.blocking_lock();
                guard.delete_project_by_path(&path_for_task)
            })
            .await;
            match result {
                Ok(Ok(())) => info!("{}: removed from catalog", path.display()),
                Ok(Err(e)) => error!("{}: failed to remove from catalog: {e}", path.display()),
                Err(e) => error!("{}: removal task panicked: {e}", path.display()),
            }
        }
        PendingChange::Changed => {
            if !path.is_file() {
                // Already gone by the time the debounce window closed;
                // nothing to reconcile.
                return;
            }
            let catalog = Arc::clone(catalog);
            let path_for_task = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let mut guard = catalog.blocking_lock();
                reconcile(&mut guard, &path_for_task, false)
            })
            .await;
            match result {
                Ok(Ok(outcome)) => info!("{}: {outcome:?}", path.display()),
                Ok(Err(e)) => warn!("{}: reconciliation failed: {e}", path.display()),
                Err(e) => error!("{}: reconciliation task panicked: {e}", path.display()),
            }
        }
    }
}

async fn startup_scan(catalog: &Arc<Mutex<Catalog>>, roots: &[PathBuf]) -> Result<(), CatalogEngineError> {
    let scanner = ProjectPathScanner::new();
    for root in roots {
        let paths = scanner.scan_directory(root)?;
        info!("{}: {} project(s) found", root.display(), paths.len());
        for path in paths {
            let catalog = Arc::clone(catalog);
            let result = tokio::task::spawn_blocking(move || {
                let mut guard = catalog.blocking_lock();
                reconcile(&mut guard, &path, false)
            })
            .await;
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("reconciliation failed: {e}"),
                Err(e) => error!("reconciliation task panicked: {e}"),
            }
        }
    }
    Ok(())
}
