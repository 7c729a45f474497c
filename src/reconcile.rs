//! Reconciler (C7): turns one `.als` path into a catalog mutation.
//!
//! Identity is decided by two lookups — by path and by content hash — run
//! before any XML is parsed:
//!
//! | at this path | at this hash | action                                   |
//! |--------------|--------------|-------------------------------------------|
//! | same row     | same row     | unchanged, nothing to do                  |
//! | yes          | no           | content changed in place: re-extract      |
//! | no           | yes          | renamed: rebind path, keep derived fields |
//! | no           | no           | new project: full extraction and insert   |
//! | yes (A)      | yes (B), A≠B | A's path was overwritten by B's content: drop A, rebind B |
//!
//! Extractor failures ([`ExtractionError`](crate::error::ExtractionError))
//! are recoverable — logged and left absent — everything else
//! ([`IoError`](crate::error::IoError), [`FormatError`](crate::error::FormatError),
//! [`CatalogError`](crate::error::CatalogError)) aborts the pass for this
//! path.
//!
//! A branch that writes anything does so as one SQLite transaction: the
//! project row plus its plugin and sample relinks commit together or not at
//! all, so a crash or error mid-reconciliation never leaves a project
//! pointing at half of its previous link set.

use std::path::{Path, PathBuf};

use log::warn;
use rusqlite::Transaction;
use uuid::Uuid;

use crate::db::{plugins as db_plugins, projects as db_projects, samples as db_samples, Catalog};
use crate::error::ReconcileError;
use crate::extract::{duration, furthest_bar, key, plugins, samples, tempo, time_signature};
use crate::project::{PluginFormat, Project};
use crate::version::{parse_creator, Version};
use crate::{hash, xml};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Unchanged,
    UpdatedInPlace,
    Renamed,
    Inserted,
}

/// Reconciles one `.als` path against the catalog. `force` re-runs
/// extraction even for a path/hash pair that would otherwise be treated as
/// unchanged — the `--force` escape hatch for a corrected extractor bug or
/// a manually edited row.
pub fn reconcile(catalog: &mut Catalog, path: &Path, force: bool) -> Result<ReconcileOutcome, ReconcileError> {
    let file_hash = hash::hash_file(path)?;
    let by_path = catalog.find_project_by_path(path)?;
    let by_hash = catalog.find_project_by_hash(&file_hash)?;
    let live_database_dir = catalog.live_database_dir.clone();

    // Pure extraction runs before the transaction opens: nothing below
    // touches the database, so there's no reason to hold a write lock
    // while parsing and walking the XML tree.
    let extracted = match (by_path.as_ref(), by_hash.as_ref()) {
        (Some(a), Some(b)) if a.identifier == b.identifier && !force => None,
        (None, Some(_)) => None,
        (Some(_), Some(_)) => None, // A's path overwritten by B's content: no re-extraction, A is just dropped.
        _ => Some(extract_all(path, &file_hash)?),
    };

    let tx = catalog.transaction()?;
    let outcome = match (by_path, by_hash) {
        (Some(a), Some(b)) if a.identifier == b.identifier && !force => ReconcileOutcome::Unchanged,
        (Some(existing), Some(b)) if existing.identifier == b.identifier => {
            // force: same row by both lookups, but re-extract anyway.
            let extracted = extracted.expect("extraction runs for this branch");
            let project = Project {
                identifier: existing.identifier,
                uuid: existing.uuid,
                path: path.to_path_buf(),
                last_scan_timestamp: chrono::Utc::now(),
                ..extracted.project
            };
            db_projects::update_project(&tx, &project)?;
            relink(&tx, live_database_dir.as_deref(), &project, path, extracted.plugins, extracted.samples)?;
            ReconcileOutcome::UpdatedInPlace
        }
        (Some(a), Some(b)) => {
            // `path` now holds a copy of an already-catalogued project `b`;
            // the stale row at this path is no longer reachable by path or
            // hash once we rebind, so it's dropped outright.
            db_projects::delete_project_by_path(&tx, &a.path)?;
            db_projects::rebind_project_path(&tx, b.identifier, path)?;
            ReconcileOutcome::Renamed
        }
        (Some(existing), None) => {
            let extracted = extracted.expect("extraction runs for this branch");
            let project = Project {
                identifier: existing.identifier,
                uuid: existing.uuid,
                path: path.to_path_buf(),
                last_scan_timestamp: chrono::Utc::now(),
                ..extracted.project
            };
            db_projects::update_project(&tx, &project)?;
            relink(&tx, live_database_dir.as_deref(), &project, path, extracted.plugins, extracted.samples)?;
            ReconcileOutcome::UpdatedInPlace
        }
        (None, Some(existing)) => {
            db_projects::rebind_project_path(&tx, existing.identifier, path)?;
            ReconcileOutcome::Renamed
        }
        (None, None) => {
            let extracted = extracted.expect("extraction runs for this branch");
            let project = Project {
                identifier: 0,
                uuid: Uuid::new_v4(),
                path: path.to_path_buf(),
                last_scan_timestamp: chrono::Utc::now(),
                ..extracted.project
            };
            let identifier = db_projects::insert_project(&tx, &project)?;
            let project = Project {
                identifier,
                ..project
            };
            relink(&tx, live_database_dir.as_deref(), &project, path, extracted.plugins, extracted.samples)?;
            ReconcileOutcome::Inserted
        }
    };

    tx.commit().map_err(crate::error::CatalogError::from)?;
    Ok(outcome)
}

/// Persists the plugin and sample links for a freshly (re-)extracted
/// project, replacing whatever was there before. Runs against the same
/// transaction as the project row write that precedes it.
fn relink(
    tx: &Transaction<'_>,
    live_database_dir: Option<&Path>,
    project: &Project,
    path: &Path,
    plugin_refs: Vec<(String, PluginFormat)>,
    sample_results: Vec<Result<PathBuf, crate::error::ExtractionError>>,
) -> Result<(), ReconcileError> {
    db_plugins::clear_project_plugins(tx, project.identifier)?;
    for (name, format) in plugin_refs {
        let plugin_id = db_plugins::upsert_plugin(tx, live_database_dir, &name, format)?;
        db_plugins::link_project_plugin(tx, project.identifier, plugin_id)?;
    }

    db_samples::clear_project_samples(tx, project.identifier)?;
    for result in sample_results {
        match result {
            Ok(sample_path) => {
                let sample_id = db_samples::upsert_sample(tx, &sample_path)?;
                db_samples::link_project_sample(tx, project.identifier, sample_id)?;
            }
            Err(e) => warn!("{}: sample reference skipped: {e}", path.display()),
        }
    }

    Ok(())
}

/// Default beats-per-bar used for the furthest-bar computation when no
/// time-signature marker is found, per §4.7.
const DEFAULT_BEATS_PER_BAR: f64 = 4.0;

/// Everything a fresh extraction pass produces: the project's own field
/// set, plus the plugin and sample references `relink` needs to commit
/// alongside it in the same transaction.
struct Extracted {
    project: Project,
    plugins: Vec<(String, PluginFormat)>,
    samples: Vec<Result<PathBuf, crate::error::ExtractionError>>,
}

/// Runs the full field-extraction pipeline for a project that's new to the
/// catalog, or whose content changed in place.
///
/// Field order follows §4.7: name, file-times, load-xml, version, tempo,
/// furthest-bar, samples, plugins, key, time-signature, duration. Two
/// departures from that literal order, both forced by data dependencies
/// rather than a choice: `file_hash` is computed by the caller before this
/// function even runs, since identity lookup needs it before any XML is
/// parsed; and the time-signature marker is read once ahead of its own
/// named step, purely to supply furthest-bar's beats-per-bar divisor
/// (defaulting to 4 if the marker is absent) — the field stored on the
/// project is still the one produced at time-signature's own place in the
/// order, and is identical since both reads are pure functions of the same
/// tree.
fn extract_all(path: &Path, file_hash: &str) -> Result<Extracted, ReconcileError> {
    let (creation_time, last_modification_time) = hash::stat_times(path);
    let name = project_name(path);

    let compressed = std::fs::read(path).map_err(|source| crate::error::IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decompressed = hash::decompress(&compressed)?;
    let tree = xml::parse(&decompressed)?;

    let creator = tree
        .attr("Creator")
        .ok_or(crate::error::FormatError::MissingCreator)?
        .to_string();
    let creator_version = recoverable(path, parse_creator(&creator));
    let version = creator_version
        .as_ref()
        .map(|c| c.version)
        .unwrap_or(Version::new(0, 0, 0));

    let tempo_value = recoverable(path, tempo::extract(&tree, version));
    let signature = recoverable(path, time_signature::extract(&tree));
    let beats_per_bar = signature.map(|s| s.numerator as f64).unwrap_or(DEFAULT_BEATS_PER_BAR);
    let furthest = furthest_bar::extract(&tree, beats_per_bar);

    let plugin_refs = plugins::extract(&tree);
    let sample_results = creator_version
        .map(|c| samples::extract(&tree, c.version))
        .unwrap_or_default();

    let key_value = recoverable(path, key::extract(&tree, version));
    let estimated_duration = match tempo_value {
        Some(bpm) => duration::estimate(furthest, beats_per_bar, bpm),
        None => 0.0,
    };

    let project = Project {
        identifier: 0,
        uuid: Uuid::nil(),
        path: path.to_path_buf(),
        file_hash: file_hash.to_string(),
        name,
        creation_time,
        last_modification_time,
        last_scan_timestamp: chrono::Utc::now(),
        creator,
        key: key_value,
        tempo: tempo_value,
        time_signature: signature,
        furthest_bar: Some(furthest),
        estimated_duration: Some(estimated_duration),
    };

    Ok(Extracted {
        project,
        plugins: plugin_refs,
        samples: sample_results,
    })
}

/// Logs and discards a recoverable extraction failure, per §7's policy:
/// a missing or malformed field never aborts the whole reconciliation.
fn recoverable<T>(path: &Path, result: Result<T, crate::error::ExtractionError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {e}", path.display());
            None
        }
    }
}

fn project_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Catalog;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_als(dir: &TempDir, name: &str, tempo_value: &str) -> PathBuf {
        let xml = format!(
            r#"<Ableton Creator="Ableton Live 11.0.2"><LiveSet>
                <MasterTrack><DeviceChain><Mixer><Tempo>
                    <Manual Value="{tempo_value}" />
                </Tempo></Mixer></DeviceChain></MasterTrack>
                <MidiClip><CurrentEnd Value="32.0" /></MidiClip>
                <EnumEvent Time="-63072000" Value="201" />
            </LiveSet></Ableton>"#
        );
        let path = dir.path().join(name);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        let gzipped = encoder.finish().unwrap();
        std::fs::write(&path, gzipped).unwrap();
        path
    }

    #[test]
    fn new_file_is_inserted() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::open_in_memory().unwrap();
        let path = write_als(&dir, "Project A.als", "120.0");

        let outcome = reconcile(&mut catalog, &path, false).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Inserted);

        let found = catalog.find_project_by_path(&path).unwrap().unwrap();
        assert_eq!(found.tempo, Some(120.0));
        // max CurrentEnd 32.0 beats / 4 beats-per-bar (from the 4/4 marker).
        assert_eq!(found.furthest_bar, Some(8.0));
    }

    #[test]
    fn rescanning_unchanged_file_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::open_in_memory().unwrap();
        let path = write_als(&dir, "Project A.als", "120.0");
        reconcile(&mut catalog, &path, false).unwrap();

        let outcome = reconcile(&mut catalog, &path, false).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
    }

    #[test]
    fn force_re_extracts_an_otherwise_unchanged_file() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::open_in_memory().unwrap();
        let path = write_als(&dir, "Project A.als", "120.0");
        reconcile(&mut catalog, &path, false).unwrap();
        let original = catalog.find_project_by_path(&path).unwrap().unwrap();

        let outcome = reconcile(&mut catalog, &path, true).unwrap();
        assert_eq!(outcome, ReconcileOutcome::UpdatedInPlace);

        let found = catalog.find_project_by_path(&path).unwrap().unwrap();
        assert_eq!(found.identifier, original.identifier);
        assert_eq!(found.uuid, original.uuid);
    }

    #[test]
    fn content_change_in_place_updates_existing_row() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::open_in_memory().unwrap();
        let path = write_als(&dir, "Project A.als", "120.0");
        reconcile(&mut catalog, &path, false).unwrap();
        let original = catalog.find_project_by_path(&path).unwrap().unwrap();

        write_als(&dir, "Project A.als", "140.0");
        let outcome = reconcile(&mut catalog, &path, false).unwrap();
        assert_eq!(outcome, ReconcileOutcome::UpdatedInPlace);

        let found = catalog.find_project_by_path(&path).unwrap().unwrap();
        assert_eq!(found.identifier, original.identifier);
        assert_eq!(found.uuid, original.uuid);
        assert_eq!(found.tempo, Some(140.0));
    }

    #[test]
    fn insert_commits_project_row_and_plugin_sample_links_together() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::open_in_memory().unwrap();
        let xml = r#"<Ableton Creator="Ableton Live 11.0.2"><LiveSet>
            <MasterTrack><DeviceChain><Mixer><Tempo>
                <Manual Value="120.0" />
            </Tempo></Mixer></DeviceChain></MasterTrack>
            <VstPluginInfo><PlugName Value="Diva" /></VstPluginInfo>
            <SampleRef><FileRef><Path Value="/samples/kick.wav" /></FileRef></SampleRef>
        </LiveSet></Ableton>"#;
        let path = dir.path().join("Project A.als");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let outcome = reconcile(&mut catalog, &path, false).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Inserted);

        let project = catalog.find_project_by_path(&path).unwrap().unwrap();
        assert_eq!(catalog.plugins_for_project(project.identifier).unwrap().len(), 1);
        assert_eq!(catalog.samples_for_project(project.identifier).unwrap().len(), 1);
    }

    #[test]
    fn rename_rebinds_path_and_keeps_identity() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::open_in_memory().unwrap();
        let original_path = write_als(&dir, "Project A.als", "120.0");
        reconcile(&mut catalog, &original_path, false).unwrap();
        let original = catalog
            .find_project_by_path(&original_path)
            .unwrap()
            .unwrap();

        std::fs::rename(&original_path, dir.path().join("Project A Renamed.als")).unwrap();
        let renamed_path = dir.path().join("Project A Renamed.als");

        let outcome = reconcile(&mut catalog, &renamed_path, false).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Renamed);

        let found = catalog.find_project_by_path(&renamed_path).unwrap().unwrap();
        assert_eq!(found.identifier, original.identifier);
        assert_eq!(found.uuid, original.uuid);
        assert!(catalog
            .find_project_by_path(&original_path)
            .unwrap()
            .is_none());
    }
}
