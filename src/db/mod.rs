//! Catalog store (C6): the SQLite-backed relational catalog, plus the
//! read-only installed-plugin overlay (C9).
//!
//! Five tables: `projects`, `plugins`, `samples`, and two join tables.
//! Uniqueness is enforced at the schema level — on `projects.path`,
//! `projects.file_hash`, `(plugins.name, plugins.format)`, and
//! `samples.path` — so the reconciler's insert/rebind/update decisions are
//! backstopped by the database itself rather than trusted blindly.

pub mod installed;
pub mod plugins;
pub mod projects;
pub mod samples;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction};

use crate::error::CatalogError;

pub struct Catalog {
    pub(crate) conn: Connection,
    /// Directory holding the auxiliary installed-plugin inventories (C9),
    /// if the config supplied one. `None` means every plugin is inserted
    /// as not-installed.
    pub(crate) live_database_dir: Option<PathBuf>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    identifier              INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid                    TEXT NOT NULL UNIQUE,
    path                    TEXT NOT NULL UNIQUE,
    file_hash               TEXT NOT NULL UNIQUE,
    name                    TEXT NOT NULL,
    creation_time           TEXT NOT NULL,
    last_modification_time  TEXT NOT NULL,
    last_scan_timestamp     TEXT NOT NULL,
    creator                 TEXT NOT NULL,
    key                     TEXT,
    tempo                   REAL,
    time_signature          TEXT,
    furthest_bar            REAL,
    estimated_duration      REAL
);

CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name);

CREATE TABLE IF NOT EXISTS plugins (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    format     TEXT NOT NULL,
    installed  INTEGER NOT NULL DEFAULT 0,
    UNIQUE(name, format)
);

CREATE INDEX IF NOT EXISTS idx_plugins_name ON plugins(name);

CREATE TABLE IF NOT EXISTS samples (
    id          TEXT PRIMARY KEY,
    path        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    is_present  INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS project_plugins (
    project_id  INTEGER NOT NULL REFERENCES projects(identifier) ON DELETE CASCADE,
    plugin_id   TEXT NOT NULL REFERENCES plugins(id) ON DELETE CASCADE,
    PRIMARY KEY (project_id, plugin_id)
);

CREATE TABLE IF NOT EXISTS project_samples (
    project_id  INTEGER NOT NULL REFERENCES projects(identifier) ON DELETE CASCADE,
    sample_id   TEXT NOT NULL REFERENCES samples(id) ON DELETE CASCADE,
    PRIMARY KEY (project_id, sample_id)
);

CREATE INDEX IF NOT EXISTS idx_project_plugins_plugin ON project_plugins(plugin_id);
CREATE INDEX IF NOT EXISTS idx_project_samples_sample ON project_samples(sample_id);
"#;

impl Catalog {
    /// Opens (creating if necessary) the SQLite database at `path` and
    /// ensures the schema exists. Foreign keys are off by default in
    /// SQLite; this pragma turns on cascade-delete enforcement for the two
    /// join tables.
    pub fn open(path: &Path, live_database_dir: Option<PathBuf>) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, live_database_dir })
    }

    /// In-memory catalog, used by tests and by `scan --dry-run`-style
    /// one-shot invocations that shouldn't persist anything.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, live_database_dir: None })
    }

    /// Opens a transaction against this catalog's connection. The
    /// reconciler runs a project's full row write plus its plugin/sample
    /// relink through the returned `Transaction` (which derefs to
    /// `Connection`, so the same CRUD functions apply to either) and
    /// commits once at the end, so a panic or error midway leaves the
    /// catalog exactly as it was before the pass started.
    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>, CatalogError> {
        Ok(self.conn.transaction()?)
    }
}

/// Shared across `db/*`'s test modules: inserts a minimal project row so
/// link-table tests have a real `identifier` to reference under foreign-key
/// enforcement.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::Catalog;
    use crate::project::Project;
    use uuid::Uuid;

    pub(crate) fn insert_stub_project(catalog: &Catalog, path: &str) -> i64 {
        let now = chrono::Utc::now();
        let project = Project {
            identifier: 0,
            uuid: Uuid::new_v4(),
            path: path.into(),
            file_hash: format!("hash-{path}"),
            name: "stub".to_string(),
            creation_time: now,
            last_modification_time: now,
            last_scan_timestamp: now,
            creator: "Ableton Live 11.0.2".to_string(),
            key: None,
            tempo: None,
            time_signature: None,
            furthest_bar: None,
            estimated_duration: None,
        };
        catalog.insert_project(&project).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_all_tables() {
        let catalog = Catalog::open_in_memory().unwrap();
        let count: i64 = catalog
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 5);
    }
}
