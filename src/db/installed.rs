//! Installed-plugin overlay (C9): a read-only join against Ableton's own
//! plugin-scan database, used to annotate which catalog plugins are
//! currently installed on this machine.
//!
//! The overlay only ever reads; it never writes to Ableton's database, and
//! it depends on a single column contract (`plugins.name`) rather than the
//! full schema, since that schema is undocumented and has drifted across
//! Live versions.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::CatalogError;

/// Finds the most recently modified `.db` file directly under `dir` whose
/// filename contains `"plugins"`, case-insensitively, matching
/// `examples/UR91K-seula/src/utils/plugins.rs`'s own
/// `get_most_recent_plugins_db_file`.
pub fn most_recent_plugins_db_file(dir: &Path) -> Option<PathBuf> {
    most_recent_db_file(dir, Some("plugins"))
}

fn most_recent_db_file(dir: &Path, name_contains: Option<&str>) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("db"))
        .filter(|path| match name_contains {
            Some(needle) => path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.to_lowercase().contains(needle)),
            None => true,
        })
        .filter_map(|path| {
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path)
}

/// A read-only handle onto Ableton's plugin-scan database.
pub struct InstalledPluginsDb {
    conn: Connection,
}

impl InstalledPluginsDb {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;
        Ok(Self { conn })
    }

    /// Every plugin name Ableton reports as scanned and enabled. Any schema
    /// drift beyond the `plugins(name, scanstate, enabled)` contract
    /// surfaces as a [`CatalogError::Sqlite`], not a panic.
    pub fn installed_plugin_names(&self) -> Result<Vec<String>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM plugins WHERE scanstate = 1 AND enabled = 1 ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(CatalogError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn most_recent_plugins_db_file_ignores_unrelated_dbs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("other.db"), b"").unwrap();
        sleep(Duration::from_millis(10));
        fs::write(dir.path().join("plugins-v1.db"), b"").unwrap();

        let found = most_recent_plugins_db_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "plugins-v1.db");
    }

    #[test]
    fn most_recent_plugins_db_file_matches_case_insensitively() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Plugins-Cache.db"), b"").unwrap();

        let found = most_recent_plugins_db_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "Plugins-Cache.db");
    }

    #[test]
    fn most_recent_plugins_db_file_picks_the_newest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("plugins-v1.db"), b"").unwrap();
        sleep(Duration::from_millis(10));
        fs::write(dir.path().join("plugins-v2.db"), b"").unwrap();

        let found = most_recent_plugins_db_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "plugins-v2.db");
    }

    #[test]
    fn installed_plugin_names_filters_on_scanstate_and_enabled() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("plugins-v1.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE plugins (name TEXT, scanstate INTEGER, enabled INTEGER);
             INSERT INTO plugins VALUES ('Serum', 1, 1);
             INSERT INTO plugins VALUES ('Disabled Thing', 1, 0);
             INSERT INTO plugins VALUES ('Unscanned Thing', 0, 1);",
        )
        .unwrap();
        drop(conn);

        let db = InstalledPluginsDb::open(&db_path).unwrap();
        let names = db.installed_plugin_names().unwrap();
        assert_eq!(names, vec!["Serum".to_string()]);
    }
}
