//! Plugin row CRUD and the `project_plugins` join table.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use super::Catalog;
use crate::error::CatalogError;
use crate::project::{Plugin, PluginFormat};

impl Catalog {
    /// Returns the id of the `(name, format)` plugin, inserting a new row
    /// if this is the first time it's been referenced. A newly inserted
    /// row's `installed` flag is set from the installed-plugin overlay
    /// (C9) as of right now; an existing row's flag is left as-is.
    pub fn upsert_plugin(&self, name: &str, format: PluginFormat) -> Result<Uuid, CatalogError> {
        upsert_plugin(&self.conn, self.live_database_dir.as_deref(), name, format)
    }

    pub fn find_plugin(
        &self,
        name: &str,
        format: PluginFormat,
    ) -> Result<Option<Plugin>, CatalogError> {
        find_plugin(&self.conn, name, format)
    }

    pub fn link_project_plugin(&self, project_id: i64, plugin_id: Uuid) -> Result<(), CatalogError> {
        link_project_plugin(&self.conn, project_id, plugin_id)
    }

    /// Clears every plugin link for `project_id`. Called before
    /// re-inserting the current extraction's plugin set when re-extracting
    /// a project in place.
    pub fn clear_project_plugins(&self, project_id: i64) -> Result<(), CatalogError> {
        clear_project_plugins(&self.conn, project_id)
    }

    pub fn plugins_for_project(&self, project_id: i64) -> Result<Vec<Plugin>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.* FROM plugins p
             JOIN project_plugins pp ON pp.plugin_id = p.id
             WHERE pp.project_id = ?1
             ORDER BY p.name",
        )?;
        let rows = stmt.query_map(params![project_id], row_to_plugin)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(CatalogError::from)
    }

    pub fn list_plugins(&self) -> Result<Vec<Plugin>, CatalogError> {
        let mut stmt = self.conn.prepare("SELECT * FROM plugins ORDER BY name")?;
        let rows = stmt.query_map([], row_to_plugin)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(CatalogError::from)
    }
}

/// Free-function form of [`Catalog::upsert_plugin`] — see
/// [`super::projects::insert_project`] for why these take `&Connection`
/// rather than `&Catalog`.
pub(crate) fn upsert_plugin(
    conn: &Connection,
    live_database_dir: Option<&Path>,
    name: &str,
    format: PluginFormat,
) -> Result<Uuid, CatalogError> {
    if let Some(existing) = find_plugin(conn, name, format)? {
        return Ok(existing.id);
    }
    let id = Uuid::new_v4();
    let installed = lookup_installed(live_database_dir, name);
    conn.execute(
        "INSERT INTO plugins (id, name, format, installed) VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), name, format.to_string(), installed],
    )?;
    Ok(id)
}

/// Consults the most recently modified plugin inventory under the
/// configured live-database directory. Any failure to locate or read it (no
/// directory configured, no file present, schema drift) is treated as "not
/// installed" rather than surfaced as an error.
fn lookup_installed(live_database_dir: Option<&Path>, name: &str) -> bool {
    let Some(dir) = live_database_dir else {
        return false;
    };
    let Some(db_path) = super::installed::most_recent_plugins_db_file(dir) else {
        return false;
    };
    super::installed::InstalledPluginsDb::open(&db_path)
        .and_then(|db| db.installed_plugin_names())
        .map(|names| names.iter().any(|n| n == name))
        .unwrap_or(false)
}

pub(crate) fn find_plugin(
    conn: &Connection,
    name: &str,
    format: PluginFormat,
) -> Result<Option<Plugin>, CatalogError> {
    conn.query_row(
        "SELECT * FROM plugins WHERE name = ?1 AND format = ?2",
        params![name, format.to_string()],
        row_to_plugin,
    )
    .optional()
    .map_err(CatalogError::from)
}

pub(crate) fn link_project_plugin(conn: &Connection, project_id: i64, plugin_id: Uuid) -> Result<(), CatalogError> {
    conn.execute(
        "INSERT OR IGNORE INTO project_plugins (project_id, plugin_id) VALUES (?1, ?2)",
        params![project_id, plugin_id.to_string()],
    )?;
    Ok(())
}

pub(crate) fn clear_project_plugins(conn: &Connection, project_id: i64) -> Result<(), CatalogError> {
    conn.execute(
        "DELETE FROM project_plugins WHERE project_id = ?1",
        params![project_id],
    )?;
    Ok(())
}

fn row_to_plugin(row: &Row) -> rusqlite::Result<Plugin> {
    let id: String = row.get("id")?;
    let format: String = row.get("format")?;
    Ok(Plugin {
        id: Uuid::from_str(&id).unwrap_or_else(|_| Uuid::nil()),
        name: row.get("name")?,
        format: PluginFormat::from_str(&format).unwrap_or(PluginFormat::Vst),
        installed: row.get("installed")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Catalog;

    #[test]
    fn upsert_is_idempotent() {
        let catalog = Catalog::open_in_memory().unwrap();
        let first = catalog.upsert_plugin("Serum", PluginFormat::Vst3).unwrap();
        let second = catalog.upsert_plugin("Serum", PluginFormat::Vst3).unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.list_plugins().unwrap().len(), 1);
    }

    #[test]
    fn same_name_different_format_is_distinct() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.upsert_plugin("Diva", PluginFormat::Vst).unwrap();
        catalog.upsert_plugin("Diva", PluginFormat::Vst3).unwrap();
        assert_eq!(catalog.list_plugins().unwrap().len(), 2);
    }

    #[test]
    fn with_no_live_database_dir_configured_nothing_is_installed() {
        let catalog = Catalog::open_in_memory().unwrap();
        let id = catalog.upsert_plugin("Serum", PluginFormat::Vst3).unwrap();
        let found = catalog.find_plugin("Serum", PluginFormat::Vst3).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(!found.installed);
    }

    #[test]
    fn insertion_checks_the_installed_overlay() {
        use rusqlite::Connection;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("plugins-v1.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE plugins (name TEXT, scanstate INTEGER, enabled INTEGER);
             INSERT INTO plugins VALUES ('Serum', 1, 1);",
        )
        .unwrap();
        drop(conn);

        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog.live_database_dir = Some(dir.path().to_path_buf());

        catalog.upsert_plugin("Serum", PluginFormat::Vst3).unwrap();
        catalog.upsert_plugin("Diva", PluginFormat::Vst).unwrap();

        let serum = catalog.find_plugin("Serum", PluginFormat::Vst3).unwrap().unwrap();
        let diva = catalog.find_plugin("Diva", PluginFormat::Vst).unwrap().unwrap();
        assert!(serum.installed);
        assert!(!diva.installed);
    }

    #[test]
    fn linking_and_listing_for_project_round_trips() {
        let catalog = Catalog::open_in_memory().unwrap();
        let project_id = crate::db::tests_support::insert_stub_project(&catalog, "/music/a.als");
        let plugin_id = catalog.upsert_plugin("Serum", PluginFormat::Vst3).unwrap();
        catalog
            .link_project_plugin(project_id, plugin_id)
            .unwrap();
        let linked = catalog.plugins_for_project(project_id).unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].name, "Serum");
    }
}
