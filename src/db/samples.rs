//! Sample row CRUD and the `project_samples` join table.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::Catalog;
use crate::error::CatalogError;
use crate::project::Sample;

impl Catalog {
    /// Inserts a new sample row, or refreshes an existing one's
    /// `is_present` flag against the filesystem right now. `is_present` is
    /// stale-acceptable between scans, so it's only ever recomputed here,
    /// at relink time.
    pub fn upsert_sample(&self, path: &Path) -> Result<Uuid, CatalogError> {
        upsert_sample(&self.conn, path)
    }

    pub fn find_sample(&self, path: &Path) -> Result<Option<Sample>, CatalogError> {
        find_sample(&self.conn, path)
    }

    pub fn link_project_sample(&self, project_id: i64, sample_id: Uuid) -> Result<(), CatalogError> {
        link_project_sample(&self.conn, project_id, sample_id)
    }

    pub fn clear_project_samples(&self, project_id: i64) -> Result<(), CatalogError> {
        clear_project_samples(&self.conn, project_id)
    }

    pub fn samples_for_project(&self, project_id: i64) -> Result<Vec<Sample>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.* FROM samples s
             JOIN project_samples ps ON ps.sample_id = s.id
             WHERE ps.project_id = ?1
             ORDER BY s.path",
        )?;
        let rows = stmt.query_map(params![project_id], row_to_sample)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(CatalogError::from)
    }
}

/// Free-function form of [`Catalog::upsert_sample`] — see
/// [`super::projects::insert_project`] for why these take `&Connection`
/// rather than `&Catalog`.
pub(crate) fn upsert_sample(conn: &Connection, path: &Path) -> Result<Uuid, CatalogError> {
    let is_present = path.exists();
    if let Some(existing) = find_sample(conn, path)? {
        conn.execute(
            "UPDATE samples SET is_present = ?2 WHERE id = ?1",
            params![existing.id.to_string(), is_present],
        )?;
        return Ok(existing.id);
    }
    let id = Uuid::new_v4();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    conn.execute(
        "INSERT INTO samples (id, path, name, is_present) VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), path.to_string_lossy(), name, is_present],
    )?;
    Ok(id)
}

pub(crate) fn find_sample(conn: &Connection, path: &Path) -> Result<Option<Sample>, CatalogError> {
    conn.query_row(
        "SELECT * FROM samples WHERE path = ?1",
        params![path.to_string_lossy()],
        row_to_sample,
    )
    .optional()
    .map_err(CatalogError::from)
}

pub(crate) fn link_project_sample(conn: &Connection, project_id: i64, sample_id: Uuid) -> Result<(), CatalogError> {
    conn.execute(
        "INSERT OR IGNORE INTO project_samples (project_id, sample_id) VALUES (?1, ?2)",
        params![project_id, sample_id.to_string()],
    )?;
    Ok(())
}

pub(crate) fn clear_project_samples(conn: &Connection, project_id: i64) -> Result<(), CatalogError> {
    conn.execute(
        "DELETE FROM project_samples WHERE project_id = ?1",
        params![project_id],
    )?;
    Ok(())
}

fn row_to_sample(row: &Row) -> rusqlite::Result<Sample> {
    let id: String = row.get("id")?;
    let path: String = row.get("path")?;
    Ok(Sample {
        id: Uuid::from_str(&id).unwrap_or_else(|_| Uuid::nil()),
        path: PathBuf::from(path),
        name: row.get("name")?,
        is_present: row.get("is_present")?,
    })
}
