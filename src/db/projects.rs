//! Project row CRUD.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::Catalog;
use crate::error::CatalogError;
use crate::project::{Project, TimeSignature};

impl Catalog {
    /// Inserts a new project row and returns the catalog-assigned
    /// `identifier`. `project.identifier` is ignored on input.
    pub fn insert_project(&self, project: &Project) -> Result<i64, CatalogError> {
        insert_project(&self.conn, project)
    }

    /// Overwrites every derived field of an existing row, keyed by
    /// `identifier`. Used when re-extracting a project in place (content
    /// changed, path unchanged).
    pub fn update_project(&self, project: &Project) -> Result<(), CatalogError> {
        update_project(&self.conn, project)
    }

    /// Rebinds an existing row (matched by content hash) onto a new path,
    /// without touching its derived fields — the reconciler's "rename"
    /// branch.
    pub fn rebind_project_path(&self, identifier: i64, new_path: &Path) -> Result<(), CatalogError> {
        rebind_project_path(&self.conn, identifier, new_path)
    }

    pub fn find_project_by_path(&self, path: &Path) -> Result<Option<Project>, CatalogError> {
        find_project_by_path(&self.conn, path)
    }

    pub fn find_project_by_hash(&self, file_hash: &str) -> Result<Option<Project>, CatalogError> {
        find_project_by_hash(&self.conn, file_hash)
    }

    pub fn get_project(&self, identifier: i64) -> Result<Option<Project>, CatalogError> {
        self.conn
            .query_row(
                "SELECT * FROM projects WHERE identifier = ?1",
                params![identifier],
                row_to_project,
            )
            .optional()
            .map_err(CatalogError::from)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, CatalogError> {
        let mut stmt = self.conn.prepare("SELECT * FROM projects ORDER BY path")?;
        let rows = stmt.query_map([], row_to_project)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(CatalogError::from)
    }

    /// Removes a project row and, via `ON DELETE CASCADE`, its join-table
    /// rows. Called by the watcher when a `.als` file disappears.
    pub fn delete_project_by_path(&self, path: &Path) -> Result<(), CatalogError> {
        delete_project_by_path(&self.conn, path)
    }
}

/// Free-function form of [`Catalog::insert_project`], usable against either
/// the catalog's own autocommit connection or an open
/// [`rusqlite::Transaction`] (which derefs to `Connection`) — the
/// reconciler commits a project row and its plugin/sample links as one
/// transaction rather than as separate autocommit statements.
pub(crate) fn insert_project(conn: &Connection, project: &Project) -> Result<i64, CatalogError> {
    conn.execute(
        "INSERT INTO projects (
            uuid, path, file_hash, name, creation_time, last_modification_time,
            last_scan_timestamp, creator, key, tempo, time_signature,
            furthest_bar, estimated_duration
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            project.uuid.to_string(),
            project.path.to_string_lossy(),
            project.file_hash,
            project.name,
            project.creation_time.to_rfc3339(),
            project.last_modification_time.to_rfc3339(),
            project.last_scan_timestamp.to_rfc3339(),
            project.creator,
            project.key,
            project.tempo,
            project.time_signature.map(|sig| sig.to_string()),
            project.furthest_bar,
            project.estimated_duration,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_project(conn: &Connection, project: &Project) -> Result<(), CatalogError> {
    conn.execute(
        "UPDATE projects SET
            file_hash = ?2, name = ?3, last_modification_time = ?4,
            last_scan_timestamp = ?5, creator = ?6, key = ?7, tempo = ?8,
            time_signature = ?9, furthest_bar = ?10, estimated_duration = ?11
         WHERE identifier = ?1",
        params![
            project.identifier,
            project.file_hash,
            project.name,
            project.last_modification_time.to_rfc3339(),
            project.last_scan_timestamp.to_rfc3339(),
            project.creator,
            project.key,
            project.tempo,
            project.time_signature.map(|sig| sig.to_string()),
            project.furthest_bar,
            project.estimated_duration,
        ],
    )?;
    Ok(())
}

pub(crate) fn rebind_project_path(
    conn: &Connection,
    identifier: i64,
    new_path: &Path,
) -> Result<(), CatalogError> {
    conn.execute(
        "UPDATE projects SET path = ?2 WHERE identifier = ?1",
        params![identifier, new_path.to_string_lossy()],
    )?;
    Ok(())
}

pub(crate) fn find_project_by_path(conn: &Connection, path: &Path) -> Result<Option<Project>, CatalogError> {
    conn.query_row(
        "SELECT * FROM projects WHERE path = ?1",
        params![path.to_string_lossy()],
        row_to_project,
    )
    .optional()
    .map_err(CatalogError::from)
}

pub(crate) fn find_project_by_hash(conn: &Connection, file_hash: &str) -> Result<Option<Project>, CatalogError> {
    conn.query_row(
        "SELECT * FROM projects WHERE file_hash = ?1",
        params![file_hash],
        row_to_project,
    )
    .optional()
    .map_err(CatalogError::from)
}

pub(crate) fn delete_project_by_path(conn: &Connection, path: &Path) -> Result<(), CatalogError> {
    conn.execute(
        "DELETE FROM projects WHERE path = ?1",
        params![path.to_string_lossy()],
    )?;
    Ok(())
}

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    let identifier: i64 = row.get("identifier")?;
    let uuid: String = row.get("uuid")?;
    let path: String = row.get("path")?;
    let creation_time: String = row.get("creation_time")?;
    let last_modification_time: String = row.get("last_modification_time")?;
    let last_scan_timestamp: String = row.get("last_scan_timestamp")?;
    let time_signature: Option<String> = row.get("time_signature")?;

    Ok(Project {
        identifier,
        uuid: Uuid::from_str(&uuid).unwrap_or_else(|_| Uuid::nil()),
        path: PathBuf::from(path),
        file_hash: row.get("file_hash")?,
        name: row.get("name")?,
        creation_time: parse_rfc3339(&creation_time),
        last_modification_time: parse_rfc3339(&last_modification_time),
        last_scan_timestamp: parse_rfc3339(&last_scan_timestamp),
        creator: row.get("creator")?,
        key: row.get("key")?,
        tempo: row.get("tempo")?,
        time_signature: time_signature.and_then(|s| TimeSignature::from_str(&s).ok()),
        furthest_bar: row.get("furthest_bar")?,
        estimated_duration: row.get("estimated_duration")?,
    })
}

fn parse_rfc3339(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
