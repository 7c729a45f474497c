//! Error taxonomy shared across the catalog engine.
//!
//! Extractor-level failures (`ExtractionError`) are recoverable: callers log
//! a warning and leave the field untouched. `IoError`, `FormatError`, and a
//! missing XML root abort the whole reconciliation pass for that path. See
//! §7 of the design for the full propagation policy.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("gzip envelope rejected: {0}")]
    Gzip(#[source] std::io::Error),
    #[error("XML payload rejected: {0}")]
    Xml(String),
    #[error("document has no root element")]
    MissingRoot,
    #[error("document root is missing its Creator attribute")]
    MissingCreator,
}

#[derive(Debug, Error)]
#[error("no element for path [{path}]")]
pub struct ElementNotFound {
    pub path: String,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("required marker absent: {0}")]
    MarkerAbsent(String),
    #[error("invalid hex blob: {0}")]
    InvalidHex(String),
    #[error("UTF-16 decode failed for sample path")]
    Utf16Decode,
    #[error("field unsupported below Ableton Live {0}")]
    BelowMinimumVersion(String),
    #[error("could not parse version from creator string: {0}")]
    UnparseableVersion(String),
}

#[derive(Debug, Error)]
pub enum InvalidPath {
    #[error("'{0}' is not a .als file")]
    NotAlsFile(PathBuf),
    #[error("'{0}' is neither a file nor a directory")]
    NotFileOrDirectory(PathBuf),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("uniqueness violation: {0}")]
    Uniqueness(String),
    #[error("referential integrity violation: {0}")]
    Referential(String),
}

/// Top-level error for a single reconciliation pass over one path.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Umbrella error returned by the CLI binary and library entry points that
/// can fail in more than one of the above ways at startup.
#[derive(Debug, Error)]
pub enum CatalogEngineError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    ElementNotFound(#[from] ElementNotFound),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    InvalidPath(#[from] InvalidPath),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Notify(#[from] notify::Error),
}
