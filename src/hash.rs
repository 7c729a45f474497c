//! Hash & IO primitives (C1): streaming SHA-256, gzip decompression, and
//! filesystem timestamp reads with a "now" fallback on OS failure.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use log::warn;
use sha2::{Digest, Sha256};

use crate::error::{FormatError, IoError};

const CHUNK_SIZE: usize = 4096;

/// Streams `path` in 4 KiB blocks through SHA-256 and returns the lowercase
/// hex digest. The gzip envelope is hashed as-is, matching the reconciler's
/// use of the raw file hash for identity, independent of its decoded content.
pub fn hash_file(path: &Path) -> Result<String, IoError> {
    let mut file = File::open(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf).map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Gunzips `bytes`, returning the decompressed payload. Any failure while
/// reading the gzip envelope is a [`FormatError`].
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(FormatError::Gzip)?;
    Ok(out)
}

/// Returns `(created, modified)` for `path`. On any OS failure, both values
/// fall back to "now" and a warning is logged; this method never fails.
pub fn stat_times(path: &Path) -> (DateTime<Utc>, DateTime<Utc>) {
    match std::fs::metadata(path) {
        Ok(meta) => {
            let created = meta.created().unwrap_or_else(|_| SystemTime::now());
            let modified = meta.modified().unwrap_or_else(|_| SystemTime::now());
            (DateTime::from(created), DateTime::from(modified))
        }
        Err(e) => {
            warn!("{}: failed to stat file: {e}", path.display());
            let now = Utc::now();
            (now, now)
        }
    }
}
