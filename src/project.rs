//! Data model (§3): the catalog's core record types, shared by the
//! reconciler, the SQLite store, and the query projection.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A decoded `(numerator, denominator)` pair, rendered as `"4/4"` for
/// display and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl std::str::FromStr for TimeSignature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once('/')
            .ok_or_else(|| format!("not a time signature: {s}"))?;
        Ok(TimeSignature {
            numerator: num.parse().map_err(|_| format!("bad numerator: {num}"))?,
            denominator: den.parse().map_err(|_| format!("bad denominator: {den}"))?,
        })
    }
}

/// The two plugin formats the original device-chain parser recognizes.
/// Distinguishes the uniqueness family a plugin name belongs to: the same
/// name can appear once as a VST2 device and once as a VST3 device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginFormat {
    Vst,
    Vst3,
}

impl std::fmt::Display for PluginFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginFormat::Vst => write!(f, "vst"),
            PluginFormat::Vst3 => write!(f, "vst3"),
        }
    }
}

impl std::str::FromStr for PluginFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vst" => Ok(PluginFormat::Vst),
            "vst3" => Ok(PluginFormat::Vst3),
            other => Err(format!("unknown plugin format: {other}")),
        }
    }
}

/// A single Ableton Live Set, as reconciled into the catalog.
///
/// `identifier` is the catalog's own monotonically assigned primary key;
/// `uuid` is assigned once at creation and never reused. Both survive
/// renames and in-place edits untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub identifier: i64,
    pub uuid: Uuid,
    pub path: PathBuf,
    pub file_hash: String,
    pub name: String,
    pub creation_time: DateTime<Utc>,
    pub last_modification_time: DateTime<Utc>,
    pub last_scan_timestamp: DateTime<Utc>,
    pub creator: String,
    pub key: Option<String>,
    pub tempo: Option<f64>,
    pub time_signature: Option<TimeSignature>,
    pub furthest_bar: Option<f64>,
    pub estimated_duration: Option<f64>,
}

/// A distinct plugin identity: `(name, format)` is unique across the
/// catalog regardless of how many projects reference it.
///
/// `installed` reflects the installed-plugin overlay as of this row's last
/// insertion — it is not re-checked on every read, so it can drift stale
/// for a plugin that stops (or starts) being installed between scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    pub id: Uuid,
    pub name: String,
    pub format: PluginFormat,
    pub installed: bool,
}

/// A distinct sample path. Two projects referencing the same file on disk
/// share one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    pub path: PathBuf,
    /// File name component of `path`, kept alongside it for display.
    pub name: String,
    /// Whether `path` resolved to an existing file as of the last
    /// reconciliation that touched this row. Set on insert and refreshed on
    /// every relink; stale caching between scans is acceptable.
    pub is_present: bool,
}
