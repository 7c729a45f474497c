//! Version gate (C4): parses the `Creator` attribute of the document root
//! into a comparable version, and gates field extractors that only apply
//! above (or below) a given Ableton Live release.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractionError;

/// Matches strings like `Ableton Live 11.0.2`, `Ableton Live 9.7.5b`, or
/// `Ableton Live 10.1`. The third component and the beta marker are both
/// optional, matching the inconsistent `Creator` strings seen across
/// releases.
static CREATOR_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Ableton Live (\d{1,2})\.(\d{1,3})[\.b]?(\d{1,3})?").expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A parsed `Creator` string: the version triple plus whether the release
/// string carried a beta marker (a literal `b` between minor and patch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatorVersion {
    pub version: Version,
    pub beta: bool,
}

/// Parses a `Creator` attribute value such as `"Ableton Live 11.0.2"` into
/// its version triple. Returns [`ExtractionError::UnparseableVersion`] if the
/// string doesn't contain a recognizable `Ableton Live X.Y[.Z]` prefix.
pub fn parse_creator(creator: &str) -> Result<CreatorVersion, ExtractionError> {
    let captures = CREATOR_VERSION
        .captures(creator)
        .ok_or_else(|| ExtractionError::UnparseableVersion(creator.to_string()))?;

    let major: u32 = captures[1]
        .parse()
        .map_err(|_| ExtractionError::UnparseableVersion(creator.to_string()))?;
    let minor: u32 = captures[2]
        .parse()
        .map_err(|_| ExtractionError::UnparseableVersion(creator.to_string()))?;
    let patch: u32 = captures
        .get(3)
        .map(|m| m.as_str().parse())
        .transpose()
        .map_err(|_| ExtractionError::UnparseableVersion(creator.to_string()))?
        .unwrap_or(0);

    let beta = creator.contains('b') && creator[captures.get(0).unwrap().range()].contains('b');

    Ok(CreatorVersion {
        version: Version::new(major, minor, patch),
        beta,
    })
}

/// Replaces the Python `@above_version(major, minor)` decorator: a plain
/// predicate an extractor calls before running a version-gated code path.
pub fn at_least(version: Version, major: u32, minor: u32) -> bool {
    version >= Version::new(major, minor, 0)
}
