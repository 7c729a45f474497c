//! Tempo extraction: the master tempo's path in the document changed when
//! Live 9.7 introduced the `Manual` value form; earlier releases only ever
//! wrote the tempo as the first point of an automation envelope.

use crate::error::ExtractionError;
use crate::version::{at_least, Version};
use crate::xml::{get_attribute, XmlElement};

const MANUAL_PATH: &str = "LiveSet.MasterTrack.DeviceChain.Mixer.Tempo.Manual";
const LEGACY_EVENT_PATH: &str =
    "LiveSet.MasterTrack.MasterChain.Mixer.Tempo.ArrangerAutomation.Events.FloatEvent";

/// Returns the project's master tempo in BPM, rounded to 6 decimals.
///
/// Live 9.7 and above store the tempo as a plain `Manual` value; earlier
/// releases only ever automated it, so the first point of that automation
/// envelope is read instead.
pub fn extract(root: &XmlElement, version: Version) -> Result<f64, ExtractionError> {
    // `major >= 10 || (major == 9 && minor >= 7)` collapses to a single
    // `(major, minor) >= (9, 7)` comparison.
    let path = if at_least(version, 9, 7) {
        MANUAL_PATH
    } else {
        LEGACY_EVENT_PATH
    };

    let raw = get_attribute(root, path, "Value")
        .map_err(|_| ExtractionError::MarkerAbsent(path.to_string()))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| ExtractionError::MarkerAbsent(format!("unparseable tempo: {raw}")))?;
    Ok(round6(value))
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
