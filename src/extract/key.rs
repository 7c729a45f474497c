//! Key extraction: the project's key is inferred from every MIDI clip
//! explicitly flagged as harmonically constrained to a scale, taken as a
//! histogram vote rather than read from any single authoritative field —
//! Ableton Live Sets have no "project key" of their own, and the feature
//! that lets a clip declare one didn't exist before Live 11.

use crate::error::ExtractionError;
use crate::version::{at_least, Version};
use crate::xml::{iter_named, XmlElement};

/// Root note names in semitone order, `0` through `11`.
const NOTE_SYMBOLS: [&str; 12] = [
    "C", "C#/Db", "D", "D#/Eb", "E", "F", "F#/Gb", "G", "G#/Ab", "A", "A#/Bb", "B",
];

const UNKNOWN: &str = "Unknown";

fn note_symbol(root_note: i64) -> Option<&'static str> {
    NOTE_SYMBOLS.get(root_note.rem_euclid(12) as usize).copied()
}

/// Returns `"<root note> <scale name>"` for the most frequently declared
/// in-key scale across the document's `MidiClip` elements, `"Unknown"` if
/// none is found (or the file predates Live 11), never an error.
///
/// Clips are first collapsed into a root-note-keyed map — a second clip
/// sharing an earlier clip's root note overwrites the recorded scale name
/// rather than adding a second histogram entry — so every entry going into
/// the frequency count is already unique by root note. `find_most_frequent`
/// therefore always lands on a tie, which it breaks by keeping whichever
/// root note was *first observed* in document order. This mirrors the
/// original scan's `scale_dict[root_note] = scale_name` accumulation
/// exactly: it is not a numeric-majority vote despite reading like one.
pub fn extract(root: &XmlElement, version: Version) -> Result<String, ExtractionError> {
    if !at_least(version, 11, 0) {
        return Ok(UNKNOWN.to_string());
    }

    let mut by_root_note: Vec<(&'static str, String)> = Vec::new();
    for clip in iter_named(root, "MidiClip") {
        let in_key = clip
            .child("IsInKey")
            .and_then(|e| e.attr("Value"))
            .map(|v| v == "true")
            .unwrap_or(false);
        if !in_key {
            continue;
        }
        let Some(scale) = clip.child("ScaleInformation") else { continue };
        let Some(root_note) = scale
            .child("RootNote")
            .and_then(|e| e.attr("Value"))
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(note_symbol)
        else {
            continue;
        };
        let Some(scale_name) = scale.child("Name").and_then(|e| e.attr("Value")) else {
            continue;
        };

        match by_root_note.iter_mut().find(|(note, _)| *note == root_note) {
            Some((_, existing)) => *existing = scale_name.to_string(),
            None => by_root_note.push((root_note, scale_name.to_string())),
        }
    }

    let keys: Vec<String> = by_root_note
        .into_iter()
        .map(|(note, scale)| format!("{note} {scale}"))
        .collect();

    Ok(find_most_frequent(&keys).unwrap_or_else(|| UNKNOWN.to_string()))
}

/// First-observed-wins mode: scans `values` once, keeping the first value
/// seen for each distinct entry and its running count, then returns the
/// entry with the highest count — on a tie, whichever was inserted first.
fn find_most_frequent(values: &[String]) -> Option<String> {
    let mut order: Vec<&String> = Vec::new();
    let mut counts: Vec<(&String, usize)> = Vec::new();

    for value in values {
        match order.iter().position(|&seen| seen == value) {
            Some(idx) => counts[idx].1 += 1,
            None => {
                order.push(value);
                counts.push((value, 1));
            }
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(&String, usize)>, (value, count)| {
            match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((value, count)),
            }
        })
        .map(|(value, _)| value.clone())
}
