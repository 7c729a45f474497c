//! Furthest-bar extraction: the position (in bars) of the latest clip end
//! marker anywhere in the arrangement, used as the basis for the estimated
//! duration.

use crate::xml::{iter_named, XmlElement};

/// The highest `CurrentEnd@Value` found anywhere in the document, divided
/// by `beats_per_bar` to convert from beats to bars. Never fails: a
/// document with no `CurrentEnd` markers at all yields `0.0`.
pub fn extract(root: &XmlElement, beats_per_bar: f64) -> f64 {
    let max_end = iter_named(root, "CurrentEnd")
        .into_iter()
        .filter_map(|e| e.attr("Value"))
        .filter_map(|v| v.parse::<f64>().ok())
        .fold(0.0_f64, f64::max);

    if beats_per_bar <= 0.0 {
        return 0.0;
    }
    max_end / beats_per_bar
}
