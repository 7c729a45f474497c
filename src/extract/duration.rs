//! Estimated duration: derived from the furthest bar marker, the time
//! signature, and the tempo, not read directly from the file — Ableton
//! Live Sets don't store a project length anywhere.

/// `furthest_bar * beats_per_bar * 60 / tempo`, in seconds. Any missing or
/// zero operand (tempo in particular) yields `0.0` rather than dividing by
/// zero.
pub fn estimate(furthest_bar: f64, beats_per_bar: f64, tempo: f64) -> f64 {
    if tempo <= 0.0 || furthest_bar <= 0.0 || beats_per_bar <= 0.0 {
        return 0.0;
    }
    furthest_bar * beats_per_bar * 60.0 / tempo
}
