//! Time signature extraction.
//!
//! The global time signature is stored as an `EnumEvent` whose `Time`
//! attribute carries an undocumented sentinel, `-63072000`, rather than a
//! real song position — this is how the original format distinguishes the
//! one authoritative global event from the per-clip automation events that
//! share the same element name. Its `Value` attribute packs numerator and
//! denominator into a single integer.

use crate::error::ExtractionError;
use crate::project::TimeSignature;
use crate::xml::{iter_named, XmlElement};

/// The `Time` value that marks the global (non-automated) time signature
/// event, as opposed to a per-clip automation point.
const GLOBAL_EVENT_SENTINEL: &str = "-63072000";

/// `value = denominator_index * 99 + (numerator - 1)`, where
/// `denominator = 2 ^ denominator_index`. A negative value carries no
/// denominator information at all and decodes to a bare numerator of `1`.
pub fn decode_numerator(value: i64) -> u32 {
    if value < 0 {
        1
    } else if value < 99 {
        (value + 1) as u32
    } else {
        ((value % 99) + 1) as u32
    }
}

pub fn decode_denominator(value: i64) -> u32 {
    let denominator_index = value.div_euclid(99).max(0);
    2u32.pow(denominator_index as u32)
}

pub fn encode(signature: TimeSignature) -> i64 {
    let denominator_index = (signature.denominator as f64).log2().round() as i64;
    denominator_index * 99 + (signature.numerator as i64 - 1)
}

/// Scans every `EnumEvent` in the document for the one carrying the global
/// sentinel, and decodes its packed `Value`.
pub fn extract(root: &XmlElement) -> Result<TimeSignature, ExtractionError> {
    let event = iter_named(root, "EnumEvent")
        .into_iter()
        .find(|e| e.attr("Time") == Some(GLOBAL_EVENT_SENTINEL))
        .ok_or_else(|| ExtractionError::MarkerAbsent("global time signature event".to_string()))?;

    let raw = event
        .attr("Value")
        .ok_or_else(|| ExtractionError::MarkerAbsent("EnumEvent@Value".to_string()))?;
    let encoded: i64 = raw
        .parse()
        .map_err(|_| ExtractionError::MarkerAbsent(format!("unparseable time signature: {raw}")))?;

    Ok(TimeSignature {
        numerator: decode_numerator(encoded),
        denominator: decode_denominator(encoded),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    #[test]
    fn decodes_common_time() {
        // numerator 4, denominator 4 -> denominator_index 2 -> 2*99+3
        assert_eq!(decode_numerator(201), 4);
        assert_eq!(decode_denominator(201), 4);
    }

    #[test]
    fn decodes_six_eight() {
        // numerator 6, denominator 8 -> denominator_index 3 -> 3*99+5
        assert_eq!(decode_numerator(302), 6);
        assert_eq!(decode_denominator(302), 8);
    }

    #[test]
    fn negative_value_decodes_to_bare_numerator_one() {
        assert_eq!(decode_numerator(-1), 1);
    }

    #[test]
    fn decoder_laws_hold_across_the_v99_boundary() {
        for v in 0..99 {
            assert_eq!(decode_numerator(v), (v + 1) as u32);
        }
        for v in [99, 150, 297, 302] {
            assert_eq!(decode_numerator(v), ((v % 99) + 1) as u32);
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let sig = TimeSignature {
            numerator: 7,
            denominator: 16,
        };
        let encoded = encode(sig);
        assert_eq!(decode_numerator(encoded), sig.numerator);
        assert_eq!(decode_denominator(encoded), sig.denominator);
    }

    #[test]
    fn extract_ignores_non_sentinel_enum_events() {
        let doc = parse(
            br#"<Ableton><LiveSet>
                <MidiClip><Time><EnumEvent Time="0" Value="201" /></Time></MidiClip>
                <EnumEvent Time="-63072000" Value="201" />
            </LiveSet></Ableton>"#,
        )
        .unwrap();
        let sig = extract(&doc).unwrap();
        assert_eq!(sig.numerator, 4);
        assert_eq!(sig.denominator, 4);
    }

    #[test]
    fn extract_errors_when_sentinel_event_absent() {
        let doc = parse(br#"<Ableton><LiveSet /></Ableton>"#).unwrap();
        assert!(extract(&doc).is_err());
    }
}
