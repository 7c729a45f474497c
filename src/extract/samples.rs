//! Sample reference extraction.
//!
//! Ableton Live 11 stores sample paths as plain text. Earlier versions
//! store them as a hex-encoded, UTF-16LE-backed blob split across `Data`
//! elements — a quirk of how the old format persisted Windows `MAX_PATH`
//! wide strings regardless of platform.

use std::path::PathBuf;

use crate::error::ExtractionError;
use crate::version::{at_least, Version};
use crate::xml::{get_attribute, iter_named, try_get_element, XmlElement};

/// Every sample path referenced by a `SampleRef` element in the document.
/// Extraction failures for individual references are returned inline so
/// the caller can decide whether to log-and-skip or abort.
pub fn extract(root: &XmlElement, version: Version) -> Vec<Result<PathBuf, ExtractionError>> {
    iter_named(root, "SampleRef")
        .into_iter()
        .map(|sample_ref| extract_one(sample_ref, version))
        .collect()
}

fn extract_one(sample_ref: &XmlElement, version: Version) -> Result<PathBuf, ExtractionError> {
    if at_least(version, 11, 0) {
        let path = get_attribute(sample_ref, "FileRef.Path", "Value")
            .map_err(|_| ExtractionError::MarkerAbsent("FileRef.Path@Value".to_string()))?;
        return Ok(PathBuf::from(path));
    }

    let data = try_get_element(sample_ref, "FileRef.Data")
        .ok_or_else(|| ExtractionError::MarkerAbsent("FileRef.Data".to_string()))?;
    decode_hex_path(data)
}

/// Concatenates the hex digits scattered across `Data`'s children (or its
/// own text, depending on how the element was serialized), strips
/// whitespace, decodes the hex, and interprets the bytes as UTF-16LE.
fn decode_hex_path(data: &XmlElement) -> Result<PathBuf, ExtractionError> {
    let mut hex_digits = String::new();
    if !data.text.is_empty() {
        hex_digits.push_str(&data.text);
    }
    for child in &data.children {
        hex_digits.push_str(&child.text);
    }
    let cleaned: String = hex_digits
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let bytes = hex::decode(&cleaned)
        .map_err(|e| ExtractionError::InvalidHex(format!("{e}: {cleaned}")))?;

    let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(&bytes);
    if had_errors {
        return Err(ExtractionError::Utf16Decode);
    }

    let cleaned = decoded.replace('\u{0}', "");
    Ok(PathBuf::from(cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    #[test]
    fn reads_plain_path_on_v11_and_above() {
        let doc = parse(
            br#"<Ableton><SampleRef><FileRef>
                <Path Value="/Users/me/Samples/kick.wav" />
            </FileRef></SampleRef></Ableton>"#,
        )
        .unwrap();
        let sample_ref = doc.child("SampleRef").unwrap();
        let path = extract_one(sample_ref, Version::new(11, 0, 0)).unwrap();
        assert_eq!(path, PathBuf::from("/Users/me/Samples/kick.wav"));
    }

    fn hex_encode_utf16le(s: &str) -> String {
        let units: Vec<u16> = s.encode_utf16().collect();
        let mut bytes = Vec::with_capacity(units.len() * 2);
        for unit in units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        hex::encode_upper(bytes)
    }

    #[test]
    fn decodes_hex_utf16_blob_below_v11() {
        let encoded = hex_encode_utf16le("C:\\Samples\\kick.wav");
        let xml = format!(
            r#"<Ableton><SampleRef><FileRef><Data>{encoded}</Data></FileRef></SampleRef></Ableton>"#
        );
        let doc = parse(xml.as_bytes()).unwrap();
        let sample_ref = doc.child("SampleRef").unwrap();
        let path = extract_one(sample_ref, Version::new(9, 7, 0)).unwrap();
        assert_eq!(path, PathBuf::from("C:\\Samples\\kick.wav"));
    }

    #[test]
    fn strips_embedded_nulls_not_just_trailing_ones() {
        // A zero-padded UTF-16LE code unit ("\0") spliced into the middle of
        // the string, mimicking the old format's fixed-width field layout,
        // must be dropped wherever it falls, not just at the end.
        let mut units: Vec<u16> = "C:\\a".encode_utf16().collect();
        units.push(0);
        units.extend("b.wav".encode_utf16());
        let mut bytes = Vec::with_capacity(units.len() * 2);
        for unit in units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let encoded = hex::encode_upper(bytes);
        let xml = format!(
            r#"<Ableton><SampleRef><FileRef><Data>{encoded}</Data></FileRef></SampleRef></Ableton>"#
        );
        let doc = parse(xml.as_bytes()).unwrap();
        let sample_ref = doc.child("SampleRef").unwrap();
        let path = extract_one(sample_ref, Version::new(9, 7, 0)).unwrap();
        assert_eq!(path, PathBuf::from("C:\\ab.wav"));
    }

    #[test]
    fn rejects_malformed_hex() {
        let doc = parse(
            br#"<Ableton><SampleRef><FileRef><Data>not-hex-at-all</Data></FileRef></SampleRef></Ableton>"#,
        )
        .unwrap();
        let sample_ref = doc.child("SampleRef").unwrap();
        let err = extract_one(sample_ref, Version::new(9, 0, 0)).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidHex(_)));
    }
}
