//! XML model (C3): a minimal DOM-like tree with dotted-path child lookups,
//! the shape the field extractors (C5) are written against.
//!
//! This mirrors the semantics of Python's `ElementTree.findall("./a/b/c")`
//! used by the original extraction code: a dotted path is a sequence of
//! *direct* child names, one level at a time, starting from the document
//! root. A companion [`iter_named`] walks the whole tree (any depth) for the
//! handful of extractors that scan for a tag wherever it occurs.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{ElementNotFound, FormatError};

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            attributes: HashMap::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// First direct child named `name`, document order.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Parses a complete XML document into a tree rooted at its single root
/// element. Fails with [`FormatError`] on malformed XML or an empty
/// document (no root element at all).
pub fn parse(bytes: &[u8]) -> Result<XmlElement, FormatError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| FormatError::Xml(e.to_string()))?;
        match event {
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let elem = element_from_start(&start)?;
                attach(&mut stack, &mut root, elem);
            }
            Event::End(_) => {
                let finished = stack
                    .pop()
                    .ok_or_else(|| FormatError::Xml("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, finished);
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| FormatError::Xml(e.to_string()))?;
                    top.text.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                if let Some(top) = stack.last_mut() {
                    top.text
                        .push_str(&String::from_utf8_lossy(cdata.as_ref()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or(FormatError::MissingRoot)
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, elem: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(elem);
    } else {
        *root = Some(elem);
    }
}

fn element_from_start(start: &BytesStart) -> Result<XmlElement, FormatError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut elem = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FormatError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| FormatError::Xml(e.to_string()))?
            .into_owned();
        elem.attributes.insert(key, value);
    }
    Ok(elem)
}

/// Navigates a `.`-separated path of direct-child names starting at `root`.
/// Returns the first matching element at each level, document order.
fn navigate<'a>(root: &'a XmlElement, dotted_path: &str) -> Option<&'a XmlElement> {
    let mut current = root;
    for segment in dotted_path.split('.') {
        current = current.child(segment)?;
    }
    Some(current)
}

/// `get_element(root, path)` — required variant; raises [`ElementNotFound`]
/// when the path doesn't resolve.
pub fn get_element<'a>(
    root: &'a XmlElement,
    dotted_path: &str,
) -> Result<&'a XmlElement, ElementNotFound> {
    navigate(root, dotted_path).ok_or_else(|| ElementNotFound {
        path: dotted_path.to_string(),
    })
}

/// `get_element` silent variant; returns `None` rather than raising.
pub fn try_get_element<'a>(root: &'a XmlElement, dotted_path: &str) -> Option<&'a XmlElement> {
    navigate(root, dotted_path)
}

/// `get(root, path, attribute)` — required variant; raises
/// [`ElementNotFound`] when the path or the attribute doesn't resolve.
pub fn get_attribute(
    root: &XmlElement,
    dotted_path: &str,
    attribute: &str,
) -> Result<String, ElementNotFound> {
    navigate(root, dotted_path)
        .and_then(|elem| elem.attr(attribute))
        .map(str::to_string)
        .ok_or_else(|| ElementNotFound {
            path: format!("{dotted_path}@{attribute}"),
        })
}

/// Silent variant of [`get_attribute`]; returns `None` instead of raising.
pub fn try_get_attribute(root: &XmlElement, dotted_path: &str, attribute: &str) -> Option<String> {
    navigate(root, dotted_path).and_then(|elem| elem.attr(attribute).map(str::to_string))
}

/// Every element named `tag`, anywhere in the tree, in document (pre-)order.
pub fn iter_named<'a>(root: &'a XmlElement, tag: &str) -> Vec<&'a XmlElement> {
    let mut out = Vec::new();
    collect_named(root, tag, &mut out);
    out
}

fn collect_named<'a>(elem: &'a XmlElement, tag: &str, out: &mut Vec<&'a XmlElement>) {
    if elem.name == tag {
        out.push(elem);
    }
    for child in &elem.children {
        collect_named(child, tag, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<Ableton Creator="Ableton Live 11.0.0">
        <LiveSet>
            <MasterTrack>
                <DeviceChain>
                    <Mixer>
                        <Tempo>
                            <Manual Value="120.5" />
                        </Tempo>
                    </Mixer>
                </DeviceChain>
            </MasterTrack>
            <Tracks>
                <MidiClip>
                    <CurrentEnd Value="16" />
                </MidiClip>
                <MidiClip>
                    <CurrentEnd Value="32" />
                </MidiClip>
            </Tracks>
        </LiveSet>
    </Ableton>"#;

    #[test]
    fn parse_builds_tree_with_root_attribute() {
        let tree = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tree.name, "Ableton");
        assert_eq!(tree.attr("Creator"), Some("Ableton Live 11.0.0"));
    }

    #[test]
    fn get_attribute_navigates_dotted_path() {
        let tree = parse(SAMPLE.as_bytes()).unwrap();
        let value =
            get_attribute(&tree, "LiveSet.MasterTrack.DeviceChain.Mixer.Tempo.Manual", "Value")
                .unwrap();
        assert_eq!(value, "120.5");
    }

    #[test]
    fn get_attribute_missing_path_raises() {
        let tree = parse(SAMPLE.as_bytes()).unwrap();
        let err = get_attribute(&tree, "LiveSet.Nope", "Value").unwrap_err();
        assert_eq!(err.path, "LiveSet.Nope@Value");
    }

    #[test]
    fn try_get_attribute_missing_path_is_none() {
        let tree = parse(SAMPLE.as_bytes()).unwrap();
        assert!(try_get_attribute(&tree, "LiveSet.Nope", "Value").is_none());
    }

    #[test]
    fn iter_named_finds_all_matches_any_depth() {
        let tree = parse(SAMPLE.as_bytes()).unwrap();
        let ends = iter_named(&tree, "CurrentEnd");
        assert_eq!(ends.len(), 2);
        assert_eq!(ends[0].attr("Value"), Some("16"));
        assert_eq!(ends[1].attr("Value"), Some("32"));
    }

    #[test]
    fn parse_rejects_malformed_xml() {
        let err = parse(b"<Ableton><Unclosed></Ableton>");
        assert!(err.is_err());
    }

    #[test]
    fn parse_empty_document_has_no_root() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(err, FormatError::MissingRoot));
    }
}
