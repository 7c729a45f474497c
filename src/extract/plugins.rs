//! Plugin extraction: walks the device chain for VST2 and VST3 device
//! descriptors and de-duplicates by `(name, format)`, since the same
//! instrument can appear on many tracks.

use std::collections::HashSet;

use crate::project::PluginFormat;
use crate::xml::{iter_named, XmlElement};

/// Every distinct `(name, format)` plugin reference in the document, in
/// first-seen order.
pub fn extract(root: &XmlElement) -> Vec<(String, PluginFormat)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for info in iter_named(root, "Vst3PluginInfo") {
        if let Some(name) = info.child("Name").and_then(|n| n.attr("Value")) {
            push_unique(&mut out, &mut seen, name.to_string(), PluginFormat::Vst3);
        }
    }

    for info in iter_named(root, "VstPluginInfo") {
        if let Some(name) = info.child("PlugName").and_then(|n| n.attr("Value")) {
            push_unique(&mut out, &mut seen, name.to_string(), PluginFormat::Vst);
        }
    }

    out
}

fn push_unique(
    out: &mut Vec<(String, PluginFormat)>,
    seen: &mut HashSet<(String, PluginFormat)>,
    name: String,
    format: PluginFormat,
) {
    let key = (name.clone(), format);
    if seen.insert(key) {
        out.push((name, format));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    #[test]
    fn dedups_repeated_vst3_instances() {
        let doc = parse(
            br#"<Ableton><LiveSet>
                <Track1><Vst3PluginInfo><Name Value="Serum" /></Vst3PluginInfo></Track1>
                <Track2><Vst3PluginInfo><Name Value="Serum" /></Vst3PluginInfo></Track2>
            </LiveSet></Ableton>"#,
        )
        .unwrap();
        let found = extract(&doc);
        assert_eq!(found, vec![("Serum".to_string(), PluginFormat::Vst3)]);
    }

    #[test]
    fn keeps_vst2_and_vst3_of_the_same_name_distinct() {
        let doc = parse(
            br#"<Ableton><LiveSet>
                <Track1><Vst3PluginInfo><Name Value="Diva" /></Vst3PluginInfo></Track1>
                <Track2><VstPluginInfo><PlugName Value="Diva" /></VstPluginInfo></Track2>
            </LiveSet></Ableton>"#,
        )
        .unwrap();
        let found = extract(&doc);
        assert_eq!(found.len(), 2);
    }
}
