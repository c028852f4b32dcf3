//! Walking a calculation document for groups and setting lines.
use crate::edit::{ParagraphRange, traverse};
use crate::ooxml::docx::Document;
use crate::settings::{Setting, SettingGroups, SettingsLayout, expand_ranged};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

static SETTING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^=]+)\s*=\s*(.*)").expect("valid setting line regex"));

/// Split setting-line text into `(name, value)`, both trimmed.
///
/// The text must contain `=` with something before it.
pub fn parse_setting_line(text: &str) -> Option<(String, String)> {
    let caps = SETTING_LINE.captures(text.trim())?;
    let name = caps[1].trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), caps[2].trim().to_string()))
}

/// Extract the settings of `doc`, grouped by the heading they follow.
///
/// Only the bold, non-struck direct runs of a setting line count. Lines
/// that do not parse are skipped, as are lines before the first heading
/// that names a group. Ranged names are expanded per group.
pub fn extract_settings(doc: &Document, layout: &SettingsLayout) -> SettingGroups {
    let mut groups = SettingGroups::new();
    let mut current: Option<String> = None;

    for id in traverse(doc, ParagraphRange::all()) {
        let paragraph = doc.paragraph(id);
        let style = paragraph.style_name();

        if let Some(rules) = layout.heading_rules(&style) {
            let heading = paragraph.text();
            if let Some(group) = rules.iter().find_map(|rule| rule.classify(heading.trim())) {
                debug!(heading = %heading, group = %group, "setting group");
                current = Some(group);
            }
            continue;
        }

        if !layout.is_setting_style(&style) {
            continue;
        }
        let text: String = paragraph
            .runs()
            .iter()
            .filter(|r| r.is_bold() && !r.is_strike())
            .map(|r| r.text())
            .collect();
        let Some((name, value)) = parse_setting_line(&text) else {
            continue;
        };
        match &current {
            Some(group) => {
                debug!(group = %group, name = %name, value = %value, "setting");
                groups.push(group, Setting::new(name, value));
            },
            None => warn!(name = %name, "setting line before any group heading skipped"),
        }
    }

    for group in groups.iter_mut() {
        expand_ranged(&mut group.settings);
    }
    info!(groups = groups.len(), "settings extracted");
    groups
}
