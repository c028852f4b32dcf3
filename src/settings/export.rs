//! Flat text export for setting import.
use crate::settings::SettingGroups;
use std::collections::BTreeMap;
use tracing::warn;

/// Render `groups` as a flat import file.
///
/// Each group starts with a blank line and a `[ALIAS]` header, where the
/// alias comes from `aliases` keyed by group name (the group name itself when
/// missing). Settings follow as `name,"value"`; names containing spaces are
/// quoted too.
pub fn write_flat(groups: &SettingGroups, aliases: &BTreeMap<String, String>) -> String {
    let mut lines: Vec<String> = Vec::new();
    for group in groups.iter() {
        let alias = match aliases.get(&group.name) {
            Some(alias) => alias.as_str(),
            None => {
                warn!(group = %group.name, "no alias for setting group, using its name");
                group.name.as_str()
            },
        };
        lines.push(String::new());
        lines.push(format!("[{}]", alias));
        for setting in &group.settings {
            if setting.name.contains(' ') {
                lines.push(format!("\"{}\",\"{}\"", setting.name, setting.value));
            } else {
                lines.push(format!("{},\"{}\"", setting.name, setting.value));
            }
        }
    }
    lines.join("\n")
}
