//! Aspen relay database setting sheets.
//!
//! The database cannot import a sheet built from scratch, so an exported
//! sheet serves as the template. Its header names the relay type and every
//! following row carries one setting. Extracted values are written into the
//! matching rows, and only the rows that changed are written back out, so
//! the import touches nothing else.
use crate::common::error::{Error, Result};
use crate::settings::SettingGroups;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<row>[0-9.]+),'(?P<grp>.+)'='(?P<setting>.*?)','(?P<range>.*?)','(?P<value>.*?)','(?P<comment>.*?)','.*','.*','.*','.*','.*'",
    )
    .expect("valid Aspen row regex")
});

static RELAY_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RELAYTYPE='(.*)'").expect("valid relay type regex"));

const REQUEST_SECTION: &str = "[TREQUEST]";

/// How extracted groups map onto the database's setting groups.
#[derive(Debug, Clone, Default)]
pub struct AspenOptions {
    /// Database group name per extracted group name
    pub group_aliases: BTreeMap<String, String>,
    /// Names written into every row that carries them instead of only the
    /// first, e.g. voltage elements listed once per PT connection.
    pub repeated_settings: Vec<String>,
}

/// One setting row of an exported sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspenRow {
    pub row: String,
    pub group: String,
    pub setting: String,
    pub range: String,
    pub value: String,
    pub comment: String,
    /// Set once an extracted value was written into the row
    pub modified: bool,
}

impl AspenRow {
    fn parse(line: &str) -> Option<Self> {
        let caps = ROW.captures(line)?;
        Some(Self {
            row: caps["row"].to_string(),
            group: caps["grp"].to_string(),
            setting: caps["setting"].to_string(),
            range: caps["range"].to_string(),
            value: caps["value"].to_string(),
            comment: caps["comment"].to_string(),
            modified: false,
        })
    }

    fn to_line(&self) -> String {
        format!(
            "{},'{}'='{}','{}','{}','{}','','','','',''",
            self.row, self.group, self.setting, self.range, self.value, self.comment
        )
    }
}

/// A parsed Aspen export.
#[derive(Debug, Clone)]
pub struct AspenTemplate {
    head: Vec<String>,
    relay_type: String,
    rows: Vec<AspenRow>,
}

impl AspenTemplate {
    /// Parse an exported sheet.
    ///
    /// The header runs up to the `[<relay type>]` section line; lines after
    /// it that are not setting rows are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFormat`] when the `[TREQUEST]` section carries no
    /// `RELAYTYPE`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim);
        let mut head: Vec<String> = Vec::new();

        for line in lines.by_ref() {
            head.push(line.to_string());
            if line == REQUEST_SECTION {
                break;
            }
        }

        let mut relay_type = None;
        for line in lines.by_ref() {
            head.push(line.to_string());
            if let Some(caps) = RELAY_TYPE.captures(line) {
                relay_type = Some(caps[1].to_string());
                break;
            }
        }
        let relay_type = relay_type.ok_or_else(|| {
            Error::InvalidFormat("Aspen export has no RELAYTYPE in its [TREQUEST] section".to_string())
        })?;

        let section = format!("[{}]", relay_type);
        let mut found = false;
        for line in lines.by_ref() {
            head.push(line.to_string());
            if line == section {
                found = true;
                break;
            }
        }
        if !found {
            warn!(section = %section, "relay type section not found in Aspen export");
        }

        let rows: Vec<AspenRow> = lines.filter_map(AspenRow::parse).collect();
        debug!(relay_type = %relay_type, rows = rows.len(), "parsed Aspen export");
        Ok(Self { head, relay_type, rows })
    }

    pub fn relay_type(&self) -> &str {
        &self.relay_type
    }

    pub fn rows(&self) -> &[AspenRow] {
        &self.rows
    }

    /// Write the values of `groups` into the matching rows.
    ///
    /// Names match case-insensitively within the database group the
    /// extracted group maps to. Returns the number of rows changed.
    pub fn apply(&mut self, groups: &SettingGroups, options: &AspenOptions) -> usize {
        let mut changed = 0;
        for group in groups.iter() {
            let target = match options.group_aliases.get(&group.name) {
                Some(alias) => alias.as_str(),
                None => {
                    warn!(group = %group.name, "no Aspen group configured, using the group name");
                    group.name.as_str()
                },
            };
            if !self.rows.iter().any(|r| r.group == target) {
                warn!(group = %group.name, aspen_group = %target, "group missing from Aspen template");
                continue;
            }

            for setting in &group.settings {
                let wanted = setting.name.to_uppercase();
                let repeated = options
                    .repeated_settings
                    .iter()
                    .any(|n| n.eq_ignore_ascii_case(&setting.name));

                for row in self.rows.iter_mut().filter(|r| r.group == target) {
                    let name = row.setting.to_uppercase();
                    if name != wanted && name.trim() == wanted {
                        warn!(setting = %row.setting, "database setting name with extra space");
                    }
                    if name != wanted {
                        continue;
                    }
                    debug!(setting = %setting.name, old = %row.value, new = %setting.value, "Aspen setting");
                    row.value = setting.value.clone();
                    row.modified = true;
                    changed += 1;
                    if !repeated {
                        break;
                    }
                }
            }
        }
        info!(relay_type = %self.relay_type, rows = changed, "Aspen settings merged");
        changed
    }

    /// The import file: the first three header lines and the section line,
    /// then the changed rows grouped as in the export.
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = self.head.iter().take(3).cloned().collect();
        lines.extend(self.head.last().cloned());

        let mut order: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !order.contains(&row.group.as_str()) {
                order.push(&row.group);
            }
        }
        for group in order {
            lines.extend(
                self.rows
                    .iter()
                    .filter(|r| r.modified && r.group == group)
                    .map(AspenRow::to_line),
            );
        }
        lines.join("\n")
    }
}

/// Merge `groups` into the exported sheet `template`, returning the import file.
pub fn merge_aspen(template: &str, groups: &SettingGroups, options: &AspenOptions) -> Result<String> {
    let mut sheet = AspenTemplate::parse(template)?;
    sheet.apply(groups, options);
    Ok(sheet.to_text())
}
