//! Relay setting extraction from setting calculation documents.
//!
//! A calculation document marks its structure with paragraph styles:
//! headings name the setting group, and setting lines carry `NAME = value`
//! in bold text. Struck-through bold text is a superseded value and is
//! ignored.
//!
//! ```rust
//! use runspan::ooxml::docx::Document;
//! use runspan::settings::{SettingsLayout, extract_settings, write_flat};
//! use std::collections::BTreeMap;
//!
//! let doc = Document::from_xml(br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
//!   <w:p><w:pPr><w:pStyle w:val="Heading 1"/></w:pPr><w:r><w:t>Global Settings</w:t></w:r></w:p>
//!   <w:p><w:pPr><w:pStyle w:val="SettingLine"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>SID = SUB 1</w:t></w:r></w:p>
//! </w:body></w:document>"#)?;
//!
//! let groups = extract_settings(&doc, &SettingsLayout::default());
//! let aliases = BTreeMap::from([("GLOBAL".to_string(), "G1".to_string())]);
//! assert_eq!(write_flat(&groups, &aliases), "\n[G1]\nSID,\"SUB 1\"");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod aspen;
pub mod export;
pub mod extract;
pub mod ranged;

pub use aspen::{AspenOptions, AspenRow, AspenTemplate, merge_aspen};
pub use export::write_flat;
pub use extract::{extract_settings, parse_setting_line};
pub use ranged::expand_ranged;

use crate::common::error::{Error, Result};
use regex::{Captures, Regex};
use std::fmt;

/// How a heading that matched a [`GroupRule`] is named.
pub enum GroupLabel {
    /// A fixed group name.
    Literal(String),
    /// A name computed from the heading match, e.g. `PORT 3` from
    /// `Port 3 Settings`.
    Derived(Box<dyn Fn(&Captures<'_>) -> String + Send + Sync>),
}

impl fmt::Debug for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Literal(label) => f.debug_tuple("Literal").field(label).finish(),
            GroupLabel::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Classifies heading text into a setting group.
///
/// Patterns are case-insensitive and anchored at the start of the heading.
#[derive(Debug)]
pub struct GroupRule {
    pattern: Regex,
    label: GroupLabel,
}

impl GroupRule {
    fn compile(pattern: &str) -> Result<Regex> {
        Regex::new(&format!("(?i)^(?:{})", pattern)).map_err(|e| Error::invalid_pattern(pattern, e))
    }

    /// Headings matching `pattern` belong to the group `label`.
    pub fn literal(pattern: &str, label: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: Self::compile(pattern)?,
            label: GroupLabel::Literal(label.into()),
        })
    }

    /// The group name is `template` with `$1`/`${name}` expanded from the
    /// heading match, uppercased.
    pub fn template(pattern: &str, template: &str) -> Result<Self> {
        let template = template.to_string();
        Ok(Self {
            pattern: Self::compile(pattern)?,
            label: GroupLabel::Derived(Box::new(move |caps| {
                let mut label = String::new();
                caps.expand(&template, &mut label);
                label.to_uppercase()
            })),
        })
    }

    /// The group name is computed by `f`.
    pub fn derived<F>(pattern: &str, f: F) -> Result<Self>
    where
        F: Fn(&Captures<'_>) -> String + Send + Sync + 'static,
    {
        Ok(Self {
            pattern: Self::compile(pattern)?,
            label: GroupLabel::Derived(Box::new(f)),
        })
    }

    /// Group name for `heading`, if this rule matches it.
    pub fn classify(&self, heading: &str) -> Option<String> {
        let caps = self.pattern.captures(heading)?;
        Some(match &self.label {
            GroupLabel::Literal(label) => label.clone(),
            GroupLabel::Derived(f) => f(&caps),
        })
    }
}

/// Group rules for SEL relay setting documents.
///
/// The first matching rule wins. `LOGIC` is the SEL-3XX group logic heading.
pub fn sel_group_rules() -> Vec<GroupRule> {
    const LITERALS: [(&str, &str); 15] = [
        ("ALIAS", "ALIAS"),
        ("GLOBAL", "GLOBAL"),
        ("PORT 87", "PORT 87"),
        ("CHANNEL X", "CHANNEL X"),
        ("CHANNEL Y", "CHANNEL Y"),
        ("BREAKER MONITOR", "BREAKER MONITOR"),
        ("ZONE 1", "ZONE 1"),
        ("GROUP 1", "GROUP 1"),
        ("LOGIC", "GROUP 1 LOGIC"),
        ("PROTECTION LOGIC", "PROTECTION LOGIC"),
        ("AUTOMATION", "AUTOMATION LOGIC"),
        ("OUTPUT", "OUTPUT"),
        ("FRONT PANEL", "FRONT PANEL"),
        ("REPORT", "REPORT"),
        ("TEXT", "TEXT"),
    ];
    let mut rules: Vec<GroupRule> = LITERALS
        .iter()
        .filter_map(|(pattern, label)| GroupRule::literal(pattern, *label).ok())
        .collect();
    rules.extend(sel_port_rules());
    rules
}

/// The serial port rule alone: `Port 3 Settings` is group `PORT 3`.
pub fn sel_port_rules() -> Vec<GroupRule> {
    GroupRule::template("PORT ([F1-5])", "PORT $1").into_iter().collect()
}

/// Group rules applied to headings of one paragraph style.
#[derive(Debug)]
pub struct HeadingRules {
    pub style: String,
    pub rules: Vec<GroupRule>,
}

impl HeadingRules {
    pub fn new(style: impl Into<String>, rules: Vec<GroupRule>) -> Self {
        Self {
            style: style.into(),
            rules,
        }
    }
}

/// Which paragraph styles carry group headings and setting lines.
///
/// Each heading style has its own rules, so a `Heading 2` subsection such as
/// "Output Contacts" inside a group does not start a new group unless one of
/// its rules matches.
#[derive(Debug)]
pub struct SettingsLayout {
    /// Heading styles and their classifiers
    pub headings: Vec<HeadingRules>,
    /// Style display names of setting lines
    pub setting_styles: Vec<String>,
}

impl Default for SettingsLayout {
    fn default() -> Self {
        Self {
            headings: vec![
                HeadingRules::new("Heading 1", sel_group_rules()),
                HeadingRules::new("Heading 2", sel_port_rules()),
            ],
            setting_styles: vec!["SettingLine".to_string(), "SettingLineStandard".to_string()],
        }
    }
}

impl SettingsLayout {
    /// Rules for headings in `style`, or `None` if it is not a heading style.
    pub fn heading_rules(&self, style: &str) -> Option<&[GroupRule]> {
        self.headings
            .iter()
            .find(|h| h.style == style)
            .map(|h| h.rules.as_slice())
    }

    #[inline]
    pub fn is_setting_style(&self, style: &str) -> bool {
        self.setting_styles.iter().any(|s| s == style)
    }

    /// Group name for a heading in `style`: the first of its rules that matches.
    pub fn classify(&self, style: &str, heading: &str) -> Option<String> {
        self.heading_rules(style)?
            .iter()
            .find_map(|rule| rule.classify(heading))
    }
}

/// One `name = value` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

impl Setting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Settings of one group, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingGroup {
    pub name: String,
    pub settings: Vec<Setting>,
}

/// All extracted groups, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingGroups {
    groups: Vec<SettingGroup>,
}

impl SettingGroups {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a setting to `group`, creating the group on first use.
    pub fn push(&mut self, group: &str, setting: Setting) {
        match self.groups.iter_mut().find(|g| g.name == group) {
            Some(existing) => existing.settings.push(setting),
            None => self.groups.push(SettingGroup {
                name: group.to_string(),
                settings: vec![setting],
            }),
        }
    }

    pub fn get(&self, group: &str) -> Option<&SettingGroup> {
        self.groups.iter().find(|g| g.name == group)
    }

    /// Value of `name` in `group`.
    pub fn value(&self, group: &str, name: &str) -> Option<&str> {
        self.get(group)?
            .settings
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingGroup> {
        self.groups.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SettingGroup> {
        self.groups.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_anchored_rule_wins() {
        let layout = SettingsLayout::default();
        let h1 = |text: &str| layout.classify("Heading 1", text);
        assert_eq!(h1("Global Settings").as_deref(), Some("GLOBAL"));
        assert_eq!(h1("Protection Logic").as_deref(), Some("PROTECTION LOGIC"));
        assert_eq!(h1("Logic Settings").as_deref(), Some("GROUP 1 LOGIC"));
        assert_eq!(h1("Automation Logic 1").as_deref(), Some("AUTOMATION LOGIC"));
        assert_eq!(h1("Port 87 Settings").as_deref(), Some("PORT 87"));
        assert_eq!(h1("Port f settings").as_deref(), Some("PORT F"));
        assert_eq!(h1("Port 3").as_deref(), Some("PORT 3"));
        assert_eq!(h1("Settings for Global"), None);
    }

    #[test]
    fn test_second_level_headings_only_name_ports() {
        let layout = SettingsLayout::default();
        assert_eq!(layout.classify("Heading 2", "Port 2 Settings").as_deref(), Some("PORT 2"));
        assert_eq!(layout.classify("Heading 2", "Output Contacts"), None);
        assert_eq!(layout.classify("Heading 2", "Global"), None);
        assert_eq!(layout.classify("Normal", "Global"), None);
        assert!(layout.heading_rules("Heading 2").is_some());
        assert!(layout.heading_rules("Heading 3").is_none());
    }

    #[test]
    fn test_derived_label() {
        let rule = GroupRule::derived(r"Zone (\d)", |caps| format!("Z{}", &caps[1])).unwrap();
        assert_eq!(rule.classify("zone 4 terminals").as_deref(), Some("Z4"));
        assert!(GroupRule::literal("(", "x").is_err());
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let mut groups = SettingGroups::new();
        groups.push("GROUP 1", Setting::new("51P", "5.0"));
        groups.push("GLOBAL", Setting::new("SID", "X"));
        groups.push("GROUP 1", Setting::new("51C", "U3"));

        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["GROUP 1", "GLOBAL"]);
        assert_eq!(groups.value("GROUP 1", "51C"), Some("U3"));
        assert_eq!(groups.value("GLOBAL", "51P"), None);
    }
}
