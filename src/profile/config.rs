//! YAML configuration for profiles, table cleanup and setting extraction.
use crate::common::error::{Error, Result};
use crate::edit::{RemovalOptions, Replacement};
use crate::ooxml::docx::WdColorIndex;
use crate::settings::{AspenOptions, GroupRule, HeadingRules, SettingsLayout};
use serde::Deserialize;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

/// A string-keyed map that keeps document order and rejects duplicate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueMap<V>(Vec<(String, V)>);

impl<V> Default for UniqueMap<V> {
    fn default() -> Self {
        UniqueMap(Vec::new())
    }
}

impl<V> UniqueMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueMap<V> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct UniqueMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueMapVisitor<V> {
            type Value = UniqueMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with unique keys")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<UniqueMap<V>, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, V)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(key) = map.next_key::<String>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    let value = map.next_value()?;
                    entries.push((key, value));
                }
                Ok(UniqueMap(entries))
            }

            fn visit_unit<E>(self) -> std::result::Result<UniqueMap<V>, E>
            where
                E: de::Error,
            {
                Ok(UniqueMap::default())
            }

            fn visit_none<E>(self) -> std::result::Result<UniqueMap<V>, E>
            where
                E: de::Error,
            {
                Ok(UniqueMap::default())
            }
        }

        deserializer.deserialize_map(UniqueMapVisitor(PhantomData))
    }
}

/// One replacement of a profile, optionally bounded by a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplacementConfig {
    pub find: String,
    pub replace: String,
    /// Apply only up to and including the paragraph holding this bookmark
    #[serde(default)]
    pub until_bookmark: Option<String>,
}

impl ReplacementConfig {
    pub fn replacement(&self) -> Replacement {
        Replacement::new(self.find.clone(), self.replace.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProfile {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    keep: Vec<String>,
    #[serde(default)]
    clear_kept_highlighting: bool,
    #[serde(default)]
    replacements: Vec<ReplacementConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTableCleanup {
    #[serde(default)]
    clean_tables: bool,
    #[serde(default)]
    empty_row_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroupRule {
    pattern: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    label_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    heading_rules: Option<UniqueMap<Vec<RawGroupRule>>>,
    #[serde(default)]
    setting_styles: Option<Vec<String>>,
    #[serde(default)]
    group_aliases: UniqueMap<String>,
    #[serde(default)]
    aspen: RawAspen,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAspen {
    #[serde(default)]
    group_aliases: UniqueMap<String>,
    #[serde(default)]
    repeated_settings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    colors: UniqueMap<String>,
    #[serde(default)]
    profiles: UniqueMap<RawProfile>,
    #[serde(default)]
    table_cleanup: RawTableCleanup,
    #[serde(default)]
    settings: RawSettings,
}

/// A named combination of colours to keep and replacements to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    /// Output file stem; the profile name when not configured
    pub output: String,
    pub keep: Vec<WdColorIndex>,
    pub clear_kept_highlighting: bool,
    pub replacements: Vec<ReplacementConfig>,
}

/// Validated configuration.
///
/// Every colour, pattern and group rule is resolved while loading, so a
/// loaded configuration cannot fail later for configuration reasons.
#[derive(Debug)]
pub struct Config {
    colors: Vec<(String, WdColorIndex)>,
    profiles: Vec<Profile>,
    table_cleanup: RemovalOptions,
    settings: SettingsLayout,
    group_aliases: BTreeMap<String, String>,
    aspen: AspenOptions,
}

impl Config {
    /// Load and validate the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loading configuration");
        Self::from_yaml_str(&yaml)
    }

    /// Parse and validate a configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawConfig = if yaml.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_saphyr::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?
        };
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let colors = raw
            .colors
            .iter()
            .map(|(alias, color)| -> Result<(String, WdColorIndex)> {
                Ok((alias.to_string(), color.parse()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let resolve = |name: &str| -> Result<WdColorIndex> {
            match colors.iter().find(|(alias, _)| alias == name) {
                Some((_, color)) => Ok(*color),
                None => name.parse::<WdColorIndex>(),
            }
        };

        let profiles = raw
            .profiles
            .iter()
            .map(|(name, p)| -> Result<Profile> {
                Ok(Profile {
                    name: name.to_string(),
                    output: p.output.clone().unwrap_or_else(|| name.to_string()),
                    keep: p.keep.iter().map(|k| resolve(k)).collect::<Result<Vec<_>>>()?,
                    clear_kept_highlighting: p.clear_kept_highlighting,
                    replacements: p.replacements.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut table_cleanup = RemovalOptions::with_row_patterns(&raw.table_cleanup.empty_row_patterns)?;
        table_cleanup.clean_tables = raw.table_cleanup.clean_tables;

        let mut settings = SettingsLayout::default();
        if let Some(headings) = &raw.settings.heading_rules {
            settings.headings = headings
                .iter()
                .map(|(style, rules)| -> Result<HeadingRules> {
                    let rules = rules.iter().map(group_rule).collect::<Result<Vec<_>>>()?;
                    Ok(HeadingRules::new(style, rules))
                })
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(styles) = raw.settings.setting_styles {
            settings.setting_styles = styles;
        }
        let group_aliases = aliases(&raw.settings.group_aliases);
        let aspen = AspenOptions {
            group_aliases: aliases(&raw.settings.aspen.group_aliases),
            repeated_settings: raw.settings.aspen.repeated_settings,
        };

        Ok(Self {
            colors,
            profiles,
            table_cleanup,
            settings,
            group_aliases,
            aspen,
        })
    }

    /// Configured colour aliases in file order.
    pub fn colors(&self) -> &[(String, WdColorIndex)] {
        &self.colors
    }

    /// Distinct configured colours, in file order.
    pub fn configured_colors(&self) -> Vec<WdColorIndex> {
        let mut out: Vec<WdColorIndex> = Vec::with_capacity(self.colors.len());
        for (_, color) in &self.colors {
            if !out.contains(color) {
                out.push(*color);
            }
        }
        out
    }

    /// Resolve a colour alias, falling back to a colour name.
    pub fn color(&self, name: &str) -> Result<WdColorIndex> {
        match self.colors.iter().find(|(alias, _)| alias == name) {
            Some((_, color)) => Ok(*color),
            None => name.parse(),
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    #[inline]
    pub fn table_cleanup(&self) -> &RemovalOptions {
        &self.table_cleanup
    }

    #[inline]
    pub fn settings_layout(&self) -> &SettingsLayout {
        &self.settings
    }

    #[inline]
    pub fn group_aliases(&self) -> &BTreeMap<String, String> {
        &self.group_aliases
    }

    #[inline]
    pub fn aspen(&self) -> &AspenOptions {
        &self.aspen
    }
}

fn aliases(map: &UniqueMap<String>) -> BTreeMap<String, String> {
    map.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn group_rule(raw: &RawGroupRule) -> Result<GroupRule> {
    match (&raw.label, &raw.label_template) {
        (Some(label), None) => GroupRule::literal(&raw.pattern, label.as_str()),
        (None, Some(template)) => GroupRule::template(&raw.pattern, template),
        _ => Err(Error::Config(format!(
            "group `{}` needs exactly one of `label` and `label_template`",
            raw.pattern
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
colors:
  DCBPri: turquoise
  POTTPri: BRIGHT_GREEN
  Sec411L: red
profiles:
  PP115-230E1A3A:
    output: "DCB 1Bkr 21P-0X 11S-0X SEL-421-4"
    keep: [DCBPri]
    clear_kept_highlighting: true
    replacements:
      - { find: OUT2, replace: OUT3, until_bookmark: SecondarySettingsStart }
      - { find: 87P-0X, replace: 87P-LZZ }
  bare:
    keep: [yellow]
table_cleanup:
  clean_tables: true
  empty_row_patterns: ['^[0-9]+:(NOT 52AA1 *)?$']
settings:
  heading_rules:
    Heading 1:
      - { pattern: GLOBAL, label: GLOBAL }
      - { pattern: 'PORT ([F1-5])', label_template: 'PORT $1' }
    Heading 3:
      - { pattern: 'PORT ([F1-5])', label_template: 'PORT $1' }
  group_aliases: { GLOBAL: G1, PORT 1: P1 }
  aspen:
    group_aliases: { GLOBAL: Global }
    repeated_settings: [27PP, 59PP]
"#;

    #[test]
    fn test_load_sample() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(
            config.configured_colors(),
            vec![WdColorIndex::Turquoise, WdColorIndex::BrightGreen, WdColorIndex::Red]
        );

        let profile = config.profile("PP115-230E1A3A").unwrap();
        assert_eq!(profile.output, "DCB 1Bkr 21P-0X 11S-0X SEL-421-4");
        assert_eq!(profile.keep, vec![WdColorIndex::Turquoise]);
        assert!(profile.clear_kept_highlighting);
        assert_eq!(profile.replacements.len(), 2);
        assert_eq!(
            profile.replacements[0].until_bookmark.as_deref(),
            Some("SecondarySettingsStart")
        );
        assert_eq!(profile.replacements[1].until_bookmark, None);

        let bare = config.profile("bare").unwrap();
        assert_eq!(bare.output, "bare");
        assert_eq!(bare.keep, vec![WdColorIndex::Yellow]);

        assert!(config.table_cleanup().clean_tables);
        assert_eq!(config.table_cleanup().empty_row_patterns.len(), 1);

        let layout = config.settings_layout();
        let styles: Vec<&str> = layout.headings.iter().map(|h| h.style.as_str()).collect();
        assert_eq!(styles, vec!["Heading 1", "Heading 3"]);
        assert_eq!(layout.setting_styles, vec!["SettingLine", "SettingLineStandard"]);
        assert_eq!(layout.classify("Heading 1", "port 1 settings").as_deref(), Some("PORT 1"));
        assert_eq!(layout.classify("Heading 3", "Global"), None);
        assert!(layout.heading_rules("Heading 2").is_none());
        assert_eq!(config.group_aliases()["PORT 1"], "P1");
        assert_eq!(config.aspen().group_aliases["GLOBAL"], "Global");
        assert_eq!(config.aspen().repeated_settings, vec!["27PP", "59PP"]);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_yaml_str("").unwrap();
        assert!(config.profiles().is_empty());
        assert!(!config.table_cleanup().clean_tables);
        assert_eq!(
            config.settings_layout().classify("Heading 1", "Global").as_deref(),
            Some("GLOBAL")
        );
        assert_eq!(config.settings_layout().classify("Heading 2", "Output"), None);
        assert!(config.aspen().group_aliases.is_empty());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = Config::from_yaml_str("colors:\n  A: red\n  A: yellow\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_yaml_str("profiles:\n  p: {}\n  p: {}\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_colour() {
        let err = Config::from_yaml_str("colors:\n  A: mauve\n").unwrap_err();
        assert!(matches!(err, Error::UnknownColor(_)));

        let err = Config::from_yaml_str("profiles:\n  p:\n    keep: [Nope]\n").unwrap_err();
        assert!(matches!(err, Error::UnknownColor(_)));
    }

    #[test]
    fn test_bad_patterns_and_rules() {
        let err = Config::from_yaml_str("table_cleanup:\n  empty_row_patterns: ['(']\n").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));

        let err =
            Config::from_yaml_str("settings:\n  heading_rules:\n    Heading 1:\n      - { pattern: X }\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_yaml_str("settings:\n  heading_rules:\n    H: []\n    H: []\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_yaml_str("profilez: {}\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runspan.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(Config::load(&path).unwrap().profiles().len(), 2);

        let err = Config::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
