//! Ranged setting names such as `PB1 - PB8` or `OUT101–OUT108`.
use crate::settings::Setting;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// `<prefix><n><suffix> - <prefix><m><suffix>`. Prefix and suffix must agree
/// on both sides, which is checked after matching. A prefix may end in `0`
/// so that `OUT101` splits as `OUT10` + `1`.
static RANGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9A-Z_]*[0A-Z]+)([1-9][0-9]*)([0-9A-Z_]*)\s*[-\x{2013}]\s*([0-9A-Z_]*[0A-Z]+)([1-9][0-9]*)([0-9A-Z_]*)",
    )
    .expect("valid ranged setting regex")
});

/// Longest range expanded; anything wider is taken as a typo.
pub const MAX_RANGE_LEN: u32 = 1000;

/// Parsed bounds of a ranged name.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NameRange<'a> {
    prefix: &'a str,
    first: u32,
    last: u32,
    suffix: &'a str,
}

fn parse_range(name: &str) -> Option<NameRange<'_>> {
    let caps = RANGED.captures(name)?;
    let prefix = caps.get(1)?.as_str();
    let suffix = caps.get(3)?.as_str();
    if prefix != &caps[4] || suffix != &caps[6] {
        return None;
    }
    Some(NameRange {
        prefix,
        first: caps[2].parse().ok()?,
        last: caps[5].parse().ok()?,
        suffix,
    })
}

/// Replace every ranged setting in `settings` with one setting per name in
/// the range, all with the ranged setting's value.
///
/// Plain settings keep their order; expansions are appended after them. A
/// range whose end is below its start, or that spans more than
/// [`MAX_RANGE_LEN`] names, is left as is.
pub fn expand_ranged(settings: &mut Vec<Setting>) {
    let mut expanded = Vec::new();
    settings.retain(|setting| {
        let Some(range) = parse_range(&setting.name) else {
            return true;
        };
        if range.last < range.first {
            warn!(name = %setting.name, "descending setting range left unexpanded");
            return true;
        }
        if range.last - range.first >= MAX_RANGE_LEN {
            warn!(
                name = %setting.name,
                limit = MAX_RANGE_LEN,
                "setting range too wide, left unexpanded"
            );
            return true;
        }
        expanded.extend((range.first..=range.last).map(|n| {
            Setting::new(format!("{}{}{}", range.prefix, n, range.suffix), setting.value.clone())
        }));
        false
    });
    settings.extend(expanded);
}
