//! Profiles: one configured template variant of a master document.
//!
//! A master document marks variant-specific content with highlight colours.
//! Applying a profile removes the content of every configured colour the
//! profile does not keep, optionally un-highlights what it keeps, then runs
//! the profile's text replacements.
pub mod config;

pub use config::{Config, Profile, ReplacementConfig, UniqueMap};

use crate::common::error::{Error, Result};
use crate::edit::{
    EditContext, ParagraphRange, Replacement, clear_highlighting, remove_highlighted, replace_all,
};
use crate::ooxml::docx::Document;
use tracing::{debug, info};

/// Apply the profile called `name` from `config` to `doc`.
///
/// Replacements are applied in batches of consecutive entries sharing the
/// same `until_bookmark`, so each batch is order-independent.
///
/// # Errors
///
/// [`Error::Config`] for an unknown profile, and
/// [`Error::ComponentNotFound`] when a replacement is bounded by a bookmark
/// the document does not contain.
pub fn apply_profile(
    doc: &mut Document,
    config: &Config,
    name: &str,
    ctx: &mut EditContext,
) -> Result<()> {
    let profile = config
        .profile(name)
        .ok_or_else(|| Error::Config(format!("unknown profile `{}`", name)))?;

    let span = ctx.span().clone();
    let _guard = span.enter();
    info!(profile = %profile.name, "applying profile");

    for color in config.configured_colors() {
        if profile.keep.contains(&color) {
            continue;
        }
        debug!(color = %color, "removing colour");
        remove_highlighted(doc, color, config.table_cleanup(), ParagraphRange::all(), ctx);
    }

    if profile.clear_kept_highlighting {
        for &color in &profile.keep {
            clear_highlighting(doc, color, ParagraphRange::all(), ctx);
        }
    }

    for batch in profile
        .replacements
        .chunk_by(|a, b| a.until_bookmark == b.until_bookmark)
    {
        let range = match batch[0].until_bookmark.as_deref() {
            Some(bookmark) => {
                let end = doc.bookmark_paragraph(bookmark).ok_or_else(|| {
                    Error::ComponentNotFound(format!("bookmark `{}`", bookmark))
                })?;
                ParagraphRange::until(end)
            },
            None => ParagraphRange::all(),
        };
        let pairs: Vec<Replacement> = batch.iter().map(ReplacementConfig::replacement).collect();
        replace_all(doc, &pairs, &[], range, ctx)?;
    }

    info!(profile = %profile.name, stats = %ctx.stats(), "profile applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::document::tests::doc;
    use crate::ooxml::docx::WdColorIndex;

    const CONFIG: &str = r#"
colors:
  DCB: cyan
  POTT: green
profiles:
  dcb:
    keep: [DCB]
    clear_kept_highlighting: true
    replacements:
      - { find: OUT1, replace: OUT2, until_bookmark: Secondary }
      - { find: OUT2, replace: OUT3, until_bookmark: Secondary }
      - { find: 87P-0X, replace: 87P-LZZ }
  pott:
    keep: [POTT]
  broken:
    replacements:
      - { find: A, replace: B, until_bookmark: Missing }
table_cleanup:
  clean_tables: true
"#;

    fn hl(text: &str, color: &str) -> String {
        format!(
            "<w:r><w:rPr><w:highlight w:val=\"{}\"/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r>",
            color, text
        )
    }

    fn plain(text: &str) -> String {
        format!("<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>", text)
    }

    fn master() -> Document {
        doc(&format!(
            "<w:p>{}{}</w:p>\
             <w:p>{}</w:p>\
             <w:tbl><w:tr><w:tc><w:p>{}</w:p></w:tc></w:tr><w:tr><w:tc><w:p>{}</w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:bookmarkStart w:id=\"0\" w:name=\"Secondary\"/>{}</w:p>\
             <w:p>{}</w:p>",
            plain("Scheme: "),
            hl("DCB", "cyan"),
            hl("POTT only", "green"),
            hl("POTT row", "green"),
            plain("OUT1 OUT2 87P-0X"),
            plain("secondary"),
            plain("OUT1 87P-0X"),
        ))
    }

    #[test]
    fn test_apply_dcb_profile() {
        let config = Config::from_yaml_str(CONFIG).unwrap();
        let mut d = master();
        let mut ctx = EditContext::new("master.docx");
        apply_profile(&mut d, &config, "dcb", &mut ctx).unwrap();

        assert_eq!(d.text(), "Scheme: DCB\nOUT2 OUT3 87P-LZZ\nsecondary\nOUT1 87P-LZZ");
        assert_eq!(ctx.stats().rows_deleted, 1);
        for p in d.paragraphs() {
            for r in d.paragraph(p).all_runs() {
                assert_eq!(r.highlight(), None);
            }
        }
    }

    #[test]
    fn test_apply_pott_profile_keeps_highlighting() {
        let config = Config::from_yaml_str(CONFIG).unwrap();
        let mut d = master();
        let mut ctx = EditContext::default();
        apply_profile(&mut d, &config, "pott", &mut ctx).unwrap();

        assert!(d.text().starts_with("Scheme: \nPOTT only\nPOTT row\n"));
        let first = d.paragraphs().nth(1).unwrap();
        assert_eq!(d.paragraph(first).runs()[0].highlight(), Some(WdColorIndex::BrightGreen));
    }

    #[test]
    fn test_profile_errors() {
        let config = Config::from_yaml_str(CONFIG).unwrap();
        let mut d = master();
        let mut ctx = EditContext::default();

        let err = apply_profile(&mut d, &config, "nope", &mut ctx).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = apply_profile(&mut d, &config, "broken", &mut ctx).unwrap_err();
        assert!(matches!(err, Error::ComponentNotFound(_)));
    }
}
