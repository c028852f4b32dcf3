//! Order-independent batches of literal replacements.
use crate::common::error::Result;
use crate::edit::{EditContext, FindReplace, ParagraphRange};
use crate::ooxml::docx::Document;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// One literal `find` → `replace` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Replacement {
    pub find: String,
    pub replace: String,
}

impl Replacement {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// Private-use marker for slot `index`, built only from private-use
/// characters so no find text can match inside it. The closing marker keeps
/// slot 1 from matching inside slot 12.
fn placeholder(index: usize) -> String {
    let mut out = String::from('\u{E000}');
    for digit in index.to_string().bytes() {
        out.push(char::from_u32(0xE010 + u32::from(digit - b'0')).unwrap_or('\u{E010}'));
    }
    out.push('\u{E001}');
    out
}

/// Apply all `pairs` to the paragraphs in `range` as if simultaneously.
///
/// Each find text is first swapped for a private-use placeholder and only
/// then for its replacement, so `OUT1 → OUT2` and `OUT2 → OUT3` can be given
/// in any order without chaining. Texts in `keep` are shielded the same way
/// for the whole batch, e.g. keeping `OUT21` intact while `OUT2` changes.
/// Longer texts are shielded and swapped before shorter ones.
///
/// Returns the number of paragraphs rewritten by the final pass.
pub fn replace_all(
    doc: &mut Document,
    pairs: &[Replacement],
    keep: &[String],
    range: ParagraphRange,
    ctx: &mut EditContext,
) -> Result<usize> {
    let span = ctx.span().clone();
    let _guard = span.enter();

    let mut kept: Vec<&str> = keep.iter().map(String::as_str).filter(|k| !k.is_empty()).collect();
    kept.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));
    kept.dedup();

    let mut ordered: Vec<&Replacement> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        if pair.find.is_empty() {
            warn!(replace = %pair.replace, "skipping replacement with empty find text");
            continue;
        }
        ordered.push(pair);
    }
    ordered.sort_by_key(|p| std::cmp::Reverse(p.find.chars().count()));

    // Slots 0..kept.len() shield keep texts, the rest carry replacements.
    for (slot, text) in kept.iter().enumerate() {
        FindReplace::literal(text, &placeholder(slot))?.apply(doc, range, ctx)?;
    }
    for (i, pair) in ordered.iter().enumerate() {
        let slot = kept.len() + i;
        FindReplace::literal(&pair.find, &placeholder(slot))?.apply(doc, range, ctx)?;
    }

    let mut rewritten = 0;
    for (i, pair) in ordered.iter().enumerate() {
        let slot = kept.len() + i;
        let n = FindReplace::literal(&placeholder(slot), &pair.replace)?.apply(doc, range, ctx)?;
        debug!(find = %pair.find, replace = %pair.replace, paragraphs = n, "replacement applied");
        rewritten += n;
    }
    for (slot, text) in kept.iter().enumerate() {
        FindReplace::literal(&placeholder(slot), text)?.apply(doc, range, ctx)?;
    }

    info!(
        pairs = ordered.len(),
        kept = kept.len(),
        paragraphs = rewritten,
        "batch replacement finished"
    );
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::document::tests::doc;

    fn runs_doc(runs: &[&str]) -> Document {
        let body: String = runs
            .iter()
            .map(|t| format!("<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>", t))
            .collect();
        doc(&format!("<w:p>{}</w:p>", body))
    }

    #[test]
    fn test_pairs_do_not_chain() {
        let mut d = runs_doc(&["OUT1 and OU", "T2, IN1"]);
        let mut ctx = EditContext::default();
        let pairs = [
            Replacement::new("OUT1", "OUT2"),
            Replacement::new("OUT2", "OUT3"),
            Replacement::new("IN1", "IN2"),
        ];
        replace_all(&mut d, &pairs, &[], ParagraphRange::all(), &mut ctx).unwrap();
        assert_eq!(d.text(), "OUT2 and OUT3, IN2");
    }

    #[test]
    fn test_swap() {
        let mut d = runs_doc(&["A then B"]);
        let mut ctx = EditContext::default();
        let pairs = [Replacement::new("A", "B"), Replacement::new("B", "A")];
        replace_all(&mut d, &pairs, &[], ParagraphRange::all(), &mut ctx).unwrap();
        assert_eq!(d.text(), "B then A");
    }

    #[test]
    fn test_keep_shields_text() {
        let mut d = runs_doc(&["OUT2 OUT21 OUT2"]);
        let mut ctx = EditContext::default();
        let pairs = [Replacement::new("OUT2", "OUT3")];
        let keep = vec!["OUT21".to_string()];
        replace_all(&mut d, &pairs, &keep, ParagraphRange::all(), &mut ctx).unwrap();
        assert_eq!(d.text(), "OUT3 OUT21 OUT3");
    }

    #[test]
    fn test_longer_find_wins() {
        let mut d = runs_doc(&["IN1 IN12"]);
        let mut ctx = EditContext::default();
        let pairs = [Replacement::new("IN1", "X"), Replacement::new("IN12", "Y")];
        replace_all(&mut d, &pairs, &[], ParagraphRange::all(), &mut ctx).unwrap();
        assert_eq!(d.text(), "X Y");
    }

    #[test]
    fn test_empty_find_is_skipped() {
        let mut d = runs_doc(&["unchanged"]);
        let mut ctx = EditContext::default();
        let n = replace_all(
            &mut d,
            &[Replacement::new("", "x")],
            &[],
            ParagraphRange::all(),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(n, 0);
        assert_eq!(d.text(), "unchanged");
    }

    #[test]
    fn test_replacement_with_dollar_is_literal() {
        let mut d = runs_doc(&["price"]);
        let mut ctx = EditContext::default();
        replace_all(
            &mut d,
            &[Replacement::new("price", "$1.00")],
            &[],
            ParagraphRange::all(),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(d.text(), "$1.00");
    }
}
