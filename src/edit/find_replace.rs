//! Regex find & replace across run boundaries.
//!
//! A match is located in the paragraph's flattened text, but replaced inside
//! a single run so the surrounding formatting survives. When a match spans
//! several runs they are first merged into the first of them.
use crate::common::error::{Error, Result};
use crate::edit::{EditContext, ParagraphRange, walker};
use crate::ooxml::docx::{Document, ParagraphId, RunId};
use regex::{NoExpand, Regex};
use std::ops::Range;
use tracing::{debug, info};

/// A compiled replacement.
///
/// # Examples
///
/// ```rust
/// use runspan::edit::{EditContext, FindReplace, ParagraphRange};
/// use runspan::ooxml::docx::Document;
///
/// let mut doc = Document::from_xml(br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>OUT2</w:t></w:r><w:r><w:t>01</w:t></w:r></w:p></w:body></w:document>"#)?;
/// let mut ctx = EditContext::new("example");
///
/// FindReplace::new(r"OUT(\d)01", "OUT${1}02")?.apply(&mut doc, ParagraphRange::all(), &mut ctx)?;
/// assert_eq!(doc.text(), "OUT202");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct FindReplace {
    pattern: Regex,
    replacement: String,
    literal: bool,
}

impl FindReplace {
    /// Compile `pattern`. `replacement` may refer to groups as `$1` or `${name}`.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?;
        Ok(Self {
            pattern: regex,
            replacement: replacement.to_string(),
            literal: false,
        })
    }

    /// Replace the exact text `find` with the exact text `replacement`.
    pub fn literal(find: &str, replacement: &str) -> Result<Self> {
        let escaped = regex::escape(find);
        let regex = Regex::new(&escaped).map_err(|e| Error::invalid_pattern(find, e))?;
        Ok(Self {
            pattern: regex,
            replacement: replacement.to_string(),
            literal: true,
        })
    }

    #[inline]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    #[inline]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    fn substitute(&self, text: &str) -> String {
        if self.literal {
            self.pattern
                .replace_all(text, NoExpand(&self.replacement))
                .into_owned()
        } else {
            self.pattern
                .replace_all(text, self.replacement.as_str())
                .into_owned()
        }
    }

    /// Apply the replacement to every paragraph in `range`.
    ///
    /// Returns the number of paragraphs whose text matched.
    pub fn apply(
        &self,
        doc: &mut Document,
        range: ParagraphRange,
        ctx: &mut EditContext,
    ) -> Result<usize> {
        let span = ctx.span().clone();
        let _guard = span.enter();

        let mut touched = 0;
        for paragraph in walker::collect(doc, range) {
            if !doc.is_live(paragraph) {
                continue;
            }
            if self.apply_to_paragraph(doc, paragraph, ctx)? {
                touched += 1;
            }
        }

        info!(
            pattern = %self.pattern,
            paragraphs = touched,
            "find/replace finished"
        );
        Ok(touched)
    }

    /// Apply the replacement to one paragraph. Returns whether it matched.
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`] when a match crosses from one run
    /// container into another (for instance from plain text into a
    /// hyperlink), since such runs cannot be merged. Matches that stay
    /// inside a wrapper are replaced like any other.
    pub fn apply_to_paragraph(
        &self,
        doc: &mut Document,
        paragraph: ParagraphId,
        ctx: &mut EditContext,
    ) -> Result<bool> {
        let text = doc.paragraph(paragraph).text();
        let matches: Vec<Range<usize>> = self.pattern.find_iter(&text).map(|m| m.range()).collect();
        if matches.is_empty() {
            return Ok(false);
        }

        // Merge each group of runs a match crosses into its first run.
        let runs = run_spans(doc, paragraph);
        let groups = merge_groups(&runs, &matches);
        for group in &groups {
            let parent = doc.tree().parent(runs[group.start].0.0);
            if runs[group.clone()].iter().any(|(id, _)| doc.tree().parent(id.0) != parent) {
                return Err(Error::InvariantViolation(format!(
                    "a match in paragraph {:?} crosses runs in different containers",
                    text
                )));
            }
        }
        for group in groups.iter().rev() {
            let ids: Vec<RunId> = runs[group.clone()].iter().map(|(id, _)| *id).collect();
            doc.merge_runs(&ids);
            ctx.stats_mut().runs_merged += ids.len() - 1;
            debug!(runs = ids.len(), "merged runs spanned by a match");
        }

        // Offsets are unchanged by merging, but the run list is not.
        let runs = run_spans(doc, paragraph);
        for (run, span) in &runs {
            if !matches.iter().any(|m| overlaps(span, m)) {
                continue;
            }
            let old = doc.run(*run).text();
            let new = self.substitute(&old);
            if new != old {
                doc.set_run_text(*run, &new);
                ctx.stats_mut().runs_replaced += 1;
            }
        }

        ctx.stats_mut().paragraphs_changed += 1;
        debug!(
            matches = matches.len(),
            text = %doc.paragraph(paragraph).text(),
            "paragraph rewritten"
        );
        Ok(true)
    }
}

/// Compile and apply a replacement in one call.
pub fn find_replace(
    doc: &mut Document,
    pattern: &str,
    replacement: &str,
    range: ParagraphRange,
    ctx: &mut EditContext,
) -> Result<usize> {
    FindReplace::new(pattern, replacement)?.apply(doc, range, ctx)
}

/// Runs of a paragraph with their byte interval in its text.
fn run_spans(doc: &Document, paragraph: ParagraphId) -> Vec<(RunId, Range<usize>)> {
    let mut offset = 0;
    doc.paragraph(paragraph)
        .all_runs()
        .iter()
        .map(|run| {
            let len = run.text().len();
            let span = offset..offset + len;
            offset += len;
            (run.id(), span)
        })
        .collect()
}

/// Whether a match touches a run.
///
/// An empty match belongs to the run whose text contains its position.
fn overlaps(run: &Range<usize>, m: &Range<usize>) -> bool {
    if m.is_empty() {
        run.start <= m.start && m.start < run.end
    } else {
        m.start < run.end && m.end > run.start
    }
}

/// Index ranges of runs to merge, one per group of matches sharing runs.
///
/// Only groups of two or more runs are returned, in ascending order.
fn merge_groups(runs: &[(RunId, Range<usize>)], matches: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut groups: Vec<Range<usize>> = Vec::new();
    for m in matches {
        let mut hit = runs
            .iter()
            .enumerate()
            .filter(|(_, (_, span))| overlaps(span, m))
            .map(|(i, _)| i);
        let Some(first) = hit.next() else {
            continue;
        };
        let last = hit.last().unwrap_or(first);

        match groups.last_mut() {
            Some(prev) if first < prev.end => prev.end = prev.end.max(last + 1),
            _ => groups.push(first..last + 1),
        }
    }
    groups.retain(|g| g.len() > 1);
    groups
}
