//! Highlight-based content removal.
//!
//! Highlight colours are used as content-selection tags: every run carrying
//! a colour can be cleared, and paragraphs, table rows and tables left
//! empty are removed with it. A cell always keeps at least one paragraph.
use crate::common::error::{Error, Result};
use crate::edit::{EditContext, ParagraphRange, walker};
use crate::ooxml::docx::{CellId, Document, ParagraphId, ParagraphRemoval, RunId, WdColorIndex};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Row texts that count as empty in automation and protection logic tables:
/// a bare line number, optionally followed by the breaker-status term.
pub const LOGIC_PLACEHOLDER_PATTERNS: [&str; 2] = [
    r"^[0-9]+:(NOT 52AA1 *)?$",
    r"^[0-9]+:(NOT \(52AA1 OR 52AA2\) *)?$",
];

static LOGIC_PLACEHOLDERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    LOGIC_PLACEHOLDER_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("valid logic placeholder regex"))
        .collect()
});

/// How [`remove_highlighted`] treats tables.
#[derive(Debug, Clone, Default)]
pub struct RemovalOptions {
    /// Delete rows left empty by a removal, and tables left without rows.
    pub clean_tables: bool,
    /// Row texts treated as empty when `clean_tables` is set.
    pub empty_row_patterns: Vec<Regex>,
}

impl RemovalOptions {
    /// No table cleanup.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table cleanup with no extra "empty" row patterns.
    pub fn clean_tables() -> Self {
        Self {
            clean_tables: true,
            empty_row_patterns: Vec::new(),
        }
    }

    /// Table cleanup that also removes logic-table placeholder rows.
    pub fn with_logic_placeholders() -> Self {
        Self {
            clean_tables: true,
            empty_row_patterns: LOGIC_PLACEHOLDERS.clone(),
        }
    }

    /// Table cleanup with `patterns` compiled as empty-row patterns.
    pub fn with_row_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let empty_row_patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()).map_err(|e| Error::invalid_pattern(p.as_ref(), e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            clean_tables: true,
            empty_row_patterns,
        })
    }

    fn row_counts_as_empty(&self, text: &str) -> bool {
        text.is_empty() || self.empty_row_patterns.iter().any(|re| re.is_match(text))
    }
}

/// Remove all content highlighted with `color` from the paragraphs in `range`.
///
/// Every matching run is cleared down to its properties. A paragraph whose
/// text becomes empty is deleted (the last paragraph of a cell is emptied
/// instead), as is an empty paragraph whose mark carries `color`. With
/// [`RemovalOptions::clean_tables`], the enclosing row is deleted when its
/// text is empty or matches an empty-row pattern, and the table with it
/// once no rows remain.
///
/// Returns the number of runs cleared.
pub fn remove_highlighted(
    doc: &mut Document,
    color: WdColorIndex,
    options: &RemovalOptions,
    range: ParagraphRange,
    ctx: &mut EditContext,
) -> usize {
    let span = ctx.span().clone();
    let _guard = span.enter();

    let before = ctx.stats().runs_cleared;
    for paragraph in walker::collect(doc, range) {
        if !doc.is_live(paragraph) {
            debug!("skipping paragraph removed by an earlier deletion");
            continue;
        }
        let cell = doc.paragraph(paragraph).enclosing_cell();

        let cleared = clear_runs(doc, paragraph, color, ctx);
        let para = doc.paragraph(paragraph);
        let empty = para.is_empty();

        if empty && (cleared > 0 || para.mark_highlight() == Some(color)) {
            delete_paragraph(doc, paragraph, ctx);
        }

        if options.clean_tables
            && cleared > 0
            && let Some(cell) = cell
        {
            clean_row(doc, cell, options, ctx);
        }
    }

    let cleared = ctx.stats().runs_cleared - before;
    info!(color = %color, runs = cleared, "highlighted content removed");
    cleared
}

fn clear_runs(
    doc: &mut Document,
    paragraph: ParagraphId,
    color: WdColorIndex,
    ctx: &mut EditContext,
) -> usize {
    let runs: Vec<RunId> = doc
        .paragraph(paragraph)
        .all_runs()
        .iter()
        .filter(|r| r.highlight() == Some(color))
        .map(|r| r.id())
        .collect();
    for &run in &runs {
        doc.clear_run(run);
    }
    ctx.stats_mut().runs_cleared += runs.len();
    runs.len()
}

fn delete_paragraph(doc: &mut Document, paragraph: ParagraphId, ctx: &mut EditContext) {
    match doc.delete_paragraph(paragraph) {
        ParagraphRemoval::Removed => {
            ctx.stats_mut().paragraphs_deleted += 1;
            debug!("deleted empty paragraph");
        },
        ParagraphRemoval::KeptAsLastInCell => {
            ctx.stats_mut().paragraphs_emptied += 1;
            debug!("kept empty paragraph as the last one in its cell");
        },
    }
}

/// Delete the row holding `cell` if it now counts as empty, then the table
/// if that was its last row.
fn clean_row(doc: &mut Document, cell: CellId, options: &RemovalOptions, ctx: &mut EditContext) {
    if !doc.is_live(cell) {
        return;
    }
    let Some(row) = doc.cell(cell).row() else {
        return;
    };
    let text = doc.row(row).text();
    if !options.row_counts_as_empty(&text) {
        return;
    }

    let Some(table) = doc.delete_row(row) else {
        return;
    };
    ctx.stats_mut().rows_deleted += 1;
    debug!(text = %text, "deleted row");

    if doc.table(table).row_count() == 0 {
        let removal = doc.delete_table(table);
        ctx.stats_mut().tables_deleted += 1;
        debug!(
            refilled_cell = removal.refilled_cell.is_some(),
            "deleted table without rows"
        );
    }
}

/// Remove the `color` highlight from runs and from the marks of empty
/// paragraphs in `range`, leaving all text in place.
///
/// Returns the number of highlight attributes removed.
pub fn clear_highlighting(
    doc: &mut Document,
    color: WdColorIndex,
    range: ParagraphRange,
    ctx: &mut EditContext,
) -> usize {
    let span = ctx.span().clone();
    let _guard = span.enter();

    let mut removed = 0;
    for paragraph in walker::collect(doc, range) {
        let para = doc.paragraph(paragraph);
        let runs: Vec<RunId> = para
            .all_runs()
            .iter()
            .filter(|r| r.highlight() == Some(color))
            .map(|r| r.id())
            .collect();
        let mark = para.is_empty() && para.mark_highlight() == Some(color);

        for run in runs {
            if doc.remove_run_highlight(run) {
                removed += 1;
            }
        }
        if mark && doc.remove_mark_highlight(paragraph) {
            removed += 1;
        }
    }

    ctx.stats_mut().highlights_cleared += removed;
    info!(color = %color, highlights = removed, "highlighting cleared");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::document::tests::doc;

    fn run(text: &str, color: Option<&str>) -> String {
        match color {
            Some(c) => format!(
                "<w:r><w:rPr><w:highlight w:val=\"{}\"/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r>",
                c, text
            ),
            None => format!("<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>", text),
        }
    }

    fn para(runs: &[String]) -> String {
        format!("<w:p>{}</w:p>", runs.concat())
    }

    fn cell(content: &str) -> String {
        format!("<w:tc>{}</w:tc>", content)
    }

    fn row(cells: &[String]) -> String {
        format!("<w:tr>{}</w:tr>", cells.concat())
    }

    #[test]
    fn test_red_and_yellow_removal() {
        let body = [
            para(&[run("all red", Some("red"))]),
            para(&[run("keep ", None), run("drop", Some("red")), run(" yellow", Some("yellow"))]),
            para(&[run("only yellow", Some("yellow"))]),
            para(&[run("red ", Some("red")), run("again", Some("red"))]),
        ]
        .concat();
        let mut d = doc(&body);
        let mut ctx = EditContext::default();

        let cleared = remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::new(),
            ParagraphRange::all(),
            &mut ctx,
        );

        assert_eq!(cleared, 4);
        assert_eq!(d.text(), "keep  yellow\nonly yellow");
        assert_eq!(ctx.stats().paragraphs_deleted, 2);
        for p in d.paragraphs() {
            for r in d.paragraph(p).all_runs() {
                assert_ne!(r.highlight(), Some(WdColorIndex::Red));
            }
        }
    }

    #[test]
    fn test_last_paragraph_in_cell_is_kept() {
        let body = format!(
            "<w:tbl>{}</w:tbl>",
            row(&[
                cell(&para(&[run("gone", Some("cyan"))])),
                cell(&para(&[run("stays", None)])),
            ])
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Turquoise,
            &RemovalOptions::new(),
            ParagraphRange::all(),
            &mut ctx,
        );

        let table = d.tables().next().unwrap();
        let cells = d.table(table).rows()[0].cells();
        assert_eq!(cells[0].paragraphs().len(), 1);
        assert_eq!(cells[0].text(), "");
        assert_eq!(cells[1].text(), "stays");
        assert_eq!(ctx.stats().paragraphs_emptied, 1);
    }

    #[test]
    fn test_cell_floor_looks_through_content_controls() {
        let body = format!(
            "<w:tbl>{}</w:tbl>",
            row(&[cell(&format!(
                "<w:sdt><w:sdtPr/><w:sdtContent>{}</w:sdtContent></w:sdt>",
                para(&[run("wrapped", Some("red"))])
            ))])
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::new(),
            ParagraphRange::all(),
            &mut ctx,
        );

        let table = d.tables().next().unwrap();
        let cell = d.table(table).rows()[0].cells()[0].id();
        assert_eq!(d.block_paragraph_count(cell.0), 1);
        assert_eq!(ctx.stats().paragraphs_deleted, 0);
        assert_eq!(ctx.stats().paragraphs_emptied, 1);
        let xml = String::from_utf8(d.to_xml()).unwrap();
        assert!(xml.contains("<w:sdtContent><w:p"), "{}", xml);
    }

    #[test]
    fn test_last_paragraph_of_text_box_is_kept() {
        let body = format!(
            "<w:p>{}<w:r><w:drawing><w:txbxContent>{}</w:txbxContent></w:drawing></w:r></w:p>",
            run("anchor", None),
            para(&[run("boxed", Some("red"))])
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::new(),
            ParagraphRange::all(),
            &mut ctx,
        );

        assert_eq!(d.paragraphs().count(), 2);
        assert_eq!(d.text(), "anchor\n");
        assert_eq!(ctx.stats().paragraphs_emptied, 1);
    }

    #[test]
    fn test_only_paragraph_of_cell_survives_full_removal() {
        let body = format!(
            "<w:tbl>{}</w:tbl>",
            row(&[cell(&(para(&[run("first", Some("red"))]) + &para(&[run("second", Some("red"))])))])
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::new(),
            ParagraphRange::all(),
            &mut ctx,
        );

        let table = d.tables().next().unwrap();
        let only = d.table(table).rows()[0].cells()[0];
        assert_eq!(only.paragraphs().len(), 1);
        assert_eq!(ctx.stats().paragraphs_deleted, 1);
        assert_eq!(ctx.stats().paragraphs_emptied, 1);
    }

    #[test]
    fn test_single_row_table_is_removed() {
        let body = format!(
            "{}<w:tbl>{}</w:tbl>{}",
            para(&[run("before", None)]),
            row(&[
                cell(&para(&[run("a", Some("red"))])),
                cell(&para(&[run("b", Some("red"))])),
            ]),
            para(&[run("after", None)])
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::clean_tables(),
            ParagraphRange::all(),
            &mut ctx,
        );

        assert!(d.tables().next().is_none());
        assert_eq!(d.text(), "before\nafter");
        assert_eq!(ctx.stats().rows_deleted, 1);
        assert_eq!(ctx.stats().tables_deleted, 1);
    }

    #[test]
    fn test_tables_kept_without_cleanup() {
        let body = format!(
            "<w:tbl>{}</w:tbl>",
            row(&[cell(&para(&[run("a", Some("red"))]))])
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::new(),
            ParagraphRange::all(),
            &mut ctx,
        );
        assert_eq!(d.tables().count(), 1);
        assert_eq!(ctx.stats().rows_deleted, 0);
    }

    #[test]
    fn test_logic_placeholder_rows() {
        let body = format!(
            "<w:tbl>{}{}{}</w:tbl>",
            row(&[cell(&para(&[run("1:", None), run("SV01", Some("red"))]))]),
            row(&[cell(&para(&[run("2:NOT 52AA1 ", None), run("AND IN101", Some("red"))]))]),
            row(&[cell(&para(&[run("3:", None), run("IN102", None), run(" OR X", Some("red"))]))]),
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::with_logic_placeholders(),
            ParagraphRange::all(),
            &mut ctx,
        );

        let table = d.tables().next().unwrap();
        let rows = d.table(table).rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text(), "3:IN102");
        assert_eq!(ctx.stats().rows_deleted, 2);
    }

    #[test]
    fn test_nested_table_removal_refills_cell() {
        let inner = format!("<w:tbl>{}</w:tbl>", row(&[cell(&para(&[run("x", Some("red"))]))]));
        let body = format!(
            "<w:tbl>{}</w:tbl>",
            row(&[cell(&inner), cell(&para(&[run("keep", None)]))])
        );
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::clean_tables(),
            ParagraphRange::all(),
            &mut ctx,
        );

        let outer = d.tables().next().unwrap();
        let host = d.table(outer).rows()[0].cells()[0];
        assert_eq!(host.paragraphs().len(), 1);
        assert_eq!(host.text(), "");
        assert_eq!(ctx.stats().tables_deleted, 1);
    }

    #[test]
    fn test_empty_paragraph_with_marked_paragraph_mark() {
        let body = "<w:p><w:pPr><w:rPr><w:highlight w:val=\"red\"/></w:rPr></w:pPr></w:p>\
                    <w:p><w:pPr><w:rPr><w:highlight w:val=\"yellow\"/></w:rPr></w:pPr></w:p>\
                    <w:p/>";
        let mut d = doc(body);
        let mut ctx = EditContext::default();
        remove_highlighted(
            &mut d,
            WdColorIndex::Red,
            &RemovalOptions::new(),
            ParagraphRange::all(),
            &mut ctx,
        );
        assert_eq!(d.paragraphs().count(), 2);
    }

    #[test]
    fn test_clear_highlighting_keeps_text() {
        let body = [
            para(&[run("kept", Some("cyan")), run(" plain", None), run(" other", Some("red"))]),
            "<w:p><w:pPr><w:rPr><w:highlight w:val=\"cyan\"/></w:rPr></w:pPr></w:p>".to_string(),
        ]
        .concat();
        let mut d = doc(&body);
        let mut ctx = EditContext::default();
        let removed =
            clear_highlighting(&mut d, WdColorIndex::Turquoise, ParagraphRange::all(), &mut ctx);

        assert_eq!(removed, 2);
        assert_eq!(d.text(), "kept plain other\n");
        let ids: Vec<ParagraphId> = d.paragraphs().collect();
        let runs = d.paragraph(ids[0]).runs();
        assert_eq!(runs[0].highlight(), None);
        assert_eq!(runs[2].highlight(), Some(WdColorIndex::Red));
        assert_eq!(d.paragraph(ids[1]).mark_highlight(), None);
    }

    #[test]
    fn test_bad_row_pattern() {
        let err = RemovalOptions::with_row_patterns(["(oops"]).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        let ok = RemovalOptions::with_row_patterns(["^N/A$"]).unwrap();
        assert!(ok.row_counts_as_empty("N/A"));
        assert!(ok.row_counts_as_empty(""));
        assert!(!ok.row_counts_as_empty("N/A later"));
    }
}
