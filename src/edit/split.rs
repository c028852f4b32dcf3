//! One document per highlight colour.
use crate::edit::{EditContext, ParagraphRange, RemovalOptions, remove_highlighted};
use crate::ooxml::docx::{Document, Package, WdColorIndex};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Count the highlighted runs of `doc` per colour, in colour order.
pub fn highlight_colors(doc: &Document) -> BTreeMap<WdColorIndex, usize> {
    let mut counts = BTreeMap::new();
    for paragraph in doc.paragraphs() {
        for run in doc.paragraph(paragraph).all_runs() {
            if let Some(color) = run.highlight() {
                *counts.entry(color).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Split `pkg` into one package per highlight colour in use.
///
/// Each output keeps the unhighlighted content plus the content of one
/// colour, which stays highlighted. Content of every other colour is
/// removed as by [`remove_highlighted`], without table cleanup.
pub fn split_by_highlight(pkg: &Package, ctx: &mut EditContext) -> Vec<(WdColorIndex, Package)> {
    let span = ctx.span().clone();
    let _guard = span.enter();

    let counts = highlight_colors(pkg.document());
    for (color, runs) in &counts {
        debug!(color = %color, runs, "highlight colour in use");
    }

    let options = RemovalOptions::new();
    let mut outputs = Vec::with_capacity(counts.len());
    for &keep in counts.keys() {
        let mut copy = pkg.clone();
        for &other in counts.keys().filter(|&&c| c != keep) {
            remove_highlighted(copy.document_mut(), other, &options, ParagraphRange::all(), ctx);
        }
        outputs.push((keep, copy));
    }

    info!(outputs = outputs.len(), "document split by highlight colour");
    outputs
}
