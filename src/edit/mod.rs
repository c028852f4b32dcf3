//! Run-aware editing of Word documents.
//!
//! The operations here all follow the same shape: walk the paragraphs of a
//! [`Document`](crate::ooxml::docx::Document) in document order
//! ([`walker`]), touch the smallest set of runs that realises the edit, then
//! clean up paragraphs, rows and tables left empty.
//!
//! - [`find_replace`]: regex replacement across run boundaries
//! - [`highlight`]: removal or un-marking of content by highlight colour
//! - [`batch`]: order-independent literal replacements
//! - [`split`]: one output package per highlight colour
//!
//! Every operation takes an [`EditContext`], which carries the tracing span
//! for the document being processed and counts what was changed.
pub mod batch;
pub mod find_replace;
pub mod highlight;
pub mod split;
pub mod walker;

pub use batch::{Replacement, replace_all};
pub use find_replace::{FindReplace, find_replace};
pub use highlight::{RemovalOptions, clear_highlighting, remove_highlighted};
pub use split::{highlight_colors, split_by_highlight};
pub use walker::{Paragraphs, traverse};

use crate::ooxml::docx::ParagraphId;
use std::fmt;
use tracing::Span;

/// Inclusive bounds of a traversal.
///
/// `None` on either side means the start or the end of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParagraphRange {
    pub start: Option<ParagraphId>,
    pub end: Option<ParagraphId>,
}

impl ParagraphRange {
    /// The whole document.
    #[inline]
    pub fn all() -> Self {
        Self::default()
    }

    /// From `start` to the end of the document.
    #[inline]
    pub fn starting_at(start: ParagraphId) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// From the start of the document up to and including `end`.
    #[inline]
    pub fn until(end: ParagraphId) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    #[inline]
    pub fn between(start: ParagraphId, end: ParagraphId) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Counters for the changes made to one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditStats {
    /// Paragraphs whose text was rewritten by a replacement
    pub paragraphs_changed: usize,
    /// Runs absorbed into a neighbour so a match fits in one run
    pub runs_merged: usize,
    /// Runs whose text was substituted
    pub runs_replaced: usize,
    /// Runs emptied by highlight removal
    pub runs_cleared: usize,
    pub paragraphs_deleted: usize,
    /// Paragraphs emptied but kept as the last one in their cell
    pub paragraphs_emptied: usize,
    pub rows_deleted: usize,
    pub tables_deleted: usize,
    /// Highlight attributes removed from runs and paragraph marks
    pub highlights_cleared: usize,
}

impl fmt::Display for EditStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} paragraphs changed, {} runs merged, {} runs replaced, {} runs cleared, \
             {} paragraphs deleted ({} kept empty), {} rows deleted, {} tables deleted, \
             {} highlights cleared",
            self.paragraphs_changed,
            self.runs_merged,
            self.runs_replaced,
            self.runs_cleared,
            self.paragraphs_deleted,
            self.paragraphs_emptied,
            self.rows_deleted,
            self.tables_deleted,
            self.highlights_cleared
        )
    }
}

/// Logging and bookkeeping context for editing one document.
///
/// Create one per document and pass it to every operation. Events emitted
/// by the operations are recorded inside its span, so a subscriber sees
/// which document they belong to.
///
/// ```rust
/// use runspan::edit::EditContext;
///
/// let ctx = EditContext::new("relay-settings.docx");
/// assert_eq!(ctx.stats().runs_merged, 0);
/// ```
#[derive(Debug, Clone)]
pub struct EditContext {
    span: Span,
    stats: EditStats,
}

impl EditContext {
    /// Create a context for the document called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            span: tracing::info_span!("document", name = %name),
            stats: EditStats::default(),
        }
    }

    /// Span that operations enter while working on the document.
    #[inline]
    pub fn span(&self) -> &Span {
        &self.span
    }

    #[inline]
    pub fn stats(&self) -> &EditStats {
        &self.stats
    }

    #[inline]
    pub(crate) fn stats_mut(&mut self) -> &mut EditStats {
        &mut self.stats
    }
}

impl Default for EditContext {
    fn default() -> Self {
        Self::new("document")
    }
}
