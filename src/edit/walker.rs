//! Document-order traversal of paragraphs.
//!
//! Order comes from a pre-order walk of the body, so a table's paragraphs
//! appear where the table sits, cells are visited row by row, left to
//! right, and nested tables and text boxes are entered in place.
use crate::edit::ParagraphRange;
use crate::ooxml::docx::document::wml;
use crate::ooxml::docx::tree::Descendants;
use crate::ooxml::docx::{Document, NodeHandle, ParagraphId};

/// Lazy iterator over the paragraphs of a [`ParagraphRange`].
///
/// Returned by [`traverse`]. It borrows the document, so callers that edit
/// while walking collect the ids first and check
/// [`Document::is_live`] before each use.
pub struct Paragraphs<'a> {
    doc: &'a Document,
    nodes: Descendants<'a>,
    range: ParagraphRange,
    started: bool,
    finished: bool,
}

/// Walk the paragraphs of `doc` within `range`, in document order.
///
/// Both bounds are inclusive. A `start` that is never reached yields
/// nothing; an `end` that is never reached runs to the end of the document.
/// An `end` met before `start` makes the range empty.
pub fn traverse(doc: &Document, range: ParagraphRange) -> Paragraphs<'_> {
    Paragraphs {
        doc,
        nodes: doc.tree().descendants(doc.body()),
        range,
        started: range.start.is_none(),
        finished: false,
    }
}

impl Iterator for Paragraphs<'_> {
    type Item = ParagraphId;

    fn next(&mut self) -> Option<ParagraphId> {
        if self.finished {
            return None;
        }
        for node in self.nodes.by_ref() {
            if !self.doc.tree().is_element(node, wml::P) {
                continue;
            }
            let is_start = self.range.start.map(NodeHandle::node) == Some(node);
            let is_end = self.range.end.map(NodeHandle::node) == Some(node);

            if !self.started {
                if is_start {
                    self.started = true;
                } else {
                    if is_end {
                        self.finished = true;
                        return None;
                    }
                    continue;
                }
            }
            if is_end {
                self.finished = true;
            }
            return self.doc.paragraph_id(node);
        }
        self.finished = true;
        None
    }
}

/// Collect the paragraph ids of `range` up front, for passes that edit.
pub(crate) fn collect(doc: &Document, range: ParagraphRange) -> Vec<ParagraphId> {
    traverse(doc, range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::document::tests::doc;

    fn texts(d: &Document, range: ParagraphRange) -> Vec<String> {
        traverse(d, range).map(|p| d.paragraph(p).text()).collect()
    }

    const INTERLEAVED: &str = "<w:p><w:r><w:t>p1</w:t></w:r></w:p>\
        <w:tbl>\
          <w:tr><w:tc><w:p><w:r><w:t>a1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b1</w:t></w:r></w:p></w:tc></w:tr>\
          <w:tr><w:tc><w:p><w:r><w:t>a2</w:t></w:r></w:p>\
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>n1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>n2</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
            <w:p/></w:tc>\
          <w:tc><w:p><w:r><w:t>b2</w:t></w:r></w:p></w:tc></w:tr>\
        </w:tbl>\
        <w:p><w:r><w:t>p2</w:t></w:r></w:p>";

    #[test]
    fn test_document_order_with_nested_tables() {
        let d = doc(INTERLEAVED);
        assert_eq!(
            texts(&d, ParagraphRange::all()),
            vec!["p1", "a1", "b1", "a2", "n1", "n2", "", "b2", "p2"]
        );
    }

    #[test]
    fn test_inclusive_bounds() {
        let d = doc(INTERLEAVED);
        let ids: Vec<ParagraphId> = traverse(&d, ParagraphRange::all()).collect();

        assert_eq!(texts(&d, ParagraphRange::between(ids[2], ids[4])), vec!["b1", "a2", "n1"]);
        assert_eq!(texts(&d, ParagraphRange::starting_at(ids[7])), vec!["b2", "p2"]);
        assert_eq!(texts(&d, ParagraphRange::until(ids[1])), vec!["p1", "a1"]);
        assert_eq!(texts(&d, ParagraphRange::between(ids[3], ids[3])), vec!["a2"]);
    }

    #[test]
    fn test_unreached_start_yields_nothing() {
        let mut d = doc(INTERLEAVED);
        let ids: Vec<ParagraphId> = traverse(&d, ParagraphRange::all()).collect();
        d.delete_paragraph(ids[0]);
        assert!(texts(&d, ParagraphRange::starting_at(ids[0])).is_empty());
    }

    #[test]
    fn test_end_before_start_is_empty() {
        let d = doc(INTERLEAVED);
        let ids: Vec<ParagraphId> = traverse(&d, ParagraphRange::all()).collect();
        assert!(texts(&d, ParagraphRange::between(ids[5], ids[1])).is_empty());
    }

    #[test]
    fn test_text_box_paragraphs_are_visited() {
        let d = doc(
            "<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r></w:p>",
        );
        assert_eq!(texts(&d, ParagraphRange::all()), vec!["outer", "inner"]);
    }
}
