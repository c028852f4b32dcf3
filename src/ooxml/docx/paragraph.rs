/// Paragraph and Run - text-bearing content of a Word document.
///
/// A paragraph's rendered text is built from its runs. Runs nested in
/// wrappers such as hyperlinks, content controls or insertions count towards
/// it, runs inside nested paragraphs (text boxes) do not.
use crate::ooxml::docx::document::{Document, node_handle, wml};
use crate::ooxml::docx::enums::{NO_HIGHLIGHT, WdColorIndex};
use crate::ooxml::docx::table::CellId;
use crate::ooxml::docx::tree::{NodeId, XmlTree};
use smallvec::SmallVec;

node_handle!(
    /// Handle to a `w:p` element.
    ParagraphId
);
node_handle!(
    /// Handle to a `w:r` element.
    RunId
);

/// Outcome of [`Document::delete_paragraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphRemoval {
    /// The paragraph was unlinked from its parent.
    Removed,
    /// The paragraph is the only one in its table cell or text box; its
    /// content was cleared and the paragraph kept so the container stays valid.
    KeptAsLastInCell,
}

/// Whether a toggle property element (`w:b`, `w:strike`) is switched on.
fn toggle_on(tree: &XmlTree, element: Option<NodeId>) -> bool {
    match element {
        Some(el) => !matches!(tree.attr(el, wml::VAL), Some("0" | "false" | "off")),
        None => false,
    }
}

/// Collect the runs below `node` in order, not descending into runs or
/// nested paragraphs.
fn collect_runs(tree: &XmlTree, node: NodeId, out: &mut SmallVec<[RunId; 8]>) {
    for &child in tree.children(node) {
        match tree.name(child) {
            Some(wml::R) => out.push(RunId(child)),
            Some(wml::P) => {},
            Some(_) => collect_runs(tree, child, out),
            None => {},
        }
    }
}

/// Text contributed by a text-bearing run child, or `None` for other children.
fn child_text<'t>(tree: &'t XmlTree, child: NodeId) -> Option<&'t str> {
    match tree.name(child)? {
        wml::T => Some(tree.children(child).first().and_then(|&n| tree.text(n)).unwrap_or("")),
        wml::TAB => Some("\t"),
        wml::BR | wml::CR => Some("\n"),
        _ => None,
    }
}

/// A paragraph in a document.
#[derive(Clone, Copy)]
pub struct Paragraph<'a> {
    doc: &'a Document,
    id: ParagraphId,
}

impl<'a> Paragraph<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, id: ParagraphId) -> Self {
        Self { doc, id }
    }

    #[inline]
    pub fn id(&self) -> ParagraphId {
        self.id
    }

    #[inline]
    fn tree(&self) -> &'a XmlTree {
        self.doc.tree()
    }

    /// Rendered text: the text of every run the paragraph contains.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for run in self.all_runs() {
            run.push_text(&mut text);
        }
        text
    }

    /// Concatenated text of the direct `w:r` children only.
    pub fn direct_runs_text(&self) -> String {
        let mut text = String::new();
        for run in self.runs() {
            run.push_text(&mut text);
        }
        text
    }

    /// Direct `w:r` children, in order.
    pub fn runs(&self) -> SmallVec<[Run<'a>; 8]> {
        self.tree()
            .child_elements(self.id.0, wml::R)
            .map(|r| Run::new(self.doc, RunId(r)))
            .collect()
    }

    /// Every run contributing to the rendered text, including runs in
    /// hyperlinks and other inline wrappers.
    pub fn all_runs(&self) -> SmallVec<[Run<'a>; 8]> {
        let mut ids = SmallVec::new();
        collect_runs(self.tree(), self.id.0, &mut ids);
        ids.into_iter().map(|r| Run::new(self.doc, r)).collect()
    }

    /// Whether the rendered text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.all_runs().iter().all(|r| r.text().is_empty())
    }

    /// Style ID from `w:pPr/w:pStyle`.
    pub fn style_id(&self) -> Option<&'a str> {
        let style = self.tree().child_path(self.id.0, &[wml::P_PR, wml::P_STYLE])?;
        self.tree().attr(style, wml::VAL)
    }

    /// Display name of the paragraph style, resolved through the styles part.
    ///
    /// Paragraphs without an explicit style use `Normal`.
    pub fn style_name(&self) -> String {
        match self.style_id() {
            Some(id) => self.doc.styles().display_name(id).into_owned(),
            None => "Normal".to_string(),
        }
    }

    /// Highlight of the paragraph mark (`w:pPr/w:rPr/w:highlight/@w:val`).
    pub fn mark_highlight(&self) -> Option<WdColorIndex> {
        let highlight =
            self.tree()
                .child_path(self.id.0, &[wml::P_PR, wml::R_PR, wml::HIGHLIGHT])?;
        WdColorIndex::from_xml(self.tree().attr(highlight, wml::VAL)?)
    }

    /// Nearest enclosing table cell.
    pub fn enclosing_cell(&self) -> Option<CellId> {
        self.tree().ancestor(self.id.0, wml::TC).map(CellId)
    }
}

impl std::fmt::Debug for Paragraph<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paragraph")
            .field("id", &self.id)
            .field("text", &self.text())
            .finish()
    }
}

/// A run of uniformly formatted text.
#[derive(Clone, Copy)]
pub struct Run<'a> {
    doc: &'a Document,
    id: RunId,
}

impl<'a> Run<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, id: RunId) -> Self {
        Self { doc, id }
    }

    #[inline]
    pub fn id(&self) -> RunId {
        self.id
    }

    #[inline]
    fn tree(&self) -> &'a XmlTree {
        self.doc.tree()
    }

    fn push_text(&self, out: &mut String) {
        for &child in self.tree().children(self.id.0) {
            if let Some(text) = child_text(self.tree(), child) {
                out.push_str(text);
            }
        }
    }

    /// Run text: `w:t` content, `w:tab` as `\t`, `w:br`/`w:cr` as `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.push_text(&mut text);
        text
    }

    fn property(&self, name: &str) -> Option<NodeId> {
        self.tree().child_path(self.id.0, &[wml::R_PR, name])
    }

    /// Raw `w:highlight/@w:val` value, if any.
    pub fn highlight_val(&self) -> Option<&'a str> {
        let highlight = self.property(wml::HIGHLIGHT)?;
        self.tree().attr(highlight, wml::VAL)
    }

    /// Highlight colour; `none` and unknown values are no highlight.
    pub fn highlight(&self) -> Option<WdColorIndex> {
        self.highlight_val()
            .filter(|v| *v != NO_HIGHLIGHT)
            .and_then(WdColorIndex::from_xml)
    }

    #[inline]
    pub fn is_bold(&self) -> bool {
        toggle_on(self.tree(), self.property(wml::BOLD))
    }

    /// Single or double strikethrough.
    #[inline]
    pub fn is_strike(&self) -> bool {
        toggle_on(self.tree(), self.property(wml::STRIKE))
            || toggle_on(self.tree(), self.property(wml::DSTRIKE))
    }
}

impl std::fmt::Debug for Run<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("id", &self.id)
            .field("text", &self.text())
            .field("highlight", &self.highlight())
            .finish()
    }
}

/// Paragraph and run edits.
impl Document {
    /// Replace a run's text, keeping its formatting and non-text children.
    ///
    /// The text-bearing children are removed and the new content is inserted
    /// where the first of them was (at the end when there were none). Tabs and
    /// newlines become `w:tab` and `w:br` so the run text reads back unchanged.
    pub fn set_run_text(&mut self, run: RunId, text: &str) {
        let tree = self.tree_mut();
        let children: Vec<NodeId> = tree.children(run.0).to_vec();

        let mut insert_at = None;
        for (index, &child) in children.iter().enumerate() {
            if child_text(tree, child).is_some() {
                insert_at.get_or_insert(index);
                tree.detach(child);
            }
        }
        let mut position = insert_at.unwrap_or(children.len());

        let mut pending = String::new();
        let flush = |tree: &mut XmlTree, pending: &mut String, position: &mut usize| {
            if pending.is_empty() {
                return;
            }
            let t = tree.create_element(wml::T);
            tree.set_attr(t, wml::XML_SPACE, "preserve");
            let content = tree.create_text(pending);
            tree.append_child(t, content);
            tree.insert_child(run.0, *position, t);
            *position += 1;
            pending.clear();
        };

        for ch in text.chars() {
            let special = match ch {
                '\t' => Some(wml::TAB),
                '\n' => Some(wml::BR),
                _ => None,
            };
            match special {
                Some(name) => {
                    flush(tree, &mut pending, &mut position);
                    let el = tree.create_element(name);
                    tree.insert_child(run.0, position, el);
                    position += 1;
                },
                None => pending.push(ch),
            }
        }
        flush(tree, &mut pending, &mut position);
    }

    /// Remove everything from a run except its properties.
    pub fn clear_run(&mut self, run: RunId) {
        let tree = self.tree_mut();
        let children: Vec<NodeId> = tree.children(run.0).to_vec();
        for child in children {
            if !tree.is_element(child, wml::R_PR) {
                tree.detach(child);
            }
        }
    }

    /// Merge `runs` into the first one.
    ///
    /// The first run receives the concatenated text and keeps its own
    /// formatting; the others are removed. Returns the surviving run.
    pub fn merge_runs(&mut self, runs: &[RunId]) -> Option<RunId> {
        let (&first, rest) = runs.split_first()?;
        if rest.is_empty() {
            return Some(first);
        }
        let text: String = runs.iter().map(|&r| self.run(r).text()).collect();
        self.set_run_text(first, &text);
        for &run in rest {
            self.tree_mut().detach(run.0);
        }
        Some(first)
    }

    /// Remove the highlight property from a run. Returns whether one was removed.
    pub fn remove_run_highlight(&mut self, run: RunId) -> bool {
        match self.run(run).property(wml::HIGHLIGHT) {
            Some(highlight) => {
                self.tree_mut().detach(highlight);
                true
            },
            None => false,
        }
    }

    /// Remove the highlight from a paragraph mark. Returns whether one was removed.
    pub fn remove_mark_highlight(&mut self, paragraph: ParagraphId) -> bool {
        let highlight = self.tree().child_path(
            paragraph.0,
            &[wml::P_PR, wml::R_PR, wml::HIGHLIGHT],
        );
        match highlight {
            Some(highlight) => {
                self.tree_mut().detach(highlight);
                true
            },
            None => false,
        }
    }

    /// Delete a paragraph from its parent.
    ///
    /// The last paragraph of a table cell or text box is never removed, even
    /// when it sits inside a wrapper such as a content control: its content
    /// is cleared down to the paragraph properties instead.
    pub fn delete_paragraph(&mut self, paragraph: ParagraphId) -> ParagraphRemoval {
        let tree = self.tree();
        let container = tree
            .ancestors(paragraph.0)
            .find(|&a| tree.is_element(a, wml::TC) || tree.is_element(a, wml::TXBX_CONTENT));
        if let Some(container) = container
            && self.block_paragraph_count(container) == 1
        {
            let tree = self.tree_mut();
            let children: Vec<NodeId> = tree.children(paragraph.0).to_vec();
            for child in children {
                if !tree.is_element(child, wml::P_PR) {
                    tree.detach(child);
                }
            }
            return ParagraphRemoval::KeptAsLastInCell;
        }
        self.tree_mut().detach(paragraph.0);
        ParagraphRemoval::Removed
    }

    /// Paragraphs owned by a cell or text box: wrappers are looked through,
    /// nested tables and text boxes are not.
    pub(crate) fn block_paragraph_count(&self, container: NodeId) -> usize {
        let tree = self.tree();
        let mut count = 0;
        let mut stack: Vec<NodeId> = tree.children(container).to_vec();
        while let Some(node) = stack.pop() {
            match tree.name(node) {
                Some(wml::P) => count += 1,
                Some(wml::TBL | wml::TXBX_CONTENT) | None => {},
                Some(_) => stack.extend_from_slice(tree.children(node)),
            }
        }
        count
    }

    /// Create an empty paragraph and append it to `parent`.
    pub(crate) fn append_empty_paragraph(&mut self, parent: NodeId) -> ParagraphId {
        let tree = self.tree_mut();
        let p = tree.create_element(wml::P);
        tree.append_child(parent, p);
        ParagraphId(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::document::tests::doc;

    fn first_paragraph(d: &Document) -> ParagraphId {
        d.paragraphs().next().unwrap()
    }

    #[test]
    fn test_run_text_mapping() {
        let d = doc("<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t><w:cr/></w:r></w:p>");
        let p = d.paragraph(first_paragraph(&d));
        assert_eq!(p.runs()[0].text(), "a\tb\nc\n");
    }

    #[test]
    fn test_rendered_text_includes_wrapped_runs() {
        let d = doc(
            "<w:p><w:r><w:t>see </w:t></w:r>\
             <w:hyperlink><w:r><w:t>link</w:t></w:r></w:hyperlink>\
             <w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>box</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r></w:p>",
        );
        let p = d.paragraph(first_paragraph(&d));
        assert_eq!(p.text(), "see link");
        assert_eq!(p.direct_runs_text(), "see ");
        assert_eq!(p.runs().len(), 2);
        assert_eq!(p.all_runs().len(), 3);
    }

    #[test]
    fn test_formatting_queries() {
        let d = doc(
            "<w:p><w:pPr><w:pStyle w:val=\"SettingLine\"/><w:rPr><w:highlight w:val=\"yellow\"/></w:rPr></w:pPr>\
             <w:r><w:rPr><w:b/><w:highlight w:val=\"cyan\"/></w:rPr><w:t>x</w:t></w:r>\
             <w:r><w:rPr><w:b w:val=\"0\"/><w:strike/></w:rPr><w:t>y</w:t></w:r>\
             <w:r><w:rPr><w:highlight w:val=\"none\"/></w:rPr><w:t>z</w:t></w:r></w:p>",
        );
        let p = d.paragraph(first_paragraph(&d));
        assert_eq!(p.style_id(), Some("SettingLine"));
        assert_eq!(p.style_name(), "SettingLine");
        assert_eq!(p.mark_highlight(), Some(WdColorIndex::Yellow));

        let runs = p.runs();
        assert!(runs[0].is_bold());
        assert_eq!(runs[0].highlight(), Some(WdColorIndex::Turquoise));
        assert!(!runs[1].is_bold());
        assert!(runs[1].is_strike());
        assert_eq!(runs[2].highlight_val(), Some("none"));
        assert_eq!(runs[2].highlight(), None);
    }

    #[test]
    fn test_set_run_text_keeps_other_children() {
        let mut d = doc(
            "<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>old</w:t><w:tab/><w:t>text</w:t><w:fldChar w:fldCharType=\"begin\"/></w:r></w:p>",
        );
        let run = d.paragraph(first_paragraph(&d)).runs()[0].id();
        d.set_run_text(run, "new\ttext\nhere");

        let tree = d.tree();
        let names: Vec<&str> = tree.children(run.0).iter().filter_map(|&c| tree.name(c)).collect();
        assert_eq!(names, vec!["w:rPr", "w:t", "w:tab", "w:t", "w:br", "w:t", "w:fldChar"]);
        assert_eq!(d.run(run).text(), "new\ttext\nhere");
    }

    #[test]
    fn test_clear_run_keeps_properties() {
        let mut d = doc("<w:p><w:r><w:rPr><w:highlight w:val=\"red\"/></w:rPr><w:t>gone</w:t></w:r></w:p>");
        let run = d.paragraph(first_paragraph(&d)).runs()[0].id();
        d.clear_run(run);
        assert_eq!(d.run(run).text(), "");
        assert_eq!(d.run(run).highlight(), Some(WdColorIndex::Red));
    }

    #[test]
    fn test_merge_runs_keeps_first_formatting() {
        let mut d = doc(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>ab</w:t></w:r><w:r><w:t>cd</w:t></w:r><w:r><w:t>ef</w:t></w:r></w:p>",
        );
        let p = first_paragraph(&d);
        let runs: Vec<RunId> = d.paragraph(p).runs().iter().map(|r| r.id()).collect();
        let merged = d.merge_runs(&runs).unwrap();

        assert_eq!(merged, runs[0]);
        let para = d.paragraph(p);
        assert_eq!(para.runs().len(), 1);
        assert_eq!(para.text(), "abcdef");
        assert!(para.runs()[0].is_bold());
        assert!(!d.is_live(runs[1]));
    }

    #[test]
    fn test_delete_paragraph_keeps_cell_floor() {
        let mut d = doc(
            "<w:p><w:r><w:t>body</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr><w:r><w:t>only</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let ids: Vec<ParagraphId> = d.paragraphs().collect();

        assert_eq!(d.delete_paragraph(ids[0]), ParagraphRemoval::Removed);
        assert!(!d.is_live(ids[0]));

        assert_eq!(d.delete_paragraph(ids[1]), ParagraphRemoval::KeptAsLastInCell);
        assert!(d.is_live(ids[1]));
        assert_eq!(d.paragraph(ids[1]).text(), "");
        assert!(d.tree().first_child(ids[1].0, wml::P_PR).is_some());
    }

    #[test]
    fn test_remove_highlights() {
        let mut d = doc(
            "<w:p><w:pPr><w:rPr><w:highlight w:val=\"red\"/></w:rPr></w:pPr><w:r><w:rPr><w:highlight w:val=\"red\"/></w:rPr><w:t>x</w:t></w:r></w:p>",
        );
        let p = first_paragraph(&d);
        let run = d.paragraph(p).runs()[0].id();
        assert!(d.remove_run_highlight(run));
        assert!(!d.remove_run_highlight(run));
        assert!(d.remove_mark_highlight(p));
        assert_eq!(d.paragraph(p).mark_highlight(), None);
        assert_eq!(d.paragraph(p).text(), "x");
    }
}
