/// Table, Row, and Cell structures for Word documents.
///
/// Tables nest: a cell holds paragraphs and possibly further tables. A cell
/// must always end up holding at least one paragraph, which the deletion
/// methods here maintain.
use crate::ooxml::docx::document::{Document, node_handle, wml};
use crate::ooxml::docx::paragraph::{Paragraph, ParagraphId};
use crate::ooxml::docx::tree::XmlTree;
use smallvec::SmallVec;

node_handle!(
    /// Handle to a `w:tbl` element.
    TableId
);
node_handle!(
    /// Handle to a `w:tr` element.
    RowId
);
node_handle!(
    /// Handle to a `w:tc` element.
    CellId
);

/// Outcome of [`Document::delete_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRemoval {
    /// The table sat in a cell that was left without paragraphs and got an
    /// empty one re-inserted.
    pub refilled_cell: Option<CellId>,
}

/// A table in a Word document.
///
/// Represents a `<w:tbl>` element. Tables contain rows, which contain cells,
/// which contain paragraphs.
///
/// # Example
///
/// ```rust
/// use runspan::ooxml::docx::Document;
///
/// let doc = Document::from_xml(br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:tbl><w:tr><w:tc><w:p><w:r><w:t>A1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B1</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body></w:document>"#)?;
/// for table in doc.tables() {
///     for (row_idx, row) in doc.table(table).rows().iter().enumerate() {
///         for (col_idx, cell) in row.cells().iter().enumerate() {
///             println!("Cell [{},{}]: {}", row_idx, col_idx, cell.text());
///         }
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy)]
pub struct Table<'a> {
    doc: &'a Document,
    id: TableId,
}

impl<'a> Table<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, id: TableId) -> Self {
        Self { doc, id }
    }

    #[inline]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Rows of this table, in order.
    pub fn rows(&self) -> SmallVec<[Row<'a>; 16]> {
        self.doc
            .tree()
            .child_elements(self.id.0, wml::TR)
            .map(|r| Row::new(self.doc, RowId(r)))
            .collect()
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.doc.tree().child_elements(self.id.0, wml::TR).count()
    }

    /// Cell enclosing this table, if it is nested.
    pub fn enclosing_cell(&self) -> Option<CellId> {
        let parent = self.doc.tree().parent(self.id.0)?;
        self.doc.tree().is_element(parent, wml::TC).then_some(CellId(parent))
    }
}

/// A row in a table.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    doc: &'a Document,
    id: RowId,
}

impl<'a> Row<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, id: RowId) -> Self {
        Self { doc, id }
    }

    #[inline]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Cells of this row, in order.
    pub fn cells(&self) -> SmallVec<[Cell<'a>; 8]> {
        self.doc
            .tree()
            .child_elements(self.id.0, wml::TC)
            .map(|c| Cell::new(self.doc, CellId(c)))
            .collect()
    }

    /// The table owning this row.
    pub fn table(&self) -> Option<TableId> {
        let parent = self.doc.tree().parent(self.id.0)?;
        self.doc.tree().is_element(parent, wml::TBL).then_some(TableId(parent))
    }

    /// Rendered text of every paragraph in every cell, concatenated.
    pub fn text(&self) -> String {
        subtree_text(self.doc, self.id.0)
    }
}

/// A cell in a table row.
#[derive(Clone, Copy)]
pub struct Cell<'a> {
    doc: &'a Document,
    id: CellId,
}

impl<'a> Cell<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, id: CellId) -> Self {
        Self { doc, id }
    }

    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The row owning this cell.
    pub fn row(&self) -> Option<RowId> {
        let parent = self.doc.tree().parent(self.id.0)?;
        self.doc.tree().is_element(parent, wml::TR).then_some(RowId(parent))
    }

    /// Paragraphs directly inside the cell.
    pub fn paragraphs(&self) -> SmallVec<[Paragraph<'a>; 4]> {
        self.doc
            .tree()
            .child_elements(self.id.0, wml::P)
            .map(|p| self.doc.paragraph(ParagraphId(p)))
            .collect()
    }

    /// Rendered text of every paragraph in the cell, nested tables included.
    pub fn text(&self) -> String {
        subtree_text(self.doc, self.id.0)
    }
}

fn subtree_text(doc: &Document, node: crate::ooxml::docx::tree::NodeId) -> String {
    let tree: &XmlTree = doc.tree();
    tree.descendants(node)
        .filter(|&n| tree.is_element(n, wml::P))
        .map(|p| doc.paragraph(ParagraphId(p)).text())
        .collect()
}

/// Table edits.
impl Document {
    /// Remove a row from its table.
    ///
    /// Returns the owning table so the caller can decide whether it is now
    /// empty.
    pub fn delete_row(&mut self, row: RowId) -> Option<TableId> {
        let table = self.row(row).table();
        self.tree_mut().detach(row.0);
        table
    }

    /// Remove a table. If it was nested in a cell that is left without a
    /// paragraph, an empty paragraph is appended to that cell.
    pub fn delete_table(&mut self, table: TableId) -> TableRemoval {
        let cell = self.table(table).enclosing_cell();
        self.tree_mut().detach(table.0);

        let refilled_cell = match cell {
            Some(cell) if self.block_paragraph_count(cell.0) == 0 => {
                self.append_empty_paragraph(cell.0);
                Some(cell)
            },
            _ => None,
        };
        TableRemoval { refilled_cell }
    }
}
