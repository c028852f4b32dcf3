/// Document - the main API for reading and editing Word document content.
///
/// A [`Document`] owns the parsed main part. Read access goes through
/// borrowed views ([`Paragraph`], [`Run`], [`Table`], [`Row`], [`Cell`]);
/// edits are `&mut Document` methods taking the matching typed handle.
use crate::ooxml::docx::paragraph::{Paragraph, ParagraphId, Run, RunId};
use crate::ooxml::docx::styles::Styles;
use crate::ooxml::docx::table::{Cell, CellId, Row, RowId, Table, TableId};
use crate::ooxml::docx::tree::{NodeId, XmlTree};
use crate::ooxml::error::{OoxmlError, Result};

/// Element names the editor works with.
pub mod wml {
    pub const DOCUMENT: &str = "w:document";
    pub const BODY: &str = "w:body";
    pub const P: &str = "w:p";
    pub const P_PR: &str = "w:pPr";
    pub const P_STYLE: &str = "w:pStyle";
    pub const R: &str = "w:r";
    pub const R_PR: &str = "w:rPr";
    pub const T: &str = "w:t";
    pub const TAB: &str = "w:tab";
    pub const BR: &str = "w:br";
    pub const CR: &str = "w:cr";
    pub const HIGHLIGHT: &str = "w:highlight";
    pub const BOLD: &str = "w:b";
    pub const STRIKE: &str = "w:strike";
    pub const DSTRIKE: &str = "w:dstrike";
    pub const TBL: &str = "w:tbl";
    pub const TR: &str = "w:tr";
    pub const TC: &str = "w:tc";
    pub const TXBX_CONTENT: &str = "w:txbxContent";
    pub const BOOKMARK_START: &str = "w:bookmarkStart";
    pub const VAL: &str = "w:val";
    pub const NAME: &str = "w:name";
    pub const XML_SPACE: &str = "xml:space";
}

/// Implemented by the typed handles so [`Document::is_live`] accepts any of them.
pub trait NodeHandle: Copy {
    fn node(self) -> NodeId;
}

macro_rules! node_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) $crate::ooxml::docx::tree::NodeId);

        impl $crate::ooxml::docx::document::NodeHandle for $name {
            #[inline]
            fn node(self) -> $crate::ooxml::docx::tree::NodeId {
                self.0
            }
        }
    };
}
pub(crate) use node_handle;

/// A Word document's main part, parsed and editable.
///
/// # Examples
///
/// ```rust
/// use runspan::ooxml::docx::Document;
///
/// let doc = Document::from_xml(br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p></w:body></w:document>"#)?;
/// assert_eq!(doc.text(), "Hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    tree: XmlTree,
    body: NodeId,
    styles: Styles,
}

impl Document {
    /// Parse the XML of a main document part.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let tree = XmlTree::parse(xml)?;
        let root = tree
            .document_element()
            .ok_or_else(|| OoxmlError::InvalidFormat("empty document part".to_string()))?;
        if !tree.is_element(root, wml::DOCUMENT) {
            return Err(OoxmlError::InvalidFormat(format!(
                "expected {} root element, found {}",
                wml::DOCUMENT,
                tree.name(root).unwrap_or_default()
            )));
        }
        let body = tree
            .first_child(root, wml::BODY)
            .ok_or_else(|| OoxmlError::PartNotFound(wml::BODY.to_string()))?;

        Ok(Self {
            tree,
            body,
            styles: Styles::default(),
        })
    }

    /// Serialize the document back to XML.
    #[inline]
    pub fn to_xml(&self) -> Vec<u8> {
        self.tree.to_xml()
    }

    /// Attach the style table used to resolve paragraph style names.
    pub fn set_styles(&mut self, styles: Styles) {
        self.styles = styles;
    }

    #[inline]
    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    /// The underlying XML tree.
    #[inline]
    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    #[inline]
    pub(crate) fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }

    /// The `w:body` element.
    #[inline]
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Whether a handle still refers to a node attached to the document.
    #[inline]
    pub fn is_live<H: NodeHandle>(&self, handle: H) -> bool {
        self.tree.is_live(handle.node())
    }

    /// View a paragraph.
    #[inline]
    pub fn paragraph(&self, id: ParagraphId) -> Paragraph<'_> {
        Paragraph::new(self, id)
    }

    /// View a run.
    #[inline]
    pub fn run(&self, id: RunId) -> Run<'_> {
        Run::new(self, id)
    }

    #[inline]
    pub fn table(&self, id: TableId) -> Table<'_> {
        Table::new(self, id)
    }

    #[inline]
    pub fn row(&self, id: RowId) -> Row<'_> {
        Row::new(self, id)
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> Cell<'_> {
        Cell::new(self, id)
    }

    /// Handle for `node` if it is a paragraph element.
    pub fn paragraph_id(&self, node: NodeId) -> Option<ParagraphId> {
        self.tree.is_element(node, wml::P).then_some(ParagraphId(node))
    }

    /// Every paragraph below the body in document order, text boxes included.
    pub fn paragraphs(&self) -> impl Iterator<Item = ParagraphId> + '_ {
        self.tree
            .descendants(self.body)
            .filter(|&n| self.tree.is_element(n, wml::P))
            .map(ParagraphId)
    }

    /// Top-level tables of the body.
    pub fn tables(&self) -> impl Iterator<Item = TableId> + '_ {
        self.tree.child_elements(self.body, wml::TBL).map(TableId)
    }

    /// Rendered text of every paragraph, one per line.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, p) in self.paragraphs().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&self.paragraph(p).text());
        }
        out
    }
}
