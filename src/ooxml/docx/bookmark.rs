/// Bookmark lookup.
///
/// Bookmarks mark locations in a document. The editor uses them as anchors
/// that bound where a replacement applies.
use crate::ooxml::docx::document::{Document, wml};
use crate::ooxml::docx::paragraph::ParagraphId;
use crate::ooxml::docx::tree::NodeId;

/// A bookmark in a Word document.
///
/// Represents a `<w:bookmarkStart>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// Bookmark ID
    id: u32,
    /// Bookmark name
    name: String,
    /// The `w:bookmarkStart` element
    node: NodeId,
}

impl Bookmark {
    /// Get the bookmark ID.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get the bookmark name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this is a hidden bookmark (starts with underscore).
    ///
    /// Word creates hidden bookmarks such as `_GoBack` and `_Toc…` itself.
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('_')
    }
}

impl Document {
    /// All bookmarks in document order.
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        let tree = self.tree();
        tree.descendants(self.body())
            .filter(|&n| tree.is_element(n, wml::BOOKMARK_START))
            .filter_map(|n| {
                let name = tree.attr(n, wml::NAME)?;
                let id = tree
                    .attr(n, "w:id")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                Some(Bookmark {
                    id,
                    name: name.to_string(),
                    node: n,
                })
            })
            .collect()
    }

    /// Paragraph holding the start of bookmark `name`.
    ///
    /// A bookmark placed between block elements (directly in the body or a
    /// cell) belongs to the next paragraph in document order.
    pub fn bookmark_paragraph(&self, name: &str) -> Option<ParagraphId> {
        let bookmark = self.bookmarks().into_iter().find(|b| b.name == name)?;
        let tree = self.tree();
        if let Some(p) = tree.ancestor(bookmark.node, wml::P) {
            return self.paragraph_id(p);
        }

        let mut seen = false;
        tree.descendants(self.body())
            .find(|&n| {
                if n == bookmark.node {
                    seen = true;
                    return false;
                }
                seen && tree.is_element(n, wml::P)
            })
            .and_then(|p| self.paragraph_id(p))
    }
}
