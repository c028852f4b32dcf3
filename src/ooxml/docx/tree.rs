/// Arena-backed XML tree for WordprocessingML parts.
///
/// Every node lives in one `Vec` and refers to its parent and children by
/// index. Removing a node only unlinks it: the slot stays in the arena with
/// its parent cleared, so a handle taken before a cascading deletion can be
/// checked with [`XmlTree::is_live`] instead of dangling.
use crate::common::xml::{escape_xml, resolve_entity, unescape_xml};
use crate::ooxml::error::{OoxmlError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;

/// Index of a node in an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Attribute list of an element, in document order.
pub type Attributes = SmallVec<[(String, String); 2]>;

/// The payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic container for everything at the top level of the part
    Root,
    /// Element with its qualified name (e.g. `w:p`) and attributes
    Element { name: String, attrs: Attributes },
    /// Unescaped character data
    Text(String),
    /// CDATA section content
    CData(String),
    /// Comment content
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
}

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

impl XmlTree {
    /// Create a tree that holds only the synthetic root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse XML bytes into a tree.
    ///
    /// Whitespace is preserved. The XML declaration, processing instructions
    /// and DOCTYPE are dropped; [`XmlTree::to_xml`] writes its own declaration.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut tree = Self::new();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<NodeId> = vec![tree.root()];
        let mut buf = Vec::new();

        loop {
            let parent = *stack.last().unwrap_or(&NodeId(0));
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let id = tree.element_from_event(e)?;
                    tree.append_child(parent, id);
                    stack.push(id);
                },
                Ok(Event::Empty(ref e)) => {
                    let id = tree.element_from_event(e)?;
                    tree.append_child(parent, id);
                },
                Ok(Event::End(_)) => {
                    if stack.len() <= 1 {
                        return Err(OoxmlError::Xml("unbalanced end tag".to_string()));
                    }
                    stack.pop();
                },
                Ok(Event::Text(ref t)) => {
                    let text = unescape_xml(std::str::from_utf8(t)?);
                    tree.push_text(parent, &text);
                },
                Ok(Event::GeneralRef(ref r)) => {
                    let name = std::str::from_utf8(r)?;
                    let ch = resolve_entity(name).ok_or_else(|| {
                        OoxmlError::Xml(format!("unknown entity reference &{};", name))
                    })?;
                    let mut tmp = [0u8; 4];
                    tree.push_text(parent, ch.encode_utf8(&mut tmp));
                },
                Ok(Event::CData(ref c)) => {
                    let text = std::str::from_utf8(c)?.to_string();
                    let id = tree.push_node(NodeKind::CData(text));
                    tree.append_child(parent, id);
                },
                Ok(Event::Comment(ref c)) => {
                    let text = std::str::from_utf8(c)?.to_string();
                    let id = tree.push_node(NodeKind::Comment(text));
                    tree.append_child(parent, id);
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        if stack.len() != 1 {
            return Err(OoxmlError::Xml("unexpected end of document".to_string()));
        }
        if tree.document_element().is_none() {
            return Err(OoxmlError::InvalidFormat("no root element".to_string()));
        }

        Ok(tree)
    }

    fn element_from_event(&mut self, e: &BytesStart<'_>) -> Result<NodeId> {
        let name = std::str::from_utf8(e.name().as_ref())?.to_string();
        let mut attrs = Attributes::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = unescape_xml(std::str::from_utf8(&attr.value)?);
            attrs.push((key, value));
        }
        Ok(self.push_node(NodeKind::Element { name, attrs }))
    }

    /// Append text to `parent`, extending a trailing text node if there is one.
    ///
    /// Entity references arrive as separate events, so adjacent pieces are
    /// joined to keep one text node per run of character data.
    fn push_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeKind::Text(existing) = &mut self.nodes[last.0].kind
        {
            existing.push_str(text);
            return;
        }
        let id = self.push_node(NodeKind::Text(text.to_string()));
        self.append_child(parent, id);
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Serialize the tree back to XML with a standalone UTF-8 declaration.
    pub fn to_xml(&self) -> Vec<u8> {
        let mut out = String::with_capacity(self.nodes.len() * 32);
        out.push_str(XML_DECLARATION);
        for &child in &self.nodes[0].children {
            self.write_node(child, &mut out);
        }
        out.into_bytes()
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Root => {
                for &child in &node.children {
                    self.write_node(child, out);
                }
            },
            NodeKind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape_xml(value));
                    out.push('"');
                }
                if node.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &node.children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            },
            NodeKind::Text(text) => out.push_str(&escape_xml(text)),
            NodeKind::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            },
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            },
        }
    }

    /// The synthetic root holding the top-level nodes.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The outermost element (e.g. `w:document`).
    pub fn document_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|&c| matches!(self.nodes[c.0].kind, NodeKind::Element { .. }))
    }

    /// Number of slots in the arena, detached nodes included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Qualified name of an element node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Check whether `id` is an element named `name`.
    #[inline]
    pub fn is_element(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    /// Value of attribute `key` on an element.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Set attribute `key`, replacing an existing value.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attrs.iter_mut().find(|(k, _)| k == key) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((key.to_string(), value.to_string())),
            }
        }
    }

    /// Content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated content of all text nodes below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child elements of `id` named `name`, in order.
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.is_element(c, name))
    }

    /// First child element of `id` named `name`.
    pub fn first_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.child_elements(id, name).next()
    }

    /// Follow a path of child element names from `id`.
    pub fn child_path(&self, id: NodeId, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(id, |node, name| self.first_child(node, name))
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes[parent.0].children.iter().position(|&c| c == id)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Nearest ancestor element named `name`.
    pub fn ancestor(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.is_element(a, name))
    }

    /// Pre-order iterator over the subtree below `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.clone();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// A node is live while its parent chain reaches the root.
    pub fn is_live(&self, id: NodeId) -> bool {
        if id == self.root() {
            return true;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent == self.root() {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_node(NodeKind::Element {
            name: name.to_string(),
            attrs: Attributes::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert a node at `index` among the children of `parent`.
    ///
    /// An `index` past the end appends.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Unlink `id` from its parent. Its own subtree stays attached to it.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Deep-copy the subtree at `id` into new detached nodes.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let copy = self.push_node(self.nodes[id.0].kind.clone());
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.append_child(copy, child_copy);
        }
        copy
    }
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`XmlTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a XmlTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator returned by [`XmlTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a XmlTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t xml:space="preserve"> A &amp; B </w:t></w:r></w:p><w:p/></w:body></w:document>"#;

    #[test]
    fn test_parse_structure() {
        let tree = XmlTree::parse(XML.as_bytes()).unwrap();
        let doc = tree.document_element().unwrap();
        assert_eq!(tree.name(doc), Some("w:document"));

        let body = tree.first_child(doc, "w:body").unwrap();
        assert_eq!(tree.child_elements(body, "w:p").count(), 2);

        let t = tree.child_path(body, &["w:p", "w:r", "w:t"]).unwrap();
        assert_eq!(tree.attr(t, "xml:space"), Some("preserve"));
        assert_eq!(tree.text_content(t), " A & B ");
    }

    #[test]
    fn test_round_trip_escapes() {
        let tree = XmlTree::parse(XML.as_bytes()).unwrap();
        let xml = String::from_utf8(tree.to_xml()).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("<w:t xml:space=\"preserve\"> A &amp; B </w:t>"));
        assert!(xml.contains("<w:p/>"));

        let again = XmlTree::parse(&tree.to_xml()).unwrap();
        assert_eq!(again.to_xml(), tree.to_xml());
    }

    #[test]
    fn test_character_references_join_text() {
        let tree = XmlTree::parse(b"<a>x&#65;&lt;y</a>").unwrap();
        let a = tree.document_element().unwrap();
        assert_eq!(tree.children(a).len(), 1);
        assert_eq!(tree.text_content(a), "xA<y");
    }

    #[test]
    fn test_detach_and_liveness() {
        let mut tree = XmlTree::parse(XML.as_bytes()).unwrap();
        let doc = tree.document_element().unwrap();
        let body = tree.first_child(doc, "w:body").unwrap();
        let p = tree.first_child(body, "w:p").unwrap();
        let t = tree.child_path(p, &["w:r", "w:t"]).unwrap();

        assert!(tree.is_live(t));
        tree.detach(p);
        assert!(!tree.is_live(p));
        assert!(!tree.is_live(t));
        assert_eq!(tree.child_elements(body, "w:p").count(), 1);
    }

    #[test]
    fn test_insert_and_descendants_order() {
        let mut tree = XmlTree::parse(b"<r><a/><c/></r>").unwrap();
        let r = tree.document_element().unwrap();
        let b = tree.create_element("b");
        tree.insert_child(r, 1, b);
        let names: Vec<_> = tree
            .descendants(r)
            .filter_map(|n| tree.name(n).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(tree.index_in_parent(b), Some(1));
    }

    #[test]
    fn test_unbalanced_is_error() {
        assert!(XmlTree::parse(b"<a><b></a>").is_err());
        assert!(XmlTree::parse(b"").is_err());
    }
}
