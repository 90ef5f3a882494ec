//! Arena-based DOM tree consumed by the style resolver.
//!
//! Nodes are stored in a flat `Vec` arena and linked by index. The tree is
//! produced upstream by the HTML parser and is read-only while styles are
//! resolved. Tag and attribute names compare case-insensitively.

use restyle_types::{Ident, RestyleError, Result};
use serde::{Deserialize, Serialize};

/// Index into the [`Document`]'s node arena.
pub type NodeId = usize;

// ------------------------------------------------------------------
// Node types
// ------------------------------------------------------------------

/// An HTML document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub root: NodeId,
    /// Character encoding the page was decoded with, if known.
    #[serde(default)]
    pub encoding: Option<String>,
}

/// A single node in the DOM tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// The kind of DOM node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Data associated with an Element node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementData {
    pub tag: Ident,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: Ident,
    pub value: String,
}

// ------------------------------------------------------------------
// ElementData
// ------------------------------------------------------------------

impl ElementData {
    /// Create a new `ElementData` with the given tag and no attributes.
    pub fn new(tag: impl Into<Ident>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: impl Into<Ident>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Get an attribute value by name (case-insensitive lookup).
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(name))
            .map(|a| a.value.as_str())
    }

    /// Whether the tag name equals `tag`, ignoring case.
    pub fn is(&self, tag: &str) -> bool {
        self.tag.is(tag)
    }

    /// Check if this element has a given CSS class.
    ///
    /// The `class` attribute value is split on ASCII whitespace and each
    /// token is compared to `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.get_attribute("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Get the `id` attribute if present.
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    /// Returns `true` for `<a>` elements, the only ones that can be
    /// visited or activated.
    pub fn is_anchor(&self) -> bool {
        self.is("a")
    }

    /// Returns `true` for elements that accept keyboard input.
    pub fn accepts_focus(&self) -> bool {
        self.is("input") || self.is("option") || self.is("textarea")
    }
}

// ------------------------------------------------------------------
// Document
// ------------------------------------------------------------------

impl Document {
    /// Create an empty document with a synthetic `Document` root node.
    pub fn new() -> Self {
        let root_node = Node {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root_node],
            root: 0,
            encoding: None,
        }
    }

    /// Add a new node to the arena and return its [`NodeId`].
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child_id` as the last child of `parent_id`.
    ///
    /// Updates both the parent's child list and the child's parent link.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        self.nodes[parent_id].children.push(child_id);
        self.nodes[child_id].parent = Some(parent_id);
    }

    /// Create an element and append it under `parent_id` in one step.
    pub fn append_element(&mut self, parent_id: NodeId, data: ElementData) -> NodeId {
        let id = self.add_node(NodeKind::Element(data));
        self.append_child(parent_id, id);
        id
    }

    /// Create a text node and append it under `parent_id`.
    pub fn append_text(&mut self, parent_id: NodeId, text: impl Into<String>) -> NodeId {
        let id = self.add_node(NodeKind::Text(text.into()));
        self.append_child(parent_id, id);
        id
    }

    /// Get a reference to a node by ID.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Get the [`ElementData`] for a node, if it is an `Element`.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Find the nearest ancestor that is an element node.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.nodes[id].parent;
        while let Some(pid) = current {
            if self.element(pid).is_some() {
                return Some(pid);
            }
            current = self.nodes[pid].parent;
        }
        None
    }

    /// The element ancestors of `id` from the outermost down, followed by
    /// `id` itself.
    pub fn element_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent_element(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// The element children of a node, in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// The closest preceding sibling that is an element, skipping text and
    /// comments.
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&s| s == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|&s| self.element(s).is_some())
    }

    /// Whether `id` is the first element child of its parent element.
    pub fn is_first_element_child(&self, id: NodeId) -> bool {
        self.parent_element(id).is_some() && self.previous_element_sibling(id).is_none()
    }

    /// The language of an element: the `lang` attribute of the element
    /// itself or of its nearest ancestor that has one, lowercased.
    pub fn language(&self, id: NodeId) -> Option<String> {
        let mut current = Some(id);
        while let Some(nid) = current {
            if let Some(lang) = self.element(nid).and_then(|e| e.get_attribute("lang")) {
                return Some(lang.trim().to_ascii_lowercase());
            }
            current = self.nodes[nid].parent;
        }
        None
    }

    /// Get the concatenated text content of a node and all its
    /// descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(s) => out.push_str(s),
            _ => {
                for i in 0..self.nodes[id].children.len() {
                    let child = self.nodes[id].children[i];
                    self.collect_text(child, out);
                }
            },
        }
    }

    /// Every element below `id` in document order (pre-order), `id`
    /// included if it is an element.
    pub fn elements_in_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(nid) = stack.pop() {
            if self.element(nid).is_some() {
                out.push(nid);
            }
            stack.extend(self.nodes[nid].children.iter().rev());
        }
        out
    }

    /// Check the links of a tree that did not come from [`append_child`].
    ///
    /// Every id must be in range, the root must have no parent, and each
    /// child must name its parent back and be reachable only once.
    ///
    /// [`append_child`]: Document::append_child
    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len();
        let Some(root) = self.nodes.get(self.root) else {
            return Err(RestyleError::Document(format!(
                "root {} out of range ({len} nodes)",
                self.root
            )));
        };
        if root.parent.is_some() {
            return Err(RestyleError::Document(format!("root {} has a parent", self.root)));
        }
        let mut seen = vec![false; len];
        seen[self.root] = true;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            for &child in &self.nodes[id].children {
                let Some(node) = self.nodes.get(child) else {
                    return Err(RestyleError::Document(format!(
                        "node {id} has child {child} out of range ({len} nodes)"
                    )));
                };
                if node.parent != Some(id) {
                    return Err(RestyleError::Document(format!(
                        "node {child} is a child of {id} but names {:?} as parent",
                        node.parent
                    )));
                }
                if std::mem::replace(&mut seen[child], true) {
                    return Err(RestyleError::Document(format!("node {child} is reachable twice")));
                }
                stack.push(child);
            }
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_document_with_nodes() {
        let mut doc = Document::new();
        assert_eq!(doc.nodes.len(), 1); // root Document node

        let div_id = doc.add_node(NodeKind::Element(ElementData::new("div")));
        assert_eq!(div_id, 1);
        doc.append_child(doc.root, div_id);
        assert_eq!(doc.get(doc.root).children, vec![div_id]);
    }

    #[test]
    fn attribute_lookup_ignores_case() {
        let elem = ElementData::new("A")
            .with_attribute("HREF", "https://example.com")
            .with_attribute("class", "link primary");
        assert!(elem.is("a"));
        assert!(elem.is_anchor());
        assert_eq!(elem.get_attribute("href"), Some("https://example.com"));
        assert!(elem.has_class("primary"));
        assert!(!elem.has_class("Primary"));
        assert_eq!(elem.get_attribute("missing"), None);
    }

    #[test]
    fn parent_element_skips_document_root() {
        let mut doc = Document::new();
        let html = doc.append_element(doc.root, ElementData::new("html"));
        let body = doc.append_element(html, ElementData::new("body"));
        assert_eq!(doc.parent_element(body), Some(html));
        assert_eq!(doc.parent_element(html), None);
        assert_eq!(doc.element_path(body), vec![html, body]);
    }

    #[test]
    fn elements_in_document_order() {
        let mut doc = Document::new();
        let html = doc.append_element(doc.root, ElementData::new("html"));
        let head = doc.append_element(html, ElementData::new("head"));
        let body = doc.append_element(html, ElementData::new("body"));
        // Appended out of arena order.
        let title = doc.append_element(head, ElementData::new("title"));
        doc.append_text(title, "t");
        let p = doc.append_element(body, ElementData::new("p"));
        assert_eq!(doc.elements_in_order(doc.root), vec![html, head, title, body, p]);
        assert_eq!(doc.elements_in_order(body), vec![body, p]);
    }

    #[test]
    fn previous_sibling_skips_text_and_comments() {
        let mut doc = Document::new();
        let body = doc.append_element(doc.root, ElementData::new("body"));
        let h1 = doc.append_element(body, ElementData::new("h1"));
        doc.append_text(body, "\n");
        let c = doc.add_node(NodeKind::Comment("note".into()));
        doc.append_child(body, c);
        let p = doc.append_element(body, ElementData::new("p"));

        assert_eq!(doc.previous_element_sibling(p), Some(h1));
        assert_eq!(doc.previous_element_sibling(h1), None);
        assert!(doc.is_first_element_child(h1));
        assert!(!doc.is_first_element_child(p));
        assert_eq!(doc.element_children(body).collect::<Vec<_>>(), vec![h1, p]);
    }

    #[test]
    fn language_is_inherited_from_ancestors() {
        let mut doc = Document::new();
        let html = ElementData::new("html").with_attribute("lang", "EN-us");
        let html = doc.append_element(doc.root, html);
        let body = doc.append_element(html, ElementData::new("body"));
        let q = doc.append_element(body, ElementData::new("q").with_attribute("lang", "fr"));

        assert_eq!(doc.language(body).as_deref(), Some("en-us"));
        assert_eq!(doc.language(q).as_deref(), Some("fr"));
        assert_eq!(Document::new().language(0), None);
    }

    #[test]
    fn text_content_traversal() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root, ElementData::new("p"));
        doc.append_text(p, "Hello ");
        let b = doc.append_element(p, ElementData::new("b"));
        doc.append_text(b, "world");

        assert_eq!(doc.text_content(p), "Hello world");
        assert_eq!(doc.text_content(b), "world");
    }

    #[test]
    fn focusable_elements() {
        assert!(ElementData::new("input").accepts_focus());
        assert!(ElementData::new("TEXTAREA").accepts_focus());
        assert!(!ElementData::new("div").accepts_focus());
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "nodes": [
                {"kind": "document", "parent": null, "children": [1]},
                {"kind": {"element": {"tag": "P", "attributes": [{"name": "Class", "value": "x"}]}},
                 "parent": 0}
            ],
            "root": 0
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        let p = doc.element(1).unwrap();
        assert!(p.is("p"));
        assert!(p.has_class("x"));
        assert!(doc.get(1).children.is_empty());
        assert_eq!(doc.encoding, None);
        assert!(doc.validate().is_ok());
    }

    fn node(parent: Option<NodeId>, children: &[NodeId]) -> Node {
        Node {
            kind: NodeKind::Document,
            parent,
            children: children.to_vec(),
        }
    }

    #[test]
    fn built_documents_validate() {
        let mut doc = Document::new();
        let html = doc.append_element(doc.root, ElementData::new("html"));
        doc.append_text(html, "x");
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn validate_rejects_broken_links() {
        let broken = [
            (vec![node(None, &[7])], 0, "out of range"),
            (vec![node(None, &[])], 3, "root 3"),
            (vec![node(Some(1), &[1]), node(Some(0), &[])], 0, "has a parent"),
            (vec![node(None, &[1]), node(None, &[])], 0, "names None"),
            (vec![node(None, &[1, 1]), node(Some(0), &[])], 0, "twice"),
        ];
        for (nodes, root, message) in broken {
            let doc = Document {
                nodes,
                root,
                encoding: None,
            };
            let err = doc.validate().unwrap_err();
            assert!(matches!(err, RestyleError::Document(_)));
            assert!(err.to_string().contains(message), "{err}");
        }
    }
}
