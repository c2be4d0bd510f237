//! Arena-backed HTML node tree.
//!
//! A [`Document`] owns every node in a slot map. Parents own their children through the
//! `children` key lists; the `parent` key of a child is a back link used for navigation
//! only. Nodes can exist detached (created but not inserted yet, or removed from their
//! parent) until they are inserted again or freed with [`Document::remove`].
//!
//! Calling an operation with a key that is not part of the document, or that would break
//! the tree shape (attaching an already attached node, creating a cycle), is a programming
//! error and panics.

use slotmap::{new_key_type, SlotMap};

use crate::attribute::{self, Attribute};
use crate::elements;

new_key_type! {
    /// Key of a node inside a [`Document`]
    pub struct NodeId;
}

/// Element name and attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(name: &str, attributes: Vec<Attribute>) -> Self {
        let mut data = Self::new(name);
        for attr in attributes {
            attribute::set_attribute(&mut data.attributes, attr);
        }
        data
    }

    /// Get an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Get a string attribute value by name
    pub fn attribute_value(&self, name: &str) -> Option<String> {
        self.attribute(name).and_then(|a| a.value.to_value_string())
    }

    pub fn is_block_level(&self) -> bool {
        elements::is_block(&self.name)
    }

    pub fn is_void(&self) -> bool {
        elements::is_void(&self.name)
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Root,
    Element(ElementData),
    Text(String),
    Comment(String),
    CData(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An HTML node tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Document {
    /// Create an empty document holding only the root node
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeData::Root));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    // Creation

    pub fn create(&mut self, data: NodeData) -> NodeId {
        assert!(
            !matches!(data, NodeData::Root),
            "a document has exactly one root"
        );
        self.nodes.insert(Node::new(data))
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_element_with(&mut self, name: &str, attributes: Vec<Attribute>) -> NodeId {
        self.create(NodeData::Element(ElementData::with_attributes(name, attributes)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.create(NodeData::Comment(text.to_string()))
    }

    pub fn create_cdata(&mut self, text: &str) -> NodeId {
        self.create(NodeData::CData(text.to_string()))
    }

    // Access

    fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id) {
            Some(node) => node,
            None => panic!("{id:?} is not a node of this document"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id) {
            Some(node) => node,
            None => panic!("{id:?} is not a node of this document"),
        }
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.node_mut(id).data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.data_mut(id) {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Lowercase element name, `None` for non-element nodes
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Check if the node is an element with the given name
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id).is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    /// Text payload of text nodes
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn is_block_level(&self, id: NodeId) -> bool {
        match self.data(id) {
            NodeData::Root => true,
            NodeData::Element(e) => e.is_block_level(),
            _ => false,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.element(id).and_then(|e| e.attribute(name))
    }

    /// Set an attribute, replacing any previous value in place
    pub fn set_attribute(&mut self, id: NodeId, attr: Attribute) {
        if let Some(element) = self.element_mut(id) {
            attribute::set_attribute(&mut element.attributes, attr);
        }
    }

    /// Remove an attribute, returning it if it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        let element = self.element_mut(id)?;
        let index = element
            .attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(element.attributes.remove(index))
    }

    /// Check if the `class` attribute contains `class`
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .and_then(|a| a.value_str())
            .is_some_and(|v| v.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let value = match self.attribute(id, "class").and_then(|a| a.value_str()) {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(id, Attribute::new("class", &value));
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(existing) = self.attribute(id, "class").and_then(|a| a.value_str()) else {
            return;
        };
        let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attribute(id, "class");
        } else {
            let value = remaining.join(" ");
            self.set_attribute(id, Attribute::new("class", &value));
        }
    }

    // Navigation

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            next: self.parent(id),
        }
    }

    /// The node and all of its descendants in document order
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// First descendant element (document order, excluding `id`) with the given name
    pub fn find_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .skip(1)
            .find(|d| self.is_element_named(*d, name))
    }

    /// First direct child element with the given name
    pub fn child_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.is_element_named(*c, name))
    }

    /// Concatenated text of all descendant text and CDATA nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match self.data(node) {
                NodeData::Text(t) | NodeData::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    // Mutation

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Insert a detached node at `index` among the children of `parent`
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.check_can_attach(parent, child);
        let children = &mut self.node_mut(parent).children;
        assert!(
            index <= children.len(),
            "child index {index} out of bounds ({} children)",
            children.len()
        );
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Detach and return the child at `index`. The node stays alive, detached.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> NodeId {
        let children = &mut self.node_mut(parent).children;
        assert!(
            index < children.len(),
            "child index {index} out of bounds ({} children)",
            children.len()
        );
        let child = children.remove(index);
        self.node_mut(child).parent = None;
        child
    }

    /// Replace the child at `index` with a detached node, returning the old child detached
    pub fn replace_child(&mut self, parent: NodeId, index: usize, new_child: NodeId) -> NodeId {
        let old = self.remove_child(parent, index);
        self.insert_child(parent, index, new_child);
        old
    }

    /// Detach a node from its parent, if it has one
    pub fn detach(&mut self, id: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) {
            self.remove_child(parent, index);
        }
    }

    /// Detach a node and free it with its whole subtree
    pub fn remove(&mut self, id: NodeId) {
        assert!(id != self.root, "the root node cannot be removed");
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
            }
        }
    }

    /// Detach all children of `id`, returning them in order
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in &children {
            self.node_mut(*child).parent = None;
        }
        children
    }

    /// Copy a subtree. The copy is detached; payloads are copied by value.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let copy = self.create(copyable(self.data(id)));
        for child in self.children(id).to_vec() {
            let child_copy = self.deep_copy(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Copy a subtree of another document into this one, detached
    pub fn import(&mut self, source: &Document, id: NodeId) -> NodeId {
        let copy = self.create(copyable(source.data(id)));
        for child in source.children(id) {
            let child_copy = self.import(source, *child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Split a text node at byte `offset`, replacing it in its parent with two new text
    /// nodes. Returns the (left, right) pair.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> (NodeId, NodeId) {
        let text = match self.data(id) {
            NodeData::Text(t) => t.clone(),
            other => panic!("split_text called on a non-text node: {other:?}"),
        };
        assert!(
            offset <= text.len() && text.is_char_boundary(offset),
            "split offset {offset} is not a char boundary of a {}-byte text",
            text.len()
        );
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            panic!("split_text called on a detached node");
        };

        let left = self.create_text(&text[..offset]);
        let right = self.create_text(&text[offset..]);
        self.replace_child(parent, index, left);
        self.insert_child(parent, index + 1, right);
        self.remove(id);
        (left, right)
    }

    /// Wrap the children of `parent` in `range` into the detached element `wrapper`,
    /// which takes their place.
    pub fn wrap_children(&mut self, parent: NodeId, range: std::ops::Range<usize>, wrapper: NodeId) {
        assert!(range.start <= range.end && range.end <= self.children(parent).len());
        let moved: Vec<NodeId> = self.node_mut(parent).children.drain(range.clone()).collect();
        for child in &moved {
            self.node_mut(*child).parent = None;
        }
        for child in moved {
            self.append_child(wrapper, child);
        }
        self.insert_child(parent, range.start, wrapper);
    }

    /// Replace a node with its own children
    pub fn unwrap(&mut self, id: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            panic!("unwrap called on a detached node");
        };
        let children = self.take_children(id);
        self.remove(id);
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + offset, child);
        }
    }

    /// Merge adjacent text children of `id`, recursively
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            match self.text(child).map(str::to_string) {
                Some(t) if t.is_empty() => self.remove(child),
                Some(t) => match previous_text {
                    Some(prev) => {
                        if let NodeData::Text(p) = self.data_mut(prev) {
                            p.push_str(&t);
                        }
                        self.remove(child);
                    }
                    None => previous_text = Some(child),
                },
                None => {
                    previous_text = None;
                    self.normalize(child);
                }
            }
        }
    }

    fn check_can_attach(&self, parent: NodeId, child: NodeId) {
        assert!(child != self.root, "the root node cannot become a child");
        assert!(
            self.node(child).parent.is_none(),
            "{child:?} already has a parent, detach it first"
        );
        match self.data(parent) {
            NodeData::Root => {}
            NodeData::Element(e) => assert!(!e.is_void(), "void element <{}> cannot have children", e.name),
            other => panic!("{other:?} cannot have children"),
        }
        assert!(
            parent != child && !self.ancestors(parent).any(|a| a == child),
            "attaching {child:?} under {parent:?} would create a cycle"
        );
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// The root of a document is copied as a neutral container.
fn copyable(data: &NodeData) -> NodeData {
    match data {
        NodeData::Root => NodeData::Element(ElementData::new("span")),
        data => data.clone(),
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.document.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.document.children(current).iter().rev().copied());
        Some(current)
    }
}

/// Helper for building attribute lists in tests and processors
pub fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
    pairs.iter().map(|(k, v)| Attribute::new(k, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph_with_text(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
        let p = doc.create_element("p");
        let t = doc.create_text(text);
        doc.append_child(p, t);
        let root = doc.root();
        doc.append_child(root, p);
        (p, t)
    }

    #[test]
    fn test_append_sets_parent() {
        let mut doc = Document::new();
        let (p, t) = paragraph_with_text(&mut doc, "Hello");
        assert_eq!(doc.parent(t), Some(p));
        assert_eq!(doc.parent(p), Some(doc.root()));
        assert_eq!(doc.children(p), &[t]);
    }

    #[test]
    fn test_remove_child_detaches() {
        let mut doc = Document::new();
        let (p, t) = paragraph_with_text(&mut doc, "Hello");
        let removed = doc.remove_child(p, 0);
        assert_eq!(removed, t);
        assert_eq!(doc.parent(t), None);
        assert!(doc.children(p).is_empty());
        assert!(doc.contains(t));
    }

    #[test]
    fn test_replace_child() {
        let mut doc = Document::new();
        let (p, t) = paragraph_with_text(&mut doc, "old");
        let new_text = doc.create_text("new");
        let old = doc.replace_child(p, 0, new_text);
        assert_eq!(old, t);
        assert_eq!(doc.text(doc.children(p)[0]), Some("new"));
        assert_eq!(doc.parent(new_text), Some(p));
    }

    #[test]
    fn test_deep_copy_rebuilds_parents() {
        let mut doc = Document::new();
        let (p, _) = paragraph_with_text(&mut doc, "Hello");
        doc.set_attribute(p, Attribute::new("class", "x"));
        let copy = doc.deep_copy(p);
        assert_ne!(copy, p);
        assert_eq!(doc.parent(copy), None);
        let copied_text = doc.children(copy)[0];
        assert_eq!(doc.parent(copied_text), Some(copy));
        assert_eq!(doc.text(copied_text), Some("Hello"));
        assert_eq!(doc.element(copy), doc.element(p));

        // Payloads are independent
        if let NodeData::Text(t) = doc.data_mut(copied_text) {
            t.push('!');
        }
        assert_eq!(doc.text_content(p), "Hello");
    }

    #[test]
    fn test_split_text() {
        let mut doc = Document::new();
        let (p, t) = paragraph_with_text(&mut doc, "Hello World");
        let (left, right) = doc.split_text(t, 5);
        assert!(!doc.contains(t));
        assert_eq!(doc.children(p), &[left, right]);
        assert_eq!(doc.text(left), Some("Hello"));
        assert_eq!(doc.text(right), Some(" World"));
        assert_eq!(doc.parent(right), Some(p));
    }

    #[test]
    #[should_panic]
    fn test_split_text_off_char_boundary_panics() {
        let mut doc = Document::new();
        let (_, t) = paragraph_with_text(&mut doc, "\u{e9}t\u{e9}");
        doc.split_text(t, 1);
    }

    #[test]
    #[should_panic]
    fn test_attaching_attached_node_panics() {
        let mut doc = Document::new();
        let (_, t) = paragraph_with_text(&mut doc, "x");
        let root = doc.root();
        doc.append_child(root, t);
    }

    #[test]
    #[should_panic]
    fn test_cycle_panics() {
        let mut doc = Document::new();
        let (p, _) = paragraph_with_text(&mut doc, "x");
        let inner = doc.create_element("span");
        doc.append_child(p, inner);
        doc.detach(p);
        doc.append_child(inner, p);
    }

    #[test]
    #[should_panic]
    fn test_void_element_children_panics() {
        let mut doc = Document::new();
        let br = doc.create_element("br");
        let t = doc.create_text("x");
        doc.append_child(br, t);
    }

    #[test]
    #[should_panic]
    fn test_removed_node_access_panics() {
        let mut doc = Document::new();
        let (p, _) = paragraph_with_text(&mut doc, "x");
        doc.remove(p);
        doc.children(p);
    }

    #[test]
    fn test_set_attribute_last_write_wins() {
        let mut doc = Document::new();
        let img = doc.create_element_with(
            "img",
            attrs(&[("src", "a.jpg"), ("alt", "one"), ("alt", "two")]),
        );
        let element = doc.element(img).cloned().unwrap();
        assert_eq!(element.attributes.len(), 2);
        assert_eq!(element.attribute_value("alt").as_deref(), Some("two"));
    }

    #[test]
    fn test_class_helpers() {
        let mut doc = Document::new();
        let img = doc.create_element("img");
        doc.add_class(img, "alignnone");
        doc.add_class(img, "size-full");
        doc.add_class(img, "alignnone");
        assert_eq!(
            doc.attribute(img, "class").and_then(|a| a.value_str()),
            Some("alignnone size-full")
        );
        doc.remove_class(img, "alignnone");
        assert!(doc.has_class(img, "size-full"));
        doc.remove_class(img, "size-full");
        assert!(doc.attribute(img, "class").is_none());
    }

    #[test]
    fn test_wrap_and_unwrap_children() {
        let mut doc = Document::new();
        let root = doc.root();
        for text in ["a", "b", "c"] {
            let t = doc.create_text(text);
            doc.append_child(root, t);
        }
        let p = doc.create_element("p");
        doc.wrap_children(root, 0..2, p);
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.text_content(p), "ab");

        doc.unwrap(p);
        assert_eq!(doc.children(root).len(), 3);
        doc.normalize(root);
        assert_eq!(doc.children(root).len(), 1);
        assert_eq!(doc.text_content(root), "abc");
    }

    #[test]
    fn test_descendants_order() {
        let mut doc = Document::new();
        let (p, t) = paragraph_with_text(&mut doc, "x");
        let b = doc.create_element("b");
        doc.append_child(p, b);
        let order: Vec<NodeId> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![doc.root(), p, t, b]);
        assert_eq!(doc.find_element(doc.root(), "b"), Some(b));
    }
}
