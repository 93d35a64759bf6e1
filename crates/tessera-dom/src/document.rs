//! Document - High-level document API and node factory

use crate::{DomResult, DomTree, Namespace, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a document with `<html><head></head><body></body></html>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html", Namespace::Html);
        let head = tree.create_element("head", Namespace::Html);
        let body = tree.create_element("body", Namespace::Html);

        let root = tree.root();
        let _ = tree.append_child(root, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty() -> Self {
        Self {
            tree: DomTree::new(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Create an element whose namespace follows the element it will live in
    pub fn create_element_in(&mut self, tag: &str, parent: Option<NodeId>) -> NodeId {
        let parent_ns = parent.and_then(|p| {
            let ns = self.tree.namespace(p)?;
            let tag = self.tree.tag_name(p)?;
            Some((ns, tag))
        });
        let namespace = Namespace::resolve(tag, parent_ns);
        self.tree.create_element(tag, namespace)
    }

    /// Create an element in an explicit namespace
    pub fn create_element_ns(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.tree.create_element(tag, namespace)
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.tree.create_text(text)
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.tree.create_comment(text)
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.tree.create_document_fragment()
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> DomResult<NodeId> {
        let el = self.create_element_in(tag, Some(parent));
        self.tree.append_child(parent, el)?;
        Ok(el)
    }

    /// Create a text node and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> DomResult<NodeId> {
        let node = self.tree.create_text(text);
        self.tree.append_child(parent, node)?;
        Ok(node)
    }

    /// Get element by `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&node| self.tree.get_attribute(node, "id") == Some(id))
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
