//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: a removed node keeps its id and can be inserted
//! again, which is what lets the reconciler move nodes instead of recreating
//! them.

use crate::node::FormState;
use crate::observer::{MutationKind, MutationLog, MutationRecord};
use crate::{Attribute, DomError, DomResult, Namespace, Node, NodeData, NodeId, NodeType};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    log: MutationLog,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            log: MutationLog::new(),
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.alloc(Node::element(tag, namespace))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(Node::text(text))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(Node::comment(text))
    }

    /// Create an empty document fragment
    pub fn create_document_fragment(&mut self) -> NodeId {
        self.alloc(Node::document_fragment())
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a node or fail with [`DomError::NotFound`]
    pub fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(DomError::NotFound(id))
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.option())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.option())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.option())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.option())
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Inclusive pre-order list of a subtree
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut child = self.last_child(node);
            while let Some(c) = child {
                stack.push(c);
                child = self.prev_sibling(c);
            }
        }
        out
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(Node::node_type)
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag.as_str())
    }

    /// Namespace of an element
    pub fn namespace(&self, id: NodeId) -> Option<Namespace> {
        self.get(id)?.as_element().map(|e| e.namespace)
    }

    /// Text or comment data
    pub fn char_data(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.char_data()
    }

    /// Concatenated text of all text descendants
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match &self.get(n)?.data {
                NodeData::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether `node` is `ancestor` or lies beneath it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn is_observed(&self, target: NodeId) -> bool {
        self.log.is_observing() && self.log.roots().iter().any(|&root| self.contains(root, target))
    }

    fn record(&mut self, record: MutationRecord) {
        if self.is_observed(record.target) {
            self.log.push(record);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[child.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else if parent.is_valid() {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else if parent.is_valid() {
            self.nodes[parent.index()].last_child = prev;
        }
        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    fn link_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let prev = match reference {
            Some(r) => self.nodes[r.index()].prev_sibling,
            None => self.nodes[parent.index()].last_child,
        };
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference.unwrap_or(NodeId::NONE);
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        match reference {
            Some(r) => self.nodes[r.index()].prev_sibling = child,
            None => self.nodes[parent.index()].last_child = child,
        }
    }

    /// Insert `child` before `reference` (or at the end).
    ///
    /// An attached `child` is moved. A document fragment contributes its
    /// children and is left empty.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<()> {
        self.node(parent)?;
        let child_type = self.node(child)?.node_type();
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }
        if child_type == NodeType::DocumentFragment {
            let kids: Vec<NodeId> = self.children(child).collect();
            for kid in kids {
                self.insert_before(parent, kid, reference)?;
            }
            return Ok(());
        }
        if child_type == NodeType::Document || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child),
            other => other,
        };

        match self.parent(child) {
            Some(old_parent) => {
                let was_observed = self.is_observed(old_parent);
                self.unlink(child);
                self.link_before(parent, child, reference);
                if self.is_observed(parent) {
                    self.log.push(MutationRecord::child_list(MutationKind::Move, parent, child));
                } else if was_observed {
                    self.log.push(MutationRecord::child_list(MutationKind::Remove, old_parent, child));
                }
            }
            None => {
                self.link_before(parent, child, reference);
                self.record(MutationRecord::child_list(MutationKind::Insert, parent, child));
            }
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.record(MutationRecord::child_list(MutationKind::Remove, parent, child));
        self.unlink(child);
        Ok(())
    }

    /// Remove a node from whatever parent it has
    pub fn detach(&mut self, node: NodeId) -> DomResult<()> {
        match self.parent(node) {
            Some(parent) => self.remove_child(parent, node),
            None => self.node(node).map(|_| ()),
        }
    }

    /// Replace `old` with `new` under `parent`
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> DomResult<()> {
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)
    }

    /// Attributes of an element (empty for other nodes)
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(Node::as_element)
            .map(|e| e.attrs.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Set an attribute in no namespace
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.set_attribute_ns(id, None, name, value)
    }

    /// Set an attribute, optionally namespaced (`xlink:href`)
    pub fn set_attribute_ns(&mut self, id: NodeId, namespace: Option<&'static str>, name: &str, value: &str) -> DomResult<()> {
        let element = self.node_mut(id)?.as_element_mut().ok_or(DomError::InvalidNodeType(id))?;
        element.set_attr(name, namespace, value.to_string());
        self.record(MutationRecord::named(MutationKind::SetAttribute, id, name));
        Ok(())
    }

    /// Remove an attribute; absent attributes are not a mutation
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        let element = self.node_mut(id)?.as_element_mut().ok_or(DomError::InvalidNodeType(id))?;
        if element.remove_attr(name).is_some() {
            self.record(MutationRecord::named(MutationKind::RemoveAttribute, id, name));
        }
        Ok(())
    }

    /// Replace the data of a text or comment node
    pub fn set_char_data(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(t) | NodeData::Comment(t) => {
                t.clear();
                t.push_str(text);
            }
            _ => return Err(DomError::InvalidNodeType(id)),
        }
        self.record(MutationRecord::character_data(id));
        Ok(())
    }

    /// Split a text node at a byte offset; the tail becomes the next sibling
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> DomResult<NodeId> {
        let tail = match &mut self.node_mut(id)?.data {
            NodeData::Text(t) => {
                if offset > t.len() || !t.is_char_boundary(offset) {
                    return Err(DomError::IndexSize { node: id, offset });
                }
                t.split_off(offset)
            }
            _ => return Err(DomError::InvalidNodeType(id)),
        };
        self.record(MutationRecord::character_data(id));
        let new_node = self.create_text(&tail);
        if let Some(parent) = self.parent(id) {
            let next = self.next_sibling(id);
            self.insert_before(parent, new_node, next)?;
        }
        Ok(new_node)
    }

    /// Live form-control state of an element
    pub fn form_state(&self, id: NodeId) -> Option<&FormState> {
        self.get(id)?.as_element().map(|e| &e.form)
    }

    fn update_form(&mut self, id: NodeId, name: &str, apply: impl FnOnce(&mut FormState) -> bool) -> DomResult<()> {
        let element = self.node_mut(id)?.as_element_mut().ok_or(DomError::InvalidNodeType(id))?;
        if apply(&mut element.form) {
            self.record(MutationRecord::named(MutationKind::Property, id, name));
        }
        Ok(())
    }

    /// Set the live `value` property
    pub fn set_value(&mut self, id: NodeId, value: Option<&str>) -> DomResult<()> {
        self.update_form(id, "value", |form| {
            if form.value.as_deref() == value {
                return false;
            }
            form.value = value.map(str::to_string);
            true
        })
    }

    /// Set the live `checked` property
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> DomResult<()> {
        self.update_form(id, "checked", |form| std::mem::replace(&mut form.checked, checked) != checked)
    }

    /// Set the live `selected` property
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> DomResult<()> {
        self.update_form(id, "selected", |form| std::mem::replace(&mut form.selected, selected) != selected)
    }

    /// Set the live `disabled` property
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> DomResult<()> {
        self.update_form(id, "disabled", |form| std::mem::replace(&mut form.disabled, disabled) != disabled)
    }

    /// Start recording mutations under `root`
    pub fn observe(&mut self, root: NodeId) {
        self.log.observe(root);
    }

    /// Stop observing all roots; collected records are kept
    pub fn disconnect(&mut self) {
        self.log.disconnect();
    }

    /// Mutations recorded so far
    pub fn mutations(&self) -> &MutationLog {
        &self.log
    }

    /// Take and clear recorded mutations
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.log.take_records()
    }
}

/// Iterator over the children of a node
#[derive(Debug, Clone)]
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_list() -> (DomTree, NodeId, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul", Namespace::Html);
        tree.append_child(tree.root(), ul).unwrap();
        let items: Vec<NodeId> = (0..3)
            .map(|_| {
                let li = tree.create_element("li", Namespace::Html);
                tree.append_child(ul, li).unwrap();
                li
            })
            .collect();
        (tree, ul, items)
    }

    #[test]
    fn test_append_and_iterate() {
        let (tree, ul, items) = tree_with_list();
        assert_eq!(tree.children(ul).collect::<Vec<_>>(), items);
        assert_eq!(tree.first_child(ul), Some(items[0]));
        assert_eq!(tree.last_child(ul), Some(items[2]));
        assert_eq!(tree.prev_sibling(items[1]), Some(items[0]));
    }

    #[test]
    fn test_move_keeps_identity() {
        let (mut tree, ul, items) = tree_with_list();
        tree.observe(ul);
        tree.insert_before(ul, items[2], Some(items[0])).unwrap();

        assert_eq!(tree.children(ul).collect::<Vec<_>>(), vec![items[2], items[0], items[1]]);
        assert_eq!(tree.mutations().count(MutationKind::Move), 1);
        assert_eq!(tree.mutations().len(), 1);
    }

    #[test]
    fn test_detached_subtree_is_not_observed() {
        let mut tree = DomTree::new();
        let root = tree.root();
        tree.observe(root);
        let li = tree.create_element("li", Namespace::Html);
        let text = tree.create_text("1");
        tree.append_child(li, text).unwrap();
        tree.set_attribute(li, "class", "x").unwrap();
        assert!(tree.mutations().is_empty());

        tree.append_child(root, li).unwrap();
        assert_eq!(tree.mutations().count(MutationKind::Insert), 1);
    }

    #[test]
    fn test_remove_and_reinsert() {
        let (mut tree, ul, items) = tree_with_list();
        tree.remove_child(ul, items[1]).unwrap();
        assert_eq!(tree.parent(items[1]), None);
        assert_eq!(tree.next_sibling(items[0]), Some(items[2]));

        tree.append_child(ul, items[1]).unwrap();
        assert_eq!(tree.last_child(ul), Some(items[1]));
    }

    #[test]
    fn test_hierarchy_request() {
        let (mut tree, ul, items) = tree_with_list();
        let err = tree.append_child(items[0], ul).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
    }

    #[test]
    fn test_insert_before_requires_child_reference() {
        let (mut tree, ul, _) = tree_with_list();
        let stray = tree.create_text("x");
        let other = tree.create_text("y");
        let err = tree.insert_before(ul, other, Some(stray)).unwrap_err();
        assert_eq!(err, DomError::NotAChild { parent: ul, child: stray });
    }

    #[test]
    fn test_fragment_insert_moves_children() {
        let (mut tree, ul, items) = tree_with_list();
        let frag = tree.create_document_fragment();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        tree.append_child(frag, a).unwrap();
        tree.append_child(frag, b).unwrap();

        tree.insert_before(ul, frag, Some(items[0])).unwrap();
        assert_eq!(tree.first_child(frag), None);
        assert_eq!(tree.children(ul).take(3).collect::<Vec<_>>(), vec![a, b, items[0]]);
    }

    #[test]
    fn test_split_text() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let text = tree.create_text("HelloWorld");
        tree.append_child(root, text).unwrap();

        let tail = tree.split_text(text, 5).unwrap();
        assert_eq!(tree.char_data(text), Some("Hello"));
        assert_eq!(tree.char_data(tail), Some("World"));
        assert_eq!(tree.next_sibling(text), Some(tail));
        assert!(tree.split_text(text, 99).is_err());
    }

    #[test]
    fn test_form_properties_only_record_changes() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let input = tree.create_element("input", Namespace::Html);
        tree.append_child(root, input).unwrap();
        tree.observe(root);

        tree.set_checked(input, false).unwrap();
        assert!(tree.mutations().is_empty());
        tree.set_checked(input, true).unwrap();
        tree.set_value(input, Some("typed")).unwrap();
        tree.set_value(input, Some("typed")).unwrap();

        assert_eq!(tree.mutations().count(MutationKind::Property), 2);
        assert_eq!(tree.form_state(input).unwrap().value.as_deref(), Some("typed"));
    }

    #[test]
    fn test_text_content_and_descendants() {
        let (mut tree, ul, items) = tree_with_list();
        let t = tree.create_text("one");
        tree.append_child(items[0], t).unwrap();
        assert_eq!(tree.text_content(ul), "one");
        assert_eq!(tree.descendants(ul), vec![ul, items[0], t, items[1], items[2]]);
    }
}
