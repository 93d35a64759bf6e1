//! Virtual tree arena
//!
//! Children form a singly linked list (first child / next sibling) with the
//! parent holding the last child for O(1) append. Document fragments are
//! transparent to [`VTree::first_child`] and [`VTree::next_sibling`]: their
//! children read as if they were inline, and an empty one is skipped.

use crate::node::{ComponentId, VNode, VNodeKind};
use crate::{VdomError, VdomResult};

/// Node identifier inside one [`VTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VNodeId(u32);

impl VNodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of virtual nodes rooted at a document fragment
#[derive(Debug, Clone)]
pub struct VTree {
    nodes: Vec<VNode>,
}

impl Default for VTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![VNode::new(VNodeKind::DocumentFragment, None, None)],
        }
    }

    /// Root document fragment
    #[inline]
    pub fn root(&self) -> VNodeId {
        VNodeId(0)
    }

    /// Allocate a detached node
    pub fn create(&mut self, kind: VNodeKind, key: Option<String>, owner: Option<ComponentId>) -> VNodeId {
        let id = VNodeId(self.nodes.len() as u32);
        self.nodes.push(VNode::new(kind, key, owner));
        id
    }

    /// Allocate a node whose child count is known up front
    pub fn create_counted(
        &mut self,
        kind: VNodeKind,
        key: Option<String>,
        owner: Option<ComponentId>,
        final_child_count: usize,
    ) -> VNodeId {
        let id = self.create(kind, key, owner);
        self.nodes[id.index()].final_child_count = Some(final_child_count);
        id
    }

    /// Node by id. Ids are only ever produced by this tree.
    #[inline]
    pub fn get(&self, id: VNodeId) -> &VNode {
        &self.nodes[id.index()]
    }

    pub fn try_get(&self, id: VNodeId) -> Option<&VNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: VNodeId) -> &mut VNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A `<textarea>` never gets children: text is folded into its value and
    /// a preserved node makes the value opaque; anything else is rejected.
    pub fn append_child(&mut self, parent: VNodeId, child: VNodeId) -> VdomResult<VNodeId> {
        let text = match &self.get(child).kind {
            VNodeKind::Text(t) => Some(t.clone()),
            _ => None,
        };
        let child_preserved = self.get(child).is_preserved();
        let child_kind = self.get(child).kind.name();

        let parent_node = self.get_mut(parent);
        if let VNodeKind::Element(el) = &mut parent_node.kind {
            if el.tag == "textarea" {
                match text {
                    Some(t) => el.value.get_or_insert_with(String::new).push_str(&t),
                    None if child_preserved => el.preserve_value = true,
                    None => return Err(VdomError::InvalidTextareaChild(child_kind)),
                }
                parent_node.child_count += 1;
                return Ok(child);
            }
        }

        parent_node.child_count += 1;
        let last = parent_node.last_child.replace(child);
        match last {
            Some(last) => self.get_mut(last).next_sibling = Some(child),
            None => self.get_mut(parent).first_child = Some(child),
        }
        self.get_mut(child).parent = Some(parent);
        Ok(child)
    }

    /// Nearest node, starting at `node`, that still expects children.
    ///
    /// A node whose declared child count has been reached hands over to its
    /// parent; nodes with an unknown count never finish on their own.
    pub fn finish_child(&self, node: VNodeId) -> VNodeId {
        let mut current = node;
        loop {
            let n = self.get(current);
            match (n.final_child_count, n.parent) {
                (Some(count), Some(parent)) if n.child_count >= count => current = parent,
                _ => return current,
            }
        }
    }

    /// Whether a node with a declared child count has received all of them
    pub fn is_finished(&self, node: VNodeId) -> bool {
        let n = self.get(node);
        n.final_child_count.is_some_and(|count| n.child_count >= count)
    }

    /// First child, looking through document fragments
    pub fn first_child(&self, id: VNodeId) -> Option<VNodeId> {
        let first = self.get(id).first_child?;
        if self.get(first).is_document_fragment() {
            self.first_child(first).or_else(|| self.next_sibling(first))
        } else {
            Some(first)
        }
    }

    /// Next sibling, looking through document fragments in both directions
    pub fn next_sibling(&self, id: VNodeId) -> Option<VNodeId> {
        let node = self.get(id);
        match node.next_sibling {
            Some(next) if self.get(next).is_document_fragment() => {
                self.first_child(next).or_else(|| self.next_sibling(next))
            }
            Some(next) => Some(next),
            None => {
                let parent = node.parent?;
                if self.get(parent).is_document_fragment() {
                    self.next_sibling(parent)
                } else {
                    None
                }
            }
        }
    }

    /// Effective children of a node (document fragments flattened)
    pub fn children(&self, id: VNodeId) -> VChildren<'_> {
        VChildren {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Children exactly as appended, document fragments included
    pub fn raw_children(&self, id: VNodeId) -> impl Iterator<Item = VNodeId> + '_ {
        std::iter::successors(self.get(id).first_child, move |&c| self.get(c).next_sibling)
    }

    /// Pre-order walk of the effective subtree below `id` (exclusive)
    pub fn walk(&self, id: VNodeId, mut visit: impl FnMut(VNodeId, &VNode)) {
        let mut stack: Vec<VNodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            visit(node, self.get(node));
            let mut kids: Vec<VNodeId> = self.children(node).collect();
            kids.reverse();
            stack.extend(kids);
        }
    }
}

/// Iterator over effective children
#[derive(Debug, Clone)]
pub struct VChildren<'a> {
    tree: &'a VTree,
    next: Option<VNodeId>,
}

impl Iterator for VChildren<'_> {
    type Item = VNodeId;

    fn next(&mut self) -> Option<VNodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attrs, VElement};

    fn element(tree: &mut VTree, tag: &str) -> VNodeId {
        tree.create(VNodeKind::Element(VElement::new(tag, Attrs::new())), None, None)
    }

    fn text(tree: &mut VTree, s: &str) -> VNodeId {
        tree.create(VNodeKind::Text(s.into()), None, None)
    }

    #[test]
    fn test_append_links_siblings() {
        let mut tree = VTree::new();
        let root = tree.root();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();

        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.get(b).parent(), Some(root));
        assert_eq!(tree.get(root).child_count(), 2);
    }

    #[test]
    fn test_document_fragment_is_transparent() {
        let mut tree = VTree::new();
        let root = tree.root();
        let a = element(&mut tree, "a");
        let empty = tree.create(VNodeKind::DocumentFragment, None, None);
        let frag = tree.create(VNodeKind::DocumentFragment, None, None);
        let inner = text(&mut tree, "inner");
        let b = element(&mut tree, "b");

        tree.append_child(root, empty).unwrap();
        tree.append_child(root, a).unwrap();
        tree.append_child(root, frag).unwrap();
        tree.append_child(frag, inner).unwrap();
        tree.append_child(root, b).unwrap();

        assert_eq!(tree.first_child(root), Some(a));
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, inner, b]);
        assert_eq!(tree.raw_children(root).count(), 4);
    }

    #[test]
    fn test_finish_child_climbs_complete_ancestors() {
        let mut tree = VTree::new();
        let root = tree.root();
        let ul = tree.create_counted(VNodeKind::Element(VElement::new("ul", Attrs::new())), None, None, 1);
        let li = tree.create_counted(VNodeKind::Element(VElement::new("li", Attrs::new())), None, None, 1);
        tree.append_child(root, ul).unwrap();
        tree.append_child(ul, li).unwrap();
        assert_eq!(tree.finish_child(li), li);

        let t = text(&mut tree, "1");
        tree.append_child(li, t).unwrap();
        assert!(tree.is_finished(li));
        assert_eq!(tree.finish_child(li), root);
    }

    #[test]
    fn test_textarea_accepts_text_only() {
        let mut tree = VTree::new();
        let textarea = element(&mut tree, "textarea");
        let a = text(&mut tree, "hello ");
        let b = text(&mut tree, "world");
        tree.append_child(textarea, a).unwrap();
        tree.append_child(textarea, b).unwrap();

        let el = tree.get(textarea).as_element().unwrap();
        assert_eq!(el.value.as_deref(), Some("hello world"));
        assert_eq!(tree.first_child(textarea), None);

        let span = element(&mut tree, "span");
        let err = tree.append_child(textarea, span).unwrap_err();
        assert!(matches!(err, VdomError::InvalidTextareaChild("element")));
    }

    #[test]
    fn test_textarea_preserved_child() {
        let mut tree = VTree::new();
        let textarea = element(&mut tree, "textarea");
        let kept = tree.create(VNodeKind::Fragment { preserve: true }, Some("k".into()), None);
        tree.append_child(textarea, kept).unwrap();
        assert!(tree.get(textarea).as_element().unwrap().preserve_value);
    }
}
