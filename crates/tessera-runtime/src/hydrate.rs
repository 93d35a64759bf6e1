//! Hydration
//!
//! Server-rendered markup is adopted rather than recreated: the first pass
//! over it runs in hydrate mode, where elements without a shadow match by
//! tag and merged text nodes are split apart again. [`virtualize`] goes the
//! other way and turns existing markup into a virtual tree.

use tessera_dom::{Document, DomError, DomTree, NodeId, NodeType};
use tessera_vdom::{Attrs, ComponentId, ElementFlags, Input, VElement, VNodeId, VNodeKind, VTree};

use crate::morph::{Hook, Pass, Span};
use crate::{Runtime, RuntimeResult};

/// Attributes of a real element as a virtual attribute map
pub(crate) fn dom_attrs(tree: &DomTree, node: NodeId) -> Attrs {
    let mut attrs = Attrs::new();
    for attr in tree.attributes(node) {
        attrs.insert(&attr.name, attr.value.as_str());
    }
    attrs
}

fn virtualize_into(dom: &DomTree, node: NodeId, tree: &mut VTree, parent: VNodeId) -> RuntimeResult<()> {
    let kind = match dom.node_type(node) {
        Some(NodeType::Element) => {
            let tag = dom.tag_name(node).unwrap_or_default();
            VNodeKind::Element(VElement::new(tag, dom_attrs(dom, node)).with_flags(ElementFlags::VIRTUALIZED))
        }
        Some(NodeType::Text) => VNodeKind::Text(dom.char_data(node).unwrap_or_default().to_string()),
        Some(NodeType::Comment) => VNodeKind::Comment(dom.char_data(node).unwrap_or_default().to_string()),
        Some(NodeType::Document | NodeType::DocumentFragment) => {
            for child in dom.children(node) {
                virtualize_into(dom, child, tree, parent)?;
            }
            return Ok(());
        }
        None => return Err(DomError::NotFound(node).into()),
    };
    let id = tree.create(kind, None, None);
    tree.append_child(parent, id)?;
    if dom.node_type(node) == Some(NodeType::Element) {
        for child in dom.children(node) {
            virtualize_into(dom, child, tree, id)?;
        }
    }
    Ok(())
}

/// Build a virtual tree from existing markup.
///
/// Elements carry the `VIRTUALIZED` flag, so the first morph against them
/// removes any attribute the new render does not set. Documents and
/// fragments contribute their children.
pub fn virtualize(doc: &Document, node: NodeId) -> RuntimeResult<VTree> {
    let mut tree = VTree::new();
    let root = tree.root();
    virtualize_into(&doc.tree, node, &mut tree, root)?;
    Ok(tree)
}

impl Runtime {
    /// Mount a component over markup already in `container`, adopting the
    /// nodes its first render matches
    pub fn hydrate(&mut self, type_name: &str, input: Input, container: NodeId) -> RuntimeResult<ComponentId> {
        let id = self.next_root_id();
        tracing::info!(component = %id, type_name, %container, "hydrate");
        self.observe_if_recording(container);
        self.instantiate(&id, type_name, input, None, None)?;

        let (start, _) = self.markers(&id)?;
        let first = self.doc.tree.first_child(container);
        self.doc.tree.insert_before(container, start, first)?;

        let mut pass = Pass::hydrating();
        pass.rendered.insert(id.clone());
        let span = Span { parent: container, end: None };
        self.hydrate_component(&id, span, first, &mut pass)?;
        pass.completed.push((id.clone(), Hook::Mount));
        self.finish_pass(pass)?;
        Ok(id)
    }
}
