//! Shadow side-tables
//!
//! What was last rendered into each real node. Elements get an
//! [`ElementShadow`]; fragments and component roots are identified by their
//! start marker.

use std::collections::HashMap;
use std::rc::Rc;

use tessera_dom::NodeId;
use tessera_vdom::{Attrs, ComponentId, ElementFlags, EventBinding, VElement};

/// Compact record of the virtual element last rendered into a real element
#[derive(Debug, Clone)]
pub struct ElementShadow {
    pub tag: String,
    pub key: Option<String>,
    pub attrs: Rc<Attrs>,
    pub flags: ElementFlags,
    pub const_id: Option<u32>,
    pub owner: Option<ComponentId>,
    pub events: Vec<EventBinding>,
}

impl ElementShadow {
    pub(crate) fn new(el: &VElement, key: Option<String>, owner: Option<ComponentId>) -> Self {
        Self {
            tag: el.tag.clone(),
            key,
            attrs: el.attrs.clone(),
            flags: el.flags,
            const_id: el.const_id,
            owner,
            events: el.events.clone(),
        }
    }
}

/// Marker pair of a keyed fragment or a component root
#[derive(Debug, Clone)]
pub struct FragmentShadow {
    pub end: NodeId,
    pub key: Option<String>,
    pub owner: Option<ComponentId>,
    /// Set when the range is a component's root
    pub component: Option<ComponentId>,
}

#[derive(Debug, Default)]
pub(crate) struct ShadowTable {
    elements: HashMap<NodeId, ElementShadow>,
    fragments: HashMap<NodeId, FragmentShadow>,
    ends: HashMap<NodeId, NodeId>,
}

impl ShadowTable {
    pub fn element(&self, node: NodeId) -> Option<&ElementShadow> {
        self.elements.get(&node)
    }

    pub fn set_element(&mut self, node: NodeId, shadow: ElementShadow) {
        self.elements.insert(node, shadow);
    }

    pub fn take_element(&mut self, node: NodeId) -> Option<ElementShadow> {
        self.elements.remove(&node)
    }

    pub fn fragment(&self, start: NodeId) -> Option<&FragmentShadow> {
        self.fragments.get(&start)
    }

    pub fn set_fragment(&mut self, start: NodeId, shadow: FragmentShadow) {
        self.ends.insert(shadow.end, start);
        self.fragments.insert(start, shadow);
    }

    pub fn is_fragment_start(&self, node: NodeId) -> bool {
        self.fragments.contains_key(&node)
    }

    /// Start or end marker of any fragment
    pub fn is_marker(&self, node: NodeId) -> bool {
        self.fragments.contains_key(&node) || self.ends.contains_key(&node)
    }

    /// Component whose root starts at `node`
    pub fn component_at(&self, node: NodeId) -> Option<&ComponentId> {
        self.fragments.get(&node)?.component.as_ref()
    }

    /// Key of the element or plain fragment at `node`, if `owner` rendered it
    pub fn key_of(&self, node: NodeId, owner: Option<&ComponentId>) -> Option<&str> {
        if let Some(el) = self.elements.get(&node) {
            return el.key.as_deref().filter(|_| el.owner.as_ref() == owner);
        }
        let frag = self.fragments.get(&node)?;
        if frag.component.is_some() || frag.owner.as_ref() != owner {
            return None;
        }
        frag.key.as_deref()
    }

    pub fn forget(&mut self, node: NodeId) {
        self.elements.remove(&node);
        if let Some(frag) = self.fragments.remove(&node) {
            self.ends.remove(&frag.end);
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len() + self.fragments.len()
    }
}
