//! Virtual nodes
//!
//! A closed set of node kinds. Every render produces fresh nodes; only the
//! reconciler's per-element shadow records survive a render.

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use bitflags::bitflags;

use crate::Attrs;
use crate::tree::VNodeId;

/// Component input: a flat key/value map compared shallowly between renders
pub type Input = serde_json::Map<String, serde_json::Value>;

/// Handle of a component instance, unique among mounted components
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the child component rendered under `key`
    pub fn child(&self, key: &str) -> ComponentId {
        Self::new(format!("{}-{}", self.0, key))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

bitflags! {
    /// Element flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// Only `class`, `id` and `style` attributes
        const SIMPLE_ATTRS = 1 << 0;
        /// Tag name contains a dash
        const CUSTOM_ELEMENT = 1 << 1;
        /// Leave the element's body untouched on re-render
        const PRESERVE = 1 << 2;
        /// Built from existing markup rather than rendered
        const VIRTUALIZED = 1 << 3;
    }
}

/// Delegated event binding: `event` on this element calls `method` on the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub event: String,
    pub method: String,
}

/// Virtual element
#[derive(Debug, Clone)]
pub struct VElement {
    pub tag: String,
    /// Shared so constant attribute maps can be recognised by identity
    pub attrs: Rc<Attrs>,
    pub flags: ElementFlags,
    /// Set by the compiler on statically invariant subtrees
    pub const_id: Option<u32>,
    pub events: Vec<EventBinding>,
    /// Accumulated text of a `<textarea>`
    pub value: Option<String>,
    /// A preserved child made the `<textarea>` value opaque
    pub preserve_value: bool,
}

impl VElement {
    /// Create an element; `SIMPLE_ATTRS` and `CUSTOM_ELEMENT` are inferred
    pub fn new(tag: &str, attrs: impl Into<Rc<Attrs>>) -> Self {
        let attrs = attrs.into();
        let mut flags = ElementFlags::empty();
        if tag.contains('-') {
            flags |= ElementFlags::CUSTOM_ELEMENT;
        } else if attrs.iter().all(|(name, _)| matches!(name, "class" | "id" | "style")) {
            flags |= ElementFlags::SIMPLE_ATTRS;
        }
        Self {
            tag: tag.to_string(),
            attrs,
            flags,
            const_id: None,
            events: Vec::new(),
            value: None,
            preserve_value: false,
        }
    }

    pub fn with_flags(mut self, flags: ElementFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_const_id(mut self, id: u32) -> Self {
        self.const_id = Some(id);
        self
    }

    /// Bind a delegated DOM event to a handler method on the owning component
    pub fn on(mut self, event: &str, method: &str) -> Self {
        self.events.push(EventBinding {
            event: event.to_string(),
            method: method.to_string(),
        });
        self
    }

    pub fn is_preserved(&self) -> bool {
        self.flags.contains(ElementFlags::PRESERVE)
    }

    /// Value the live `value` property should hold
    pub fn value(&self) -> Option<String> {
        if self.tag == "textarea" {
            self.value.clone().or_else(|| self.attrs.dom_value("value"))
        } else {
            self.attrs.dom_value("value")
        }
    }

    pub fn checked(&self) -> bool {
        self.attrs.is_present("checked")
    }

    pub fn selected(&self) -> bool {
        self.attrs.is_present("selected")
    }

    pub fn disabled(&self) -> bool {
        self.attrs.is_present("disabled")
    }
}

/// Placeholder for a component rendered at this position
#[derive(Debug, Clone)]
pub struct VComponent {
    /// Name the component registry resolves
    pub type_name: String,
    pub input: Input,
    /// Skip reconciliation of the component entirely
    pub preserve: bool,
}

/// Node kinds
#[derive(Debug, Clone)]
pub enum VNodeKind {
    Element(VElement),
    Text(String),
    Comment(String),
    /// Keyed grouping rendered between two boundary markers
    Fragment { preserve: bool },
    Component(VComponent),
    /// Transparent container used by async placeholders and the tree root
    DocumentFragment,
}

impl VNodeKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Text(_) => "text",
            Self::Comment(_) => "comment",
            Self::Fragment { .. } => "fragment",
            Self::Component(_) => "component",
            Self::DocumentFragment => "document fragment",
        }
    }
}

/// Virtual node with its links
#[derive(Debug, Clone)]
pub struct VNode {
    pub kind: VNodeKind,
    /// Identity among siblings of the same owner; `None` matches by position
    pub key: Option<String>,
    /// Component that rendered this node
    pub owner: Option<ComponentId>,
    pub(crate) parent: Option<VNodeId>,
    pub(crate) first_child: Option<VNodeId>,
    pub(crate) last_child: Option<VNodeId>,
    pub(crate) next_sibling: Option<VNodeId>,
    pub(crate) child_count: usize,
    pub(crate) final_child_count: Option<usize>,
}

impl VNode {
    pub(crate) fn new(kind: VNodeKind, key: Option<String>, owner: Option<ComponentId>) -> Self {
        Self {
            kind,
            key,
            owner,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            child_count: 0,
            final_child_count: None,
        }
    }

    pub fn parent(&self) -> Option<VNodeId> {
        self.parent
    }

    pub fn child_count(&self) -> usize {
        self.child_count
    }

    pub fn final_child_count(&self) -> Option<usize> {
        self.final_child_count
    }

    pub fn as_element(&self) -> Option<&VElement> {
        match &self.kind {
            VNodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&VComponent> {
        match &self.kind {
            VNodeKind::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_document_fragment(&self) -> bool {
        matches!(self.kind, VNodeKind::DocumentFragment)
    }

    /// Preserved nodes are the only non-text content a `<textarea>` accepts
    pub fn is_preserved(&self) -> bool {
        match &self.kind {
            VNodeKind::Element(el) => el.is_preserved(),
            VNodeKind::Fragment { preserve } => *preserve,
            VNodeKind::Component(c) => c.preserve,
            _ => false,
        }
    }
}
