//! Tessera DOM - Document Object Model
//!
//! Arena-based document tree the reconciler mutates. Nodes are addressed by
//! [`NodeId`] handles that stay stable for the lifetime of the tree, so the
//! runtime can keep side-tables keyed by node identity.

mod document;
mod error;
mod namespace;
mod node;
mod observer;
mod tree;

pub use document::Document;
pub use error::{DomError, DomResult};
pub use namespace::{Namespace, XLINK_NS};
pub use node::{Attribute, ElementData, FormState, Node, NodeData, NodeType};
pub use observer::{MutationKind, MutationLog, MutationRecord};
pub use tree::{Children, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this id points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}
