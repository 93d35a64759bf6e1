//! Mutation observation
//!
//! The tree records every mutation whose target lies under an observed root,
//! the way a `MutationObserver` with `subtree: true` would. Nodes built while
//! detached are invisible until they are inserted.

use crate::NodeId;

/// What a mutation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// A node that had no parent was inserted
    Insert,
    /// An attached node was moved to a new position
    Move,
    /// A node was removed from its parent
    Remove,
    /// An attribute was added or changed
    SetAttribute,
    /// An attribute was removed
    RemoveAttribute,
    /// Text or comment data changed
    CharacterData,
    /// A live form-control property changed
    Property,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// Parent for child-list mutations, the node itself otherwise
    pub target: NodeId,
    /// Node inserted, moved or removed
    pub node: Option<NodeId>,
    /// Attribute or property name
    pub name: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(kind: MutationKind, target: NodeId, node: NodeId) -> Self {
        Self {
            kind,
            target,
            node: Some(node),
            name: None,
        }
    }

    pub(crate) fn named(kind: MutationKind, target: NodeId, name: &str) -> Self {
        Self {
            kind,
            target,
            node: None,
            name: Some(name.to_string()),
        }
    }

    pub(crate) fn character_data(target: NodeId) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
            node: None,
            name: None,
        }
    }
}

/// Observed roots plus the records collected for them
#[derive(Debug, Default, Clone)]
pub struct MutationLog {
    roots: Vec<NodeId>,
    records: Vec<MutationRecord>,
}

impl MutationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn observe(&mut self, root: NodeId) {
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    pub(crate) fn disconnect(&mut self) {
        self.roots.clear();
    }

    pub(crate) fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub(crate) fn is_observing(&self) -> bool {
        !self.roots.is_empty()
    }

    pub(crate) fn push(&mut self, record: MutationRecord) {
        tracing::trace!(kind = ?record.kind, target = %record.target, "mutation");
        self.records.push(record);
    }

    /// All records collected so far
    pub fn records(&self) -> &[MutationRecord] {
        &self.records
    }

    /// Take and clear the collected records
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// Number of records of one kind
    pub fn count(&self, kind: MutationKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
