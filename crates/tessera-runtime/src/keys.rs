//! Key resolution
//!
//! Keys are resolved once per tree, in document order, before the walk.
//! Within one owner scope the first use of a key keeps it as written and
//! later uses become `key_1`, `key_2`, ... Fragments and components without
//! a key get an automatic one the same way.

use std::collections::HashMap;

use tessera_dom::NodeId;
use tessera_vdom::{ComponentId, VNodeId, VNodeKind, VTree};

/// Namespace keys are unique within
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Scope {
    Component(ComponentId),
    /// Owner-less nodes rendered into a container
    Root(NodeId),
}

impl Scope {
    pub fn new(owner: Option<&ComponentId>, container: NodeId) -> Self {
        match owner {
            Some(id) => Self::Component(id.clone()),
            None => Self::Root(container),
        }
    }

    /// Id of the component placed under `key` in this scope
    pub fn component_id(&self, key: &str, prefix: &str) -> ComponentId {
        match self {
            Self::Component(owner) => owner.child(key),
            Self::Root(container) => ComponentId::new(format!("{prefix}r{}-{key}", container.index())),
        }
    }
}

/// Counter of key uses within one scope
#[derive(Debug, Default, Clone)]
pub struct KeySequence {
    seen: HashMap<String, usize>,
}

impl KeySequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the next use of `key`
    pub fn next_key(&mut self, key: &str) -> String {
        let count = self.seen.entry(key.to_string()).or_insert(0);
        let resolved = match *count {
            0 => key.to_string(),
            n => format!("{key}_{n}"),
        };
        *count += 1;
        resolved
    }
}

/// A virtual tree with its keys resolved
pub(crate) struct Resolved<'t> {
    pub tree: &'t VTree,
    pub container: NodeId,
    fallback: Option<ComponentId>,
    keys: HashMap<VNodeId, String>,
    components: HashMap<VNodeId, ComponentId>,
}

impl<'t> Resolved<'t> {
    pub fn new(tree: &'t VTree, container: NodeId, fallback: Option<ComponentId>, prefix: &str) -> Self {
        let mut resolved = Self {
            tree,
            container,
            fallback,
            keys: HashMap::new(),
            components: HashMap::new(),
        };
        let mut sequences: HashMap<Scope, KeySequence> = HashMap::new();
        let mut found = Vec::new();
        tree.walk(tree.root(), |id, node| {
            let key = match (&node.kind, node.key.as_deref()) {
                (_, Some(key)) => key.to_string(),
                (VNodeKind::Fragment { .. }, None) => "@fragment".to_string(),
                (VNodeKind::Component(c), None) => format!("@{}", c.type_name),
                _ => return,
            };
            found.push((id, key));
        });
        for (id, key) in found {
            let scope = resolved.scope_of(id);
            let key = sequences.entry(scope.clone()).or_default().next_key(&key);
            if matches!(tree.get(id).kind, VNodeKind::Component(_)) {
                resolved.components.insert(id, scope.component_id(&key, prefix));
            }
            resolved.keys.insert(id, key);
        }
        resolved
    }

    /// Component that owns `id`, falling back to the tree's owner
    pub fn owner_of(&self, id: VNodeId) -> Option<&ComponentId> {
        self.tree.get(id).owner.as_ref().or(self.fallback.as_ref())
    }

    pub fn scope_of(&self, id: VNodeId) -> Scope {
        Scope::new(self.owner_of(id), self.container)
    }

    pub fn key(&self, id: VNodeId) -> Option<&str> {
        self.keys.get(&id).map(String::as_str)
    }

    pub fn component_id(&self, id: VNodeId) -> Option<&ComponentId> {
        self.components.get(&id)
    }

    /// Ids of every component placeholder in the tree
    pub fn component_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.components.values()
    }
}

/// Values stored under the repeated key `base[]`, in render order
pub(crate) fn indexed<'a, V>(entries: impl Iterator<Item = (&'a str, V)>, base: &str) -> Vec<V> {
    let prefix = format!("{base}[]");
    let mut found: Vec<(usize, V)> = entries
        .filter_map(|(key, value)| {
            let rest = key.strip_prefix(prefix.as_str())?;
            let index = match rest {
                "" => 0,
                _ => rest.strip_prefix('_')?.parse().ok()?,
            };
            Some((index, value))
        })
        .collect();
    found.sort_by_key(|(index, _)| *index);
    found.into_iter().map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_vdom::{Attrs, Input, RenderOut};

    #[test]
    fn test_key_sequence() {
        let mut seq = KeySequence::new();
        assert_eq!(seq.next_key("a"), "a");
        assert_eq!(seq.next_key("a"), "a_1");
        assert_eq!(seq.next_key("b"), "b");
        assert_eq!(seq.next_key("a"), "a_2");
    }

    #[test]
    fn test_resolve_duplicates_and_components() {
        let mut out = RenderOut::for_component("s0".into());
        out.element_with_text("li", Attrs::new(), Some("x"), "1").unwrap();
        out.element_with_text("li", Attrs::new(), Some("x"), "2").unwrap();
        out.component("child", "c", Input::new()).unwrap();
        out.end();
        let result = out.result().unwrap();
        let tree = result.tree();
        let resolved = Resolved::new(tree, NodeId::NONE, None, "s");

        let kids: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(resolved.key(kids[0]), Some("x"));
        assert_eq!(resolved.key(kids[1]), Some("x_1"));
        assert_eq!(resolved.component_id(kids[2]).map(|c| c.as_str()), Some("s0-c"));
    }

    #[test]
    fn test_indexed_keys() {
        let entries = vec![("items[]_2", 'c'), ("items[]", 'a'), ("other", 'z'), ("items[]_1", 'b')];
        let found = indexed(entries.into_iter(), "items");
        assert_eq!(found, vec!['a', 'b', 'c']);
    }
}
