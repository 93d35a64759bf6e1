//! Finished render output

use std::rc::Rc;

use crate::node::VNodeKind;
use crate::tree::{VNodeId, VTree};

/// Finished virtual tree of one render.
///
/// Cheap to clone; the runtime materializes it into the document through
/// `Runtime::append_to`, `replace`, `insert_before` and friends.
#[derive(Debug, Clone)]
pub struct RenderResult {
    tree: Rc<VTree>,
}

impl RenderResult {
    pub(crate) fn new(tree: Rc<VTree>) -> Self {
        Self { tree }
    }

    /// Wrap a tree built by hand
    pub fn from_tree(tree: VTree) -> Self {
        Self { tree: Rc::new(tree) }
    }

    pub fn tree(&self) -> &VTree {
        &self.tree
    }

    pub fn root(&self) -> VNodeId {
        self.tree.root()
    }

    /// Top-level component placeholders as `(type name, key)`
    pub fn components(&self) -> Vec<(&str, Option<&str>)> {
        self.tree
            .children(self.tree.root())
            .filter_map(|id| {
                let node = self.tree.get(id);
                match &node.kind {
                    VNodeKind::Component(c) => Some((c.type_name.as_str(), node.key.as_deref())),
                    _ => None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Input, RenderOut};

    #[test]
    fn test_components_listed() {
        let mut out = RenderOut::new();
        out.component("counter", "c", Input::new()).unwrap();
        out.text("x").unwrap();
        out.end();
        let result = out.result().unwrap();
        assert_eq!(result.components(), vec![("counter", Some("c"))]);
    }
}
