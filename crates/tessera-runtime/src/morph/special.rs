//! Form control properties
//!
//! Live properties drift from attributes once a user interacts with a
//! control, so after each morph they are pushed from the virtual element.

use tessera_dom::{DomResult, DomTree, NodeId};
use tessera_vdom::VElement;

fn has_select_ancestor(tree: &DomTree, node: NodeId) -> bool {
    let mut current = tree.parent(node);
    while let Some(id) = current {
        if tree.tag_name(id) == Some("select") {
            return true;
        }
        current = tree.parent(id);
    }
    false
}

fn sync_select(tree: &mut DomTree, node: NodeId) -> DomResult<()> {
    let options: Vec<NodeId> = tree
        .descendants(node)
        .into_iter()
        .filter(|&n| tree.tag_name(n) == Some("option"))
        .collect();
    if tree.has_attribute(node, "multiple") {
        for option in options {
            let selected = tree.has_attribute(option, "selected");
            tree.set_selected(option, selected)?;
        }
        return Ok(());
    }
    let index = options
        .iter()
        .position(|&o| tree.has_attribute(o, "selected"))
        .unwrap_or(0);
    for (i, option) in options.into_iter().enumerate() {
        tree.set_selected(option, i == index)?;
    }
    Ok(())
}

/// Push form properties of `el` onto `node`
pub(super) fn sync_form(tree: &mut DomTree, node: NodeId, el: &VElement) -> DomResult<()> {
    match el.tag.as_str() {
        "option" if !has_select_ancestor(tree, node) => tree.set_selected(node, el.selected()),
        "button" => tree.set_disabled(node, el.disabled()),
        "input" => {
            tree.set_checked(node, el.checked())?;
            tree.set_disabled(node, el.disabled())?;
            tree.set_value(node, el.value().as_deref())
        }
        "textarea" if !el.preserve_value => tree.set_value(node, el.value().as_deref()),
        "select" => sync_select(tree, node),
        _ => Ok(()),
    }
}
