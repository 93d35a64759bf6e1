//! Attribute diffing

use std::rc::Rc;

use tessera_dom::{DomResult, DomTree, NodeId, XLINK_NS};
use tessera_vdom::{AttrValue, Attrs, ElementFlags, VElement};

const SIMPLE: [&str; 3] = ["class", "id", "style"];

fn write(tree: &mut DomTree, node: NodeId, name: &str, value: &str) -> DomResult<()> {
    match name {
        "xlink:href" => tree.set_attribute_ns(node, Some(XLINK_NS), name, value),
        _ => tree.set_attribute(node, name, value),
    }
}

fn apply(tree: &mut DomTree, node: NodeId, name: &str, old: Option<&AttrValue>, new: Option<&AttrValue>) -> DomResult<()> {
    let old = old.and_then(AttrValue::to_dom_value);
    match new.and_then(AttrValue::to_dom_value) {
        Some(value) if old.as_deref() != Some(value.as_str()) => write(tree, node, name, &value),
        Some(_) => Ok(()),
        None => tree.remove_attribute(node, name),
    }
}

/// Bring the attributes of `node` from `old` to `el.attrs`.
///
/// With no `old` every present attribute is written. Attributes missing from
/// the new map are removed: all of them when the element is unkeyed or was
/// adopted from existing markup, otherwise only those the last render set.
pub(super) fn morph_attrs(
    tree: &mut DomTree,
    node: NodeId,
    old: Option<(&Rc<Attrs>, ElementFlags)>,
    el: &VElement,
    keyed: bool,
) -> DomResult<()> {
    let Some((old_attrs, old_flags)) = old else {
        for (name, value) in el.attrs.iter() {
            if let Some(value) = value.to_dom_value() {
                write(tree, node, name, &value)?;
            }
        }
        return Ok(());
    };

    if Rc::ptr_eq(old_attrs, &el.attrs) {
        return Ok(());
    }

    let both_simple =
        old_flags.contains(ElementFlags::SIMPLE_ATTRS) && el.flags.contains(ElementFlags::SIMPLE_ATTRS);
    if both_simple {
        for name in SIMPLE {
            apply(tree, node, name, old_attrs.get(name), el.attrs.get(name))?;
        }
        return Ok(());
    }

    for (name, value) in el.attrs.iter() {
        apply(tree, node, name, old_attrs.get(name), Some(value))?;
    }

    if !keyed || old_flags.contains(ElementFlags::VIRTUALIZED) {
        let stale: Vec<String> = tree
            .attributes(node)
            .iter()
            .filter(|a| !el.attrs.contains(&a.name))
            .map(|a| a.name.clone())
            .collect();
        for name in stale {
            tree.remove_attribute(node, &name)?;
        }
    } else {
        for (name, _) in old_attrs.iter() {
            if !el.attrs.contains(name) {
                tree.remove_attribute(node, name)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_dom::{Document, MutationKind};

    fn setup(attrs: Attrs) -> (Document, NodeId, Rc<Attrs>) {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.append_element(body, "div").unwrap();
        let el = VElement::new("div", attrs);
        morph_attrs(&mut doc.tree, div, None, &el, false).unwrap();
        doc.tree.observe(body);
        (doc, div, el.attrs)
    }

    #[test]
    fn test_fresh_skips_absent_values() {
        let (doc, div, _) = setup(Attrs::new().with("class", "a").with("hidden", false).with("title", "t"));
        let names: Vec<_> = doc.tree.attributes(div).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["class", "title"]);
    }

    #[test]
    fn test_shared_attrs_are_skipped() {
        let (mut doc, div, attrs) = setup(Attrs::new().with("title", "t"));
        let el = VElement::new("div", attrs.clone());
        morph_attrs(&mut doc.tree, div, Some((&attrs, el.flags)), &el, false).unwrap();
        assert!(doc.tree.mutations().is_empty());
    }

    #[test]
    fn test_simple_attrs_compare_three_names() {
        let (mut doc, div, attrs) = setup(Attrs::new().with("class", "a").with("id", "x"));
        let el = VElement::new("div", Attrs::new().with("class", "b").with("id", "x"));
        morph_attrs(&mut doc.tree, div, Some((&attrs, ElementFlags::SIMPLE_ATTRS)), &el, false).unwrap();
        assert_eq!(doc.tree.mutations().len(), 1);
        assert_eq!(doc.tree.get_attribute(div, "class"), Some("b"));
    }

    #[test]
    fn test_keyed_removes_only_rendered_attrs() {
        let (mut doc, div, attrs) = setup(Attrs::new().with("title", "t").with("data-x", "1"));
        doc.tree.set_attribute(div, "data-foreign", "kept").unwrap();
        doc.tree.take_records();

        let el = VElement::new("div", Attrs::new().with("title", "t"));
        morph_attrs(&mut doc.tree, div, Some((&attrs, ElementFlags::empty())), &el, true).unwrap();
        assert_eq!(doc.tree.get_attribute(div, "data-x"), None);
        assert_eq!(doc.tree.get_attribute(div, "data-foreign"), Some("kept"));
        assert_eq!(doc.tree.mutations().count(MutationKind::RemoveAttribute), 1);
    }

    #[test]
    fn test_unkeyed_removes_foreign_attrs() {
        let (mut doc, div, attrs) = setup(Attrs::new().with("title", "t"));
        doc.tree.set_attribute(div, "data-foreign", "gone").unwrap();

        let el = VElement::new("div", Attrs::new().with("title", "u"));
        morph_attrs(&mut doc.tree, div, Some((&attrs, ElementFlags::empty())), &el, false).unwrap();
        assert_eq!(doc.tree.get_attribute(div, "data-foreign"), None);
        assert_eq!(doc.tree.get_attribute(div, "title"), Some("u"));
    }

    #[test]
    fn test_false_value_removes_attribute() {
        let (mut doc, div, attrs) = setup(Attrs::new().with("disabled", true));
        let el = VElement::new("div", Attrs::new().with("disabled", false));
        morph_attrs(&mut doc.tree, div, Some((&attrs, ElementFlags::empty())), &el, true).unwrap();
        assert!(!doc.tree.has_attribute(div, "disabled"));
    }

    #[test]
    fn test_xlink_href_is_namespaced() {
        let mut doc = Document::new();
        let body = doc.body();
        let svg = doc.append_element(body, "svg").unwrap();
        let use_el = doc.append_element(svg, "use").unwrap();
        let el = VElement::new("use", Attrs::new().with("xlink:href", "#icon"));
        morph_attrs(&mut doc.tree, use_el, None, &el, false).unwrap();

        let attr = &doc.tree.attributes(use_el)[0];
        assert_eq!(attr.namespace, Some(XLINK_NS));
        assert_eq!(attr.value, "#icon");
    }
}
