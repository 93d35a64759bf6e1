//! Edge case tests for tessera-dom
//!
//! Tree surgery corner cases and mutation recording boundaries.

use tessera_dom::{Document, DomError, MutationKind, Namespace, NodeType};

// ============================================================================
// TREE SURGERY
// ============================================================================

#[test]
fn test_insert_before_self_is_noop_position() {
    let mut doc = Document::new();
    let body = doc.body();
    let a = doc.append_element(body, "a").unwrap();
    let b = doc.append_element(body, "b").unwrap();

    doc.tree.insert_before(body, a, Some(a)).unwrap();
    assert_eq!(doc.tree.children(body).collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn test_cannot_insert_ancestor_into_descendant() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = doc.append_element(body, "div").unwrap();
    let inner = doc.append_element(outer, "span").unwrap();

    let err = doc.tree.append_child(inner, outer).unwrap_err();
    assert!(matches!(err, DomError::HierarchyRequest { .. }));
}

#[test]
fn test_reference_must_be_child() {
    let mut doc = Document::new();
    let body = doc.body();
    let head = doc.head();
    let stray = doc.append_element(head, "meta").unwrap();
    let node = doc.create_text("x");

    let err = doc.tree.insert_before(body, node, Some(stray)).unwrap_err();
    assert!(matches!(err, DomError::NotAChild { .. }));
}

#[test]
fn test_fragment_insert_empties_fragment() {
    let mut doc = Document::new();
    let body = doc.body();
    let frag = doc.create_document_fragment();
    let a = doc.append_text(frag, "a").unwrap();
    let b = doc.append_text(frag, "b").unwrap();

    doc.tree.append_child(body, frag).unwrap();
    assert_eq!(doc.tree.children(body).collect::<Vec<_>>(), vec![a, b]);
    assert_eq!(doc.tree.first_child(frag), None);
    assert_eq!(doc.tree.node_type(frag), Some(NodeType::DocumentFragment));
}

#[test]
fn test_split_text_on_char_boundary_only() {
    let mut doc = Document::new();
    let body = doc.body();
    let t = doc.append_text(body, "héllo").unwrap();

    let err = doc.tree.split_text(t, 2).unwrap_err();
    assert!(matches!(err, DomError::IndexSize { offset: 2, .. }));

    let tail = doc.tree.split_text(t, 3).unwrap();
    assert_eq!(doc.tree.char_data(t), Some("hé"));
    assert_eq!(doc.tree.char_data(tail), Some("llo"));
    assert_eq!(doc.tree.next_sibling(t), Some(tail));
}

#[test]
fn test_svg_namespace_inherited() {
    let mut doc = Document::new();
    let body = doc.body();
    let svg = doc.append_element(body, "svg").unwrap();
    let path = doc.append_element(svg, "path").unwrap();
    let fo = doc.append_element(svg, "foreignObject").unwrap();
    let div = doc.append_element(fo, "div").unwrap();

    assert_eq!(doc.tree.namespace(svg), Some(Namespace::Svg));
    assert_eq!(doc.tree.namespace(path), Some(Namespace::Svg));
    assert_eq!(doc.tree.namespace(div), Some(Namespace::Html));
}

// ============================================================================
// MUTATION RECORDING
// ============================================================================

#[test]
fn test_detached_subtree_is_invisible() {
    let mut doc = Document::new();
    let body = doc.body();
    doc.tree.observe(body);

    let li = doc.create_element_in("li", None);
    let text = doc.append_text(li, "x").unwrap();
    doc.tree.set_attribute(li, "class", "item").unwrap();
    doc.tree.set_char_data(text, "y").unwrap();
    assert!(doc.tree.mutations().is_empty());

    doc.tree.append_child(body, li).unwrap();
    assert_eq!(doc.tree.mutations().count(MutationKind::Insert), 1);
    assert_eq!(doc.tree.mutations().len(), 1);
}

#[test]
fn test_reinsert_attached_is_move() {
    let mut doc = Document::new();
    let body = doc.body();
    let a = doc.append_element(body, "a").unwrap();
    let b = doc.append_element(body, "b").unwrap();
    doc.tree.observe(body);

    doc.tree.insert_before(body, b, Some(a)).unwrap();
    let records = doc.tree.take_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, MutationKind::Move);
    assert_eq!(records[0].node, Some(b));
}

#[test]
fn test_moving_out_of_observed_root_is_removal() {
    let mut doc = Document::new();
    let body = doc.body();
    let head = doc.head();
    let a = doc.append_element(body, "a").unwrap();
    doc.tree.observe(body);

    doc.tree.append_child(head, a).unwrap();
    assert_eq!(doc.tree.mutations().count(MutationKind::Remove), 1);
}

#[test]
fn test_removing_absent_attribute_records_nothing() {
    let mut doc = Document::new();
    let body = doc.body();
    let div = doc.append_element(body, "div").unwrap();
    doc.tree.observe(body);

    doc.tree.remove_attribute(div, "hidden").unwrap();
    assert!(doc.tree.mutations().is_empty());
}

#[test]
fn test_unchanged_property_records_nothing() {
    let mut doc = Document::new();
    let body = doc.body();
    let input = doc.append_element(body, "input").unwrap();
    doc.tree.observe(body);

    doc.tree.set_checked(input, false).unwrap();
    doc.tree.set_value(input, None).unwrap();
    assert!(doc.tree.mutations().is_empty());

    doc.tree.set_checked(input, true).unwrap();
    assert_eq!(doc.tree.mutations().count(MutationKind::Property), 1);
}

#[test]
fn test_disconnect_keeps_records() {
    let mut doc = Document::new();
    let body = doc.body();
    doc.tree.observe(body);
    doc.append_element(body, "p").unwrap();
    doc.tree.disconnect();
    doc.append_element(body, "p").unwrap();

    assert_eq!(doc.tree.mutations().len(), 1);
}
