//! Builder tests for tessera-vdom
//!
//! Covers nesting, async branches finishing in any order, and error flow.

use std::cell::RefCell;
use std::rc::Rc;

use tessera_vdom::{Attrs, RenderEventKind, RenderOut, VElement, VNodeKind, VTree, VdomError, VNodeId};

fn texts(tree: &VTree, parent: VNodeId) -> Vec<String> {
    tree.children(parent)
        .filter_map(|id| match &tree.get(id).kind {
            VNodeKind::Text(t) => Some(t.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn test_nested_counted_elements() {
    let mut out = RenderOut::new();
    out.element(VElement::new("div", Attrs::new()), None, 2).unwrap();
    out.element(VElement::new("span", Attrs::new()), None, 1).unwrap();
    out.text("a").unwrap();
    out.text("b").unwrap();
    // div is complete, so this lands at the root
    out.text("c").unwrap();
    out.end();

    let result = out.result().unwrap();
    let tree = result.tree();
    let root = tree.root();
    let top: Vec<_> = tree.children(root).collect();
    assert_eq!(top.len(), 2);
    assert_eq!(tree.get(top[0]).as_element().unwrap().tag, "div");
    assert_eq!(texts(tree, top[0]), vec!["b"]);
    assert_eq!(texts(tree, root), vec!["c"]);
}

#[test]
fn test_fragment_keeps_key() {
    let mut out = RenderOut::new();
    out.begin_fragment("items", false).unwrap();
    out.text("x").unwrap();
    out.end_fragment().unwrap();
    out.end();

    let result = out.result().unwrap();
    let tree = result.tree();
    let frag = tree.first_child(tree.root()).unwrap();
    assert_eq!(tree.get(frag).key.as_deref(), Some("items"));
    assert_eq!(texts(tree, frag), vec!["x"]);
}

#[test]
fn test_owner_is_recorded() {
    let mut out = RenderOut::for_component("s0".into());
    out.text("hi").unwrap();
    out.end();
    let result = out.result().unwrap();
    let tree = result.tree();
    let text = tree.first_child(tree.root()).unwrap();
    assert_eq!(tree.get(text).owner.as_ref().map(|o| o.as_str()), Some("s0"));
}

#[test]
fn test_textarea_rejects_element_child() {
    let mut out = RenderOut::new();
    out.begin_element("textarea", Attrs::new(), None).unwrap();
    out.text("ok").unwrap();
    let err = out.begin_element("b", Attrs::new(), None).unwrap_err();
    assert!(matches!(err, VdomError::InvalidTextareaChild("element")));
}

// ============================================================================
// ASYNC BRANCHES
// ============================================================================

#[test]
fn test_async_branches_finish_out_of_order() {
    let mut out = RenderOut::new();
    out.text("before").unwrap();
    let mut first = out.begin_async().unwrap();
    let mut second = out.begin_async().unwrap();
    out.text("after").unwrap();
    out.end();

    second.text("two").unwrap();
    second.end();
    assert!(matches!(out.result(), Err(VdomError::Pending(1))));
    first.text("one").unwrap();
    first.end();

    let result = out.result().unwrap();
    assert_eq!(texts(result.tree(), result.root()), vec!["before", "one", "two", "after"]);
}

#[test]
fn test_nested_async_branch() {
    let mut out = RenderOut::new();
    let mut outer = out.begin_async().unwrap();
    out.end();
    let mut inner = outer.begin_async().unwrap();
    outer.text("outer").unwrap();
    outer.end();
    inner.text("inner").unwrap();
    inner.end();

    let result = out.result().unwrap();
    assert_eq!(texts(result.tree(), result.root()), vec!["inner", "outer"]);
}

#[test]
fn test_finished_future_resolves() {
    let mut out = RenderOut::new();
    let mut branch = out.begin_async().unwrap();
    out.end();
    let done = out.finished();

    smol::block_on(async move {
        let writer = async {
            smol::future::yield_now().await;
            branch.text("late").unwrap();
            branch.end();
        };
        let (result, ()) = smol::future::zip(done, writer).await;
        let result = result.unwrap();
        assert_eq!(texts(result.tree(), result.root()), vec!["late"]);
    });
}

#[test]
fn test_finished_after_completion() {
    let mut out = RenderOut::new();
    out.text("sync").unwrap();
    out.end();
    let result = smol::block_on(out.finished()).unwrap();
    assert_eq!(texts(result.tree(), result.root()), vec!["sync"]);
}

// ============================================================================
// EVENTS AND ERRORS
// ============================================================================

#[test]
fn test_error_listener_receives_error() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut out = RenderOut::new();
    let s = seen.clone();
    out.on(RenderEventKind::Error, move |event| {
        if let tessera_vdom::RenderEvent::Error(e) = event {
            s.borrow_mut().push(e.to_string());
        }
    });
    let mut branch = out.begin_async().unwrap();
    out.end();
    branch.error(anyhow::anyhow!("backend down")).unwrap();

    assert_eq!(*seen.borrow(), vec!["backend down".to_string()]);
    assert!(matches!(out.result(), Err(VdomError::Failed(_))));
}

#[test]
fn test_begin_async_event_names_placeholder() {
    let placeholders = Rc::new(RefCell::new(Vec::new()));
    let mut out = RenderOut::new();
    let p = placeholders.clone();
    out.once(RenderEventKind::BeginAsync, move |event| {
        if let tessera_vdom::RenderEvent::BeginAsync { placeholder } = event {
            p.borrow_mut().push(*placeholder);
        }
    });
    let mut a = out.begin_async().unwrap();
    let mut b = out.begin_async().unwrap();
    a.end();
    b.end();
    out.end();

    assert_eq!(placeholders.borrow().len(), 1);
    assert_eq!(placeholders.borrow()[0], a.parent());
}
