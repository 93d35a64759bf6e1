//! Render builder
//!
//! `RenderOut` is the stack-based API render functions write into. Nodes
//! with a declared child count close themselves once their last child
//! arrives, so compiled templates only need explicit `end_*` calls for
//! content whose size is not known up front.
//!
//! Async branches (`begin_async`) write into a document-fragment placeholder
//! in the same tree. All builders of one render share a counter of open
//! branches; the render finishes when the last of them ends, whatever the
//! order.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use smol::channel::{Receiver, Sender};

use crate::emitter::{EmitterEvent, EventEmitter};
use crate::node::{ComponentId, Input, VComponent, VElement, VNodeKind};
use crate::tree::{VNodeId, VTree};
use crate::{Attrs, RenderResult, VdomError, VdomResult};

/// Builder lifecycle events
#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// An async branch was opened at `placeholder`
    BeginAsync { placeholder: VNodeId },
    /// An async branch completed
    Update { placeholder: VNodeId },
    /// Every branch has ended
    Finish,
    /// A branch reported an error
    Error(Arc<anyhow::Error>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderEventKind {
    BeginAsync,
    Update,
    Finish,
    Error,
}

impl EmitterEvent for RenderEvent {
    type Kind = RenderEventKind;

    fn kind(&self) -> RenderEventKind {
        match self {
            Self::BeginAsync { .. } => RenderEventKind::BeginAsync,
            Self::Update { .. } => RenderEventKind::Update,
            Self::Finish => RenderEventKind::Finish,
            Self::Error(_) => RenderEventKind::Error,
        }
    }

    fn error(&self) -> Option<Arc<anyhow::Error>> {
        match self {
            Self::Error(e) => Some(e.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    remaining: usize,
    result: Option<Rc<VTree>>,
    error: Option<Arc<anyhow::Error>>,
}

#[derive(Debug)]
struct Shared {
    tree: RefCell<VTree>,
    progress: RefCell<Progress>,
    events: RefCell<EventEmitter<RenderEvent>>,
    done_tx: Sender<()>,
    done_rx: Receiver<()>,
}

impl Shared {
    fn emit(&self, event: RenderEvent) -> VdomResult<bool> {
        // listeners may register more listeners while running
        let mut emitter = std::mem::take(&mut *self.events.borrow_mut());
        let result = emitter.emit(&event);
        let mut slot = self.events.borrow_mut();
        let added = std::mem::replace(&mut *slot, emitter);
        slot.absorb(added);
        result
    }

    fn outcome(&self) -> VdomResult<RenderResult> {
        let progress = self.progress.borrow();
        if let Some(err) = &progress.error {
            return Err(VdomError::Failed(err.clone()));
        }
        match &progress.result {
            Some(tree) => Ok(RenderResult::new(tree.clone())),
            None => Err(VdomError::Pending(progress.remaining)),
        }
    }
}

/// Append-only virtual tree builder
#[derive(Debug)]
pub struct RenderOut {
    shared: Rc<Shared>,
    owner: Option<ComponentId>,
    parent: VNodeId,
    stack: Vec<VNodeId>,
    ended: bool,
    placeholder: Option<VNodeId>,
}

impl Default for RenderOut {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderOut {
    /// Builder for a render with no owning component
    pub fn new() -> Self {
        let (done_tx, done_rx) = smol::channel::bounded(1);
        let tree = VTree::new();
        let root = tree.root();
        Self {
            shared: Rc::new(Shared {
                tree: RefCell::new(tree),
                progress: RefCell::new(Progress {
                    remaining: 1,
                    ..Progress::default()
                }),
                events: RefCell::new(EventEmitter::new()),
                done_tx,
                done_rx,
            }),
            owner: None,
            parent: root,
            stack: Vec::new(),
            ended: false,
            placeholder: None,
        }
    }

    /// Builder whose nodes are owned by `owner`
    pub fn for_component(owner: ComponentId) -> Self {
        let mut out = Self::new();
        out.owner = Some(owner);
        out
    }

    pub fn owner(&self) -> Option<&ComponentId> {
        self.owner.as_ref()
    }

    /// Current insertion point
    pub fn parent(&self) -> VNodeId {
        self.parent
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn create(&self, kind: VNodeKind, key: Option<&str>, count: Option<usize>) -> VdomResult<VNodeId> {
        if self.ended {
            return Err(VdomError::Ended);
        }
        let mut tree = self.shared.tree.borrow_mut();
        let key = key.map(str::to_string);
        let id = match count {
            Some(count) => tree.create_counted(kind, key, self.owner.clone(), count),
            None => tree.create(kind, key, self.owner.clone()),
        };
        tree.append_child(self.parent, id)?;
        Ok(id)
    }

    fn leaf(&mut self, kind: VNodeKind, key: Option<&str>) -> VdomResult<VNodeId> {
        let id = self.create(kind, key, None)?;
        self.parent = self.shared.tree.borrow().finish_child(self.parent);
        Ok(id)
    }

    fn open(&mut self, kind: VNodeKind, key: Option<&str>) -> VdomResult<VNodeId> {
        let id = self.create(kind, key, None)?;
        self.stack.push(id);
        self.parent = id;
        Ok(id)
    }

    fn close(&mut self, what: &'static str, is_kind: impl Fn(&VNodeKind) -> bool) -> VdomResult<()> {
        let tree = self.shared.tree.borrow();
        let top = match self.stack.last() {
            Some(&top) if is_kind(&tree.get(top).kind) => top,
            _ => return Err(VdomError::UnbalancedEnd(what)),
        };
        self.stack.pop();
        self.parent = match tree.get(top).parent() {
            Some(parent) => tree.finish_child(parent),
            None => tree.root(),
        };
        Ok(())
    }

    /// Open an element whose children are closed with [`RenderOut::end_element`]
    pub fn begin_element(&mut self, tag: &str, attrs: impl Into<Rc<Attrs>>, key: Option<&str>) -> VdomResult<()> {
        self.begin_element_node(VElement::new(tag, attrs), key)
    }

    pub fn begin_element_node(&mut self, element: VElement, key: Option<&str>) -> VdomResult<()> {
        self.open(VNodeKind::Element(element), key).map(|_| ())
    }

    pub fn end_element(&mut self) -> VdomResult<()> {
        self.close("end_element", |k| matches!(k, VNodeKind::Element(_)))
    }

    /// Append an element that will receive exactly `child_count` children.
    ///
    /// With `0` the element is complete immediately; otherwise following
    /// appends go into it until the count is reached.
    pub fn element(&mut self, element: VElement, key: Option<&str>, child_count: usize) -> VdomResult<()> {
        let id = self.create(VNodeKind::Element(element), key, Some(child_count))?;
        let tree = self.shared.tree.borrow();
        self.parent = if child_count == 0 {
            tree.finish_child(self.parent)
        } else {
            id
        };
        Ok(())
    }

    /// Shorthand for an element holding one text node
    pub fn element_with_text(&mut self, tag: &str, attrs: impl Into<Rc<Attrs>>, key: Option<&str>, text: &str) -> VdomResult<()> {
        self.element(VElement::new(tag, attrs), key, 1)?;
        self.text(text)
    }

    pub fn text(&mut self, text: &str) -> VdomResult<()> {
        self.leaf(VNodeKind::Text(text.to_string()), None).map(|_| ())
    }

    pub fn comment(&mut self, text: &str) -> VdomResult<()> {
        self.leaf(VNodeKind::Comment(text.to_string()), None).map(|_| ())
    }

    /// Open a keyed fragment rendered between boundary markers
    pub fn begin_fragment(&mut self, key: &str, preserve: bool) -> VdomResult<()> {
        self.open(VNodeKind::Fragment { preserve }, Some(key)).map(|_| ())
    }

    pub fn end_fragment(&mut self) -> VdomResult<()> {
        self.close("end_fragment", |k| matches!(k, VNodeKind::Fragment { .. }))
    }

    /// Place the component `type_name` under `key`
    pub fn component(&mut self, type_name: &str, key: &str, input: Input) -> VdomResult<()> {
        let component = VComponent {
            type_name: type_name.to_string(),
            input,
            preserve: false,
        };
        self.leaf(VNodeKind::Component(component), Some(key)).map(|_| ())
    }

    /// Keep an existing component exactly as it is
    pub fn preserved_component(&mut self, type_name: &str, key: &str) -> VdomResult<()> {
        let component = VComponent {
            type_name: type_name.to_string(),
            input: Input::new(),
            preserve: true,
        };
        self.leaf(VNodeKind::Component(component), Some(key)).map(|_| ())
    }

    /// Open an async branch at the current position.
    ///
    /// The returned builder writes into a placeholder; the render cannot
    /// finish until it has been ended.
    pub fn begin_async(&mut self) -> VdomResult<RenderOut> {
        let placeholder = self.leaf(VNodeKind::DocumentFragment, None)?;
        self.shared.progress.borrow_mut().remaining += 1;
        tracing::trace!(?placeholder, "begin async branch");
        self.shared.emit(RenderEvent::BeginAsync { placeholder })?;
        Ok(RenderOut {
            shared: self.shared.clone(),
            owner: self.owner.clone(),
            parent: placeholder,
            stack: Vec::new(),
            ended: false,
            placeholder: Some(placeholder),
        })
    }

    /// End this builder. The render finishes once every builder has ended.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        if !self.stack.is_empty() {
            tracing::warn!(open = self.stack.len(), "builder ended with unclosed nodes");
        }
        let remaining = {
            let mut progress = self.shared.progress.borrow_mut();
            progress.remaining = progress.remaining.saturating_sub(1);
            progress.remaining
        };
        if let Some(placeholder) = self.placeholder {
            // update listeners are optional
            let _ = self.shared.emit(RenderEvent::Update { placeholder });
        }
        if remaining == 0 {
            self.finish();
        }
    }

    fn finish(&self) {
        let tree = std::mem::take(&mut *self.shared.tree.borrow_mut());
        tracing::debug!(nodes = tree.len(), "render finished");
        self.shared.progress.borrow_mut().result = Some(Rc::new(tree));
        let _ = self.shared.emit(RenderEvent::Finish);
        self.shared.done_tx.close();
    }

    /// Report a failure and end this builder.
    ///
    /// The builder is ended whether or not an error listener exists; without
    /// one the error comes back as [`VdomError::Unhandled`].
    pub fn error(&mut self, err: anyhow::Error) -> VdomResult<()> {
        let err = Arc::new(err);
        self.shared.progress.borrow_mut().error.get_or_insert_with(|| err.clone());
        let emitted = self.shared.emit(RenderEvent::Error(err));
        self.end();
        emitted.map(|_| ())
    }

    /// Listen for builder events
    pub fn on(&mut self, kind: RenderEventKind, listener: impl FnMut(&RenderEvent) + 'static) {
        self.shared.events.borrow_mut().on(kind, listener);
    }

    pub fn once(&mut self, kind: RenderEventKind, listener: impl FnMut(&RenderEvent) + 'static) {
        self.shared.events.borrow_mut().once(kind, listener);
    }

    /// Finished result, or [`VdomError::Pending`] while branches are open
    pub fn result(&self) -> VdomResult<RenderResult> {
        self.shared.outcome()
    }

    /// Resolves once every branch has ended
    pub fn finished(&self) -> impl Future<Output = VdomResult<RenderResult>> + 'static {
        let shared = self.shared.clone();
        async move {
            // the sender is closed, never written, when the render finishes
            let _ = shared.done_rx.recv().await;
            shared.outcome()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_counted_elements_close_themselves() {
        let mut out = RenderOut::new();
        out.begin_element("ul", Attrs::new(), None).unwrap();
        out.element_with_text("li", Attrs::new(), Some("x"), "1").unwrap();
        out.element_with_text("li", Attrs::new(), Some("y"), "2").unwrap();
        out.end_element().unwrap();
        out.end();

        let result = out.result().unwrap();
        let tree = result.tree();
        let ul = tree.first_child(tree.root()).unwrap();
        let keys: Vec<_> = tree.children(ul).map(|li| tree.get(li).key.clone()).collect();
        assert_eq!(keys, vec![Some("x".to_string()), Some("y".to_string())]);
    }

    #[test]
    fn test_zero_count_element_is_leaf() {
        let mut out = RenderOut::new();
        out.element(VElement::new("br", Attrs::new()), None, 0).unwrap();
        out.text("after").unwrap();
        out.end();

        let result = out.result().unwrap();
        let tree = result.tree();
        assert_eq!(tree.children(tree.root()).count(), 2);
    }

    #[test]
    fn test_unbalanced_end() {
        let mut out = RenderOut::new();
        assert!(matches!(out.end_element(), Err(VdomError::UnbalancedEnd(_))));
        out.begin_fragment("f", false).unwrap();
        assert!(matches!(out.end_element(), Err(VdomError::UnbalancedEnd(_))));
        out.end_fragment().unwrap();
    }

    #[test]
    fn test_pending_until_async_branch_ends() {
        let mut out = RenderOut::new();
        let mut branch = out.begin_async().unwrap();
        out.end();
        assert!(matches!(out.result(), Err(VdomError::Pending(1))));

        branch.text("late").unwrap();
        branch.end();
        let result = out.result().unwrap();
        assert_eq!(result.tree().children(result.root()).count(), 1);
    }

    #[test]
    fn test_write_after_end() {
        let mut out = RenderOut::new();
        out.end();
        assert!(matches!(out.text("x"), Err(VdomError::Ended)));
    }

    #[test]
    fn test_error_ends_builder_even_without_listener() {
        let mut out = RenderOut::new();
        let err = out.error(anyhow::anyhow!("fetch failed"));
        assert!(matches!(err, Err(VdomError::Unhandled(_))));
        assert!(out.is_ended());
        assert!(matches!(out.result(), Err(VdomError::Failed(_))));
    }

    #[test]
    fn test_events() {
        let finished = Rc::new(Cell::new(0));
        let updates = Rc::new(Cell::new(0));
        let mut out = RenderOut::new();
        let f = finished.clone();
        out.on(RenderEventKind::Finish, move |_| f.set(f.get() + 1));
        let u = updates.clone();
        out.on(RenderEventKind::Update, move |_| u.set(u.get() + 1));

        let mut a = out.begin_async().unwrap();
        let mut b = out.begin_async().unwrap();
        out.end();
        b.end();
        a.end();

        assert_eq!(updates.get(), 2);
        assert_eq!(finished.get(), 1);
    }
}
