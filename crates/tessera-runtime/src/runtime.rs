//! Runtime
//!
//! Owns the document, the shadow side-tables and every mounted component.
//! All rendering goes through `&mut Runtime`, so only one pass runs at a
//! time.

use std::collections::HashMap;

use serde_json::Value;
use tessera_dom::{Document, DomResult, DomTree, NodeId};
use tessera_vdom::{ComponentId, Input, RenderResult, VTree};

use crate::component::{Behavior, Component, Phase, State, shallow_equal};
use crate::delegation::EventDelegation;
use crate::keys::indexed;
use crate::morph::{Hook, Pass};
use crate::registry::ComponentRegistry;
use crate::scheduler::Scheduler;
use crate::shadow::ShadowTable;
use crate::{Config, RuntimeError, RuntimeResult};

/// Reconciliation runtime for one document
pub struct Runtime {
    pub(crate) doc: Document,
    pub(crate) config: Config,
    pub(crate) registry: ComponentRegistry,
    pub(crate) components: HashMap<ComponentId, Component>,
    pub(crate) shadows: ShadowTable,
    /// Keyed nodes rendered without an owner, per container
    pub(crate) root_keyed: HashMap<NodeId, HashMap<String, NodeId>>,
    pub(crate) delegation: EventDelegation,
    pub(crate) scheduler: Scheduler,
    next_root: u32,
}

impl Runtime {
    /// Runtime over a fresh `<html><head></head><body></body></html>` document
    pub fn new(config: Config) -> Self {
        Self::with_document(Document::new(), config)
    }

    pub fn with_document(doc: Document, config: Config) -> Self {
        Self {
            doc,
            config,
            registry: ComponentRegistry::new(),
            components: HashMap::new(),
            shadows: ShadowTable::default(),
            root_keyed: HashMap::new(),
            delegation: EventDelegation::new(),
            scheduler: Scheduler::default(),
            next_root: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn delegation(&self) -> &EventDelegation {
        &self.delegation
    }

    /// Register a component type
    pub fn register<B, F>(&mut self, type_name: &str, factory: F)
    where
        B: Behavior + 'static,
        F: Fn() -> B + 'static,
    {
        self.registry.register(type_name, factory);
    }

    pub(crate) fn next_root_id(&mut self) -> ComponentId {
        let id = ComponentId::new(format!("{}{}", self.config.id_prefix, self.next_root));
        self.next_root += 1;
        id
    }

    pub(crate) fn observe_if_recording(&mut self, container: NodeId) {
        if self.config.record_mutations {
            self.doc.tree.observe(container);
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Create a component and append its DOM to `container`
    pub fn mount(&mut self, type_name: &str, input: Input, container: NodeId) -> RuntimeResult<ComponentId> {
        let id = self.next_root_id();
        tracing::info!(component = %id, type_name, %container, "mount");
        self.observe_if_recording(container);
        self.instantiate(&id, type_name, input, None, None)?;

        let (start, end) = self.markers(&id)?;
        self.doc.tree.append_child(container, start)?;
        self.doc.tree.append_child(container, end)?;

        let mut pass = Pass::default();
        pass.rendered.insert(id.clone());
        self.render_component(&id, &mut pass)?;
        pass.completed.push((id.clone(), Hook::Mount));
        self.finish_pass(pass)?;
        Ok(id)
    }

    /// Mutate `container`'s children to match `tree`. Components in the tree
    /// without an explicit owner are scoped to the container.
    pub fn reconcile(&mut self, container: NodeId, tree: &VTree, owner: Option<&ComponentId>) -> RuntimeResult<()> {
        self.observe_if_recording(container);
        let mut pass = Pass::default();
        self.reconcile_in(container, tree, owner, &mut pass)?;
        self.finish_pass(pass)
    }

    /// Reconcile `container` against a finished render
    pub fn render_into(&mut self, container: NodeId, result: &RenderResult) -> RuntimeResult<()> {
        self.reconcile(container, result.tree(), None)
    }

    /// Virtual tree of existing markup
    pub fn virtualize(&self, node: NodeId) -> RuntimeResult<VTree> {
        crate::hydrate::virtualize(&self.doc, node)
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    fn parent_of(&self, node: NodeId) -> RuntimeResult<NodeId> {
        self.doc.tree.parent(node).ok_or(RuntimeError::Detached(node))
    }

    /// Render into a fresh document fragment, let `place` put the fragment in
    /// the document and return the inserted top-level nodes
    fn place(
        &mut self,
        result: &RenderResult,
        discard: &[NodeId],
        place: impl FnOnce(&mut DomTree, NodeId) -> DomResult<()>,
    ) -> RuntimeResult<Vec<NodeId>> {
        let frag = self.doc.create_document_fragment();
        let mut pass = Pass::default();
        self.reconcile_in(frag, result.tree(), None, &mut pass)?;
        let nodes: Vec<NodeId> = self.doc.tree.children(frag).collect();
        place(&mut self.doc.tree, frag)?;
        for &node in discard {
            self.detach_unit(node, &mut pass)?;
        }
        self.finish_pass(pass)?;
        Ok(nodes)
    }

    /// Render into a detached document fragment
    pub fn materialize(&mut self, result: &RenderResult) -> RuntimeResult<NodeId> {
        let frag = self.doc.create_document_fragment();
        let mut pass = Pass::default();
        self.reconcile_in(frag, result.tree(), None, &mut pass)?;
        self.finish_pass(pass)?;
        Ok(frag)
    }

    pub fn append_to(&mut self, result: &RenderResult, parent: NodeId) -> RuntimeResult<Vec<NodeId>> {
        self.place(result, &[], |tree, frag| tree.append_child(parent, frag))
    }

    pub fn prepend_to(&mut self, result: &RenderResult, parent: NodeId) -> RuntimeResult<Vec<NodeId>> {
        self.place(result, &[], |tree, frag| {
            let first = tree.first_child(parent);
            tree.insert_before(parent, frag, first)
        })
    }

    pub fn insert_before(&mut self, result: &RenderResult, reference: NodeId) -> RuntimeResult<Vec<NodeId>> {
        let parent = self.parent_of(reference)?;
        self.place(result, &[], |tree, frag| tree.insert_before(parent, frag, Some(reference)))
    }

    pub fn insert_after(&mut self, result: &RenderResult, reference: NodeId) -> RuntimeResult<Vec<NodeId>> {
        let parent = self.parent_of(reference)?;
        self.place(result, &[], |tree, frag| {
            let next = tree.next_sibling(reference);
            tree.insert_before(parent, frag, next)
        })
    }

    /// Put the render where `target` is; components under `target` are
    /// destroyed
    pub fn replace(&mut self, result: &RenderResult, target: NodeId) -> RuntimeResult<Vec<NodeId>> {
        let parent = self.parent_of(target)?;
        self.place(result, &[target], |tree, frag| tree.insert_before(parent, frag, Some(target)))
    }

    /// Replace all children of `parent` with the render, without morphing
    pub fn replace_children_of(&mut self, result: &RenderResult, parent: NodeId) -> RuntimeResult<Vec<NodeId>> {
        let frag = self.doc.create_document_fragment();
        let mut pass = Pass::default();
        self.reconcile_in(frag, result.tree(), None, &mut pass)?;
        let nodes: Vec<NodeId> = self.doc.tree.children(frag).collect();
        self.detach_children(parent, &mut pass)?;
        self.doc.tree.append_child(parent, frag)?;
        self.finish_pass(pass)?;
        Ok(nodes)
    }

    // ========================================================================
    // Components
    // ========================================================================

    fn mounted(&mut self, id: &ComponentId) -> RuntimeResult<&mut Component> {
        self.components
            .get_mut(id)
            .ok_or_else(|| RuntimeError::UnknownComponent(id.clone()))
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Change one state key; queues an update when the value differs
    pub fn set_state(&mut self, id: &ComponentId, key: &str, value: impl Into<Value>) -> RuntimeResult<()> {
        if self.mounted(id)?.state.set(key, value.into()) {
            self.scheduler.queue(id.clone());
        }
        Ok(())
    }

    pub fn state(&self, id: &ComponentId) -> Option<&State> {
        self.components.get(id).map(|c| c.state.data())
    }

    /// Replace a component's input; queues an update unless it is
    /// shallow-equal to the current one
    pub fn set_input(&mut self, id: &ComponentId, input: Input) -> RuntimeResult<()> {
        let component = self.mounted(id)?;
        if shallow_equal(&component.input, &input) {
            return Ok(());
        }
        component.input = input;
        component.input_changed = true;
        self.scheduler.queue(id.clone());
        Ok(())
    }

    pub fn input(&self, id: &ComponentId) -> Option<&Input> {
        self.components.get(id).map(|c| &c.input)
    }

    pub fn force_update(&mut self, id: &ComponentId) -> RuntimeResult<()> {
        self.mounted(id)?.force = true;
        self.scheduler.queue(id.clone());
        Ok(())
    }

    /// Flush one component now instead of waiting for `tick`
    pub fn update(&mut self, id: &ComponentId) -> RuntimeResult<()> {
        self.scheduler.dequeue(id);
        self.update_component(id)
    }

    /// Destroy a component and remove its DOM
    pub fn destroy(&mut self, id: &ComponentId) -> RuntimeResult<()> {
        if !self.components.contains_key(id) {
            return Err(RuntimeError::UnknownComponent(id.clone()));
        }
        self.destroy_component(id, true)
    }

    pub fn is_destroyed(&self, id: &ComponentId) -> bool {
        !self.components.contains_key(id)
    }

    /// Register a teardown run when the component is destroyed
    pub fn subscribe(&mut self, id: &ComponentId, teardown: impl FnOnce() + 'static) -> RuntimeResult<()> {
        self.mounted(id)?.teardowns.push(Box::new(teardown));
        Ok(())
    }

    /// Top-level DOM nodes of a component, markers excluded
    pub fn root_nodes(&self, id: &ComponentId) -> Vec<NodeId> {
        let Some(component) = self.components.get(id) else {
            return Vec::new();
        };
        std::iter::successors(self.doc.tree.next_sibling(component.start), |&n| {
            self.doc.tree.next_sibling(n)
        })
        .take_while(|&n| n != component.end)
        .collect()
    }

    /// Keyed nodes from a component's last render
    pub fn keyed(&self, id: &ComponentId) -> Option<&HashMap<String, NodeId>> {
        self.components.get(id).map(|c| &c.keyed)
    }

    /// Element rendered under `key`
    pub fn get_el(&self, id: &ComponentId, key: &str) -> Option<NodeId> {
        let node = *self.components.get(id)?.keyed.get(key)?;
        self.shadows.element(node).map(|_| node)
    }

    /// Elements rendered under the repeated key `base[]`, in order
    pub fn get_els(&self, id: &ComponentId, base: &str) -> Vec<NodeId> {
        let Some(component) = self.components.get(id) else {
            return Vec::new();
        };
        let entries = component
            .keyed
            .iter()
            .filter(|(_, node)| self.shadows.element(**node).is_some())
            .map(|(key, &node)| (key.as_str(), node));
        indexed(entries, base)
    }

    /// Child component rendered under `key`
    pub fn get_component(&self, id: &ComponentId, key: &str) -> Option<ComponentId> {
        let child = id.child(key);
        self.components.contains_key(&child).then_some(child)
    }

    /// Child components rendered under the repeated key `base[]`, in order
    pub fn get_components(&self, id: &ComponentId, base: &str) -> Vec<ComponentId> {
        let prefix = format!("{}-", id.as_str());
        let entries = self
            .components
            .values()
            .filter(|c| c.parent.as_ref() == Some(id))
            .filter_map(|c| Some((c.id.as_str().strip_prefix(prefix.as_str())?, c.id.clone())));
        indexed(entries, base)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Destroy a component and every component below it
    pub(crate) fn destroy_component(&mut self, id: &ComponentId, remove_dom: bool) -> RuntimeResult<()> {
        let Some(mut component) = self.components.remove(id) else {
            return Ok(());
        };
        tracing::debug!(component = %id, "destroy");
        component.phase = Phase::Destroyed;
        let hook = component.run_hook("on_destroy", |b, cx| b.on_destroy(cx));

        let children: Vec<ComponentId> = self
            .components
            .values()
            .filter(|c| c.parent.as_ref() == Some(id))
            .map(|c| c.id.clone())
            .collect();
        for child in children {
            self.destroy_component(&child, false)?;
        }
        for teardown in component.teardowns.drain(..) {
            teardown();
        }

        if remove_dom {
            for node in self.unit_nodes(component.start) {
                self.doc.tree.detach(node)?;
                self.forget_subtree(node);
            }
        }
        self.scheduler.dequeue(id);
        hook
    }

    /// Apply pending changes of one component
    pub(crate) fn update_component(&mut self, id: &ComponentId) -> RuntimeResult<()> {
        let Some(component) = self.components.get_mut(id) else {
            return Ok(());
        };
        if !component.is_dirty() {
            return Ok(());
        }

        let behavior = component.behavior.clone();
        let handled = !component.input_changed
            && !component.force
            && component.state.dirty_keys().iter().all(|k| behavior.handles_state(k));
        if handled {
            let changes: Vec<(String, Value, Option<Value>)> = component
                .state
                .dirty_keys()
                .iter()
                .map(|k| {
                    let new = component.state.get(k).cloned().unwrap_or(Value::Null);
                    (k.clone(), new, component.state.old_value(k).cloned())
                })
                .collect();
            component.state.clean();
            tracing::debug!(component = %id, keys = changes.len(), "state handlers");
            for (key, new, old) in changes {
                component.run_hook("update_state", |b, cx| b.update_state(&key, &new, old.as_ref(), cx))?;
            }
            if component.is_dirty() {
                self.scheduler.queue(id.clone());
            }
            return Ok(());
        }

        let mut pass = Pass::default();
        pass.rendered.insert(id.clone());
        self.render_component(id, &mut pass)?;
        pass.completed.push((id.clone(), Hook::Update));
        self.finish_pass(pass)
    }

    fn depth(&self, id: &ComponentId) -> usize {
        let mut depth = 0;
        let mut current = self.components.get(id).and_then(|c| c.parent.as_ref());
        while let Some(parent) = current {
            depth += 1;
            current = self.components.get(parent).and_then(|c| c.parent.as_ref());
        }
        depth
    }

    /// Update components parents first. A parent's re-render may already
    /// have flushed a child, which is then clean and skipped.
    fn flush(&mut self, mut ids: Vec<ComponentId>) -> RuntimeResult<usize> {
        ids.sort_by_cached_key(|id| self.depth(id));
        let mut count = 0;
        for id in ids {
            if !self.scheduler.is_queued(&id) {
                continue;
            }
            self.scheduler.dequeue(&id);
            self.update_component(&id)?;
            count += 1;
        }
        Ok(count)
    }

    /// Flush everything queued outside a batch, including updates queued by
    /// the flush itself. Returns the number of components processed.
    pub fn tick(&mut self) -> RuntimeResult<usize> {
        let mut total = 0;
        for _ in 0..self.config.max_flush_rounds {
            let pending = self.scheduler.take_pending();
            if pending.is_empty() {
                return Ok(total);
            }
            total += self.flush(pending)?;
        }
        let left = self.scheduler.take_pending();
        if !left.is_empty() {
            tracing::warn!(
                rounds = self.config.max_flush_rounds,
                pending = left.len(),
                "flush rounds exhausted, leaving updates queued"
            );
            self.scheduler.restore(left);
        }
        Ok(total)
    }

    /// Run `f` in a batch; updates it queues flush once when it returns.
    /// Batches nest, the innermost one flushing first.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> RuntimeResult<R>) -> RuntimeResult<R> {
        self.scheduler.begin_batch();
        let result = f(self);
        let queued = self.scheduler.end_batch();
        match result {
            Ok(value) => {
                self.flush(queued)?;
                Ok(value)
            }
            Err(err) => {
                self.scheduler.restore(queued);
                Err(err)
            }
        }
    }

    /// Whether any update waits for `tick`
    pub fn has_pending(&self) -> bool {
        self.scheduler.pending_len() > 0
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("components", &self.components.len())
            .field("shadows", &self.shadows.len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
