//! Reconciler
//!
//! Walks the real children of a parent and the virtual children of a node
//! in lockstep, reusing real nodes wherever it can. Keyed nodes are found
//! through the owner's keyed table, unkeyed ones by scanning forward for a
//! compatible node. Component placeholders are resolved to live instances
//! and rendered lazily, so a pass descends through the component tree as
//! it goes.
//!
//! Detached elements, fragments and component roots stay in the document
//! until the pass ends; re-inserting one in the same pass cancels the
//! detach.

mod attrs;
mod special;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tessera_dom::{NodeId, NodeType};
use tessera_vdom::{ComponentId, ElementFlags, Input, RenderOut, RenderResult, VElement, VNodeId, VNodeKind, VTree};

use crate::component::{Component, Phase, shallow_equal};
use crate::hydrate::dom_attrs;
use crate::keys::{Resolved, Scope};
use crate::shadow::{ElementShadow, FragmentShadow};
use crate::{Runtime, RuntimeError, RuntimeResult};

/// Lifecycle hook owed to a component once the pass completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    Mount,
    Update,
}

/// What to do with real nodes left after the last virtual child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Finish {
    Detach,
    /// Leave them; used when adopting existing markup
    Stop,
}

/// Real children `[cursor, end)` of `parent`
#[derive(Debug, Clone, Copy)]
pub(crate) struct Span {
    pub parent: NodeId,
    pub end: Option<NodeId>,
}

/// Book-keeping of one reconciliation pass
#[derive(Debug, Default)]
pub(crate) struct Pass {
    pub hydrating: bool,
    /// Components referenced by a placeholder rendered in this pass
    pub rendered: HashSet<ComponentId>,
    claimed: HashSet<NodeId>,
    keyed: HashMap<Scope, HashMap<String, NodeId>>,
    detached: Vec<NodeId>,
    detached_set: HashSet<NodeId>,
    /// Hooks in completion order, children before parents
    pub completed: Vec<(ComponentId, Hook)>,
}

impl Pass {
    pub fn hydrating() -> Self {
        Self {
            hydrating: true,
            ..Self::default()
        }
    }

    fn defer(&mut self, node: NodeId) {
        if self.detached_set.insert(node) {
            self.detached.push(node);
        }
    }

    fn cancel(&mut self, node: NodeId) {
        self.detached_set.remove(&node);
    }

    fn claim(&mut self, scope: Scope, key: &str, node: NodeId) {
        self.claimed.insert(node);
        self.keyed.entry(scope).or_default().insert(key.to_string(), node);
    }
}

impl Runtime {
    fn clip(&self, span: Span, node: Option<NodeId>) -> Option<NodeId> {
        node.filter(|&n| Some(n) != span.end)
    }

    /// Last real node of the unit starting at `node`
    fn unit_end(&self, node: NodeId) -> NodeId {
        self.shadows.fragment(node).map_or(node, |f| f.end)
    }

    /// Real node after the unit starting at `node`
    fn after(&self, span: Span, node: NodeId) -> Option<NodeId> {
        self.clip(span, self.doc.tree.next_sibling(self.unit_end(node)))
    }

    /// Nodes of the unit starting at `node`: the node, or a whole marker range
    pub(crate) fn unit_nodes(&self, node: NodeId) -> Vec<NodeId> {
        let end = self.unit_end(node);
        let mut nodes = vec![node];
        let mut current = node;
        while current != end {
            match self.doc.tree.next_sibling(current) {
                Some(next) => {
                    nodes.push(next);
                    current = next;
                }
                None => break,
            }
        }
        nodes
    }

    /// Move a unit before `reference`, unless it already sits there
    fn move_unit(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) -> RuntimeResult<()> {
        let end = self.unit_end(node);
        if self.doc.tree.parent(node) == Some(parent) && self.doc.tree.next_sibling(end) == reference {
            return Ok(());
        }
        tracing::trace!(%node, "move");
        for n in self.unit_nodes(node) {
            self.doc.tree.insert_before(parent, n, reference)?;
        }
        Ok(())
    }

    /// Detach a unit: text and comments go now, the rest at the end of the pass
    pub(crate) fn detach_unit(&mut self, node: NodeId, pass: &mut Pass) -> RuntimeResult<()> {
        match self.doc.tree.node_type(node) {
            Some(NodeType::Text | NodeType::Comment) if !self.shadows.is_fragment_start(node) => {
                self.doc.tree.detach(node)?;
            }
            Some(_) => {
                tracing::trace!(%node, "detach deferred");
                pass.defer(node);
            }
            None => {}
        }
        Ok(())
    }

    /// Reconcile the real children in `span`, starting at `start`, with the
    /// children of `vparent`. Returns the first real node not consumed.
    pub(crate) fn morph_children(
        &mut self,
        span: Span,
        start: Option<NodeId>,
        r: &Resolved<'_>,
        vparent: VNodeId,
        finish: Finish,
        pass: &mut Pass,
    ) -> RuntimeResult<Option<NodeId>> {
        let mut cur = self.clip(span, start);
        let mut vchild = r.tree.first_child(vparent);
        while let Some(v) = vchild {
            let next_v = r.tree.next_sibling(v);
            cur = match &r.tree.get(v).kind {
                VNodeKind::Component(_) => self.morph_component(span, cur, r, v, pass)?,
                VNodeKind::Fragment { .. } => self.morph_keyed(span, cur, r, v, next_v, pass)?,
                VNodeKind::Element(_) if r.key(v).is_some() => self.morph_keyed(span, cur, r, v, next_v, pass)?,
                _ => self.morph_unkeyed(span, cur, r, v, next_v, pass)?,
            };
            vchild = next_v;
        }

        if finish == Finish::Detach {
            while let Some(node) = cur {
                let next = self.after(span, node);
                self.detach_stale(node, pass)?;
                cur = next;
            }
        }
        Ok(cur)
    }

    // ------------------------------------------------------------------
    // Unkeyed nodes
    // ------------------------------------------------------------------

    fn compatible(&self, node: NodeId, v: &VNodeKind, hydrating: bool) -> bool {
        let tree = &self.doc.tree;
        match (v, tree.node_type(node)) {
            (VNodeKind::Text(_), Some(NodeType::Text)) => !self.shadows.is_marker(node),
            (VNodeKind::Comment(_), Some(NodeType::Comment)) => true,
            (VNodeKind::Element(el), Some(NodeType::Element)) => match self.shadows.element(node) {
                Some(shadow) => shadow.key.is_none() && shadow.tag == el.tag,
                None => hydrating && tree.tag_name(node) == Some(el.tag.as_str()),
            },
            _ => false,
        }
    }

    fn morph_unkeyed(
        &mut self,
        span: Span,
        cur: Option<NodeId>,
        r: &Resolved<'_>,
        v: VNodeId,
        next_v: Option<VNodeId>,
        pass: &mut Pass,
    ) -> RuntimeResult<Option<NodeId>> {
        let kind = &r.tree.get(v).kind;
        let mut found = None;
        let mut scan = cur;
        while let Some(node) = scan {
            if !self.shadows.is_fragment_start(node) && self.compatible(node, kind, pass.hydrating) {
                found = Some(node);
                break;
            }
            scan = self.after(span, node);
        }

        let Some(matched) = found else {
            let node = match kind {
                VNodeKind::Text(text) => self.doc.create_text(text),
                VNodeKind::Comment(text) => self.doc.create_comment(text),
                VNodeKind::Element(el) => self.create_element(span.parent, r, v, el, pass)?,
                _ => return Ok(cur),
            };
            tracing::trace!(%node, kind = ?self.doc.tree.node_type(node), "insert");
            self.doc.tree.insert_before(span.parent, node, cur.or(span.end))?;
            return Ok(cur);
        };

        let mut skipped = cur;
        while let Some(node) = skipped {
            if node == matched {
                break;
            }
            let next = self.after(span, node);
            self.detach_stale(node, pass)?;
            skipped = next;
        }

        match kind {
            VNodeKind::Text(text) => self.morph_text(matched, text, r, next_v, pass.hydrating)?,
            VNodeKind::Comment(text) => {
                if self.doc.tree.char_data(matched) != Some(text.as_str()) {
                    self.doc.tree.set_char_data(matched, text)?;
                }
            }
            _ => self.morph_element(matched, r, v, pass)?,
        }
        Ok(self.after(span, matched))
    }

    /// Detach a unit unless it is the root of a component this pass renders
    fn detach_stale(&mut self, node: NodeId, pass: &mut Pass) -> RuntimeResult<()> {
        let rendered = self
            .shadows
            .component_at(node)
            .is_some_and(|id| pass.rendered.contains(id));
        if rendered {
            return Ok(());
        }
        self.detach_unit(node, pass)
    }

    /// Detach every child unit of `parent`
    pub(crate) fn detach_children(&mut self, parent: NodeId, pass: &mut Pass) -> RuntimeResult<()> {
        let span = Span { parent, end: None };
        let mut cur = self.doc.tree.first_child(parent);
        while let Some(node) = cur {
            cur = self.after(span, node);
            self.detach_unit(node, pass)?;
        }
        Ok(())
    }

    fn morph_text(
        &mut self,
        node: NodeId,
        text: &str,
        r: &Resolved<'_>,
        next_v: Option<VNodeId>,
        hydrating: bool,
    ) -> RuntimeResult<()> {
        let Some(current) = self.doc.tree.char_data(node) else {
            return Ok(());
        };
        if current == text {
            return Ok(());
        }
        let next_is_text = next_v.is_some_and(|n| matches!(r.tree.get(n).kind, VNodeKind::Text(_)));
        if hydrating && next_is_text && !text.is_empty() && current.starts_with(text) {
            // server output merged adjacent text nodes
            self.doc.tree.split_text(node, text.len())?;
        } else {
            self.doc.tree.set_char_data(node, text)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Keyed elements and fragments
    // ------------------------------------------------------------------

    /// Whether the real unit at `node` can take the virtual node
    fn unit_matches(&self, node: NodeId, v: &VNodeKind) -> bool {
        match v {
            VNodeKind::Element(el) => self.shadows.element(node).is_some_and(|s| s.tag == el.tag),
            VNodeKind::Fragment { .. } => self
                .shadows
                .fragment(node)
                .is_some_and(|f| f.component.is_none() && f.key.is_some()),
            _ => false,
        }
    }

    fn keyed_table(&self, scope: &Scope) -> Option<&HashMap<String, NodeId>> {
        match scope {
            Scope::Component(id) => self.components.get(id).map(|c| &c.keyed),
            Scope::Root(container) => self.root_keyed.get(container),
        }
    }

    /// Node rendered under `key` last time, if it can be reused here
    fn lookup_keyed(&self, scope: &Scope, key: &str, v: &VNodeKind, parent: NodeId, pass: &Pass) -> Option<NodeId> {
        let node = *self.keyed_table(scope)?.get(key)?;
        let usable = !pass.claimed.contains(&node)
            && self.doc.tree.parent(node).is_some()
            && !self.doc.tree.contains(node, parent)
            && self.unit_matches(node, v);
        usable.then_some(node)
    }

    fn morph_keyed(
        &mut self,
        span: Span,
        cur: Option<NodeId>,
        r: &Resolved<'_>,
        v: VNodeId,
        next_v: Option<VNodeId>,
        pass: &mut Pass,
    ) -> RuntimeResult<Option<NodeId>> {
        let vnode = r.tree.get(v);
        let key = r.key(v).unwrap_or_default().to_string();
        let owner = r.owner_of(v).cloned();
        let scope = r.scope_of(v);
        let cur_key = cur.and_then(|c| self.shadows.key_of(c, owner.as_ref()).map(str::to_string));

        if let Some(c) = cur {
            if cur_key.as_deref() == Some(key.as_str()) && self.unit_matches(c, &vnode.kind) {
                pass.cancel(c);
                self.morph_unit(c, r, v, pass)?;
                return Ok(self.after(span, c));
            }
        }

        let Some(matched) = self.lookup_keyed(&scope, &key, &vnode.kind, span.parent, pass) else {
            let mut cur = cur;
            if let Some(c) = cur {
                if cur_key.as_deref() == Some(key.as_str()) {
                    // same key, different tag
                    cur = self.after(span, c);
                    self.detach_unit(c, pass)?;
                }
            }
            if pass.hydrating && matches!(vnode.kind, VNodeKind::Element(_)) {
                // adopt server markup like an unkeyed node
                return self.morph_unkeyed(span, cur, r, v, next_v, pass);
            }
            self.create_keyed(span, cur.or(span.end), r, v, pass)?;
            return Ok(cur);
        };

        pass.cancel(matched);
        let mut cur = cur;
        match cur {
            Some(c) if self.after(span, c) == Some(matched) => {
                let next_key = next_v.and_then(|n| r.key(n));
                if next_key == cur_key.as_deref() {
                    tracing::trace!(%key, "swap");
                    self.move_unit(span.parent, matched, Some(c))?;
                } else {
                    tracing::trace!(%key, "single removal");
                    self.detach_unit(c, pass)?;
                    cur = Some(matched);
                }
            }
            _ => {
                tracing::trace!(%key, "relocate");
                self.move_unit(span.parent, matched, cur.or(span.end))?;
            }
        }
        self.morph_unit(matched, r, v, pass)?;
        Ok(if cur == Some(matched) { self.after(span, matched) } else { cur })
    }

    fn morph_unit(&mut self, node: NodeId, r: &Resolved<'_>, v: VNodeId, pass: &mut Pass) -> RuntimeResult<()> {
        match &r.tree.get(v).kind {
            VNodeKind::Fragment { preserve } => {
                let Some(end) = self.shadows.fragment(node).map(|f| f.end) else {
                    return Ok(());
                };
                if let Some(key) = r.key(v) {
                    pass.claim(r.scope_of(v), key, node);
                }
                if *preserve {
                    for n in self.unit_nodes(node) {
                        self.carry_keyed(n, r.owner_of(v), r.container, pass);
                    }
                    return Ok(());
                }
                let parent = self.doc.tree.parent(node).ok_or(RuntimeError::Detached(node))?;
                let span = Span { parent, end: Some(end) };
                let first = self.doc.tree.next_sibling(node);
                self.morph_children(span, first, r, v, Finish::Detach, pass)?;
                Ok(())
            }
            _ => self.morph_element(node, r, v, pass),
        }
    }

    fn create_keyed(
        &mut self,
        span: Span,
        reference: Option<NodeId>,
        r: &Resolved<'_>,
        v: VNodeId,
        pass: &mut Pass,
    ) -> RuntimeResult<()> {
        let el = match &r.tree.get(v).kind {
            VNodeKind::Element(el) => el,
            _ => return self.create_fragment(span, reference, r, v, pass),
        };
        let node = self.create_element(span.parent, r, v, el, pass)?;
        tracing::trace!(%node, key = ?r.key(v), "insert keyed");
        self.doc.tree.insert_before(span.parent, node, reference)?;
        Ok(())
    }

    fn create_fragment(
        &mut self,
        span: Span,
        reference: Option<NodeId>,
        r: &Resolved<'_>,
        v: VNodeId,
        pass: &mut Pass,
    ) -> RuntimeResult<()> {
        let start = self.doc.create_text("");
        let end = self.doc.create_text("");
        self.shadows.set_fragment(
            start,
            FragmentShadow {
                end,
                key: r.key(v).map(str::to_string),
                owner: r.owner_of(v).cloned(),
                component: None,
            },
        );
        if let Some(key) = r.key(v) {
            pass.claim(r.scope_of(v), key, start);
        }
        self.doc.tree.insert_before(span.parent, start, reference)?;
        self.doc.tree.insert_before(span.parent, end, reference)?;
        let inner = Span { parent: span.parent, end: Some(end) };
        self.morph_children(inner, None, r, v, Finish::Detach, pass)?;
        Ok(())
    }

    /// Claim keyed nodes below `node` that a preserved or constant subtree
    /// keeps without walking
    fn carry_keyed(&mut self, node: NodeId, owner: Option<&ComponentId>, container: NodeId, pass: &mut Pass) {
        let scope = Scope::new(owner, container);
        for n in self.doc.tree.descendants(node) {
            if let Some(key) = self.shadows.key_of(n, owner) {
                pass.claim(scope.clone(), key, n);
            }
        }
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    fn record_element(&mut self, node: NodeId, r: &Resolved<'_>, v: VNodeId, pass: &mut Pass) {
        let Some(el) = r.tree.get(v).as_element() else {
            return;
        };
        let key = r.key(v);
        if let Some(key) = key {
            pass.claim(r.scope_of(v), key, node);
        }
        if !el.events.is_empty() && self.config.delegate_events {
            self.delegation.register(&el.events);
        }
        let shadow = ElementShadow::new(el, key.map(str::to_string), r.owner_of(v).cloned());
        self.shadows.set_element(node, shadow);
    }

    /// Build a detached element and its subtree
    fn create_element(
        &mut self,
        ns_parent: NodeId,
        r: &Resolved<'_>,
        v: VNodeId,
        el: &VElement,
        pass: &mut Pass,
    ) -> RuntimeResult<NodeId> {
        let node = self.doc.create_element_in(&el.tag, Some(ns_parent));
        attrs::morph_attrs(&mut self.doc.tree, node, None, el, r.key(v).is_some())?;
        self.record_element(node, r, v, pass);
        if el.tag != "textarea" {
            let span = Span { parent: node, end: None };
            self.morph_children(span, None, r, v, Finish::Detach, pass)?;
        }
        special::sync_form(&mut self.doc.tree, node, el)?;
        Ok(node)
    }

    fn morph_element(&mut self, node: NodeId, r: &Resolved<'_>, v: VNodeId, pass: &mut Pass) -> RuntimeResult<()> {
        let Some(el) = r.tree.get(v).as_element() else {
            return Ok(());
        };
        let old = self.shadows.take_element(node);

        if let (Some(old), Some(const_id)) = (&old, el.const_id) {
            if old.const_id == Some(const_id) {
                tracing::trace!(%node, const_id, "constant subtree");
                self.shadows.set_element(node, old.clone());
                if let Some(key) = r.key(v) {
                    pass.claim(r.scope_of(v), key, node);
                }
                self.carry_keyed(node, r.owner_of(v), r.container, pass);
                return Ok(());
            }
        }

        let (old_attrs, old_flags) = match old {
            Some(shadow) => (shadow.attrs, shadow.flags),
            None => (Rc::new(dom_attrs(&self.doc.tree, node)), ElementFlags::VIRTUALIZED),
        };
        attrs::morph_attrs(&mut self.doc.tree, node, Some((&old_attrs, old_flags)), el, r.key(v).is_some())?;
        self.record_element(node, r, v, pass);

        if el.is_preserved() {
            self.carry_keyed(node, r.owner_of(v), r.container, pass);
        } else if el.tag != "textarea" {
            let span = Span { parent: node, end: None };
            let first = self.doc.tree.first_child(node);
            self.morph_children(span, first, r, v, Finish::Detach, pass)?;
        }
        special::sync_form(&mut self.doc.tree, node, el)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    fn morph_component(
        &mut self,
        span: Span,
        cur: Option<NodeId>,
        r: &Resolved<'_>,
        v: VNodeId,
        pass: &mut Pass,
    ) -> RuntimeResult<Option<NodeId>> {
        let Some(vc) = r.tree.get(v).as_component() else {
            return Ok(cur);
        };
        let Some(id) = r.component_id(v).cloned() else {
            return Ok(cur);
        };
        let Some((start, type_name)) = self.components.get(&id).map(|c| (c.start, c.type_name.clone())) else {
            return self.create_component(span, cur, r, v, pass);
        };

        let mut cur = cur;
        if type_name != vc.type_name {
            tracing::debug!(component = %id, old = %type_name, new = %vc.type_name, "component type changed");
            if cur == Some(start) {
                cur = self.after(span, start);
            }
            self.destroy_component(&id, true)?;
            return self.create_component(span, cur, r, v, pass);
        }
        loop {
            match cur {
                Some(c) if c == start => break,
                Some(c) => match self.shadows.component_at(c) {
                    Some(other) if !pass.rendered.contains(other) => {
                        let next = self.after(span, c);
                        self.detach_unit(c, pass)?;
                        cur = next;
                    }
                    _ => {
                        self.move_unit(span.parent, start, Some(c))?;
                        break;
                    }
                },
                None => {
                    self.move_unit(span.parent, start, span.end)?;
                    break;
                }
            }
        }
        pass.cancel(start);

        if !vc.preserve {
            let dirty = match self.components.get_mut(&id) {
                Some(component) => {
                    if !shallow_equal(&component.input, &vc.input) {
                        component.input = vc.input.clone();
                        component.input_changed = true;
                    }
                    component.is_dirty()
                }
                None => false,
            };
            if dirty {
                self.render_component(&id, pass)?;
                pass.completed.push((id, Hook::Update));
            }
        }
        Ok(if cur == Some(start) { self.after(span, start) } else { cur })
    }

    /// Construct a component and its (still detached) marker pair
    pub(crate) fn instantiate(
        &mut self,
        id: &ComponentId,
        type_name: &str,
        input: Input,
        parent: Option<ComponentId>,
        key: Option<String>,
    ) -> RuntimeResult<()> {
        let behavior = self.registry.create(type_name)?;
        let start = self.doc.create_text("");
        let end = self.doc.create_text("");
        let mut component = Component::new(id.clone(), type_name, behavior, input, parent.clone(), start, end);
        component.run_hook("on_create", |b, cx| b.on_create(cx))?;
        tracing::debug!(component = %id, type_name, "created");
        self.shadows.set_fragment(
            start,
            FragmentShadow {
                end,
                key,
                owner: parent,
                component: Some(id.clone()),
            },
        );
        self.components.insert(id.clone(), component);
        Ok(())
    }

    fn create_component(
        &mut self,
        span: Span,
        cur: Option<NodeId>,
        r: &Resolved<'_>,
        v: VNodeId,
        pass: &mut Pass,
    ) -> RuntimeResult<Option<NodeId>> {
        let (Some(vc), Some(id)) = (r.tree.get(v).as_component(), r.component_id(v).cloned()) else {
            return Ok(cur);
        };
        let key = r.key(v).map(str::to_string);
        self.instantiate(&id, &vc.type_name, vc.input.clone(), r.owner_of(v).cloned(), key)?;
        let (start, end) = self.markers(&id)?;
        self.doc.tree.insert_before(span.parent, start, cur.or(span.end))?;

        if pass.hydrating {
            let stop = self.hydrate_component(&id, span, cur, pass)?;
            pass.completed.push((id, Hook::Mount));
            return Ok(stop);
        }
        self.doc.tree.insert_before(span.parent, end, cur.or(span.end))?;
        self.render_component(&id, pass)?;
        pass.completed.push((id, Hook::Mount));
        Ok(cur)
    }

    pub(crate) fn markers(&self, id: &ComponentId) -> RuntimeResult<(NodeId, NodeId)> {
        self.components
            .get(id)
            .map(|c| (c.start, c.end))
            .ok_or_else(|| RuntimeError::UnknownComponent(id.clone()))
    }

    /// Run a component's render function
    pub(crate) fn render_tree(&mut self, id: &ComponentId) -> RuntimeResult<RenderResult> {
        let component = self
            .components
            .get_mut(id)
            .ok_or_else(|| RuntimeError::UnknownComponent(id.clone()))?;
        let behavior = component.behavior.clone();
        let mut out = RenderOut::for_component(id.clone());
        behavior
            .render(&component.input, component.state.data(), &mut out)
            .map_err(|source| RuntimeError::Render {
                component: id.clone(),
                source,
            })?;
        out.end();
        let result = out.result()?;
        component.mark_rendered();
        tracing::debug!(component = %id, nodes = result.tree().len(), "rendered");
        Ok(result)
    }

    /// Render a component and reconcile the DOM between its markers
    pub(crate) fn render_component(&mut self, id: &ComponentId, pass: &mut Pass) -> RuntimeResult<()> {
        let result = self.render_tree(id)?;
        let (start, end) = self.markers(id)?;
        let parent = self.doc.tree.parent(start).ok_or(RuntimeError::Detached(start))?;
        let r = Resolved::new(result.tree(), parent, Some(id.clone()), &self.config.id_prefix);
        pass.rendered.extend(r.component_ids().cloned());

        let span = Span { parent, end: Some(end) };
        let first = self.doc.tree.next_sibling(start);
        self.morph_children(span, first, &r, result.root(), Finish::Detach, pass)?;
        self.commit_keyed(Scope::Component(id.clone()), pass)
    }

    /// Render a component over existing markup starting at `cur`, placing its
    /// end marker where adoption stops
    pub(crate) fn hydrate_component(
        &mut self,
        id: &ComponentId,
        span: Span,
        cur: Option<NodeId>,
        pass: &mut Pass,
    ) -> RuntimeResult<Option<NodeId>> {
        let result = self.render_tree(id)?;
        let (_, end) = self.markers(id)?;
        let r = Resolved::new(result.tree(), span.parent, Some(id.clone()), &self.config.id_prefix);
        pass.rendered.extend(r.component_ids().cloned());

        let stop = self.morph_children(span, cur, &r, result.root(), Finish::Stop, pass)?;
        self.doc.tree.insert_before(span.parent, end, stop.or(span.end))?;
        self.commit_keyed(Scope::Component(id.clone()), pass)?;
        Ok(stop)
    }

    /// Replace a scope's keyed table with what this pass claimed; keyed
    /// nodes nobody claimed are detached
    pub(crate) fn commit_keyed(&mut self, scope: Scope, pass: &mut Pass) -> RuntimeResult<()> {
        let new = pass.keyed.remove(&scope).unwrap_or_default();
        let old = match &scope {
            Scope::Component(id) => match self.components.get_mut(id) {
                Some(component) => std::mem::replace(&mut component.keyed, new),
                None => return Ok(()),
            },
            Scope::Root(container) => self.root_keyed.insert(*container, new).unwrap_or_default(),
        };
        for (key, node) in old {
            if !pass.claimed.contains(&node) && self.doc.tree.parent(node).is_some() {
                tracing::trace!(%key, %node, "unclaimed keyed node");
                self.detach_unit(node, pass)?;
            }
        }
        Ok(())
    }

    /// Reconcile `container`'s children within an open pass
    pub(crate) fn reconcile_in(
        &mut self,
        container: NodeId,
        tree: &VTree,
        owner: Option<&ComponentId>,
        pass: &mut Pass,
    ) -> RuntimeResult<()> {
        tracing::debug!(%container, nodes = tree.len(), "reconcile");
        let r = Resolved::new(tree, container, owner.cloned(), &self.config.id_prefix);
        pass.rendered.extend(r.component_ids().cloned());
        let span = Span { parent: container, end: None };
        let first = self.doc.tree.first_child(container);
        self.morph_children(span, first, &r, tree.root(), Finish::Detach, pass)?;
        self.commit_keyed(Scope::new(owner, container), pass)
    }

    /// Remove deferred nodes, destroy components under them, then run the
    /// mount and update hooks the pass owes
    pub(crate) fn finish_pass(&mut self, mut pass: Pass) -> RuntimeResult<()> {
        let detached: Vec<NodeId> = pass
            .detached
            .drain(..)
            .filter(|n| pass.detached_set.contains(n))
            .collect();
        for node in detached {
            let nodes = self.unit_nodes(node);
            let doomed: Vec<ComponentId> = self
                .components
                .values()
                .filter(|c| nodes.iter().any(|&n| self.doc.tree.contains(n, c.start)))
                .map(|c| c.id.clone())
                .collect();
            for &n in &nodes {
                self.doc.tree.detach(n)?;
            }
            for id in doomed {
                self.destroy_component(&id, false)?;
            }
            for n in nodes {
                self.forget_subtree(n);
            }
        }

        for (id, hook) in pass.completed {
            let Some(component) = self.components.get_mut(&id) else {
                continue;
            };
            match hook {
                Hook::Mount => {
                    component.phase = Phase::Mounted;
                    component.run_hook("on_mount", |b, cx| b.on_mount(cx))?;
                }
                Hook::Update => {
                    component.phase = Phase::Updated;
                    component.run_hook("on_update", |b, cx| b.on_update(cx))?;
                }
            }
            if component.is_dirty() {
                self.scheduler.queue(id);
            }
        }
        Ok(())
    }

    pub(crate) fn forget_subtree(&mut self, node: NodeId) {
        for n in self.doc.tree.descendants(node) {
            self.shadows.forget(n);
        }
    }
}
