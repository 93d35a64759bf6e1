//! Components
//!
//! A component is a [`Behavior`] (render function plus optional hooks)
//! together with the runtime-owned record of where its output lives: two
//! empty text markers bracketing its DOM, and the table of keyed nodes it
//! rendered last time.

mod state;

pub use state::{ComponentState, State};

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tessera_dom::NodeId;
use tessera_vdom::{ComponentId, Input, RenderOut};

use crate::delegation::DomEvent;

/// Teardown closure run when a component is destroyed
pub type Teardown = Box<dyn FnOnce()>;

/// What a component does.
///
/// Only `render` is required. Hooks report failures as `anyhow::Error`; the
/// runtime wraps them in [`crate::RuntimeError::Hook`].
pub trait Behavior {
    /// Write the component's view into `out`
    fn render(&self, input: &Input, state: &State, out: &mut RenderOut) -> anyhow::Result<()>;

    /// Called once at construction, before the first render
    fn on_create(&self, _cx: &mut HookCx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the pass that first inserted the component
    fn on_mount(&self, _cx: &mut HookCx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after every later pass that re-rendered the component
    fn on_update(&self, _cx: &mut HookCx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_destroy(&self, _cx: &mut HookCx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether changes to `key` are applied by [`Behavior::update_state`]
    /// instead of a re-render
    fn handles_state(&self, _key: &str) -> bool {
        false
    }

    fn update_state(&self, _key: &str, _new: &Value, _old: Option<&Value>, _cx: &mut HookCx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Run the handler `method` for a delegated event; `None` if there is no
    /// such handler
    fn handle_event(&self, _method: &str, _event: &DomEvent, _cx: &mut HookCx<'_>) -> Option<anyhow::Result<()>> {
        None
    }
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Mounted,
    Updated,
    Destroyed,
}

/// Access a hook has to its component
pub struct HookCx<'a> {
    id: &'a ComponentId,
    input: &'a Input,
    state: &'a mut ComponentState,
    teardowns: &'a mut Vec<Teardown>,
}

impl<'a> HookCx<'a> {
    pub(crate) fn new(component: &'a mut Component) -> Self {
        Self {
            id: &component.id,
            input: &component.input,
            state: &mut component.state,
            teardowns: &mut component.teardowns,
        }
    }

    pub fn id(&self) -> &ComponentId {
        self.id
    }

    pub fn input(&self) -> &Input {
        self.input
    }

    pub fn state(&self) -> &State {
        self.state.data()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Change state; the component is queued for update after the hook returns
    pub fn set_state(&mut self, key: &str, value: impl Into<Value>) {
        self.state.set(key, value.into());
    }

    /// Run `teardown` when the component is destroyed
    pub fn subscribe(&mut self, teardown: impl FnOnce() + 'static) {
        self.teardowns.push(Box::new(teardown));
    }
}

/// Mounted component record
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) type_name: String,
    pub(crate) behavior: Rc<dyn Behavior>,
    pub(crate) input: Input,
    pub(crate) state: ComponentState,
    pub(crate) phase: Phase,
    /// Empty text markers bracketing the component's DOM
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    /// Keyed elements and fragments from the last render
    pub(crate) keyed: HashMap<String, NodeId>,
    pub(crate) teardowns: Vec<Teardown>,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) input_changed: bool,
    pub(crate) force: bool,
}

impl Component {
    pub(crate) fn new(
        id: ComponentId,
        type_name: &str,
        behavior: Rc<dyn Behavior>,
        input: Input,
        parent: Option<ComponentId>,
        start: NodeId,
        end: NodeId,
    ) -> Self {
        Self {
            id,
            type_name: type_name.to_string(),
            behavior,
            input,
            state: ComponentState::default(),
            phase: Phase::Created,
            start,
            end,
            keyed: HashMap::new(),
            teardowns: Vec::new(),
            parent,
            input_changed: false,
            force: false,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn state(&self) -> &ComponentState {
        &self.state
    }

    pub fn parent(&self) -> Option<&ComponentId> {
        self.parent.as_ref()
    }

    /// Whether a flush would do anything
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty() || self.input_changed || self.force
    }

    pub(crate) fn mark_rendered(&mut self) {
        self.state.clean();
        self.input_changed = false;
        self.force = false;
    }

    /// Run a hook with a [`HookCx`] over this component
    pub(crate) fn run_hook(
        &mut self,
        hook: &'static str,
        call: impl FnOnce(&dyn Behavior, &mut HookCx<'_>) -> anyhow::Result<()>,
    ) -> crate::RuntimeResult<()> {
        let behavior = self.behavior.clone();
        let id = self.id.clone();
        let mut cx = HookCx::new(self);
        call(behavior.as_ref(), &mut cx).map_err(|source| crate::RuntimeError::Hook {
            component: id,
            hook,
            source,
        })
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("phase", &self.phase)
            .field("start", &self.start)
            .field("end", &self.end)
            .finish_non_exhaustive()
    }
}

/// Inputs equal key by key
pub(crate) fn shallow_equal(a: &Input, b: &Input) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
}
