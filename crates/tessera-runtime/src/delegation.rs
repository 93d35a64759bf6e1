//! Event delegation
//!
//! Elements never get listeners of their own. The first time an element
//! bound to an event type is rendered, one root listener for that type is
//! recorded; dispatch then bubbles from the target to the document and
//! calls the owning component's handler for every matching binding.

use std::cell::Cell;
use std::collections::BTreeSet;

use serde_json::Value;
use tessera_dom::NodeId;
use tessera_vdom::EventBinding;

use crate::component::HookCx;
use crate::{Runtime, RuntimeError, RuntimeResult};

/// Event delivered to component handlers
#[derive(Debug, Clone)]
pub struct DomEvent {
    event_type: String,
    target: NodeId,
    current_target: Cell<NodeId>,
    detail: Value,
    stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(event_type: &str, target: NodeId, detail: Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: Cell::new(target),
            detail,
            stopped: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Element whose binding is being handled
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub fn detail(&self) -> &Value {
        &self.detail
    }

    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Delegated event types of one document
#[derive(Debug, Default)]
pub struct EventDelegation {
    root_listeners: BTreeSet<String>,
}

impl EventDelegation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach root listeners for event types not seen yet; returns how many
    pub(crate) fn register(&mut self, bindings: &[EventBinding]) -> usize {
        let mut attached = 0;
        for binding in bindings {
            if self.root_listeners.insert(binding.event.clone()) {
                tracing::debug!(event = %binding.event, "attached root listener");
                attached += 1;
            }
        }
        attached
    }

    pub fn is_delegated(&self, event_type: &str) -> bool {
        self.root_listeners.contains(event_type)
    }

    pub fn delegated_types(&self) -> impl Iterator<Item = &str> {
        self.root_listeners.iter().map(String::as_str)
    }
}

impl Runtime {
    /// Dispatch an event at `target`, bubbling to the document.
    ///
    /// Returns the number of handlers run. Handlers that change state queue
    /// their component like any other state change.
    pub fn dispatch_event(&mut self, target: NodeId, event_type: &str, detail: Value) -> RuntimeResult<usize> {
        if !self.delegation.is_delegated(event_type) {
            return Ok(0);
        }
        let event = DomEvent::new(event_type, target, detail);
        let mut handled = 0;
        let mut node = Some(target);
        while let Some(current) = node {
            node = self.doc.tree.parent(current);
            let Some(shadow) = self.shadows.element(current) else {
                continue;
            };
            let Some(owner) = shadow.owner.clone() else {
                continue;
            };
            let methods: Vec<String> = shadow
                .events
                .iter()
                .filter(|b| b.event == event_type)
                .map(|b| b.method.clone())
                .collect();

            for method in methods {
                let Some(component) = self.components.get_mut(&owner) else {
                    break;
                };
                event.current_target.set(current);
                let behavior = component.behavior.clone();
                let mut cx = HookCx::new(component);
                match behavior.handle_event(&method, &event, &mut cx) {
                    None => {
                        return Err(RuntimeError::MissingEventHandler {
                            component: owner,
                            event: event_type.to_string(),
                            method,
                        });
                    }
                    Some(Err(source)) => {
                        return Err(RuntimeError::Hook {
                            component: owner,
                            hook: "event handler",
                            source,
                        });
                    }
                    Some(Ok(())) => handled += 1,
                }
                tracing::trace!(component = %owner, %method, "handled {event_type}");
                if component.is_dirty() {
                    self.scheduler.queue(owner.clone());
                }
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_root_listener_per_type() {
        let mut delegation = EventDelegation::new();
        let click = EventBinding {
            event: "click".into(),
            method: "a".into(),
        };
        let other = EventBinding {
            event: "click".into(),
            method: "b".into(),
        };
        assert_eq!(delegation.register(&[click.clone(), other]), 1);
        assert_eq!(delegation.register(&[click]), 0);
        assert!(delegation.is_delegated("click"));
        assert_eq!(delegation.delegated_types().collect::<Vec<_>>(), vec!["click"]);
    }

    #[test]
    fn test_stop_propagation() {
        let event = DomEvent::new("click", NodeId::NONE, Value::Null);
        assert!(!event.is_propagation_stopped());
        event.stop_propagation();
        assert!(event.is_propagation_stopped());
    }
}
