//! Minimal event emitter
//!
//! Listeners are registered per event kind. Emitting an error event with no
//! listener is an error in itself, so failures never disappear silently.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::{VdomError, VdomResult};

/// Events an [`EventEmitter`] can carry
pub trait EmitterEvent {
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;

    /// The error carried by an error event
    fn error(&self) -> Option<Arc<anyhow::Error>> {
        None
    }
}

struct Listener<E: EmitterEvent> {
    kind: E::Kind,
    once: bool,
    callback: Box<dyn FnMut(&E)>,
}

/// Per-kind listener lists
pub struct EventEmitter<E: EmitterEvent> {
    listeners: Vec<Listener<E>>,
}

impl<E: EmitterEvent> Default for EventEmitter<E> {
    fn default() -> Self {
        Self { listeners: Vec::new() }
    }
}

impl<E: EmitterEvent> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E: EmitterEvent> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` for every event of `kind`
    pub fn on(&mut self, kind: E::Kind, callback: impl FnMut(&E) + 'static) {
        self.listeners.push(Listener {
            kind,
            once: false,
            callback: Box::new(callback),
        });
    }

    /// Call `callback` for the next event of `kind` only
    pub fn once(&mut self, kind: E::Kind, callback: impl FnMut(&E) + 'static) {
        self.listeners.push(Listener {
            kind,
            once: true,
            callback: Box::new(callback),
        });
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.iter().filter(|l| l.kind == kind).count()
    }

    pub fn remove_all(&mut self, kind: E::Kind) {
        self.listeners.retain(|l| l.kind != kind);
    }

    /// Deliver `event`; returns whether anybody listened.
    ///
    /// An error event with no listener yields [`VdomError::Unhandled`].
    pub fn emit(&mut self, event: &E) -> VdomResult<bool> {
        let kind = event.kind();
        let mut delivered = false;
        self.listeners.retain_mut(|listener| {
            if listener.kind != kind {
                return true;
            }
            (listener.callback)(event);
            delivered = true;
            !listener.once
        });
        if !delivered {
            if let Some(err) = event.error() {
                return Err(VdomError::Unhandled(err));
            }
        }
        Ok(delivered)
    }

    /// Move listeners registered on `other` into `self`
    pub(crate) fn absorb(&mut self, other: EventEmitter<E>) {
        self.listeners.extend(other.listeners);
    }
}
