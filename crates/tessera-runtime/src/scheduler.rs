//! Update queue
//!
//! Components are queued at most once. Inside a batch they go to the
//! innermost batch and flush when it closes; otherwise they wait for the
//! next `Runtime::tick`.

use std::collections::HashSet;

use tessera_vdom::ComponentId;

#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    batches: Vec<Vec<ComponentId>>,
    pending: Vec<ComponentId>,
    queued: HashSet<ComponentId>,
}

impl Scheduler {
    /// Queue `id`; returns false if it already was
    pub fn queue(&mut self, id: ComponentId) -> bool {
        if !self.queued.insert(id.clone()) {
            return false;
        }
        tracing::trace!(component = %id, "queued update");
        match self.batches.last_mut() {
            Some(batch) => batch.push(id),
            None => self.pending.push(id),
        }
        true
    }

    pub fn begin_batch(&mut self) {
        self.batches.push(Vec::new());
    }

    /// Close the innermost batch, returning what it collected
    pub fn end_batch(&mut self) -> Vec<ComponentId> {
        self.batches.pop().unwrap_or_default()
    }

    pub fn is_batching(&self) -> bool {
        !self.batches.is_empty()
    }

    pub fn take_pending(&mut self) -> Vec<ComponentId> {
        std::mem::take(&mut self.pending)
    }

    /// Put unflushed ids back at the front of the pending queue
    pub fn restore(&mut self, mut ids: Vec<ComponentId>) {
        ids.retain(|id| self.queued.contains(id));
        ids.append(&mut self.pending);
        self.pending = ids;
    }

    pub fn dequeue(&mut self, id: &ComponentId) {
        self.queued.remove(id);
    }

    pub fn is_queued(&self, id: &ComponentId) -> bool {
        self.queued.contains(id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
