//! FIFO wait-list of endpoints seeking a random pairing.
//!
//! Strict arrival order: the first endpoint to wait is the first to be
//! matched. The buffer is a fixed ring over a pre-allocated slot array so
//! enqueue/dequeue never reallocate, with a parallel ID set for O(1)
//! membership checks instead of a linear scan.

use std::collections::HashSet;
use std::sync::Arc;

use partyline_core::types::{Endpoint, EndpointId, UserId};

/// An endpoint waiting to be paired, plus the user who asked for the call.
#[derive(Clone)]
pub struct QueueEntry {
    pub endpoint: Arc<dyn Endpoint>,
    pub requester: UserId,
}

impl std::fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEntry")
            .field("endpoint", self.endpoint.id())
            .field("requester", &self.requester)
            .finish()
    }
}

/// Fixed-capacity circular-buffer FIFO of [`QueueEntry`] values.
pub struct EndpointQueue {
    slots: Vec<Option<QueueEntry>>,
    head: usize,
    len: usize,
    members: HashSet<EndpointId>,
}

impl EndpointQueue {
    /// Create a queue holding at most `capacity` endpoints.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be greater than 0");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
            members: HashSet::new(),
        }
    }

    /// Append an entry. Returns `false` when the queue is at capacity or the
    /// endpoint is already waiting — either way the caller must be told to
    /// try later.
    pub fn enqueue(&mut self, entry: QueueEntry) -> bool {
        if self.is_full() || self.members.contains(entry.endpoint.id()) {
            return false;
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.members.insert(entry.endpoint.id().clone());
        self.slots[tail] = Some(entry);
        self.len += 1;
        true
    }

    /// Remove and return the oldest waiting entry.
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        if self.len == 0 {
            return None;
        }
        let entry = self.slots[self.head].take()?;
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        self.members.remove(entry.endpoint.id());
        Some(entry)
    }

    /// The oldest waiting entry without removing it.
    pub fn peek(&self) -> Option<&QueueEntry> {
        if self.len == 0 {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// O(1) membership check against the parallel ID set.
    pub fn contains(&self, id: &EndpointId) -> bool {
        self.members.contains(id)
    }

    /// The user who queued `id`, if that endpoint is waiting.
    pub fn requester_of(&self, id: &EndpointId) -> Option<&UserId> {
        if !self.members.contains(id) {
            return None;
        }
        let cap = self.slots.len();
        (0..self.len).find_map(|i| {
            self.slots[(self.head + i) % cap]
                .as_ref()
                .filter(|e| e.endpoint.id() == id)
                .map(|e| &e.requester)
        })
    }

    /// Remove a waiting entry regardless of position, keeping the order of
    /// everyone behind it. O(n) slot shuffle; withdrawal is rare next to
    /// enqueue/dequeue.
    pub fn remove(&mut self, id: &EndpointId) -> Option<QueueEntry> {
        if !self.members.contains(id) {
            return None;
        }
        let cap = self.slots.len();
        let idx = (0..self.len).find(|&i| {
            self.slots[(self.head + i) % cap]
                .as_ref()
                .is_some_and(|e| e.endpoint.id() == id)
        })?;
        let removed = self.slots[(self.head + idx) % cap].take();
        for i in idx..self.len - 1 {
            let vacated = (self.head + i) % cap;
            let next = (self.head + i + 1) % cap;
            self.slots[vacated] = self.slots[next].take();
        }
        self.len -= 1;
        self.members.remove(id);
        removed
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Ordered snapshot of the waiting entries, oldest first.
    pub fn values(&self) -> Vec<QueueEntry> {
        (0..self.len)
            .filter_map(|i| self.slots[(self.head + i) % self.slots.len()].clone())
            .collect()
    }

    /// Drop every waiting entry.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
        self.members.clear();
    }
}
