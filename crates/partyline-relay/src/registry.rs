//! Authoritative map of active calls.
//!
//! Two indexes over one session set: session ID → entry for lifecycle
//! operations, endpoint ID → session ID for O(1) "is this channel already
//! in a call" checks and partner lookup. Removal is check-and-delete: the
//! caller that gets `Some` back owns the teardown, so a manual hangup and a
//! firing expiry timer can never both notify.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::AbortHandle;

use partyline_core::types::{Endpoint, EndpointId, SessionId};

use crate::session::RelaySession;

/// A registered call plus the abort handle of its auto-expiry timer.
pub struct SessionEntry {
    pub session: Arc<RelaySession>,
    pub expiry: AbortHandle,
}

/// Dual-key index of every active call.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionEntry>,
    by_endpoint: HashMap<EndpointId, SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call under its session ID and both endpoint IDs.
    pub fn add(&mut self, entry: SessionEntry) {
        let id = entry.session.id().clone();
        self.by_endpoint
            .insert(entry.session.side_a().id().clone(), id.clone());
        self.by_endpoint
            .insert(entry.session.side_b().id().clone(), id.clone());
        self.sessions.insert(id, entry);
    }

    /// Remove a call and both its endpoint keys atomically, returning the
    /// entry to exactly one caller.
    pub fn remove(&mut self, id: &SessionId) -> Option<SessionEntry> {
        let entry = self.sessions.remove(id)?;
        self.by_endpoint.remove(entry.session.side_a().id());
        self.by_endpoint.remove(entry.session.side_b().id());
        Some(entry)
    }

    pub fn get(&self, id: &SessionId) -> Option<&SessionEntry> {
        self.sessions.get(id)
    }

    pub fn has_endpoint(&self, id: &EndpointId) -> bool {
        self.by_endpoint.contains_key(id)
    }

    pub fn get_by_endpoint(&self, id: &EndpointId) -> Option<&SessionEntry> {
        self.sessions.get(self.by_endpoint.get(id)?)
    }

    /// The endpoint on the other side of `id`'s call, if any.
    pub fn partner_of(&self, id: &EndpointId) -> Option<Arc<dyn Endpoint>> {
        self.get_by_endpoint(id)?.session.partner_of(id)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    /// Every endpoint currently in a call.
    pub fn endpoint_ids(&self) -> Vec<EndpointId> {
        self.by_endpoint.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
