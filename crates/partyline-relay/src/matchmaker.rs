//! Orchestrates the queue, the registry, and session creation.
//!
//! Pairing decisions (enqueue-vs-dequeue, duplicate checks, registration)
//! happen under one mutex over the combined pairing state, so two
//! concurrent requests can never double-pair the same endpoint. The only
//! awaits are ban-store lookups, always taken before the lock.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use partyline_bans::BanStore;
use partyline_core::config::RelayConfig;
use partyline_core::types::{Endpoint, EndpointId, InboundMessage, SessionId, UserId};

use crate::error::{RelayError, Result};
use crate::events::{EndReason, RelayEvent};
use crate::queue::{EndpointQueue, QueueEntry};
use crate::registry::{SessionEntry, SessionRegistry};
use crate::session::{RelaySession, SessionPolicy, Verdict};

/// Result of a pairing request, for the command layer to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// No partner was waiting; the endpoint is now queued.
    Waiting,
    /// A call was created with the given partner.
    Paired {
        session_id: SessionId,
        partner: EndpointId,
    },
}

/// Queue and registry, guarded together so membership checks and
/// transitions between them are atomic.
struct PairState {
    queue: EndpointQueue,
    registry: SessionRegistry,
}

/// Public entry point of the relay core.
pub struct Matchmaker {
    state: Mutex<PairState>,
    ban_store: Arc<dyn BanStore>,
    events: mpsc::UnboundedSender<RelayEvent>,
    policy: SessionPolicy,
    default_duration: Duration,
    /// Handle to ourselves for the expiry timers; weak so a dropped
    /// matchmaker doesn't keep timers alive.
    weak_self: Weak<Matchmaker>,
}

impl Matchmaker {
    /// Build a matchmaker and the event stream the orchestrator consumes.
    pub fn new(
        config: RelayConfig,
        ban_store: Arc<dyn BanStore>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<RelayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let matchmaker = Arc::new_cyclic(|weak| Self {
            state: Mutex::new(PairState {
                queue: EndpointQueue::new(config.queue_capacity),
                registry: SessionRegistry::new(),
            }),
            ban_store,
            events: tx,
            policy: SessionPolicy {
                command_prefix: config.command_prefix,
                trusted_domains: config.trusted_domains,
            },
            default_duration: Duration::from_secs(config.default_call_secs),
            weak_self: weak.clone(),
        });
        (matchmaker, rx)
    }

    /// Pair `endpoint` with a random waiting partner, or queue it when no
    /// one is waiting. Default call duration.
    pub async fn connect(
        &self,
        endpoint: Arc<dyn Endpoint>,
        requester: UserId,
    ) -> Result<ConnectOutcome> {
        let duration = self.default_duration;
        self.connect_with_duration(endpoint, requester, duration)
            .await
    }

    /// `connect` with a caller-supplied call duration.
    pub async fn temp_connect(
        &self,
        endpoint: Arc<dyn Endpoint>,
        duration: Duration,
        requester: UserId,
    ) -> Result<ConnectOutcome> {
        self.connect_with_duration(endpoint, requester, duration)
            .await
    }

    /// Pair two specific endpoints directly, bypassing the queue.
    ///
    /// Queue membership is deliberately not checked here; only an endpoint
    /// already in a call blocks the pairing.
    pub async fn selective_connect(
        &self,
        endpoint: Arc<dyn Endpoint>,
        target: Arc<dyn Endpoint>,
        requester: UserId,
    ) -> Result<ConnectOutcome> {
        if self.ban_store.is_banned(&requester).await? {
            return Err(RelayError::Banned);
        }
        if endpoint.id() == target.id() {
            return Err(RelayError::NoPartnerAvailable);
        }

        let mut state = self.state.lock().unwrap();
        if state.registry.has_endpoint(endpoint.id())
            || state.registry.has_endpoint(target.id())
        {
            return Err(RelayError::AlreadyInSession);
        }
        Ok(self.pair(&mut state, endpoint, target, requester, self.default_duration))
    }

    /// Withdraw a waiting endpoint from the queue, on behalf of `requester`.
    ///
    /// Only the user who queued the endpoint may withdraw it. Returns
    /// `Ok(false)` when the endpoint is not waiting (it may have just been
    /// paired), mirroring `disconnect` on an absent session.
    pub fn leave_queue(&self, endpoint: &EndpointId, requester: &UserId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.queue.requester_of(endpoint) {
            None => return Ok(false),
            Some(owner) if owner != requester => return Err(RelayError::Unauthorized),
            Some(_) => {}
        }
        state.queue.remove(endpoint);
        info!(endpoint = %endpoint, "endpoint withdrew from the queue");
        Ok(true)
    }

    /// Tear down a call. Silent no-op when the session is already gone —
    /// the registry is the single source of truth, so a manual hangup and
    /// an expiry timer racing each other resolve to one teardown.
    pub async fn disconnect(&self, session_id: &SessionId, reason: EndReason) -> bool {
        let entry = self.state.lock().unwrap().registry.remove(session_id);
        let Some(entry) = entry else {
            return false;
        };
        entry.expiry.abort();
        entry.session.hangup(None).await;

        let session = &entry.session;
        info!(session_id = %session_id, %reason, "call ended");

        let notice = format!("Call disconnected: {reason}.");
        for side in [session.side_a(), session.side_b()] {
            if let Err(e) = side.send(&notice).await {
                warn!(session_id = %session_id, endpoint = %side.id(), error = %e,
                    "disconnect notice delivery failed");
            }
        }

        let _ = self.events.send(RelayEvent::SessionEnded {
            session_id: session_id.clone(),
            side_a: session.side_a().id().clone(),
            side_b: session.side_b().id().clone(),
            reason,
        });
        true
    }

    /// End the call `endpoint` is part of, on behalf of `requester`.
    ///
    /// Only the user who started the call may hang up this way.
    pub async fn hangup_by(
        &self,
        endpoint: &EndpointId,
        requester: &UserId,
    ) -> Result<SessionId> {
        let session = {
            let state = self.state.lock().unwrap();
            state
                .registry
                .get_by_endpoint(endpoint)
                .map(|entry| Arc::clone(&entry.session))
        }
        .ok_or(RelayError::SessionNotFound)?;

        if !session.hangup(Some(requester)).await {
            return Err(RelayError::Unauthorized);
        }
        let session_id = session.id().clone();
        self.disconnect(&session_id, EndReason::ManualHangup).await;
        Ok(session_id)
    }

    /// Route an inbound message to the call its endpoint belongs to.
    pub async fn relay_message(&self, msg: &InboundMessage) -> Result<Verdict> {
        let session = {
            let state = self.state.lock().unwrap();
            state
                .registry
                .get_by_endpoint(&msg.endpoint_id)
                .map(|entry| Arc::clone(&entry.session))
        }
        .ok_or(RelayError::SessionNotFound)?;
        session.handle_message(msg).await
    }

    /// Tear down every active call (process shutdown, maintenance).
    pub async fn disconnect_all(&self, reason: EndReason) -> usize {
        let ids = self.state.lock().unwrap().registry.session_ids();
        let mut ended = 0;
        for id in ids {
            if self.disconnect(&id, reason).await {
                ended += 1;
            }
        }
        ended
    }

    /// Number of active calls.
    pub fn active_call_count(&self) -> usize {
        self.state.lock().unwrap().registry.count()
    }

    /// Number of endpoints waiting for a partner.
    pub fn queued_count(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    /// Every endpoint currently in a call.
    pub fn active_endpoint_ids(&self) -> Vec<EndpointId> {
        self.state.lock().unwrap().registry.endpoint_ids()
    }

    /// Whether `endpoint` is waiting in the queue.
    pub fn is_queued(&self, endpoint: &EndpointId) -> bool {
        self.state.lock().unwrap().queue.contains(endpoint)
    }

    /// Whether `endpoint` is part of an active call.
    pub fn is_in_call(&self, endpoint: &EndpointId) -> bool {
        self.state.lock().unwrap().registry.has_endpoint(endpoint)
    }

    // --- private helpers ---------------------------------------------------

    async fn connect_with_duration(
        &self,
        endpoint: Arc<dyn Endpoint>,
        requester: UserId,
        duration: Duration,
    ) -> Result<ConnectOutcome> {
        if self.ban_store.is_banned(&requester).await? {
            return Err(RelayError::Banned);
        }

        let mut state = self.state.lock().unwrap();
        let id = endpoint.id().clone();
        if state.queue.contains(&id) {
            return Err(RelayError::AlreadyQueued);
        }
        if state.registry.has_endpoint(&id) {
            return Err(RelayError::AlreadyInSession);
        }

        match state.queue.dequeue() {
            Some(waiting) => {
                Ok(self.pair(&mut state, endpoint, waiting.endpoint, requester, duration))
            }
            None => {
                if !state.queue.enqueue(QueueEntry {
                    endpoint,
                    requester,
                }) {
                    return Err(RelayError::QueueFull);
                }
                info!(endpoint = %id, "endpoint queued, waiting for a partner");
                Ok(ConnectOutcome::Waiting)
            }
        }
    }

    /// Create, register, announce, and arm the expiry timer for one call.
    /// Caller holds the pairing-state lock.
    fn pair(
        &self,
        state: &mut PairState,
        caller: Arc<dyn Endpoint>,
        receiver: Arc<dyn Endpoint>,
        requester: UserId,
        duration: Duration,
    ) -> ConnectOutcome {
        let session_id = SessionId::new();
        let partner = receiver.id().clone();
        let session = Arc::new(RelaySession::new(
            session_id.clone(),
            caller,
            receiver,
            requester,
            duration,
            self.policy.clone(),
            Arc::clone(&self.ban_store),
            self.events.clone(),
        ));

        let weak = self.weak_self.clone();
        let timer_id = session_id.clone();
        let expiry = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(matchmaker) = weak.upgrade() {
                matchmaker
                    .disconnect(&timer_id, EndReason::DurationLimit)
                    .await;
            }
        })
        .abort_handle();

        info!(
            session_id = %session_id,
            side_a = %session.side_a().id(),
            side_b = %session.side_b().id(),
            duration_secs = duration.as_secs(),
            "call connected"
        );

        let notice = format!(
            "Connected to a channel! You can now chat for {} seconds.",
            duration.as_secs()
        );
        for side in [session.side_a(), session.side_b()] {
            let side = Arc::clone(side);
            let sid = session_id.clone();
            let notice = notice.clone();
            // Fire-and-forget greeting; the lock is held, so never await here.
            tokio::spawn(async move {
                if let Err(e) = side.send(&notice).await {
                    warn!(session_id = %sid, endpoint = %side.id(), error = %e,
                        "greeting delivery failed");
                }
            });
        }

        let _ = self.events.send(RelayEvent::SessionStarted {
            session_id: session_id.clone(),
            side_a: session.side_a().id().clone(),
            side_b: session.side_b().id().clone(),
            duration,
        });

        state.registry.add(SessionEntry { session, expiry });
        ConnectOutcome::Paired {
            session_id,
            partner,
        }
    }
}

impl std::fmt::Debug for Matchmaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matchmaker")
            .field("active_calls", &self.active_call_count())
            .field("queued", &self.queued_count())
            .finish()
    }
}
