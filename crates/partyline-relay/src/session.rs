//! A single active call between two endpoints.
//!
//! The session is `Active` from construction and `Ended` forever after a
//! hangup; there is no connecting phase. Message handling runs one ordered
//! pipeline — self/command filter, ban check, spam classification, link
//! filter, forward — with per-session serialization through an internal
//! async mutex. Only the ban lookup awaits; delivery is fire-and-forget.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, warn};

use partyline_bans::BanStore;
use partyline_core::types::{Endpoint, EndpointId, InboundMessage, SessionId, UserId};

use crate::error::{RelayError, Result};
use crate::events::{RejectReason, RelayEvent};
use crate::links::find_untrusted_link;
use crate::spam::RateLimitWindow;

/// What the pipeline did with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Bot-authored or command-prefixed content, or the call already ended —
    /// not relay material, dropped without notice.
    Ignored,
    /// Delivered (fire-and-forget) to the partner endpoint.
    Forwarded,
}

/// Mutable per-call state, serialized behind one async mutex.
#[derive(Default)]
struct SessionState {
    /// Per-author sliding rate-limit windows.
    windows: HashMap<UserId, RateLimitWindow>,
    /// Formatted display names, cached per author for the call's lifetime.
    name_cache: HashMap<UserId, String>,
}

/// Settings a session copies out of the relay configuration at creation.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub command_prefix: char,
    pub trusted_domains: Vec<String>,
}

/// An active pairing of two endpoints.
///
/// `side_a` is the caller (whose requester holds hangup authority) and
/// `side_b` the receiver; both directions relay identically.
pub struct RelaySession {
    id: SessionId,
    side_a: Arc<dyn Endpoint>,
    side_b: Arc<dyn Endpoint>,
    requester: UserId,
    duration: Duration,
    created_at: chrono::DateTime<chrono::Utc>,
    policy: SessionPolicy,
    ban_store: Arc<dyn BanStore>,
    events: mpsc::UnboundedSender<RelayEvent>,
    ended: AtomicBool,
    state: Mutex<SessionState>,
}

impl RelaySession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        side_a: Arc<dyn Endpoint>,
        side_b: Arc<dyn Endpoint>,
        requester: UserId,
        duration: Duration,
        policy: SessionPolicy,
        ban_store: Arc<dyn BanStore>,
        events: mpsc::UnboundedSender<RelayEvent>,
    ) -> Self {
        Self {
            id,
            side_a,
            side_b,
            requester,
            duration,
            created_at: chrono::Utc::now(),
            policy,
            ban_store,
            events,
            ended: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn side_a(&self) -> &Arc<dyn Endpoint> {
        &self.side_a
    }

    pub fn side_b(&self) -> &Arc<dyn Endpoint> {
        &self.side_b
    }

    pub fn requester(&self) -> &UserId {
        &self.requester
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// Whether `id` is one of this call's two endpoints.
    pub fn involves(&self, id: &EndpointId) -> bool {
        self.side_a.id() == id || self.side_b.id() == id
    }

    /// The other side of the call, if `id` is part of it.
    pub fn partner_of(&self, id: &EndpointId) -> Option<Arc<dyn Endpoint>> {
        if self.side_a.id() == id {
            Some(Arc::clone(&self.side_b))
        } else if self.side_b.id() == id {
            Some(Arc::clone(&self.side_a))
        } else {
            None
        }
    }

    /// Run one inbound message through the filter pipeline.
    ///
    /// Rejections come back as errors for the caller to render; the same
    /// rejection is also pushed onto the event stream. Ban takes priority
    /// over every other check, and a failed ban lookup blocks the message
    /// rather than failing open.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<Verdict> {
        // Self/command filter: not relay content, no notice.
        if msg.from_bot || msg.content.starts_with(self.policy.command_prefix) {
            return Ok(Verdict::Ignored);
        }
        if self.is_ended() {
            debug!(session_id = %self.id, "message after hangup dropped");
            return Ok(Verdict::Ignored);
        }

        let partner = self
            .partner_of(&msg.endpoint_id)
            .ok_or(RelayError::SessionNotFound)?;

        if self.ban_store.is_banned(&msg.author_id).await? {
            self.reject(&msg.author_id, RejectReason::Banned);
            return Err(RelayError::Banned);
        }

        let mut state = self.state.lock().await;

        let verdict = state
            .windows
            .entry(msg.author_id.clone())
            .or_default()
            .classify(&msg.content, Instant::now());
        if verdict.is_spam() {
            drop(state);
            debug!(session_id = %self.id, author = %msg.author_id, ?verdict, "spam suppressed");
            self.reject(&msg.author_id, RejectReason::RateLimited);
            return Err(RelayError::RateLimited);
        }

        if let Some(url) = find_untrusted_link(&msg.content, &self.policy.trusted_domains) {
            drop(state);
            debug!(session_id = %self.id, author = %msg.author_id, %url, "untrusted link suppressed");
            self.reject(
                &msg.author_id,
                RejectReason::UntrustedLink { url: url.clone() },
            );
            return Err(RelayError::UntrustedLink { url });
        }

        let name = state
            .name_cache
            .entry(msg.author_id.clone())
            .or_insert_with(|| format!("`{}`", msg.author_name))
            .clone();
        drop(state);

        let line = format!("{name}: {}", msg.content);
        let session_id = self.id.clone();
        // Fire-and-forget: a lost line is non-fatal to the call.
        tokio::spawn(async move {
            if let Err(e) = partner.send(&line).await {
                warn!(session_id = %session_id, error = %e, "forward delivery failed");
            }
        });

        let _ = self.events.send(RelayEvent::MessageForwarded {
            session_id: self.id.clone(),
            author: msg.author_id.clone(),
        });
        Ok(Verdict::Forwarded)
    }

    /// End the call.
    ///
    /// With a requester: only the user who started the call may hang up —
    /// anyone else gets `false` and the call stays active. Without one
    /// (timer or operator) the hangup always succeeds. Idempotent; returns
    /// `true` if the session is ended when the method returns.
    pub async fn hangup(&self, requester: Option<&UserId>) -> bool {
        if let Some(user) = requester {
            if user != &self.requester {
                return false;
            }
        }
        if self.ended.swap(true, Ordering::AcqRel) {
            return true;
        }
        let mut state = self.state.lock().await;
        state.windows.clear();
        state.name_cache.clear();
        debug!(session_id = %self.id, "session ended");
        true
    }

    fn reject(&self, author: &UserId, reason: RejectReason) {
        let _ = self.events.send(RelayEvent::MessageRejected {
            session_id: self.id.clone(),
            author: author.clone(),
            reason,
        });
    }
}

impl std::fmt::Debug for RelaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySession")
            .field("id", &self.id)
            .field("side_a", self.side_a.id())
            .field("side_b", self.side_b.id())
            .field("requester", &self.requester)
            .field("duration", &self.duration)
            .field("ended", &self.is_ended())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use partyline_bans::MemoryBanStore;
    use partyline_core::types::DeliveryError;

    struct StubEndpoint {
        id: EndpointId,
    }

    #[async_trait]
    impl Endpoint for StubEndpoint {
        fn id(&self) -> &EndpointId {
            &self.id
        }

        async fn send(&self, _text: &str) -> std::result::Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn session() -> RelaySession {
        let (tx, _rx) = mpsc::unbounded_channel();
        RelaySession::new(
            SessionId::new(),
            Arc::new(StubEndpoint {
                id: EndpointId::from("a"),
            }),
            Arc::new(StubEndpoint {
                id: EndpointId::from("b"),
            }),
            UserId::from("alice"),
            Duration::from_secs(60),
            SessionPolicy {
                command_prefix: '.',
                trusted_domains: vec!["youtube.com".into()],
            },
            Arc::new(MemoryBanStore::new()),
            tx,
        )
    }

    #[tokio::test]
    async fn hangup_by_stranger_is_refused() {
        let s = session();
        assert!(!s.hangup(Some(&UserId::from("eve"))).await);
        assert!(!s.is_ended(), "call must stay active after a refused hangup");
    }

    #[tokio::test]
    async fn hangup_by_requester_succeeds() {
        let s = session();
        assert!(s.hangup(Some(&UserId::from("alice"))).await);
        assert!(s.is_ended());
    }

    #[tokio::test]
    async fn system_hangup_always_succeeds() {
        let s = session();
        assert!(s.hangup(None).await);
        // Idempotent on repeat.
        assert!(s.hangup(None).await);
        assert!(s.is_ended());
    }

    #[tokio::test]
    async fn messages_after_hangup_are_ignored() {
        let s = session();
        s.hangup(None).await;
        let msg = InboundMessage {
            endpoint_id: EndpointId::from("a"),
            author_id: UserId::from("u"),
            author_name: "u".into(),
            content: "hello".into(),
            from_bot: false,
        };
        assert_eq!(s.handle_message(&msg).await.unwrap(), Verdict::Ignored);
    }

    #[tokio::test]
    async fn partner_lookup_is_side_agnostic() {
        let s = session();
        assert_eq!(
            s.partner_of(&EndpointId::from("a")).unwrap().id().as_str(),
            "b"
        );
        assert_eq!(
            s.partner_of(&EndpointId::from("b")).unwrap().id().as_str(),
            "a"
        );
        assert!(s.partner_of(&EndpointId::from("c")).is_none());
    }
}
