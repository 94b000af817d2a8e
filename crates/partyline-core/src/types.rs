use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform-native identifier for a chat channel that can take part in a call.
///
/// Opaque to the core: Discord snowflakes, Telegram chat IDs, and test
/// fixtures all pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId(pub String);

impl EndpointId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EndpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Platform-native identifier for a user (message author, call requester).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for an active call (UUIDv7 — time-sortable for easier
/// log correlation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Delivery failure reported by an [`Endpoint`] adapter.
///
/// Forwarding is fire-and-forget, so these are logged and swallowed by the
/// relay rather than surfaced to call participants.
#[derive(Debug, thiserror::Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// An addressable destination that can receive relayed text.
///
/// Implemented by the (out-of-scope) chat-platform adapters; the core only
/// holds `Arc<dyn Endpoint>` references and never constructs or destroys
/// endpoints. `send` takes `&self` so a connected adapter can deliver
/// concurrently without a mutable borrow.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Stable platform identifier for this endpoint.
    fn id(&self) -> &EndpointId;

    /// Deliver a single line of text to the endpoint.
    async fn send(&self, text: &str) -> std::result::Result<(), DeliveryError>;
}

/// A message received from one side of a call, as handed over by the
/// gateway layer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Endpoint the message arrived on.
    pub endpoint_id: EndpointId,

    /// Platform-native identifier of the author.
    pub author_id: UserId,

    /// Display name of the author, used for the forwarded-message prefix.
    pub author_name: String,

    /// Plain text content.
    pub content: String,

    /// True when the author is a bot account. Bot messages are never relayed.
    pub from_bot: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn endpoint_id_display_matches_inner() {
        let id = EndpointId::from("chan-42");
        assert_eq!(id.to_string(), "chan-42");
        assert_eq!(id.as_str(), "chan-42");
    }
}
