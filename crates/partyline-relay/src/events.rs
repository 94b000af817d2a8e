//! Lifecycle events exported to the orchestrating layer.
//!
//! The relay never talks to the command layer directly. Instead every
//! session start, rejection, and teardown is pushed onto an unbounded mpsc
//! channel; the orchestrator consumes it to render embeds, update status
//! lines, and so on. Sending is non-blocking so the relay pipeline is never
//! stalled by a slow consumer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use partyline_core::types::{EndpointId, SessionId, UserId};

/// Why a message was suppressed instead of forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The author is on the ban list.
    Banned,
    /// Frequency limit or near-duplicate flood.
    RateLimited,
    /// The message linked to a host outside the allow-list.
    UntrustedLink { url: String },
}

/// Why a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The configured call duration elapsed.
    DurationLimit,
    /// The requester hung up.
    ManualHangup,
    /// Operator or system-initiated teardown.
    Administrative,
}

impl EndReason {
    /// User-facing phrase relayed to both endpoints on teardown.
    pub fn phrase(&self) -> &'static str {
        match self {
            EndReason::DurationLimit => "duration limit reached",
            EndReason::ManualHangup => "manual hangup",
            EndReason::Administrative => "network/administrative disconnect",
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.phrase())
    }
}

/// A single notification from the relay core.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// Two endpoints were paired into a call.
    SessionStarted {
        session_id: SessionId,
        side_a: EndpointId,
        side_b: EndpointId,
        duration: Duration,
    },

    /// A message passed the filter pipeline and was handed to delivery.
    MessageForwarded {
        session_id: SessionId,
        author: UserId,
    },

    /// A message was suppressed by the filter pipeline.
    MessageRejected {
        session_id: SessionId,
        author: UserId,
        reason: RejectReason,
    },

    /// A call was torn down and removed from the registry.
    SessionEnded {
        session_id: SessionId,
        side_a: EndpointId,
        side_b: EndpointId,
        reason: EndReason,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_reason_phrases_are_stable() {
        assert_eq!(EndReason::DurationLimit.phrase(), "duration limit reached");
        assert_eq!(EndReason::ManualHangup.phrase(), "manual hangup");
        assert_eq!(
            EndReason::Administrative.phrase(),
            "network/administrative disconnect"
        );
    }
}
