//! Partyline relay core: pairs chat endpoints into temporary bidirectional
//! calls, filters abusive traffic, and bounds every call's lifetime.
//!
//! The [`Matchmaker`] is the public entry point; the gateway layer feeds it
//! pairing requests and inbound messages and consumes [`RelayEvent`]s to
//! render user-facing notices. Sessions are purely in-memory and are lost
//! on process restart.

pub mod error;
pub mod events;
pub mod links;
pub mod matchmaker;
pub mod queue;
pub mod registry;
pub mod session;
pub mod spam;

pub use error::RelayError;
pub use events::{EndReason, RejectReason, RelayEvent};
pub use matchmaker::{ConnectOutcome, Matchmaker};
pub use queue::{EndpointQueue, QueueEntry};
pub use registry::{SessionEntry, SessionRegistry};
pub use session::{RelaySession, SessionPolicy, Verdict};
pub use spam::{levenshtein, similarity, RateLimitWindow, SpamVerdict};
