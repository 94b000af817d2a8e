use thiserror::Error;

use partyline_bans::BanError;

/// Errors surfaced to the initiating user as a rejection message.
///
/// All variants are recoverable — none is fatal to the process. The command
/// layer renders them; `code()` gives it a stable short identifier.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The endpoint is already waiting for a pairing.
    #[error("this channel is already in the queue")]
    AlreadyQueued,

    /// The endpoint is already part of an active call.
    #[error("this channel is already in a call")]
    AlreadyInSession,

    /// A direct pairing target was required but unavailable.
    #[error("no partner available for this call")]
    NoPartnerAvailable,

    /// The wait queue is at capacity — try again later.
    #[error("the call queue is full, try again later")]
    QueueFull,

    /// The acting user is on the ban list.
    #[error("you are banned from using the phone system")]
    Banned,

    /// The message was suppressed by spam classification.
    #[error("message suppressed: sending too fast or repeating yourself")]
    RateLimited,

    /// The message contained a link to a host outside the allow-list.
    #[error("message suppressed: untrusted link {url}")]
    UntrustedLink { url: String },

    /// Hangup attempted by someone other than the call's requester.
    #[error("only the user who started the call can end it")]
    Unauthorized,

    /// No active call matches the given session or endpoint.
    #[error("no active call found")]
    SessionNotFound,

    /// The ban-list lookup itself failed. Blocks the action — the core never
    /// fails open on bans.
    #[error("ban store error: {0}")]
    BanStore(#[from] BanError),
}

impl RelayError {
    /// Short error code string for the command layer to render.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::AlreadyQueued => "ALREADY_QUEUED",
            RelayError::AlreadyInSession => "ALREADY_IN_SESSION",
            RelayError::NoPartnerAvailable => "NO_PARTNER_AVAILABLE",
            RelayError::QueueFull => "QUEUE_FULL",
            RelayError::Banned => "BANNED",
            RelayError::RateLimited => "RATE_LIMITED",
            RelayError::UntrustedLink { .. } => "UNTRUSTED_LINK",
            RelayError::Unauthorized => "UNAUTHORIZED",
            RelayError::SessionNotFound => "SESSION_NOT_FOUND",
            RelayError::BanStore(_) => "BAN_STORE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
