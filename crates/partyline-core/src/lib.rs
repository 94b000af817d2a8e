pub mod config;
pub mod cooldown;
pub mod error;
pub mod types;

pub use config::PartylineConfig;
pub use cooldown::{CooldownGate, CooldownStatus};
pub use error::PartylineError;
pub use types::{DeliveryError, Endpoint, EndpointId, InboundMessage, SessionId, UserId};
