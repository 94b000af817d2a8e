use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

// Relay constants — fixed policy values, not user-tunable per message
pub const DEFAULT_CALL_MS: u64 = 60_000; // default call duration
pub const SPAM_WINDOW_MS: u64 = 5_000; // sliding rate-limit window
pub const SPAM_WINDOW_CAPACITY: usize = 5; // max retained messages per author
pub const SPAM_SIMILARITY_THRESHOLD: f64 = 0.8; // near-duplicate cutoff
pub const QUEUE_CAPACITY: usize = 1000; // waiting endpoints before backpressure
pub const DEFAULT_COMMAND_PREFIX: char = '.';

/// Top-level config (partyline.toml + PARTYLINE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartylineConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for PartylineConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Tunables for the matchmaker and relay sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Call duration in seconds when `connect` is used without an explicit
    /// duration.
    #[serde(default = "default_call_secs")]
    pub default_call_secs: u64,

    /// Maximum number of endpoints waiting for a random pairing.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Messages starting with this character are treated as commands and
    /// never relayed.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,

    /// Domains whose links are allowed through the relay. Subdomains of a
    /// listed domain are also allowed. Any link to a host outside this list
    /// blocks the whole message.
    #[serde(default = "default_trusted_domains")]
    pub trusted_domains: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_call_secs: default_call_secs(),
            queue_capacity: default_queue_capacity(),
            command_prefix: default_command_prefix(),
            trusted_domains: default_trusted_domains(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_call_secs() -> u64 {
    DEFAULT_CALL_MS / 1000
}
fn default_queue_capacity() -> usize {
    QUEUE_CAPACITY
}
fn default_command_prefix() -> char {
    DEFAULT_COMMAND_PREFIX
}
fn default_trusted_domains() -> Vec<String> {
    [
        "youtube.com",
        "youtu.be",
        "twitch.tv",
        "twitter.com",
        "x.com",
        "reddit.com",
        "imgur.com",
        "tenor.com",
        "giphy.com",
        "discord.gg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.partyline/partyline.db", home)
}

impl PartylineConfig {
    /// Load config from a TOML file with PARTYLINE_* env var overrides.
    ///
    /// Falls back to `~/.partyline/partyline.toml` when no path is given;
    /// a missing file yields the compiled-in defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: PartylineConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("PARTYLINE_").split("_"))
            .extract()
            .map_err(|e| crate::error::PartylineError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.partyline/partyline.toml", home)
}
