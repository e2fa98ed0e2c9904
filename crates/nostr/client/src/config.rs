//! Client configuration.

use std::time::Duration;

use tracing::warn;

/// Default relays.
pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.nostr.band",
    "wss://nostr.wine",
];

/// Comma separated relay URLs
pub const ENV_RELAYS: &str = "NOSTR_RELAYS";
/// Per-operation timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "NOSTR_TIMEOUT_SECS";
/// Connect timeout in seconds
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "NOSTR_CONNECT_TIMEOUT_SECS";

/// Per-relay operation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Deadline for one publish or request, measured from the moment the
    /// message is sent
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Pause after a failed or empty read before trying again
    pub poll_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Relay pool configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub relay: RelayConfig,
    /// Relays used when a call names none; the first one is the primary
    pub relays: Vec<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            relays: DEFAULT_RELAYS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PoolConfig {
    /// Build from `NOSTR_RELAYS`, `NOSTR_TIMEOUT_SECS` and
    /// `NOSTR_CONNECT_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_RELAYS) {
            let relays: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if relays.is_empty() {
                warn!("{} is set but lists no relays, using defaults", ENV_RELAYS);
            } else {
                config.relays = relays;
            }
        }

        if let Some(secs) = parse_secs(&lookup, ENV_TIMEOUT_SECS) {
            config.relay.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs(&lookup, ENV_CONNECT_TIMEOUT_SECS) {
            config.relay.connect_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// The primary relay, if any are configured.
    pub fn primary_relay(&self) -> Option<&str> {
        self.relays.first().map(String::as_str)
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(secs),
        _ => {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            None
        }
    }
}
