//! Nostr relay client.
//!
//! This crate provides:
//! - NIP-01 relay protocol messages ([`ClientMessage`], [`RelayMessage`])
//! - A transport seam ([`Transport`], [`Connector`]) with a WebSocket driver
//! - [`RelayConnection`]: one publish or request against one relay, bounded
//!   by a deadline
//! - [`RelayPool`]: the same operation fanned out across many relays, with one
//!   independent result per relay
//!
//! # Example
//!
//! ```rust,no_run
//! use nostr_client::{EventTemplate, Filter, RelayPool, SecretKey};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = RelayPool::with_relays(vec![
//!         "wss://relay.damus.io".to_string(),
//!         "wss://nos.lol".to_string(),
//!     ]);
//!
//!     let secret_key = SecretKey::generate();
//!     let results = pool
//!         .publish(EventTemplate::new(1, "Hello Nostr!"), &secret_key, &[])
//!         .await;
//!     for (relay, result) in &results {
//!         println!("{}: {:?}", relay, result);
//!     }
//!
//!     let filter = Filter::new().kinds(vec![1]).limit(10);
//!     for (relay, events) in pool.list(&filter, &[]).await {
//!         println!("{}: {} events", relay, events.map(|e| e.len()).unwrap_or(0));
//!     }
//! }
//! ```

mod config;
mod error;
mod message;
mod pool;
mod relay;
mod subscription;
mod transport;

pub use config::{
    DEFAULT_RELAYS, ENV_CONNECT_TIMEOUT_SECS, ENV_RELAYS, ENV_TIMEOUT_SECS, PoolConfig,
    RelayConfig,
};
pub use error::{ClientError, Result};
pub use message::{ClientMessage, RelayMessage};
pub use pool::{PoolResults, RelayPool};
pub use relay::{
    ConnectionState, PublishConfirmation, RelayConnection, parse_relay_url, prepare_event,
};
pub use subscription::generate_subscription_id;
pub use transport::{Connector, Transport, WebSocketConnector, WebSocketTransport};

pub use nostr_core::{Event, EventTemplate, Filter, OutgoingEvent, SecretKey};

/// Create a relay pool with the default relays.
pub fn default_pool() -> RelayPool {
    RelayPool::default()
}
