//! Relay pool: one logical operation replicated across many relays.
//!
//! Every relay runs in its own task with its own connection and deadline.
//! Results come back as a map keyed by relay URL with exactly one entry per
//! distinct relay asked for; one relay failing or stalling never affects
//! another's entry.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use nostr_core::{Event, Filter, OutgoingEvent, SecretKey};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::error::{ClientError, Result};
use crate::relay::{PublishConfirmation, RelayConnection, prepare_event};
use crate::transport::{Connector, WebSocketConnector};

/// Per-relay outcomes, keyed by relay URL.
pub type PoolResults<T> = HashMap<String, Result<T>>;

/// A pool of Nostr relays.
#[derive(Clone)]
pub struct RelayPool {
    connector: Arc<dyn Connector>,
    config: PoolConfig,
}

impl Default for RelayPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl RelayPool {
    /// Create a WebSocket relay pool.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            connector: Arc::new(WebSocketConnector),
            config,
        }
    }

    /// Create a pool whose default relay list is `relays`.
    pub fn with_relays(relays: Vec<String>) -> Self {
        Self::new(PoolConfig {
            relays,
            ..Default::default()
        })
    }

    /// Replace the connector used to reach relays.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Relays used when a call names none.
    pub fn relays(&self) -> &[String] {
        &self.config.relays
    }

    /// Publish `event` to every relay in `relays`.
    ///
    /// The event is signed and checked once. If it is invalid, every relay
    /// gets an [`ClientError::InvalidEvent`] entry and nothing is sent.
    pub async fn publish(
        &self,
        event: impl Into<OutgoingEvent>,
        secret_key: &SecretKey,
        relays: &[String],
    ) -> PoolResults<PublishConfirmation> {
        let targets = self.targets(relays);

        let event = match prepare_event(event, secret_key) {
            Ok(event) => event,
            Err(e) => {
                warn!("Not publishing invalid event: {}", e);
                let reason = match e {
                    ClientError::InvalidEvent(reason) => reason,
                    other => other.to_string(),
                };
                return targets
                    .into_iter()
                    .map(|url| (url, Err(ClientError::InvalidEvent(reason.clone()))))
                    .collect();
            }
        };

        let event = Arc::new(event);
        self.fan_out(targets, move |conn| {
            let event = Arc::clone(&event);
            async move { conn.publish_signed(&event).await }
        })
        .await
    }

    /// Collect matching events from every relay in `relays`.
    pub async fn list(&self, filter: &Filter, relays: &[String]) -> PoolResults<Vec<Event>> {
        let filter = Arc::new(filter.clone());
        self.fan_out(self.targets(relays), move |conn| {
            let filter = Arc::clone(&filter);
            async move { conn.request(&filter).await }
        })
        .await
    }

    /// First matching event from every relay in `relays`.
    pub async fn get(&self, filter: &Filter, relays: &[String]) -> PoolResults<Option<Event>> {
        let filter = Arc::new(filter.clone());
        self.fan_out(self.targets(relays), move |conn| {
            let filter = Arc::clone(&filter);
            async move { conn.get(&filter).await }
        })
        .await
    }

    /// Distinct relays in first-seen order, or the configured defaults when
    /// `relays` is empty.
    fn targets(&self, relays: &[String]) -> Vec<String> {
        let source = if relays.is_empty() {
            &self.config.relays
        } else {
            relays
        };

        let mut seen = HashSet::new();
        source
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect()
    }

    async fn fan_out<T, F, Fut>(&self, targets: Vec<String>, op: F) -> PoolResults<T>
    where
        T: Send + 'static,
        F: Fn(RelayConnection) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut urls = HashMap::new();

        for url in targets {
            let connector = Arc::clone(&self.connector);
            let config = self.config.relay.clone();
            let op = op.clone();
            let task_url = url.clone();
            let handle = tasks.spawn(async move {
                let conn =
                    RelayConnection::connect_with(connector.as_ref(), &task_url, config).await?;
                op(conn).await
            });
            urls.insert(handle.id(), url);
        }

        let mut results = HashMap::with_capacity(urls.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => (e.id(), Err(ClientError::Internal(e.to_string()))),
            };
            if let Some(url) = urls.remove(&id) {
                if let Err(ref e) = result {
                    debug!("Relay {} failed: {}", url, e);
                }
                results.insert(url, result);
            }
        }

        results
    }
}
