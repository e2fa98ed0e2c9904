//! Single relay connection
//!
//! A [`RelayConnection`] carries exactly one logical operation: it is consumed
//! by `publish`, `request` or `get` and always closed afterwards, whatever the
//! outcome. Each operation gets one deadline, fixed when it starts; sending,
//! waiting for a terminating message and the best-effort CLOSE all count
//! against it. Closing is bounded separately by `connect_timeout`. Individual
//! read errors and malformed frames are absorbed; only the deadline ends an
//! unanswered wait.

use std::time::Duration;

use nostr_core::{Event, Filter, OutgoingEvent, SecretKey};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RelayConfig;
use crate::error::{ClientError, Result};
use crate::message::{ClientMessage, RelayMessage};
use crate::subscription::generate_subscription_id;
use crate::transport::{Connector, Transport, WebSocketConnector};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Connected and idle
    Connected,
    /// Waiting for an OK
    Publishing,
    /// Collecting events until EOSE
    Subscribing,
}

/// Confirmation result for event publishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfirmation {
    /// Event ID that was published
    pub event_id: String,
    /// Whether the relay accepted the event
    pub accepted: bool,
    /// Message from the relay, often empty on success
    pub message: String,
}

/// Parse and check a relay URL.
pub fn parse_relay_url(url: &str) -> Result<Url> {
    let url = Url::parse(url)?;

    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(ClientError::InvalidUrl(format!(
            "URL must use ws:// or wss:// scheme, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Sign if needed, then refuse anything that would not survive a relay's
/// own checks.
pub fn prepare_event(event: impl Into<OutgoingEvent>, secret_key: &SecretKey) -> Result<Event> {
    let event = event
        .into()
        .sign(secret_key)
        .map_err(|e| ClientError::InvalidEvent(e.to_string()))?;
    check_event(&event)?;
    Ok(event)
}

fn check_event(event: &Event) -> Result<()> {
    if !event.validate() {
        return Err(ClientError::InvalidEvent(format!(
            "event {} is structurally invalid",
            event.id()
        )));
    }
    if !event.verify() {
        return Err(ClientError::InvalidEvent(format!(
            "event {} failed id or signature verification",
            event.id()
        )));
    }
    Ok(())
}

/// Relay connection
pub struct RelayConnection {
    url: Url,
    config: RelayConfig,
    transport: Box<dyn Transport>,
    state: ConnectionState,
}

impl RelayConnection {
    /// Open a WebSocket connection to `url`.
    pub async fn connect(url: &str, config: RelayConfig) -> Result<Self> {
        Self::connect_with(&WebSocketConnector, url, config).await
    }

    /// Open a connection through `connector`, bounded by `connect_timeout`.
    pub async fn connect_with(
        connector: &dyn Connector,
        url: &str,
        config: RelayConfig,
    ) -> Result<Self> {
        let url = parse_relay_url(url)?;

        debug!("Connecting to relay: {}", url);
        let transport = match timeout(config.connect_timeout, connector.connect(&url)).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => {
                warn!("Failed to connect to {}: {}", url, e);
                return Err(e);
            }
            Err(_) => {
                return Err(ClientError::Timeout(format!(
                    "Connection to {} timed out after {:?}",
                    url, config.connect_timeout
                )));
            }
        };
        debug!("Connected to relay: {}", url);

        Ok(Self::with_transport(url, transport, config))
    }

    /// Wrap an already open transport.
    pub fn with_transport(url: Url, transport: Box<dyn Transport>, config: RelayConfig) -> Self {
        Self {
            url,
            config,
            transport,
            state: ConnectionState::Connected,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Sign `event` if unsigned, check it, publish it and wait for the relay's
    /// verdict.
    ///
    /// An event that fails validation or verification is never sent.
    pub async fn publish(
        self,
        event: impl Into<OutgoingEvent>,
        secret_key: &SecretKey,
    ) -> Result<PublishConfirmation> {
        match prepare_event(event, secret_key) {
            Ok(event) => self.publish_signed(&event).await,
            Err(e) => {
                self.close().await;
                Err(e)
            }
        }
    }

    /// Publish an already signed event.
    pub async fn publish_signed(mut self, event: &Event) -> Result<PublishConfirmation> {
        let result = match check_event(event) {
            Ok(()) => self.run_publish(event).await,
            Err(e) => Err(e),
        };
        self.close().await;
        result
    }

    /// Collect events matching `filter` until EOSE or the deadline.
    ///
    /// Events arrive in relay order. Running out of time is not an error: the
    /// events collected so far are returned.
    pub async fn request(mut self, filter: &Filter) -> Result<Vec<Event>> {
        let result = self.run_request(filter).await;
        self.close().await;
        result
    }

    /// Same as [`RelayConnection::request`].
    pub async fn list(self, filter: &Filter) -> Result<Vec<Event>> {
        self.request(filter).await
    }

    /// First event matching `filter`, if any arrives in time.
    pub async fn get(self, filter: &Filter) -> Result<Option<Event>> {
        Ok(self.request(filter).await?.into_iter().next())
    }

    async fn run_publish(&mut self, event: &Event) -> Result<PublishConfirmation> {
        let event_id = event.id().to_string();
        let deadline = Instant::now() + self.config.timeout;
        self.send(ClientMessage::Event(event.clone()), deadline).await?;
        self.state = ConnectionState::Publishing;

        loop {
            match self.next_message(deadline).await {
                Some(RelayMessage::Ok {
                    event_id: acked,
                    success,
                    message,
                }) if acked == event_id => {
                    self.state = ConnectionState::Connected;
                    if success {
                        debug!("Relay {} accepted event {}", self.url, event_id);
                        return Ok(PublishConfirmation {
                            event_id,
                            accepted: true,
                            message,
                        });
                    }
                    return Err(ClientError::RelayRejected { event_id, message });
                }
                Some(_) => {}
                None => {
                    return Err(ClientError::Timeout(format!(
                        "No OK for event {} from {} within {:?}",
                        event_id, self.url, self.config.timeout
                    )));
                }
            }
        }
    }

    async fn run_request(&mut self, filter: &Filter) -> Result<Vec<Event>> {
        let subscription_id = generate_subscription_id();
        let deadline = Instant::now() + self.config.timeout;
        self.send(
            ClientMessage::Req {
                subscription_id: subscription_id.clone(),
                filters: vec![filter.clone()],
            },
            deadline,
        )
        .await?;
        self.state = ConnectionState::Subscribing;

        let mut events = Vec::new();
        loop {
            match self.next_message(deadline).await {
                Some(RelayMessage::Event {
                    subscription_id: sid,
                    event,
                }) if sid == subscription_id => events.push(event),
                Some(RelayMessage::Eose {
                    subscription_id: sid,
                }) if sid == subscription_id => {
                    let close = ClientMessage::Close {
                        subscription_id: subscription_id.clone(),
                    };
                    if let Err(e) = self.send(close, deadline).await {
                        debug!("Failed to send CLOSE to {}: {}", self.url, e);
                    }
                    break;
                }
                Some(RelayMessage::Closed {
                    subscription_id: sid,
                    message,
                }) if sid == subscription_id => {
                    warn!(
                        "Relay {} closed subscription {}: {}",
                        self.url, subscription_id, message
                    );
                    break;
                }
                Some(_) => {}
                None => {
                    debug!(
                        "Request to {} timed out with {} events collected",
                        self.url,
                        events.len()
                    );
                    break;
                }
            }
        }

        self.state = ConnectionState::Connected;
        Ok(events)
    }

    /// Send `message`, giving up once `deadline` passes.
    async fn send(&mut self, message: ClientMessage, deadline: Instant) -> Result<()> {
        let json = message.to_json()?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, self.transport.send(json)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(format!(
                "Send to {} did not complete within {:?}",
                self.url, self.config.timeout
            ))),
        }
    }

    /// Next decodable relay message, or `None` once `deadline` passes.
    ///
    /// NOTICE messages are logged and skipped.
    async fn next_message(&mut self, deadline: Instant) -> Option<RelayMessage> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match timeout(remaining, self.transport.recv()).await {
                Err(_) => return None,
                Ok(Ok(Some(text))) => match RelayMessage::from_json(&text) {
                    Ok(RelayMessage::Notice { message }) => {
                        info!("NOTICE from {}: {}", self.url, message);
                    }
                    Ok(message) => return Some(message),
                    Err(e) => {
                        warn!("Skipping malformed message from {}: {}", self.url, e);
                    }
                },
                Ok(Ok(None)) => pause(self.config.poll_interval, deadline).await,
                Ok(Err(e)) => {
                    debug!("Read error from {}: {}", self.url, e);
                    pause(self.config.poll_interval, deadline).await;
                }
            }
        }
    }

    async fn close(mut self) {
        self.state = ConnectionState::Disconnected;
        match timeout(self.config.connect_timeout, self.transport.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Error closing connection to {}: {}", self.url, e),
            Err(_) => debug!(
                "Closing connection to {} timed out after {:?}",
                self.url, self.config.connect_timeout
            ),
        }
    }
}

/// Back off after an empty or failed read, never past `deadline`.
async fn pause(poll_interval: Duration, deadline: Instant) {
    let remaining = deadline.saturating_duration_since(Instant::now());
    sleep(poll_interval.min(remaining)).await;
}
