//! Shared harness for the client integration tests
//!
//! - [`ScriptedTransport`] / [`ScriptedConnector`]: in-memory relays driven by
//!   canned steps or by a responder reacting to what the client sends
//! - [`spawn_loopback_relay`]: a real WebSocket relay on 127.0.0.1

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use nostr_client::{ClientError, Connector, Event, Filter, RelayConfig, SecretKey, Transport};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

pub const TEST_SECRET_KEY: &str =
    "d217c1ff2f8a65c3e3a1740db3b9f58b8c848bb45e26d00ed4714e4a0f4ceecf";

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub fn test_key() -> SecretKey {
    SecretKey::from_hex(TEST_SECRET_KEY).unwrap()
}

/// Short deadlines so real-socket tests stay quick.
pub fn test_config() -> RelayConfig {
    RelayConfig {
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(10),
    }
}

// =============================================================================
// Wire helpers
// =============================================================================

fn parse(text: &str) -> Vec<Value> {
    serde_json::from_str(text).unwrap_or_default()
}

/// Subscription id of a `["REQ", ...]` or `["CLOSE", ...]` message.
pub fn subscription_id_of(text: &str) -> Option<String> {
    let arr = parse(text);
    match arr.first().and_then(Value::as_str) {
        Some("REQ") | Some("CLOSE") => arr.get(1).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Event id of a `["EVENT", {...}]` message.
pub fn event_id_of(text: &str) -> Option<String> {
    let arr = parse(text);
    if arr.first().and_then(Value::as_str) != Some("EVENT") {
        return None;
    }
    arr.get(1)?.get("id")?.as_str().map(str::to_string)
}

pub fn ok_frame(event_id: &str, success: bool, message: &str) -> String {
    json!(["OK", event_id, success, message]).to_string()
}

pub fn event_frame(subscription_id: &str, event: &Event) -> String {
    json!(["EVENT", subscription_id, event]).to_string()
}

pub fn eose_frame(subscription_id: &str) -> String {
    json!(["EOSE", subscription_id]).to_string()
}

pub fn closed_frame(subscription_id: &str, message: &str) -> String {
    json!(["CLOSED", subscription_id, message]).to_string()
}

pub fn signed_note(content: &str, created_at: u64) -> Event {
    nostr_client::EventTemplate::new(1, content)
        .created_at(created_at)
        .sign(&test_key())
        .unwrap()
}

// =============================================================================
// Scripted transport
// =============================================================================

/// One thing the scripted relay does when the client reads.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver a text frame
    Frame(String),
    /// Fail this read
    ReadError(String),
    /// A read that yields nothing usable
    Empty,
    /// Stall before the next step
    Delay(Duration),
}

/// Produces the steps queued in reply to one sent message.
pub type Responder = Arc<dyn Fn(&str) -> Vec<Step> + Send + Sync>;

/// What the client did to one transport.
#[derive(Clone, Default)]
pub struct Wire {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Wire {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ScriptedTransport {
    inbox: VecDeque<Step>,
    responder: Option<Responder>,
    fail_reads: bool,
    fail_sends: bool,
    stall_sends: bool,
    stall_close: bool,
    wire: Wire,
}

impl ScriptedTransport {
    /// Plays `steps`, then stays silent forever.
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            inbox: steps.into(),
            responder: None,
            fail_reads: false,
            fail_sends: false,
            stall_sends: false,
            stall_close: false,
            wire: Wire::default(),
        }
    }

    pub fn silent() -> Self {
        Self::new(vec![])
    }

    pub fn responding(responder: Responder) -> Self {
        let mut transport = Self::new(vec![]);
        transport.responder = Some(responder);
        transport
    }

    /// Every read fails once the script runs out.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Sends never complete, like a peer that stopped reading.
    pub fn stalled_sends(mut self) -> Self {
        self.stall_sends = true;
        self
    }

    /// The close handshake never completes.
    pub fn stalled_close(mut self) -> Self {
        self.stall_close = true;
        self
    }

    pub fn wire(&self) -> Wire {
        self.wire.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, text: String) -> nostr_client::Result<()> {
        if self.fail_sends {
            return Err(ClientError::Transport("broken pipe".to_string()));
        }
        if self.stall_sends {
            std::future::pending::<()>().await;
        }
        if let Some(responder) = &self.responder {
            self.inbox.extend(responder(&text));
        }
        self.wire.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv(&mut self) -> nostr_client::Result<Option<String>> {
        loop {
            match self.inbox.pop_front() {
                Some(Step::Frame(text)) => return Ok(Some(text)),
                Some(Step::ReadError(e)) => return Err(ClientError::Transport(e)),
                Some(Step::Empty) => return Ok(None),
                Some(Step::Delay(d)) => tokio::time::sleep(d).await,
                None if self.fail_reads => {
                    return Err(ClientError::Transport("connection reset".to_string()));
                }
                None => std::future::pending::<()>().await,
            }
        }
    }

    async fn close(&mut self) -> nostr_client::Result<()> {
        if self.stall_close {
            std::future::pending::<()>().await;
        }
        self.wire.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Responders
// =============================================================================

/// Acknowledges every EVENT with `success`.
pub fn acknowledge(success: bool, message: &'static str) -> Responder {
    Arc::new(move |sent| match event_id_of(sent) {
        Some(id) => vec![Step::Frame(ok_frame(&id, success, message))],
        None => vec![],
    })
}

/// Answers every REQ with `events` and then EOSE, optionally followed by
/// frames that must be ignored.
pub fn serve(events: Vec<Event>, after_eose: Vec<Event>) -> Responder {
    Arc::new(move |sent| {
        let Some(sub) = subscription_id_of(sent) else {
            return vec![];
        };
        if !sent.starts_with(r#"["REQ""#) {
            return vec![];
        }
        let mut steps: Vec<Step> = events
            .iter()
            .map(|e| Step::Frame(event_frame(&sub, e)))
            .collect();
        steps.push(Step::Frame(eose_frame(&sub)));
        steps.extend(after_eose.iter().map(|e| Step::Frame(event_frame(&sub, e))));
        steps
    })
}

/// Wraps another responder, prefixing each reply with `prefix`.
pub fn after(prefix: Vec<Step>, inner: Responder) -> Responder {
    Arc::new(move |sent| {
        let reply = inner(sent);
        if reply.is_empty() {
            return reply;
        }
        prefix.iter().cloned().chain(reply).collect()
    })
}

// =============================================================================
// Scripted connector
// =============================================================================

type Factory = Arc<dyn Fn() -> ScriptedTransport + Send + Sync>;

enum Route {
    Open(Factory),
    Refuse,
    Hang,
    Crash,
}

/// Routes relay hosts to scripted transports.
#[derive(Default)]
pub struct ScriptedConnector {
    routes: HashMap<String, Route>,
    wires: Mutex<HashMap<String, Vec<Wire>>>,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relay(
        mut self,
        host: &str,
        factory: impl Fn() -> ScriptedTransport + Send + Sync + 'static,
    ) -> Self {
        self.routes
            .insert(host.to_string(), Route::Open(Arc::new(factory)));
        self
    }

    pub fn refuse(mut self, host: &str) -> Self {
        self.routes.insert(host.to_string(), Route::Refuse);
        self
    }

    pub fn hang(mut self, host: &str) -> Self {
        self.routes.insert(host.to_string(), Route::Hang);
        self
    }

    /// Connecting to `host` panics.
    pub fn crash(mut self, host: &str) -> Self {
        self.routes.insert(host.to_string(), Route::Crash);
        self
    }

    /// Every transport opened to `host`, in connect order.
    pub fn wires(&self, host: &str) -> Vec<Wire> {
        self.wires
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .unwrap_or_default()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &Url) -> nostr_client::Result<Box<dyn Transport>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let host = url.host_str().unwrap_or_default().to_string();

        let factory = match self.routes.get(&host) {
            Some(Route::Open(factory)) => Arc::clone(factory),
            Some(Route::Hang) => std::future::pending::<Factory>().await,
            Some(Route::Crash) => panic!("driver for {} crashed", host),
            Some(Route::Refuse) | None => {
                return Err(ClientError::Transport(format!(
                    "connection refused: {}",
                    host
                )));
            }
        };

        let transport = factory();
        self.wires
            .lock()
            .unwrap()
            .entry(host)
            .or_default()
            .push(transport.wire());
        Ok(Box::new(transport))
    }
}

// =============================================================================
// Loopback WebSocket relay
// =============================================================================

/// A minimal relay: stores nothing, answers EVENT with OK (rejecting content
/// `"reject me"`), and answers REQ with the matching `stored` events after a
/// NOTICE and one garbage frame.
pub struct LoopbackRelay {
    pub url: String,
    received: Arc<Mutex<Vec<String>>>,
}

impl LoopbackRelay {
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Wait up to a second for a message starting with `prefix`.
    pub async fn wait_for(&self, prefix: &str) -> bool {
        for _ in 0..100 {
            if self.received().iter().any(|m| m.starts_with(prefix)) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

fn relay_replies(text: &str, stored: &[Event]) -> Vec<String> {
    let arr = parse(text);
    match arr.first().and_then(Value::as_str) {
        Some("EVENT") => {
            let Some(raw) = arr.get(1) else {
                return vec![];
            };
            let id = raw.get("id").and_then(Value::as_str).unwrap_or_default();
            if raw.get("content").and_then(Value::as_str) == Some("reject me") {
                vec![ok_frame(id, false, "blocked: test relay")]
            } else {
                vec![ok_frame(id, true, "")]
            }
        }
        Some("REQ") => {
            let Some(sub) = arr.get(1).and_then(Value::as_str) else {
                return vec![];
            };
            let filter: Filter = arr
                .get(2)
                .and_then(|f| serde_json::from_value(f.clone()).ok())
                .unwrap_or_default();

            let mut replies = vec![
                json!(["NOTICE", "welcome"]).to_string(),
                "garbage".to_string(),
            ];
            replies.extend(
                stored
                    .iter()
                    .filter(|e| filter.matches(e))
                    .map(|e| event_frame(sub, e)),
            );
            replies.push(eose_frame(sub));
            replies
        }
        _ => vec![],
    }
}

pub async fn spawn_loopback_relay(stored: Vec<Event>) -> LoopbackRelay {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let stored = Arc::new(stored);

    let log = Arc::clone(&received);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            let stored = Arc::clone(&stored);
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    let Message::Text(text) = msg else {
                        continue;
                    };
                    let text = text.as_str().to_owned();
                    log.lock().unwrap().push(text.clone());
                    for reply in relay_replies(&text, &stored) {
                        if ws.send(Message::Text(reply.into())).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });

    LoopbackRelay {
        url: format!("ws://{}", addr),
        received,
    }
}
