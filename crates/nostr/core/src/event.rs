//! Event entity: templates, signing, and the two validation levels.
//!
//! An event is either unsigned ([`EventTemplate`]) or signed ([`Event`]); there is
//! no partially signed state. Signing consumes the template and produces an
//! `Event` whose id, pubkey and signature can only be read afterwards.
//!
//! Validation comes in two strengths that must not be confused:
//! - [`Event::validate`] checks structure only (hex lengths and casing). It is
//!   cheap and is what gates network I/O.
//! - [`Event::verify`] additionally recomputes the id from the content and
//!   checks the Schnorr signature. It is what establishes provenance.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{HEX_ID_LEN, HEX_SIG_LEN, compute_id, is_hex};
use crate::error::EventError;
use crate::keys::{SecretKey, sign_id, verify_signature};

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// An unsigned event, before the author is known.
///
/// # Examples
///
/// ```
/// use nostr_core::{EventTemplate, SecretKey, KIND_TEXT_NOTE};
///
/// let secret_key = SecretKey::generate();
/// let event = EventTemplate::new(KIND_TEXT_NOTE, "Hello Nostr!")
///     .tag(vec!["t".to_string(), "nostr".to_string()])
///     .sign(&secret_key)
///     .unwrap();
///
/// assert!(event.verify());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTemplate {
    /// Unix timestamp in seconds; 0 means "now" at signing time
    pub created_at: u64,
    /// Event kind
    pub kind: u16,
    /// Array of arrays of strings (tags)
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    #[serde(default)]
    pub content: String,
}

impl EventTemplate {
    /// Create a template stamped with the current time.
    pub fn new(kind: u16, content: impl Into<String>) -> Self {
        Self {
            created_at: unix_now(),
            kind,
            tags: Vec::new(),
            content: content.into(),
        }
    }

    /// Set the creation time. Zero keeps the "stamp at signing" behavior.
    pub fn created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Append one tag.
    pub fn tag(mut self, tag: Vec<String>) -> Self {
        self.tags.push(tag);
        self
    }

    /// Replace all tags.
    pub fn tags(mut self, tags: Vec<Vec<String>>) -> Self {
        self.tags = tags;
        self
    }

    /// Resolve the author, yielding the hashable form.
    pub fn to_unsigned(&self, pubkey: impl Into<String>) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: pubkey.into(),
            created_at: if self.created_at == 0 {
                unix_now()
            } else {
                self.created_at
            },
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
        }
    }

    /// Sign the template, computing pubkey, id and signature.
    pub fn sign(&self, secret_key: &SecretKey) -> Result<Event, EventError> {
        let pubkey = secret_key.public_key_hex()?;
        self.to_unsigned(pubkey).sign(secret_key)
    }
}

/// The identity-defining fields of an event: everything but `id` and `sig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind
    pub kind: u16,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
}

impl UnsignedEvent {
    /// Canonical id of these fields.
    pub fn id(&self) -> Result<String, EventError> {
        compute_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    /// Sign with `secret_key`, which must belong to `pubkey`.
    pub fn sign(self, secret_key: &SecretKey) -> Result<Event, EventError> {
        let derived = secret_key.public_key_hex()?;
        if derived != self.pubkey {
            return Err(EventError::InvalidEvent(
                "pubkey does not belong to the signing key".to_string(),
            ));
        }

        let id = self.id()?;
        let sig = sign_id(&id, secret_key)?;

        Ok(Event {
            id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig,
        })
    }
}

/// A signed Nostr event.
///
/// Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: String,
    pubkey: String,
    created_at: u64,
    kind: u16,
    tags: Vec<Vec<String>>,
    content: String,
    sig: String,
}

impl Event {
    /// Rebuild an event from a known signed payload.
    ///
    /// Nothing is checked here; call [`Event::validate`] or [`Event::verify`]
    /// before trusting the result.
    pub fn from_parts(
        id: impl Into<String>,
        pubkey: impl Into<String>,
        created_at: u64,
        kind: u16,
        tags: Vec<Vec<String>>,
        content: impl Into<String>,
        sig: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pubkey: pubkey.into(),
            created_at,
            kind,
            tags,
            content: content.into(),
            sig: sig.into(),
        }
    }

    /// Parse a JSON event object.
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize as a JSON event object.
    pub fn to_json(&self) -> Result<String, EventError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pubkey(&self) -> &str {
        &self.pubkey
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn kind(&self) -> u16 {
        self.kind
    }

    pub fn tags(&self) -> &[Vec<String>] {
        &self.tags
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sig(&self) -> &str {
        &self.sig
    }

    /// Structural check: id, pubkey and sig are lowercase hex of the right length.
    ///
    /// Does not touch the signature or recompute the id.
    pub fn validate(&self) -> bool {
        is_hex(&self.id, HEX_ID_LEN)
            && is_hex(&self.pubkey, HEX_ID_LEN)
            && is_hex(&self.sig, HEX_SIG_LEN)
    }

    /// Full check: structure, id matches content, and signature is valid.
    pub fn verify(&self) -> bool {
        if !self.validate() {
            return false;
        }

        match compute_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        ) {
            Ok(computed) if computed == self.id => {}
            _ => return false,
        }

        verify_signature(&self.id, &self.pubkey, &self.sig)
    }

    /// Values (second element) of every tag named `name`.
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.first().map(String::as_str) == Some(name))
            .filter_map(|tag| tag.get(1).map(String::as_str))
    }

    /// Thread root: the first `e` tag marked `root`.
    pub fn root_id(&self) -> Option<&str> {
        self.marked_event_ref("root")
    }

    /// Direct parent: the first `e` tag marked `reply`.
    pub fn reply_id(&self) -> Option<&str> {
        self.marked_event_ref("reply")
    }

    fn marked_event_ref(&self, marker: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| {
                tag.first().map(String::as_str) == Some("e")
                    && tag.last().map(String::as_str) == Some(marker)
            })
            .and_then(|tag| tag.get(1).map(String::as_str))
    }
}

/// What a caller hands to a relay: an unsigned template or an already signed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingEvent {
    Unsigned(EventTemplate),
    Signed(Event),
}

impl OutgoingEvent {
    pub fn is_signed(&self) -> bool {
        matches!(self, OutgoingEvent::Signed(_))
    }

    /// Sign if unsigned; an already signed event is returned untouched.
    pub fn sign(self, secret_key: &SecretKey) -> Result<Event, EventError> {
        match self {
            OutgoingEvent::Unsigned(template) => template.sign(secret_key),
            OutgoingEvent::Signed(event) => Ok(event),
        }
    }
}

impl From<EventTemplate> for OutgoingEvent {
    fn from(template: EventTemplate) -> Self {
        OutgoingEvent::Unsigned(template)
    }
}

impl From<Event> for OutgoingEvent {
    fn from(event: Event) -> Self {
        OutgoingEvent::Signed(event)
    }
}

/// Structurally validate a raw JSON event payload, signed or unsigned.
///
/// Rejects a `kind` that is not a non-negative integer in the 16-bit range, a
/// `created_at` that is not a non-negative integer, `tags` that are not arrays
/// of strings, non-string `content`, and `id`/`pubkey`/`sig` that are not
/// lowercase hex of the right length when present.
pub fn validate_value(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    match obj.get("kind").and_then(Value::as_u64) {
        Some(kind) if kind <= u16::MAX as u64 => {}
        _ => return false,
    }

    if obj.get("created_at").and_then(Value::as_u64).is_none() {
        return false;
    }

    if let Some(content) = obj.get("content")
        && !content.is_string()
    {
        return false;
    }

    if let Some(tags) = obj.get("tags") {
        let Some(tags) = tags.as_array() else {
            return false;
        };
        let well_formed = tags.iter().all(|tag| {
            tag.as_array()
                .is_some_and(|items| items.iter().all(Value::is_string))
        });
        if !well_formed {
            return false;
        }
    }

    let hex_field_ok = |key: &str, len: usize| match obj.get(key) {
        None => true,
        Some(Value::String(s)) => is_hex(s, len),
        Some(_) => false,
    };

    hex_field_ok("id", HEX_ID_LEN)
        && hex_field_ok("pubkey", HEX_ID_LEN)
        && hex_field_ok("sig", HEX_SIG_LEN)
}

/// Sort events newest first, then by id for equal timestamps.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| match b.created_at.cmp(&a.created_at) {
        std::cmp::Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
}
