//! Nostr event model.
//!
//! This crate provides the protocol-correct, I/O-free half of the client:
//! - Canonical event serialization and SHA-256 identity ([`compute_id`])
//! - BIP-340 Schnorr signing and verification over event ids
//! - The event entity: unsigned templates, signed events, structural
//!   validation ([`Event::validate`]) and full verification ([`Event::verify`])
//! - Subscription filters
//! - Kind classification and standard tag builders
//!
//! # Example
//!
//! ```
//! use nostr_core::{EventTemplate, Filter, SecretKey, KIND_TEXT_NOTE};
//!
//! let secret_key = SecretKey::generate();
//! let event = EventTemplate::new(KIND_TEXT_NOTE, "gm").sign(&secret_key).unwrap();
//! assert!(event.validate());
//! assert!(event.verify());
//!
//! let filter = Filter::new().kinds(vec![KIND_TEXT_NOTE]).limit(10);
//! assert!(filter.matches(&event));
//! ```

mod codec;
mod error;
mod event;
mod filter;
mod keys;
mod kind;
mod tags;


pub use codec::{HEX_ID_LEN, HEX_SIG_LEN, compute_id, get_event_hash, serialize_event};
pub use error::EventError;
pub use event::{
    Event, EventTemplate, OutgoingEvent, UnsignedEvent, sort_events, unix_now, validate_value,
};
pub use filter::Filter;
pub use keys::{SecretKey, derive_public_key, sign_id, verify_signature};
pub use kind::{
    KIND_CONTACTS, KIND_ENCRYPTED_DIRECT_MESSAGE, KIND_EVENT_DELETION, KIND_LONG_FORM,
    KIND_METADATA, KIND_REACTION, KIND_RECOMMEND_RELAY, KIND_RELAY_LIST, KIND_REPOST,
    KIND_TEXT_NOTE, KindClassification, classify_kind, is_addressable_kind, is_ephemeral_kind,
    is_regular_kind, is_replaceable_kind,
};
pub use tags::Tag;
