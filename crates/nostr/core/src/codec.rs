//! Canonical event serialization and identity hashing.
//!
//! The event id is the lowercase hex SHA-256 of
//! `[0,<pubkey>,<created_at>,<kind>,<tags>,<content>]` serialized with no
//! insignificant whitespace, `/` and non-ASCII characters left unescaped, and
//! every array kept in the order given. `serde_json` produces exactly this form
//! for a tuple of these types: it escapes only `"`, `\` and control characters
//! (`\b`, `\f`, `\n`, `\r`, `\t`, otherwise `\u00XX`), which is what NIP-01
//! prescribes. Any other serializer would change ids.

use bitcoin::hashes::{Hash, sha256};

use crate::error::EventError;
use crate::event::UnsignedEvent;

/// Length of a hex-encoded event id or public key.
pub const HEX_ID_LEN: usize = 64;

/// Length of a hex-encoded Schnorr signature.
pub const HEX_SIG_LEN: usize = 128;

/// Serialize the identity-defining fields of an event in canonical form.
///
/// Format: `[0, pubkey, created_at, kind, tags, content]`
pub fn serialize_event(event: &UnsignedEvent) -> Result<String, EventError> {
    canonical_json(
        &event.pubkey,
        event.created_at,
        event.kind,
        &event.tags,
        &event.content,
    )
}

/// Compute the event id from its parts.
///
/// Fails with [`EventError::InvalidState`] when `pubkey` is empty, since the
/// author is part of the hashed payload.
pub fn compute_id(
    pubkey: &str,
    created_at: u64,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> Result<String, EventError> {
    let serialized = canonical_json(pubkey, created_at, kind, tags, content)?;
    Ok(sha256_hex(serialized.as_bytes()))
}

/// Get the event hash (id) of an unsigned event.
pub fn get_event_hash(event: &UnsignedEvent) -> Result<String, EventError> {
    compute_id(
        &event.pubkey,
        event.created_at,
        event.kind,
        &event.tags,
        &event.content,
    )
}

fn canonical_json(
    pubkey: &str,
    created_at: u64,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> Result<String, EventError> {
    if pubkey.is_empty() {
        return Err(EventError::InvalidState(
            "can't compute an event id before the pubkey is set".to_string(),
        ));
    }
    if !is_hex(pubkey, HEX_ID_LEN) {
        return Err(EventError::InvalidEvent(format!(
            "pubkey must be {} lowercase hex characters",
            HEX_ID_LEN
        )));
    }

    Ok(serde_json::to_string(&(0, pubkey, created_at, kind, tags, content))?)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let hash = sha256::Hash::hash(bytes);
    hex::encode(hash.as_byte_array())
}

/// True when `value` is exactly `len` lowercase hex digits.
pub(crate) fn is_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}
