//! Schnorr keys, signing and verification over event ids.

use std::fmt;
use std::str::FromStr;

use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::{self, Keypair, Message, XOnlyPublicKey, schnorr};
use rand::RngCore;
use zeroize::Zeroize;

use crate::codec::{HEX_ID_LEN, HEX_SIG_LEN, is_hex};
use crate::error::EventError;

/// A secp256k1 secret key.
///
/// The bytes are wiped when the key is dropped and never appear in `Debug`
/// output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Generate a random secret key from the OS RNG.
    pub fn generate() -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut bytes);
            // Rejects zero and values >= the curve order (vanishingly rare)
            if let Ok(key) = Self::from_bytes(bytes) {
                return key;
            }
        }
    }

    /// Build a key from raw bytes, checking it lies on the curve's scalar range.
    pub fn from_bytes(mut bytes: [u8; 32]) -> Result<Self, EventError> {
        let checked = secp256k1::SecretKey::from_slice(&bytes)
            .map(|_| Self(bytes))
            .map_err(|e| EventError::InvalidSecretKey(e.to_string()));
        bytes.zeroize();
        checked
    }

    /// Parse a 64-character hex secret key.
    pub fn from_hex(value: &str) -> Result<Self, EventError> {
        let mut decoded = hex::decode(value.trim())
            .map_err(|e| EventError::InvalidSecretKey(format!("invalid hex: {}", e)))?;
        if decoded.len() != 32 {
            decoded.zeroize();
            return Err(EventError::InvalidSecretKey(
                "secret key must be 32 bytes".to_string(),
            ));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Self::from_bytes(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The x-only public key, 64 lowercase hex characters.
    pub fn public_key_hex(&self) -> Result<String, EventError> {
        Ok(hex::encode(self.keypair()?.x_only_public_key().0.serialize()))
    }

    fn keypair(&self) -> Result<Keypair, EventError> {
        let secp = Secp256k1::signing_only();
        let sk = secp256k1::SecretKey::from_slice(&self.0)
            .map_err(|e| EventError::InvalidSecretKey(e.to_string()))?;
        Ok(Keypair::from_secret_key(&secp, &sk))
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl FromStr for SecretKey {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Derive the x-only public key (hex) of a secret key.
pub fn derive_public_key(secret_key: &SecretKey) -> Result<String, EventError> {
    secret_key.public_key_hex()
}

/// Sign a 32-byte event id (hex) with BIP-340 Schnorr.
///
/// Uses the all-zero auxiliary randomness variant, so a given key and id always
/// yield the same 128-character signature.
pub fn sign_id(event_id: &str, secret_key: &SecretKey) -> Result<String, EventError> {
    if !is_hex(event_id, HEX_ID_LEN) {
        return Err(EventError::Signing(format!(
            "event id must be {} hex characters",
            HEX_ID_LEN
        )));
    }
    let id_bytes = hex::decode(event_id)?;
    let message = Message::from_digest_slice(&id_bytes)
        .map_err(|e| EventError::Signing(format!("invalid message: {}", e)))?;

    let secp = Secp256k1::signing_only();
    let keypair = secret_key.keypair()?;
    let sig = secp.sign_schnorr_no_aux_rand(&message, &keypair);
    Ok(hex::encode(sig.serialize()))
}

/// Verify a Schnorr signature over an event id.
///
/// Never errors: malformed hex of any field makes the check fail.
pub fn verify_signature(event_id: &str, pubkey: &str, signature: &str) -> bool {
    if !is_hex(event_id, HEX_ID_LEN)
        || !is_hex(pubkey, HEX_ID_LEN)
        || !is_hex(signature, HEX_SIG_LEN)
    {
        return false;
    }

    let (Ok(id_bytes), Ok(pk_bytes), Ok(sig_bytes)) = (
        hex::decode(event_id),
        hex::decode(pubkey),
        hex::decode(signature),
    ) else {
        return false;
    };

    let Ok(message) = Message::from_digest_slice(&id_bytes) else {
        return false;
    };
    let Ok(pubkey) = XOnlyPublicKey::from_slice(&pk_bytes) else {
        return false;
    };
    let Ok(sig) = schnorr::Signature::from_slice(&sig_bytes) else {
        return false;
    };

    Secp256k1::verification_only()
        .verify_schnorr(&sig, &message, &pubkey)
        .is_ok()
}
