//! Local license key pre-validation.
//!
//! A key is `base64(payload_json) + "." + base64(ed25519_signature)`. With
//! the server's public key the SDK can reject tampered keys before making
//! a network call. This is advisory only - the server's activation ledger
//! remains the source of truth for limits, revocation, and expiry.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Deserialize;

/// The signed payload embedded in a license key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPayload {
    pub license_id: String,
    pub customer_id: String,
    pub tier: String,
    pub max_activations: i64,
    pub issued_at: i64,
    pub expires_at: i64,
    pub features: Vec<String>,
}

/// Decode a base64 Ed25519 public key.
pub fn decode_public_key(public_key_b64: &str) -> Option<VerifyingKey> {
    let bytes = BASE64.decode(public_key_b64.trim()).ok()?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

/// Verify a license key against the server's public key and return the
/// embedded payload. Returns `None` for any malformed or tampered input.
pub fn verify_key(public_key: &VerifyingKey, license_key: &str) -> Option<KeyPayload> {
    let (payload_b64, signature_b64) = license_key.split_once('.')?;

    let payload_bytes = BASE64.decode(payload_b64).ok()?;
    let signature_bytes = BASE64.decode(signature_b64).ok()?;
    let signature = Signature::from_slice(&signature_bytes).ok()?;

    public_key.verify(&payload_bytes, &signature).ok()?;

    serde_json::from_slice(&payload_bytes).ok()
}
