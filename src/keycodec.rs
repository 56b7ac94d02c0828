//! License key signing and verification.
//!
//! A license key is `base64(payload_json) + "." + base64(signature)` where
//! the signature is Ed25519 over the exact payload bytes. The payload is
//! serialized once at issuance and verified over the bytes as transmitted,
//! so there is no canonicalization step on the verify path.
//!
//! `verify` is a security boundary: its input is fully attacker-controlled
//! and it must return `None` on any malformed or tampered key, never panic
//! or surface an error.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::{AppError, Result};
use crate::models::LicensePayload;

/// Holds the server keypair. Constructed once at startup and passed by
/// reference to all callers; the private key never leaves this struct.
pub struct KeyCodec {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyCodec {
    /// Generate a fresh keypair (used by tests and first-run setup).
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Construct from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Load the keypair from a key file (base64-encoded 32-byte seed),
    /// generating and persisting a new one if the file does not exist.
    pub fn load_or_generate(path: &Path) -> Result<Self> {
        if path.exists() {
            let encoded = std::fs::read_to_string(path)
                .map_err(|e| AppError::Internal(format!("Failed to read signing key: {}", e)))?;
            let bytes = BASE64
                .decode(encoded.trim())
                .map_err(|e| AppError::Internal(format!("Invalid signing key encoding: {}", e)))?;
            let seed: [u8; 32] = bytes
                .try_into()
                .map_err(|_| AppError::Internal("Signing key must be 32 bytes".into()))?;
            Ok(Self::from_seed(seed))
        } else {
            let codec = Self::generate();
            std::fs::write(path, BASE64.encode(codec.signing_key.to_bytes()))
                .map_err(|e| AppError::Internal(format!("Failed to write signing key: {}", e)))?;
            tracing::info!("Generated new signing keypair at {}", path.display());
            Ok(codec)
        }
    }

    /// Base64 of the public verifying key, distributed to clients for
    /// optional local pre-validation.
    pub fn public_key_b64(&self) -> String {
        BASE64.encode(self.verifying_key.to_bytes())
    }

    /// Serialize and sign a payload, producing an opaque license key.
    pub fn issue(&self, payload: &LicensePayload) -> Result<String> {
        let payload_bytes = serde_json::to_vec(payload)?;
        let signature = self.signing_key.sign(&payload_bytes);
        Ok(format!(
            "{}.{}",
            BASE64.encode(&payload_bytes),
            BASE64.encode(signature.to_bytes())
        ))
    }

    /// Verify a license key and return the decoded payload.
    ///
    /// Returns `None` for any malformed input, decode failure, or signature
    /// mismatch. A valid signature only proves the key was issued by this
    /// server - the activation ledger remains the source of truth for
    /// limits and revocation.
    pub fn verify(&self, license_key: &str) -> Option<LicensePayload> {
        let (payload_b64, signature_b64) = license_key.split_once('.')?;

        let payload_bytes = BASE64.decode(payload_b64).ok()?;
        let signature_bytes = BASE64.decode(signature_b64).ok()?;
        let signature = Signature::from_slice(&signature_bytes).ok()?;

        self.verifying_key
            .verify(&payload_bytes, &signature)
            .ok()?;

        serde_json::from_slice(&payload_bytes).ok()
    }
}

impl std::fmt::Debug for KeyCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCodec")
            .field("public_key", &self.public_key_b64())
            .finish()
    }
}
