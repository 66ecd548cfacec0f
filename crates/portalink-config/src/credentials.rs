//! Vendor credential encryption using AES-256-GCM.
//!
//! Tenant API credentials are stored encrypted and decrypted only at
//! request time. The ciphertext format is three colon-delimited hex
//! segments, `iv:tag:payload`, so a row is self-describing and tampering
//! with any segment fails authentication on decrypt.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

use portalink_core::{PortalError, Result};

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Authentication tag size for AES-256-GCM (128 bits)
const TAG_SIZE: usize = 16;

/// Key size for AES-256 (256 bits)
const KEY_SIZE: usize = 32;

/// Environment variable holding the credential encryption key.
pub const CREDENTIAL_KEY_ENV: &str = "PORTALINK_CREDENTIAL_KEY";

/// Symmetric cipher for tenant API credentials.
///
/// Constructed once at process start from configuration and passed by
/// reference to whichever component needs it. Cloning is cheap; the key is
/// never exposed after construction.
#[derive(Clone)]
pub struct CredentialCipher {
    key: [u8; KEY_SIZE],
}

impl CredentialCipher {
    /// Create a cipher from a raw 256-bit key.
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Create a cipher from the `PORTALINK_CREDENTIAL_KEY` environment
    /// variable (hex or base64 encoded, 32 bytes).
    pub fn from_env() -> Result<Self> {
        let key_str = std::env::var(CREDENTIAL_KEY_ENV).map_err(|_| {
            PortalError::credential(format!("{CREDENTIAL_KEY_ENV} is not set"))
        })?;
        Ok(Self::new(Self::parse_key(&key_str)?))
    }

    /// Parse a key from a hex or base64 string.
    fn parse_key(key_str: &str) -> Result<[u8; KEY_SIZE]> {
        // Try hex first
        if key_str.len() == KEY_SIZE * 2 {
            let bytes = hex::decode(key_str)
                .map_err(|e| PortalError::credential(format!("Invalid hex key: {e}")))?;
            if bytes.len() == KEY_SIZE {
                let mut key = [0u8; KEY_SIZE];
                key.copy_from_slice(&bytes);
                return Ok(key);
            }
        }

        // Try base64
        let bytes = BASE64
            .decode(key_str.trim())
            .map_err(|e| PortalError::credential(format!("Invalid base64 key: {e}")))?;

        if bytes.len() != KEY_SIZE {
            return Err(PortalError::credential(format!(
                "Key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(key)
    }

    /// Generate a new random key.
    pub fn generate_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    /// Encrypt a plaintext credential into `iv:tag:payload` hex segments.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| PortalError::credential(format!("Failed to create cipher: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // aes-gcm appends the auth tag to the ciphertext
        let mut payload = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| PortalError::credential(format!("Encryption failed: {e}")))?;
        let tag = payload.split_off(payload.len() - TAG_SIZE);

        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(tag),
            hex::encode(payload)
        ))
    }

    /// Decrypt an `iv:tag:payload` credential string.
    ///
    /// Tampering with any segment, or a malformed segment count, is a hard
    /// error; there is no fallback to treating the value as plaintext.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let segments: Vec<&str> = ciphertext.split(':').collect();
        let [iv_hex, tag_hex, payload_hex] = segments.as_slice() else {
            return Err(PortalError::credential(
                "Invalid encrypted credential format",
            ));
        };

        let nonce_bytes = hex::decode(iv_hex)
            .map_err(|e| PortalError::credential(format!("Invalid IV hex: {e}")))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(PortalError::credential("Invalid IV size"));
        }
        let tag = hex::decode(tag_hex)
            .map_err(|e| PortalError::credential(format!("Invalid tag hex: {e}")))?;
        if tag.len() != TAG_SIZE {
            return Err(PortalError::credential("Invalid auth tag size"));
        }
        let mut payload = hex::decode(payload_hex)
            .map_err(|e| PortalError::credential(format!("Invalid payload hex: {e}")))?;
        payload.extend_from_slice(&tag);

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| PortalError::credential(format!("Failed to create cipher: {e}")))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, payload.as_ref())
            .map_err(|_| PortalError::credential("Decryption failed"))?;

        String::from_utf8(plaintext)
            .map_err(|e| PortalError::credential(format!("Invalid UTF-8 in credential: {e}")))
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("key", &"<redacted>")
            .finish()
    }
}
