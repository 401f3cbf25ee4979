//! Secure memory handling with automatic zeroization

use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{PipelineError, Result};

/// Size of the AES-256 master key in bytes
pub const MASTER_KEY_LEN: usize = 32;

/// Master encryption key - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; MASTER_KEY_LEN],
}

impl MasterKey {
    /// Create a new master key from raw bytes
    pub fn new(key: [u8; MASTER_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.key
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != MASTER_KEY_LEN {
            return None;
        }
        let mut key = [0u8; MASTER_KEY_LEN];
        key.copy_from_slice(slice);
        Some(Self { key })
    }

    /// Parse the configured key material
    ///
    /// Accepted encodings, tried in order:
    /// - 64 hex characters
    /// - 32 printable ASCII characters used verbatim
    /// - base64 of exactly 32 bytes
    pub fn parse(material: &str) -> Result<Self> {
        let material = material.trim();
        if material.is_empty() {
            return Err(PipelineError::KmsKeyMissing);
        }

        if material.chars().any(|c| !c.is_ascii_graphic()) {
            return Err(PipelineError::KmsKeyInvalid(
                "key contains non-printable characters".to_string(),
            ));
        }

        if material.len() == MASTER_KEY_LEN * 2
            && material.bytes().all(|b| b.is_ascii_hexdigit())
        {
            let bytes = Zeroizing::new(
                hex::decode(material).map_err(|e| PipelineError::KmsKeyInvalid(e.to_string()))?,
            );
            return Self::from_slice(&bytes).ok_or_else(|| {
                PipelineError::KmsKeyInvalid("hex key must decode to 32 bytes".to_string())
            });
        }

        if material.len() == MASTER_KEY_LEN {
            return Self::from_slice(material.as_bytes()).ok_or_else(|| {
                PipelineError::KmsKeyInvalid("key must be 32 bytes".to_string())
            });
        }

        if let Ok(decoded) = STANDARD.decode(material) {
            let decoded = Zeroizing::new(decoded);
            if let Some(key) = Self::from_slice(&decoded) {
                return Ok(key);
            }
        }

        Err(PipelineError::KmsKeyInvalid(format!(
            "expected 32 bytes of key material, got {} characters",
            material.len()
        )))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Decrypted secret value - automatically zeroed when dropped
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// First four characters followed by `***`, safe for operator logs
    pub fn masked(&self) -> String {
        let prefix: String = self.value.chars().take(4).collect();
        format!("{}***", prefix)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
