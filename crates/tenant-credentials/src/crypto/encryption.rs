//! AES-256-GCM authenticated decryption of stored credential fields
//!
//! Blob layout: `IV (12 bytes) || auth tag (16 bytes) || ciphertext`, stored
//! either as raw bytes or as a base64 string of the same bytes.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::env::VarError;
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

use super::plausibility::check_plaintext;
use super::{MasterKey, SecretString};
use crate::error::{PipelineError, Result};
use crate::settings::ResolverSettings;

/// Size of GCM nonce in bytes (96 bits)
pub const IV_LEN: usize = 12;

/// Size of GCM authentication tag in bytes
pub const AUTH_TAG_LEN: usize = 16;

/// Smallest blob that can hold an IV and a tag
pub const MIN_BLOB_LEN: usize = IV_LEN + AUTH_TAG_LEN;

/// One encrypted credential field as it comes out of storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialBlob {
    /// Base64 encoding of the blob layout
    Encoded(String),
    /// Raw blob bytes
    Raw(Vec<u8>),
}

impl CredentialBlob {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Encoded(s) => s.trim().is_empty(),
            Self::Raw(bytes) => bytes.is_empty(),
        }
    }
}

/// Encrypted data split into IV, auth tag, and ciphertext
#[derive(Debug, Clone)]
pub struct EncryptedData {
    pub iv: [u8; IV_LEN],
    pub auth_tag: [u8; AUTH_TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Split a blob into its parts, rejecting anything too short to hold IV and tag
    pub fn from_blob(blob: &CredentialBlob) -> Result<Self> {
        match blob {
            CredentialBlob::Raw(bytes) => Self::from_bytes(bytes),
            CredentialBlob::Encoded(encoded) => {
                let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
                    PipelineError::MalformedCiphertext(format!("invalid base64: {}", e))
                })?;
                Self::from_bytes(&bytes)
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_BLOB_LEN {
            return Err(PipelineError::MalformedCiphertext(format!(
                "expected at least {} bytes, got {}",
                MIN_BLOB_LEN,
                bytes.len()
            )));
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&bytes[..IV_LEN]);

        let mut auth_tag = [0u8; AUTH_TAG_LEN];
        auth_tag.copy_from_slice(&bytes[IV_LEN..MIN_BLOB_LEN]);

        Ok(Self {
            iv,
            auth_tag,
            ciphertext: bytes[MIN_BLOB_LEN..].to_vec(),
        })
    }

    /// Serialize back into the blob layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MIN_BLOB_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.auth_tag);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }
}

/// Capability to turn one stored credential field into plaintext
///
/// Implemented by [`DecryptionEngine`]; test doubles implement it to observe
/// how often the pipeline reaches the decryption primitive.
pub trait CredentialDecryptor: Send + Sync {
    fn decrypt(&self, blob: &CredentialBlob) -> Result<SecretString>;
}

/// Decrypts credential fields with the process-wide master key
///
/// Built once at process start and shared read-only. Every call constructs its
/// own cipher instance so concurrent decryptions share nothing but the key.
pub struct DecryptionEngine {
    master_key: MasterKey,
}

impl DecryptionEngine {
    pub fn new(master_key: MasterKey) -> Self {
        Self { master_key }
    }

    /// Build from raw key material; `None` or blank means the key was never configured
    pub fn from_key_material(material: Option<&str>) -> Result<Self> {
        match material {
            Some(material) if !material.trim().is_empty() => {
                Ok(Self::new(MasterKey::parse(material)?))
            }
            _ => Err(PipelineError::KmsKeyMissing),
        }
    }

    /// Read the master key from the environment variable named in settings
    ///
    /// An unset variable is a missing key; a value that is not valid unicode
    /// is invalid key material.
    pub fn from_env(settings: &ResolverSettings) -> Result<Self> {
        let engine = match std::env::var(&settings.master_key_env) {
            Ok(value) => Self::from_key_material(Some(Zeroizing::new(value).as_str())),
            Err(VarError::NotPresent) => Err(PipelineError::KmsKeyMissing),
            Err(VarError::NotUnicode(_)) => Err(PipelineError::KmsKeyInvalid(
                "key contains non-printable characters".to_string(),
            )),
        };
        match &engine {
            Ok(_) => debug!("Loaded master key from {}", settings.master_key_env),
            Err(e) => warn!(
                "Master key unavailable ({}): {}",
                settings.master_key_env,
                e.code()
            ),
        }
        engine
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.master_key.as_bytes())
            .map_err(|e| PipelineError::KmsKeyInvalid(e.to_string()))
    }

    /// Encrypt a value into the blob layout with a fresh random IV
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        let cipher = self.cipher()?;

        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut ciphertext = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut ciphertext)
            .map_err(|_| PipelineError::Unexpected("encryption failed".to_string()))?;

        let mut auth_tag = [0u8; AUTH_TAG_LEN];
        auth_tag.copy_from_slice(tag.as_slice());

        Ok(EncryptedData {
            iv,
            auth_tag,
            ciphertext,
        }
        .to_bytes())
    }

    /// Encrypt a value and base64-encode the resulting blob
    pub fn encrypt_to_base64(&self, plaintext: &str) -> Result<String> {
        Ok(STANDARD.encode(self.encrypt(plaintext)?))
    }

    /// Decrypt, verify, and sanity-check one credential field
    pub fn decrypt(&self, blob: &CredentialBlob) -> Result<SecretString> {
        let encrypted = EncryptedData::from_blob(blob)?;
        let cipher = self.cipher()?;

        // Decrypted in place so the only plaintext copy besides the result is
        // this buffer, which is scrubbed before returning on every path.
        let mut buffer = Zeroizing::new(encrypted.ciphertext);
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&encrypted.iv),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(&encrypted.auth_tag),
            )
            .map_err(|_| PipelineError::DecryptionFailed)?;

        let text = std::str::from_utf8(&buffer).map_err(|_| {
            PipelineError::ImplausiblePlaintext("value is not valid UTF-8".to_string())
        })?;
        check_plaintext(text)?;

        let secret = SecretString::new(text.to_owned());
        buffer.zeroize();
        Ok(secret)
    }
}

impl CredentialDecryptor for DecryptionEngine {
    fn decrypt(&self, blob: &CredentialBlob) -> Result<SecretString> {
        DecryptionEngine::decrypt(self, blob)
    }
}

impl std::fmt::Debug for DecryptionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionEngine")
            .field("master_key", &self.master_key)
            .finish()
    }
}
