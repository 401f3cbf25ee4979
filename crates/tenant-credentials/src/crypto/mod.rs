//! Cryptographic primitives for credential decryption
//!
//! This module provides:
//! - AES-256-GCM authenticated decryption of stored credential fields
//! - Plausibility checks on decrypted values
//! - Secure memory handling with zeroize

mod encryption;
mod plausibility;
mod secure_memory;

pub use encryption::{
    CredentialBlob, CredentialDecryptor, DecryptionEngine, EncryptedData, AUTH_TAG_LEN, IV_LEN,
    MIN_BLOB_LEN,
};
pub use plausibility::{check_plaintext, MAX_PLAINTEXT_CHARS, MIN_PLAINTEXT_CHARS};
pub use secure_memory::{MasterKey, SecretString, MASTER_KEY_LEN};
