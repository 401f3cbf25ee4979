//! Credential type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Environment;
use crate::crypto::{CredentialBlob, SecretString};

/// Stored credential record (mixed encrypted and plaintext fields)
///
/// `(tenant_id, environment)` is unique in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedCredentialRecord {
    pub tenant_id: String,
    pub environment: Environment,
    pub consumer_key_blob: Option<CredentialBlob>,
    pub consumer_secret_blob: Option<CredentialBlob>,
    pub passkey_blob: Option<CredentialBlob>,
    /// Stored in plaintext and never decrypted
    pub business_short_code: Option<String>,
    pub callback_url: String,
    pub timeout_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Decrypted credentials - secret fields are zeroed when dropped
///
/// Lives only for the duration of one resolution and is never serialized.
#[derive(Debug, Clone)]
pub struct PlaintextCredentials {
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
    pub business_short_code: String,
    pub passkey: SecretString,
    /// Environment name as stored; validated by the assembler
    pub environment: String,
    pub callback_url: String,
    pub timeout_url: Option<String>,
    pub encrypted_at: DateTime<Utc>,
    pub last_validated: Option<DateTime<Utc>>,
}
