//! Credential store reader and record decryption

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::types::{EncryptedCredentialRecord, PlaintextCredentials};
use crate::config::Environment;
use crate::crypto::{CredentialBlob, CredentialDecryptor};
use crate::error::{PipelineError, Result};
use crate::storage::CredentialRecordLookup;

/// Reads the encrypted credential record for one tenant and environment
pub struct CredentialStoreReader {
    records: Arc<dyn CredentialRecordLookup>,
}

impl CredentialStoreReader {
    pub fn new(records: Arc<dyn CredentialRecordLookup>) -> Self {
        Self { records }
    }

    /// Fetch a record that is present, active, and complete
    pub async fn fetch(
        &self,
        tenant_id: &str,
        environment: Environment,
    ) -> Result<EncryptedCredentialRecord> {
        let record = self
            .records
            .find_credentials(tenant_id, environment)
            .await
            .map_err(|e| PipelineError::Storage(e.to_string()))?
            .ok_or_else(|| PipelineError::CredentialsNotFound {
                tenant_id: tenant_id.to_string(),
                environment: environment.to_string(),
            })?;

        ensure_usable(&record)?;

        debug!("Fetched credentials for tenant {} ({})", tenant_id, environment);
        Ok(record)
    }
}

/// Reject inactive records and records missing an encrypted field or the short code
pub fn ensure_usable(record: &EncryptedCredentialRecord) -> Result<()> {
    if !record.is_active {
        return Err(PipelineError::CredentialsInactive {
            tenant_id: record.tenant_id.clone(),
            environment: record.environment.to_string(),
        });
    }

    present_blob(record, &record.consumer_key_blob, "consumerKey")?;
    present_blob(record, &record.consumer_secret_blob, "consumerSecret")?;
    present_blob(record, &record.passkey_blob, "passkey")?;

    match record.business_short_code.as_deref() {
        Some(code) if !code.trim().is_empty() => Ok(()),
        _ => Err(PipelineError::CredentialsIncomplete {
            tenant_id: record.tenant_id.clone(),
            field: "businessShortCode",
        }),
    }
}

fn required_blob(blob: &Option<CredentialBlob>) -> Option<&CredentialBlob> {
    blob.as_ref().filter(|b| !b.is_empty())
}

fn present_blob<'a>(
    record: &EncryptedCredentialRecord,
    blob: &'a Option<CredentialBlob>,
    field: &'static str,
) -> Result<&'a CredentialBlob> {
    required_blob(blob).ok_or_else(|| PipelineError::CredentialsIncomplete {
        tenant_id: record.tenant_id.clone(),
        field,
    })
}

/// Decrypt the three secret fields of a usable record
///
/// The short code is copied as-is. Fails on the first field that does not
/// decrypt; anything already decrypted is zeroed when dropped.
pub fn decrypt_record(
    record: &EncryptedCredentialRecord,
    decryptor: &dyn CredentialDecryptor,
) -> Result<PlaintextCredentials> {
    ensure_usable(record)?;

    let consumer_key =
        decryptor.decrypt(present_blob(record, &record.consumer_key_blob, "consumerKey")?)?;
    let consumer_secret =
        decryptor.decrypt(present_blob(record, &record.consumer_secret_blob, "consumerSecret")?)?;
    let passkey = decryptor.decrypt(present_blob(record, &record.passkey_blob, "passkey")?)?;

    info!(
        "Decrypted credentials for tenant {} ({})",
        record.tenant_id, record.environment
    );

    Ok(PlaintextCredentials {
        consumer_key,
        consumer_secret,
        business_short_code: record.business_short_code.clone().unwrap_or_default(),
        passkey,
        environment: record.environment.to_string(),
        callback_url: record.callback_url.clone(),
        timeout_url: record.timeout_url.clone(),
        encrypted_at: record.updated_at,
        last_validated: Some(Utc::now()),
    })
}
