//! In-memory lookup backend
//!
//! Holds sessions and credential records in maps guarded by `RwLock`s. Used by
//! tests and by embedders that load fixtures instead of a database. Faults can
//! be injected per table to exercise the storage-error paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{CredentialRecordLookup, SessionLookup};
use crate::config::Environment;
use crate::credential::EncryptedCredentialRecord;
use crate::error::LookupError;
use crate::identity::SessionRecord;

#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    credentials: RwLock<HashMap<(String, Environment), EncryptedCredentialRecord>>,
    session_fault: RwLock<Option<String>>,
    credential_fault: RwLock<Option<String>>,
    credential_queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_session(&self, session: SessionRecord) {
        self.sessions.write().await.insert(session.id.clone(), session);
    }

    /// Insert or replace the record for its (tenant, environment) pair
    pub async fn insert_credentials(&self, record: EncryptedCredentialRecord) {
        let key = (record.tenant_id.clone(), record.environment);
        self.credentials.write().await.insert(key, record);
    }

    /// Make every subsequent session lookup fail with `message`
    pub async fn fail_sessions(&self, message: &str) {
        *self.session_fault.write().await = Some(message.to_string());
    }

    /// Make every subsequent credential lookup fail with `message`
    pub async fn fail_credentials(&self, message: &str) {
        *self.credential_fault.write().await = Some(message.to_string());
    }

    /// Number of credential lookups served so far
    pub fn credential_queries(&self) -> usize {
        self.credential_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLookup for InMemoryStore {
    async fn find_session(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, LookupError> {
        if let Some(fault) = self.session_fault.read().await.as_ref() {
            return Err(LookupError::new(fault.clone()));
        }
        Ok(self.sessions.read().await.get(session_id).cloned())
    }
}

#[async_trait]
impl CredentialRecordLookup for InMemoryStore {
    async fn find_credentials(
        &self,
        tenant_id: &str,
        environment: Environment,
    ) -> Result<Option<EncryptedCredentialRecord>, LookupError> {
        self.credential_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.credential_fault.read().await.as_ref() {
            return Err(LookupError::new(fault.clone()));
        }
        Ok(self
            .credentials
            .read()
            .await
            .get(&(tenant_id.to_string(), environment))
            .cloned())
    }
}
