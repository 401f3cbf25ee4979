//! Lookup capabilities consumed by the pipeline
//!
//! Each trait carries exactly the query the corresponding stage needs, so a
//! database adapter or a test double can stand in without sharing a base type.

use async_trait::async_trait;

use crate::config::Environment;
use crate::credential::EncryptedCredentialRecord;
use crate::error::LookupError;
use crate::identity::SessionRecord;

/// Query-by-primary-key over sessions, joined with the owning entity
#[async_trait]
pub trait SessionLookup: Send + Sync {
    /// Fetch a session by its handle, `Ok(None)` when it does not exist
    async fn find_session(&self, session_id: &str)
        -> Result<Option<SessionRecord>, LookupError>;
}

/// Query-by-(tenant, environment) over stored credential records
#[async_trait]
pub trait CredentialRecordLookup: Send + Sync {
    /// Fetch the unique record for a tenant and environment, `Ok(None)` when absent
    async fn find_credentials(
        &self,
        tenant_id: &str,
        environment: Environment,
    ) -> Result<Option<EncryptedCredentialRecord>, LookupError>;
}
