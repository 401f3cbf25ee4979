//! Resolves an opaque session handle to the tenant that owns it

use std::sync::Arc;
use tracing::debug;

use super::types::TenantIdentity;
use crate::error::{PipelineError, Result};
use crate::storage::SessionLookup;

/// Lifecycle states in which a session may take payments
pub const ELIGIBLE_SESSION_STATES: [&str; 2] = ["open", "closing"];

/// Identity resolver
pub struct IdentityResolver {
    sessions: Arc<dyn SessionLookup>,
}

impl IdentityResolver {
    pub fn new(sessions: Arc<dyn SessionLookup>) -> Self {
        Self { sessions }
    }

    /// Resolve a session handle to an active, payment-eligible tenant
    pub async fn resolve(&self, session_handle: &str) -> Result<TenantIdentity> {
        let handle = session_handle.trim();
        if handle.is_empty() {
            return Err(PipelineError::SessionNotFound(String::new()));
        }

        let session = self
            .sessions
            .find_session(handle)
            .await
            .map_err(|e| PipelineError::SessionResolution(e.to_string()))?
            .ok_or_else(|| PipelineError::SessionNotFound(handle.to_string()))?;

        let owner = match (&session.owner_id, session.owner) {
            (Some(owner_id), Some(owner)) if !owner_id.trim().is_empty() => owner,
            _ => return Err(PipelineError::OrphanedSession(session.id)),
        };

        if !owner.is_active {
            return Err(PipelineError::EntityInactive(owner.id));
        }

        if !ELIGIBLE_SESSION_STATES.contains(&session.lifecycle_state.as_str()) {
            return Err(PipelineError::InvalidSessionState {
                session: session.id,
                state: session.lifecycle_state,
            });
        }

        debug!("Resolved session {} to tenant {}", session.id, owner.id);

        Ok(TenantIdentity {
            tenant_id: owner.id.clone(),
            owner_entity_id: owner.id,
            display_name: owner.display_name,
            is_active: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{OwnerRecord, SessionRecord};
    use crate::storage::InMemoryStore;

    fn session(id: &str, state: &str, owner_active: bool) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            owner_id: Some("bar-1".to_string()),
            lifecycle_state: state.to_string(),
            owner: Some(OwnerRecord {
                id: "bar-1".to_string(),
                display_name: "The Bar".to_string(),
                is_active: owner_active,
            }),
        }
    }

    async fn resolver_with(record: SessionRecord) -> (IdentityResolver, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store.insert_session(record).await;
        (IdentityResolver::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_resolves_open_session() {
        let (resolver, _) = resolver_with(session("tab-1", "open", true)).await;

        let identity = resolver.resolve("tab-1").await.unwrap();
        assert_eq!(identity.tenant_id, "bar-1");
        assert_eq!(identity.owner_entity_id, "bar-1");
        assert_eq!(identity.display_name, "The Bar");
        assert!(identity.is_active);
    }

    #[tokio::test]
    async fn test_closing_session_is_eligible() {
        let (resolver, _) = resolver_with(session("tab-1", "closing", true)).await;
        assert!(resolver.resolve("tab-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_session() {
        let (resolver, _) = resolver_with(session("tab-1", "open", true)).await;
        let err = resolver.resolve("tab-2").await.unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");

        let err = resolver.resolve("  ").await.unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_orphaned_session() {
        let mut record = session("tab-1", "open", true);
        record.owner_id = None;
        let (resolver, _) = resolver_with(record).await;
        assert_eq!(
            resolver.resolve("tab-1").await.unwrap_err().code(),
            "ORPHANED_SESSION"
        );

        let mut record = session("tab-1", "open", true);
        record.owner = None;
        let (resolver, _) = resolver_with(record).await;
        assert_eq!(
            resolver.resolve("tab-1").await.unwrap_err().code(),
            "ORPHANED_SESSION"
        );
    }

    #[tokio::test]
    async fn test_inactive_owner() {
        let (resolver, _) = resolver_with(session("tab-1", "open", false)).await;
        assert_eq!(
            resolver.resolve("tab-1").await.unwrap_err().code(),
            "ENTITY_INACTIVE"
        );
    }

    #[tokio::test]
    async fn test_ineligible_states() {
        for state in ["closed", "disputed", "cancelled", "OPEN", ""] {
            let (resolver, _) = resolver_with(session("tab-1", state, true)).await;
            let err = resolver.resolve("tab-1").await.unwrap_err();
            assert_eq!(err.code(), "INVALID_SESSION_STATE", "state {:?}", state);
        }
    }

    #[tokio::test]
    async fn test_lookup_fault_is_wrapped() {
        let (resolver, store) = resolver_with(session("tab-1", "open", true)).await;
        store.fail_sessions("connection reset").await;

        let err = resolver.resolve("tab-1").await.unwrap_err();
        assert_eq!(err.code(), "SESSION_RESOLUTION_ERROR");
    }
}
