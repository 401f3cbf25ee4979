//! Identity type definitions

use serde::{Deserialize, Serialize};

/// Owning entity as returned by the session lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRecord {
    pub id: String,
    pub display_name: String,
    pub is_active: bool,
}

/// Session row as returned by the session lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    /// Foreign key to the owning entity
    pub owner_id: Option<String>,
    /// Lifecycle state (e.g. "open", "closing", "closed")
    pub lifecycle_state: String,
    /// Joined owner row, absent when the reference dangles
    pub owner: Option<OwnerRecord>,
}

/// Tenant resolved for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantIdentity {
    pub tenant_id: String,
    pub owner_entity_id: String,
    pub display_name: String,
    pub is_active: bool,
}
