//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::SecretString;
use crate::error::PipelineError;

/// Deployment environment of a credential record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::Sandbox
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(PipelineError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Caller-supplied adjustments to the assembled configuration
///
/// Numeric fields are signed so out-of-range input can be reported rather than
/// silently wrapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub timeout_ms: Option<i64>,
    pub retry_attempts: Option<i64>,
    pub rate_limit_per_minute: Option<i64>,
    /// Explicit production opt-in for this request; falls back to settings
    pub production_mode: Option<bool>,
}

/// Tenant fields carried by a tenant-scoped configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantScope {
    pub tenant_id: String,
    pub owner_entity_id: String,
    pub display_name: String,
}

/// Ready-to-use provider configuration for one tenant and environment
///
/// Immutable once assembled: fields are private and exposed through getters.
#[derive(Debug, Clone)]
pub struct ServiceConfiguration {
    pub(crate) environment: Environment,
    pub(crate) consumer_key: SecretString,
    pub(crate) consumer_secret: SecretString,
    pub(crate) business_short_code: String,
    pub(crate) passkey: SecretString,
    pub(crate) callback_url: String,
    pub(crate) timeout_url: Option<String>,
    pub(crate) timeout_ms: u64,
    pub(crate) retry_attempts: u32,
    pub(crate) rate_limit_per_minute: u32,
    pub(crate) tenant: Option<TenantScope>,
}

impl ServiceConfiguration {
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn consumer_key(&self) -> &SecretString {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &SecretString {
        &self.consumer_secret
    }

    pub fn business_short_code(&self) -> &str {
        &self.business_short_code
    }

    pub fn passkey(&self) -> &SecretString {
        &self.passkey
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn timeout_url(&self) -> Option<&str> {
        self.timeout_url.as_deref()
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    pub fn tenant(&self) -> Option<&TenantScope> {
        self.tenant.as_ref()
    }

    /// Serializable view with secrets masked, for operator logs
    pub fn redacted(&self) -> RedactedConfiguration {
        RedactedConfiguration {
            environment: self.environment,
            consumer_key: self.consumer_key.masked(),
            consumer_secret: "***".to_string(),
            business_short_code: self.business_short_code.clone(),
            passkey: "***".to_string(),
            callback_url: self.callback_url.clone(),
            timeout_url: self.timeout_url.clone(),
            timeout_ms: self.timeout_ms,
            retry_attempts: self.retry_attempts,
            rate_limit_per_minute: self.rate_limit_per_minute,
            tenant_id: self.tenant.as_ref().map(|t| t.tenant_id.clone()),
        }
    }
}

/// Masked configuration summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedConfiguration {
    pub environment: Environment,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub business_short_code: String,
    pub passkey: String,
    pub callback_url: String,
    pub timeout_url: Option<String>,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
    pub rate_limit_per_minute: u32,
    pub tenant_id: Option<String>,
}
