//! Error types for tenant credential resolution
//!
//! Every stage of the pipeline returns [`PipelineError`]. The set of variants is
//! closed so the classifier can map each one to a fixed operator signal.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fault reported by an external lookup collaborator (database, cache, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LookupError(pub String);

impl LookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Pipeline error types, one variant per machine-readable code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    // Identity resolution
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {0} has no owning entity")]
    OrphanedSession(String),

    #[error("Owning entity {0} is inactive")]
    EntityInactive(String),

    #[error("Session {session} is in state '{state}', expected open or closing")]
    InvalidSessionState { session: String, state: String },

    #[error("Session lookup failed: {0}")]
    SessionResolution(String),

    // Credential store
    #[error("No credentials for tenant {tenant_id} in {environment}")]
    CredentialsNotFound { tenant_id: String, environment: String },

    #[error("Credentials for tenant {tenant_id} in {environment} are inactive")]
    CredentialsInactive { tenant_id: String, environment: String },

    #[error("Credential record for tenant {tenant_id} is missing field '{field}'")]
    CredentialsIncomplete { tenant_id: String, field: &'static str },

    #[error("Credential storage error: {0}")]
    Storage(String),

    // Decryption
    #[error("Master encryption key is not configured")]
    KmsKeyMissing,

    #[error("Master encryption key is invalid: {0}")]
    KmsKeyInvalid(String),

    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("Decryption failed: authentication tag verification failed")]
    DecryptionFailed,

    #[error("Decrypted value failed plausibility check: {0}")]
    ImplausiblePlaintext(String),

    // Configuration assembly
    #[error("Invalid tenant information: {0}")]
    InvalidTenantInfo(String),

    #[error("Tenant {0} is inactive")]
    TenantInactive(String),

    #[error("Credentials are missing required field '{0}'")]
    IncompleteCredentials(&'static str),

    #[error("Invalid environment '{0}', expected sandbox or production")]
    InvalidEnvironment(String),

    #[error("Invalid callback URL: {0}")]
    InvalidCallbackUrl(String),

    #[error("Invalid timeout URL: {0}")]
    InvalidTimeoutUrl(String),

    #[error("Production {field} must use https: {url}")]
    ProductionRequiresHttps { field: &'static str, url: String },

    #[error("Production business short code must be exactly 6 digits")]
    InvalidShortCodeFormat,

    #[error("Production callback host '{0}' looks like a test host")]
    ProductionTestUrl(String),

    #[error("Production requested but production mode is not enabled")]
    ProductionNotEnabled,

    #[error("Invalid timeout: {0} ms")]
    InvalidTimeout(i64),

    #[error("Invalid retry attempts: {0}")]
    InvalidRetryAttempts(i64),

    #[error("Invalid rate limit: {0} per minute")]
    InvalidRateLimit(i64),

    // Settings
    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::OrphanedSession(_) => "ORPHANED_SESSION",
            Self::EntityInactive(_) => "ENTITY_INACTIVE",
            Self::InvalidSessionState { .. } => "INVALID_SESSION_STATE",
            Self::SessionResolution(_) => "SESSION_RESOLUTION_ERROR",
            Self::CredentialsNotFound { .. } => "CREDENTIALS_NOT_FOUND",
            Self::CredentialsInactive { .. } => "CREDENTIALS_INACTIVE",
            Self::CredentialsIncomplete { .. } => "CREDENTIALS_INCOMPLETE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::KmsKeyMissing => "KMS_KEY_MISSING",
            Self::KmsKeyInvalid(_) => "KMS_KEY_INVALID",
            Self::MalformedCiphertext(_) => "MALFORMED_CIPHERTEXT",
            Self::DecryptionFailed => "DECRYPTION_FAILED",
            Self::ImplausiblePlaintext(_) => "IMPLAUSIBLE_PLAINTEXT",
            Self::InvalidTenantInfo(_) => "INVALID_TENANT_INFO",
            Self::TenantInactive(_) => "TENANT_INACTIVE",
            Self::IncompleteCredentials(_) => "INCOMPLETE_CREDENTIALS",
            Self::InvalidEnvironment(_) => "INVALID_ENVIRONMENT",
            Self::InvalidCallbackUrl(_) => "INVALID_CALLBACK_URL",
            Self::InvalidTimeoutUrl(_) => "INVALID_TIMEOUT_URL",
            Self::ProductionRequiresHttps { .. } => "PRODUCTION_REQUIRES_HTTPS",
            Self::InvalidShortCodeFormat => "INVALID_SHORTCODE_FORMAT",
            Self::ProductionTestUrl(_) => "PRODUCTION_TEST_URL",
            Self::ProductionNotEnabled => "PRODUCTION_NOT_ENABLED",
            Self::InvalidTimeout(_) => "INVALID_TIMEOUT",
            Self::InvalidRetryAttempts(_) => "INVALID_RETRY_ATTEMPTS",
            Self::InvalidRateLimit(_) => "INVALID_RATE_LIMIT",
            Self::Settings(_) => "INVALID_SETTINGS",
            Self::Unexpected(_) => "UNKNOWN_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            PipelineError::SessionNotFound("tab-1".into()).code(),
            "SESSION_NOT_FOUND"
        );
        assert_eq!(PipelineError::DecryptionFailed.code(), "DECRYPTION_FAILED");
        assert_eq!(
            PipelineError::Unexpected("boom".into()).code(),
            "UNKNOWN_ERROR"
        );
    }

    #[test]
    fn test_decryption_message_does_not_leak_detail() {
        let message = PipelineError::DecryptionFailed.to_string();
        assert!(message.contains("authentication tag"));
    }
}
