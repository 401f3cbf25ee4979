//! Static classification table
//!
//! Severity and retryability are fixed per code so identical faults always
//! produce identical operator signals. User messages stay non-technical.

use serde::{Deserialize, Serialize};

/// Stage that produced a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Identity,
    Credential,
    Decryption,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Fixed classification of one error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSpec {
    pub code: &'static str,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub status_code: u16,
    pub should_retry: bool,
    pub user_message: &'static str,
    pub admin_message: &'static str,
}

const fn spec(
    code: &'static str,
    category: ErrorCategory,
    severity: Severity,
    status_code: u16,
    should_retry: bool,
    user_message: &'static str,
    admin_message: &'static str,
) -> ErrorSpec {
    ErrorSpec {
        code,
        category,
        severity,
        status_code,
        should_retry,
        user_message,
        admin_message,
    }
}

use ErrorCategory::{Configuration, Credential, Decryption, Identity};
use Severity::{Critical, High, Low, Medium};

const UNAVAILABLE: &str = "Payments are temporarily unavailable. Please try again shortly.";
const NOT_CONFIGURED: &str =
    "Mobile payments are not available for this business right now. Please use another payment method.";
const CONTACT_SUPPORT: &str =
    "We couldn't start this payment. Please try again later or contact the business.";

/// Classification for faults outside the catalog
pub const UNKNOWN_ERROR: ErrorSpec = spec(
    "UNKNOWN_ERROR",
    Configuration,
    Medium,
    500,
    true,
    "Something went wrong. Please try again.",
    "Unclassified fault during credential resolution",
);

static CATALOG: &[ErrorSpec] = &[
    // Identity
    spec(
        "SESSION_NOT_FOUND",
        Identity,
        Low,
        404,
        false,
        "We couldn't find this order. Please check it and try again.",
        "Session handle did not match any session",
    ),
    spec(
        "ORPHANED_SESSION",
        Identity,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Session has no owning entity; data integrity issue",
    ),
    spec(
        "ENTITY_INACTIVE",
        Identity,
        Medium,
        403,
        false,
        NOT_CONFIGURED,
        "Owning entity is deactivated",
    ),
    spec(
        "INVALID_SESSION_STATE",
        Identity,
        Low,
        409,
        false,
        "This order can no longer accept payments.",
        "Session lifecycle state is not open or closing",
    ),
    spec(
        "SESSION_RESOLUTION_ERROR",
        Identity,
        Medium,
        503,
        true,
        UNAVAILABLE,
        "Session lookup failed in the storage layer",
    ),
    // Credential store
    spec(
        "CREDENTIALS_NOT_FOUND",
        Credential,
        High,
        503,
        false,
        NOT_CONFIGURED,
        "No credential record for tenant and environment",
    ),
    spec(
        "CREDENTIALS_INACTIVE",
        Credential,
        Medium,
        503,
        false,
        NOT_CONFIGURED,
        "Credential record is deactivated",
    ),
    spec(
        "CREDENTIALS_INCOMPLETE",
        Credential,
        High,
        503,
        false,
        NOT_CONFIGURED,
        "Credential record is missing a required field",
    ),
    spec(
        "STORAGE_ERROR",
        Credential,
        Medium,
        503,
        true,
        UNAVAILABLE,
        "Credential lookup failed in the storage layer",
    ),
    // Decryption
    spec(
        "KMS_KEY_MISSING",
        Decryption,
        Critical,
        500,
        false,
        UNAVAILABLE,
        "Master encryption key is not configured; operator action required",
    ),
    spec(
        "KMS_KEY_INVALID",
        Decryption,
        Critical,
        500,
        false,
        UNAVAILABLE,
        "Master encryption key is malformed; operator action required",
    ),
    spec(
        "MALFORMED_CIPHERTEXT",
        Decryption,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Stored credential blob does not match the IV/tag/ciphertext layout",
    ),
    spec(
        "DECRYPTION_FAILED",
        Decryption,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Integrity check failed: tampered blob or wrong master key",
    ),
    spec(
        "IMPLAUSIBLE_PLAINTEXT",
        Decryption,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Decrypted value failed plausibility checks",
    ),
    // Configuration
    spec(
        "INVALID_TENANT_INFO",
        Configuration,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Resolved tenant identity is missing required fields",
    ),
    spec(
        "TENANT_INACTIVE",
        Configuration,
        Medium,
        403,
        false,
        NOT_CONFIGURED,
        "Resolved tenant is inactive",
    ),
    spec(
        "INCOMPLETE_CREDENTIALS",
        Configuration,
        High,
        503,
        false,
        NOT_CONFIGURED,
        "Decrypted credentials are missing a required field",
    ),
    spec(
        "INVALID_ENVIRONMENT",
        Configuration,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Environment is neither sandbox nor production",
    ),
    spec(
        "INVALID_CALLBACK_URL",
        Configuration,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Callback URL does not parse",
    ),
    spec(
        "INVALID_TIMEOUT_URL",
        Configuration,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Timeout URL does not parse",
    ),
    spec(
        "PRODUCTION_REQUIRES_HTTPS",
        Configuration,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Production callback URLs must use https",
    ),
    spec(
        "INVALID_SHORTCODE_FORMAT",
        Configuration,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Production business short code must be 6 digits",
    ),
    spec(
        "PRODUCTION_TEST_URL",
        Configuration,
        High,
        500,
        false,
        CONTACT_SUPPORT,
        "Production callback host points at a local or test host",
    ),
    spec(
        "PRODUCTION_NOT_ENABLED",
        Configuration,
        Medium,
        503,
        false,
        NOT_CONFIGURED,
        "Production requested while production mode is disabled (strict mode)",
    ),
    spec(
        "INVALID_TIMEOUT",
        Configuration,
        Low,
        400,
        false,
        CONTACT_SUPPORT,
        "Timeout override must be positive",
    ),
    spec(
        "INVALID_RETRY_ATTEMPTS",
        Configuration,
        Low,
        400,
        false,
        CONTACT_SUPPORT,
        "Retry override must be zero or more",
    ),
    spec(
        "INVALID_RATE_LIMIT",
        Configuration,
        Low,
        400,
        false,
        CONTACT_SUPPORT,
        "Rate limit override must be positive",
    ),
    spec(
        "INVALID_SETTINGS",
        Configuration,
        Critical,
        500,
        false,
        UNAVAILABLE,
        "Resolver settings are invalid; operator action required",
    ),
];

/// Legacy codes still emitted by older callers
static ALIASES: &[(&str, &str)] = &[
    ("TAB_NOT_FOUND", "SESSION_NOT_FOUND"),
    ("ORPHANED_TAB", "ORPHANED_SESSION"),
    ("BAR_INACTIVE", "ENTITY_INACTIVE"),
    ("INVALID_TAB_STATE", "INVALID_SESSION_STATE"),
    ("TAB_RESOLUTION_ERROR", "SESSION_RESOLUTION_ERROR"),
    ("INVALID_TENANT_CONFIG", "INVALID_TENANT_INFO"),
];

/// Map a legacy code to its current name
pub fn resolve_alias(code: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(code)
}

/// Look up a code (or legacy alias) in the catalog
pub fn lookup(code: &str) -> Option<&'static ErrorSpec> {
    let code = resolve_alias(code);
    CATALOG.iter().find(|spec| spec.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<_> = CATALOG.iter().map(|s| s.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), CATALOG.len());
    }

    #[test]
    fn test_retry_policy() {
        for code in ["SESSION_RESOLUTION_ERROR", "STORAGE_ERROR"] {
            assert!(lookup(code).unwrap().should_retry, "{}", code);
        }
        for spec in CATALOG.iter().filter(|s| s.category == Decryption) {
            assert!(!spec.should_retry, "{}", spec.code);
        }
        assert!(!lookup("CREDENTIALS_NOT_FOUND").unwrap().should_retry);
        assert_eq!(lookup("KMS_KEY_MISSING").unwrap().severity, Critical);
    }

    #[test]
    fn test_user_messages_are_non_technical() {
        for spec in CATALOG.iter().chain(std::iter::once(&UNKNOWN_ERROR)) {
            let message = spec.user_message.to_lowercase();
            for word in ["encrypt", "decrypt", "key", "database", "stack", "cipher"] {
                assert!(!message.contains(word), "{}: {}", spec.code, word);
            }
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(lookup("TAB_NOT_FOUND").unwrap().code, "SESSION_NOT_FOUND");
        assert_eq!(
            lookup("INVALID_TENANT_CONFIG").unwrap().code,
            "INVALID_TENANT_INFO"
        );
        assert!(lookup("NOT_A_CODE").is_none());
    }
}
