//! Merges identity, decrypted credentials, and caller overrides into one
//! immutable [`ServiceConfiguration`]
//!
//! Validation runs in a fixed order and the first failure wins:
//! tenant identity, credential completeness, environment, URL syntax,
//! production policy, numeric overrides.
//!
//! The production downgrade is decided by [`ConfigurationAssembler::select_environment`]
//! before any record is fetched, so a downgraded request reads the sandbox
//! record. A production record handed to `assemble` without opt-in is rejected.

use tracing::{debug, warn};
use url::Url;

use super::types::{ConfigOverrides, Environment, ServiceConfiguration, TenantScope};
use crate::credential::PlaintextCredentials;
use crate::error::{PipelineError, Result};
use crate::identity::TenantIdentity;
use crate::settings::ResolverSettings;

/// Timeouts above this are accepted but logged
const TIMEOUT_WARN_MS: u64 = 5 * 60 * 1000;

/// Retry counts above this are accepted but logged
const RETRY_WARN_ATTEMPTS: u32 = 10;

const PRODUCTION_SHORT_CODE_LEN: usize = 6;

const LOOPBACK_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];
const NON_PRODUCTION_HOST_MARKERS: [&str; 3] = ["test", "staging", "dev"];

/// Environment policy and defaults applied by the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerPolicy {
    /// Process-wide production opt-in; a request may override it
    pub production_enabled: bool,
    /// Reject un-opted production requests instead of downgrading them
    pub strict_environment: bool,
    pub default_timeout_ms: u64,
    pub default_retry_attempts: u32,
    pub default_rate_limit_per_minute: u32,
}

impl Default for AssemblerPolicy {
    fn default() -> Self {
        Self::from(&ResolverSettings::default())
    }
}

impl From<&ResolverSettings> for AssemblerPolicy {
    fn from(settings: &ResolverSettings) -> Self {
        Self {
            production_enabled: settings.production_enabled,
            strict_environment: settings.strict_environment,
            default_timeout_ms: settings.default_timeout_ms,
            default_retry_attempts: settings.default_retry_attempts,
            default_rate_limit_per_minute: settings.default_rate_limit_per_minute,
        }
    }
}

/// Configuration assembler
#[derive(Debug, Clone, Default)]
pub struct ConfigurationAssembler {
    policy: AssemblerPolicy,
}

impl ConfigurationAssembler {
    pub fn new(policy: AssemblerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AssemblerPolicy {
        &self.policy
    }

    /// Build the configuration for one tenant; pure apart from logging
    pub fn assemble(
        &self,
        identity: &TenantIdentity,
        credentials: PlaintextCredentials,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<ServiceConfiguration> {
        let default_overrides = ConfigOverrides::default();
        let overrides = overrides.unwrap_or(&default_overrides);

        validate_identity(identity)?;
        validate_completeness(&credentials)?;

        let environment: Environment = credentials.environment.parse()?;

        let callback = parse_url(&credentials.callback_url, PipelineError::InvalidCallbackUrl)?;
        let timeout = match credentials.timeout_url.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                Some(parse_url(raw, PipelineError::InvalidTimeoutUrl)?)
            }
            _ => None,
        };

        if environment.is_production() {
            if !self.production_opted_in(overrides) {
                return Err(PipelineError::ProductionNotEnabled);
            }
            enforce_production_policy(
                &callback,
                timeout.as_ref(),
                &credentials.business_short_code,
            )?;
        }

        let timeout_ms = self.timeout_ms(overrides)?;
        let retry_attempts = self.retry_attempts(overrides)?;
        let rate_limit_per_minute = self.rate_limit(overrides)?;

        debug!(
            "Assembled {} configuration for tenant {}",
            environment, identity.tenant_id
        );

        let PlaintextCredentials {
            consumer_key,
            consumer_secret,
            business_short_code,
            passkey,
            callback_url,
            timeout_url,
            ..
        } = credentials;

        Ok(ServiceConfiguration {
            environment,
            consumer_key,
            consumer_secret,
            business_short_code: business_short_code.trim().to_string(),
            passkey,
            callback_url: callback_url.trim().to_string(),
            timeout_url: timeout_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            timeout_ms,
            retry_attempts,
            rate_limit_per_minute,
            tenant: Some(TenantScope {
                tenant_id: identity.tenant_id.clone(),
                owner_entity_id: identity.owner_entity_id.clone(),
                display_name: identity.display_name.clone(),
            }),
        })
    }

    /// Environment whose record should be fetched for a request
    ///
    /// Production only sticks when the caller or the process opted in.
    /// Otherwise the request is downgraded to sandbox with a warning, or
    /// rejected under strict mode.
    pub fn select_environment(
        &self,
        requested: Environment,
        overrides: Option<&ConfigOverrides>,
        tenant_id: &str,
    ) -> Result<Environment> {
        if !requested.is_production() {
            return Ok(requested);
        }

        let default_overrides = ConfigOverrides::default();
        if self.production_opted_in(overrides.unwrap_or(&default_overrides)) {
            return Ok(Environment::Production);
        }

        if self.policy.strict_environment {
            return Err(PipelineError::ProductionNotEnabled);
        }

        warn!(
            "Production requested for tenant {} without production mode enabled; using sandbox",
            tenant_id
        );
        Ok(Environment::Sandbox)
    }

    fn production_opted_in(&self, overrides: &ConfigOverrides) -> bool {
        overrides
            .production_mode
            .unwrap_or(self.policy.production_enabled)
    }

    fn timeout_ms(&self, overrides: &ConfigOverrides) -> Result<u64> {
        let Some(value) = overrides.timeout_ms else {
            return Ok(self.policy.default_timeout_ms);
        };
        if value <= 0 {
            return Err(PipelineError::InvalidTimeout(value));
        }
        let value = value as u64;
        if value > TIMEOUT_WARN_MS {
            warn!("Timeout of {} ms exceeds 5 minutes", value);
        }
        Ok(value)
    }

    fn retry_attempts(&self, overrides: &ConfigOverrides) -> Result<u32> {
        let Some(value) = overrides.retry_attempts else {
            return Ok(self.policy.default_retry_attempts);
        };
        let attempts =
            u32::try_from(value).map_err(|_| PipelineError::InvalidRetryAttempts(value))?;
        if attempts > RETRY_WARN_ATTEMPTS {
            warn!("Retry attempts {} exceeds {}", attempts, RETRY_WARN_ATTEMPTS);
        }
        Ok(attempts)
    }

    fn rate_limit(&self, overrides: &ConfigOverrides) -> Result<u32> {
        let Some(value) = overrides.rate_limit_per_minute else {
            return Ok(self.policy.default_rate_limit_per_minute);
        };
        match u32::try_from(value) {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => Err(PipelineError::InvalidRateLimit(value)),
        }
    }
}

fn validate_identity(identity: &TenantIdentity) -> Result<()> {
    let fields = [
        ("tenantId", &identity.tenant_id),
        ("ownerEntityId", &identity.owner_entity_id),
        ("displayName", &identity.display_name),
    ];
    if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(PipelineError::InvalidTenantInfo(format!("{} is required", name)));
    }

    if !identity.is_active {
        return Err(PipelineError::TenantInactive(identity.tenant_id.clone()));
    }
    Ok(())
}

fn validate_completeness(credentials: &PlaintextCredentials) -> Result<()> {
    let missing = if credentials.consumer_key.is_blank() {
        Some("consumerKey")
    } else if credentials.consumer_secret.is_blank() {
        Some("consumerSecret")
    } else if credentials.business_short_code.trim().is_empty() {
        Some("businessShortCode")
    } else if credentials.passkey.is_blank() {
        Some("passkey")
    } else if credentials.environment.trim().is_empty() {
        Some("environment")
    } else if credentials.callback_url.trim().is_empty() {
        Some("callbackUrl")
    } else {
        None
    };

    match missing {
        Some(field) => Err(PipelineError::IncompleteCredentials(field)),
        None => Ok(()),
    }
}

fn parse_url(raw: &str, error: fn(String) -> PipelineError) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| error(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(error(format!("{}: expected an http(s) URL with a host", raw))),
    }
}

fn enforce_production_policy(
    callback: &Url,
    timeout: Option<&Url>,
    business_short_code: &str,
) -> Result<()> {
    require_https(callback, "callbackUrl")?;
    if let Some(timeout) = timeout {
        require_https(timeout, "timeoutUrl")?;
    }

    let short_code = business_short_code.trim();
    if short_code.len() != PRODUCTION_SHORT_CODE_LEN
        || !short_code.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(PipelineError::InvalidShortCodeFormat);
    }

    let host = callback.host_str().unwrap_or_default().to_ascii_lowercase();
    if LOOPBACK_HOSTS.contains(&host.as_str())
        || NON_PRODUCTION_HOST_MARKERS
            .iter()
            .any(|marker| host.contains(marker))
    {
        return Err(PipelineError::ProductionTestUrl(host));
    }

    Ok(())
}

fn require_https(url: &Url, field: &'static str) -> Result<()> {
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(PipelineError::ProductionRequiresHttps {
            field,
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretString;
    use chrono::Utc;

    fn identity() -> TenantIdentity {
        TenantIdentity {
            tenant_id: "bar-1".to_string(),
            owner_entity_id: "bar-1".to_string(),
            display_name: "The Bar".to_string(),
            is_active: true,
        }
    }

    fn credentials(environment: &str, callback_url: &str) -> PlaintextCredentials {
        PlaintextCredentials {
            consumer_key: SecretString::from("consumer-key-1"),
            consumer_secret: SecretString::from("consumer-secret-1"),
            business_short_code: "174379".to_string(),
            passkey: SecretString::from("passkey-value-1"),
            environment: environment.to_string(),
            callback_url: callback_url.to_string(),
            timeout_url: None,
            encrypted_at: Utc::now(),
            last_validated: None,
        }
    }

    fn production_assembler() -> ConfigurationAssembler {
        ConfigurationAssembler::new(AssemblerPolicy {
            production_enabled: true,
            ..AssemblerPolicy::default()
        })
    }

    fn code(result: Result<ServiceConfiguration>) -> &'static str {
        result.unwrap_err().code()
    }

    #[test]
    fn test_sandbox_with_defaults() {
        let assembler = ConfigurationAssembler::default();
        let config = assembler
            .assemble(
                &identity(),
                credentials("sandbox", "http://example.com/callback"),
                None,
            )
            .unwrap();

        assert_eq!(config.environment(), Environment::Sandbox);
        assert_eq!(config.business_short_code(), "174379");
        assert_eq!(config.consumer_key().expose(), "consumer-key-1");
        assert_eq!(config.timeout_ms(), 30_000);
        assert_eq!(config.retry_attempts(), 3);
        assert_eq!(config.rate_limit_per_minute(), 60);
        assert_eq!(config.tenant().unwrap().tenant_id, "bar-1");
    }

    #[test]
    fn test_identity_validated_first() {
        let mut bad = identity();
        bad.display_name = " ".to_string();
        let result = ConfigurationAssembler::default().assemble(
            &bad,
            credentials("nowhere", "not a url"),
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            PipelineError::InvalidTenantInfo("displayName is required".to_string())
        );

        let mut inactive = identity();
        inactive.is_active = false;
        let result = ConfigurationAssembler::default().assemble(
            &inactive,
            credentials("sandbox", "https://example.com/cb"),
            None,
        );
        assert_eq!(code(result), "TENANT_INACTIVE");
    }

    #[test]
    fn test_incomplete_credentials() {
        let mut creds = credentials("sandbox", "https://example.com/cb");
        creds.passkey = SecretString::from("");
        let result = ConfigurationAssembler::default().assemble(&identity(), creds, None);
        assert_eq!(
            result.unwrap_err(),
            PipelineError::IncompleteCredentials("passkey")
        );
    }

    #[test]
    fn test_invalid_environment() {
        let result = ConfigurationAssembler::default().assemble(
            &identity(),
            credentials("staging", "https://example.com/cb"),
            None,
        );
        assert_eq!(code(result), "INVALID_ENVIRONMENT");
    }

    #[test]
    fn test_url_format_errors() {
        let assembler = ConfigurationAssembler::default();
        let result = assembler.assemble(&identity(), credentials("sandbox", "not a url"), None);
        assert_eq!(code(result), "INVALID_CALLBACK_URL");

        let result = assembler.assemble(
            &identity(),
            credentials("sandbox", "ftp://example.com/cb"),
            None,
        );
        assert_eq!(code(result), "INVALID_CALLBACK_URL");

        let mut creds = credentials("sandbox", "https://example.com/cb");
        creds.timeout_url = Some("::bad::".to_string());
        let result = assembler.assemble(&identity(), creds, None);
        assert_eq!(code(result), "INVALID_TIMEOUT_URL");
    }

    #[test]
    fn test_production_requires_https_but_sandbox_allows_http() {
        let callback = "http://example.com/callback";

        let result = production_assembler().assemble(
            &identity(),
            credentials("production", callback),
            None,
        );
        assert_eq!(code(result), "PRODUCTION_REQUIRES_HTTPS");

        let result = production_assembler().assemble(
            &identity(),
            credentials("sandbox", callback),
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_production_timeout_url_requires_https() {
        let mut creds = credentials("production", "https://pay.example.com/cb");
        creds.timeout_url = Some("http://pay.example.com/timeout".to_string());
        let result = production_assembler().assemble(&identity(), creds, None);
        assert_eq!(
            result.unwrap_err(),
            PipelineError::ProductionRequiresHttps {
                field: "timeoutUrl",
                url: "http://pay.example.com/timeout".to_string()
            }
        );
    }

    #[test]
    fn test_production_short_code_format() {
        for short_code in ["17437", "1743790", "17437a"] {
            let mut creds = credentials("production", "https://pay.example.com/cb");
            creds.business_short_code = short_code.to_string();
            let result = production_assembler().assemble(&identity(), creds, None);
            assert_eq!(code(result), "INVALID_SHORTCODE_FORMAT", "{}", short_code);
        }

        // Sandbox short codes are not format-checked
        let mut creds = credentials("sandbox", "https://example.com/cb");
        creds.business_short_code = "600".to_string();
        assert!(ConfigurationAssembler::default()
            .assemble(&identity(), creds, None)
            .is_ok());
    }

    #[test]
    fn test_production_rejects_test_hosts() {
        for host in [
            "https://localhost/cb",
            "https://127.0.0.1/cb",
            "https://api.test.example.com/cb",
            "https://staging.example.com/cb",
            "https://dev-pay.example.com/cb",
        ] {
            let result =
                production_assembler().assemble(&identity(), credentials("production", host), None);
            assert_eq!(code(result), "PRODUCTION_TEST_URL", "{}", host);
        }
    }

    #[test]
    fn test_production_happy_path() {
        let config = production_assembler()
            .assemble(
                &identity(),
                credentials("production", "https://pay.example.com/cb"),
                None,
            )
            .unwrap();
        assert_eq!(config.environment(), Environment::Production);
    }

    #[test]
    fn test_production_downgrades_without_opt_in() {
        let assembler = ConfigurationAssembler::default();
        let selected = assembler
            .select_environment(Environment::Production, None, "bar-1")
            .unwrap();
        assert_eq!(selected, Environment::Sandbox);

        let selected = assembler
            .select_environment(Environment::Sandbox, None, "bar-1")
            .unwrap();
        assert_eq!(selected, Environment::Sandbox);
    }

    #[test]
    fn test_production_record_without_opt_in_is_not_relabelled() {
        let result = ConfigurationAssembler::default().assemble(
            &identity(),
            credentials("production", "https://pay.example.com/cb"),
            None,
        );
        assert_eq!(result.unwrap_err(), PipelineError::ProductionNotEnabled);
    }

    #[test]
    fn test_request_opt_in_overrides_policy() {
        let overrides = ConfigOverrides {
            production_mode: Some(true),
            ..Default::default()
        };
        let assembler = ConfigurationAssembler::default();
        let selected = assembler
            .select_environment(Environment::Production, Some(&overrides), "bar-1")
            .unwrap();
        assert_eq!(selected, Environment::Production);

        let result = assembler.assemble(
            &identity(),
            credentials("production", "http://example.com/cb"),
            Some(&overrides),
        );
        assert_eq!(code(result), "PRODUCTION_REQUIRES_HTTPS");

        // An explicit opt-out beats the process-wide opt-in
        let opt_out = ConfigOverrides {
            production_mode: Some(false),
            ..Default::default()
        };
        let selected = production_assembler()
            .select_environment(Environment::Production, Some(&opt_out), "bar-1")
            .unwrap();
        assert_eq!(selected, Environment::Sandbox);
    }

    #[test]
    fn test_strict_mode_rejects_instead_of_downgrading() {
        let assembler = ConfigurationAssembler::new(AssemblerPolicy {
            strict_environment: true,
            ..AssemblerPolicy::default()
        });
        let result = assembler.select_environment(Environment::Production, None, "bar-1");
        assert_eq!(result.unwrap_err(), PipelineError::ProductionNotEnabled);
    }

    #[test]
    fn test_numeric_overrides() {
        let assembler = ConfigurationAssembler::default();
        let overrides = ConfigOverrides {
            timeout_ms: Some(600_000),
            retry_attempts: Some(15),
            rate_limit_per_minute: Some(120),
            production_mode: None,
        };
        let config = assembler
            .assemble(
                &identity(),
                credentials("sandbox", "https://example.com/cb"),
                Some(&overrides),
            )
            .unwrap();
        assert_eq!(config.timeout_ms(), 600_000);
        assert_eq!(config.retry_attempts(), 15);
        assert_eq!(config.rate_limit_per_minute(), 120);

        let zero_retries = ConfigOverrides {
            retry_attempts: Some(0),
            ..Default::default()
        };
        assert!(assembler
            .assemble(
                &identity(),
                credentials("sandbox", "https://example.com/cb"),
                Some(&zero_retries),
            )
            .is_ok());
    }

    #[test]
    fn test_numeric_overrides_rejected() {
        let assembler = ConfigurationAssembler::default();
        let cases = [
            (
                ConfigOverrides {
                    timeout_ms: Some(0),
                    ..Default::default()
                },
                "INVALID_TIMEOUT",
            ),
            (
                ConfigOverrides {
                    retry_attempts: Some(-1),
                    ..Default::default()
                },
                "INVALID_RETRY_ATTEMPTS",
            ),
            (
                ConfigOverrides {
                    rate_limit_per_minute: Some(0),
                    ..Default::default()
                },
                "INVALID_RATE_LIMIT",
            ),
        ];

        for (overrides, expected) in cases {
            let result = assembler.assemble(
                &identity(),
                credentials("sandbox", "https://example.com/cb"),
                Some(&overrides),
            );
            assert_eq!(code(result), expected);
        }
    }

    #[test]
    fn test_redacted_summary_hides_secrets() {
        let config = ConfigurationAssembler::default()
            .assemble(
                &identity(),
                credentials("sandbox", "https://example.com/cb"),
                None,
            )
            .unwrap();
        let json = serde_json::to_string(&config.redacted()).unwrap();

        assert!(json.contains("cons***"));
        assert!(!json.contains("consumer-secret-1"));
        assert!(!json.contains("passkey-value-1"));
        assert!(!format!("{:?}", config).contains("consumer-secret-1"));
    }
}
