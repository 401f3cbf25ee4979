//! Per-request credential resolution
//!
//! Runs the stages in strict order and stops at the first failure:
//! identity → environment selection → credential record → decryption →
//! assembly. Any failure is classified with the call-site context of the
//! stage that produced it.

use std::sync::Arc;
use tracing::{debug, info};

use crate::classify::{ClassifiedError, ErrorClassifier, ErrorContext};
use crate::config::{
    AssemblerPolicy, ConfigOverrides, ConfigurationAssembler, Environment, ServiceConfiguration,
};
use crate::credential::{decrypt_record, CredentialStoreReader};
use crate::crypto::{CredentialDecryptor, DecryptionEngine};
use crate::identity::IdentityResolver;
use crate::settings::ResolverSettings;
use crate::storage::{CredentialRecordLookup, SessionLookup};

/// Composition of the five resolution services
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct CredentialPipeline {
    resolver: IdentityResolver,
    reader: CredentialStoreReader,
    decryptor: Arc<dyn CredentialDecryptor>,
    assembler: ConfigurationAssembler,
    classifier: ErrorClassifier,
}

impl CredentialPipeline {
    /// Create a pipeline around an already constructed decryptor
    pub fn new(
        sessions: Arc<dyn SessionLookup>,
        records: Arc<dyn CredentialRecordLookup>,
        decryptor: Arc<dyn CredentialDecryptor>,
        settings: &ResolverSettings,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(sessions),
            reader: CredentialStoreReader::new(records),
            decryptor,
            assembler: ConfigurationAssembler::new(AssemblerPolicy::from(settings)),
            classifier: ErrorClassifier::new(settings.deployment_environment),
        }
    }

    /// Composition root: read the master key once and wire every stage
    pub fn from_settings(
        sessions: Arc<dyn SessionLookup>,
        records: Arc<dyn CredentialRecordLookup>,
        settings: &ResolverSettings,
    ) -> std::result::Result<Self, ClassifiedError> {
        let engine = DecryptionEngine::from_env(settings).map_err(|e| {
            ErrorClassifier::new(settings.deployment_environment)
                .classify(&e, &ErrorContext::new("load_master_key"))
        })?;

        info!("Credential pipeline ready");
        Ok(Self::new(sessions, records, Arc::new(engine), settings))
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Resolve the provider configuration for the tenant owning `session_handle`
    pub async fn resolve(
        &self,
        session_handle: &str,
        environment: &str,
        overrides: Option<&ConfigOverrides>,
    ) -> std::result::Result<ServiceConfiguration, ClassifiedError> {
        let context =
            ErrorContext::new("parse_environment").with_field("sessionHandle", session_handle);
        let requested: Environment = environment
            .parse()
            .map_err(|e| self.classifier.classify(&e, &context))?;

        let context = ErrorContext::new("resolve_identity")
            .with_environment(requested)
            .with_field("sessionHandle", session_handle);
        let identity = self
            .resolver
            .resolve(session_handle)
            .await
            .map_err(|e| self.classifier.classify(&e, &context))?;

        // Decided before the fetch so a downgraded request reads the sandbox record
        let context = ErrorContext::new("select_environment")
            .with_tenant(&identity.tenant_id)
            .with_environment(requested);
        let environment = self
            .assembler
            .select_environment(requested, overrides, &identity.tenant_id)
            .map_err(|e| self.classifier.classify(&e, &context))?;

        let context = ErrorContext::new("fetch_credentials")
            .with_tenant(&identity.tenant_id)
            .with_environment(environment);
        let record = self
            .reader
            .fetch(&identity.tenant_id, environment)
            .await
            .map_err(|e| self.classifier.classify(&e, &context))?;

        let context = ErrorContext::new("decrypt_credentials")
            .with_tenant(&identity.tenant_id)
            .with_environment(environment);
        let credentials = decrypt_record(&record, self.decryptor.as_ref())
            .map_err(|e| self.classifier.classify(&e, &context))?;

        let context = ErrorContext::new("assemble_configuration")
            .with_tenant(&identity.tenant_id)
            .with_environment(environment);
        let config = self
            .assembler
            .assemble(&identity, credentials, overrides)
            .map_err(|e| self.classifier.classify(&e, &context))?;

        debug!(
            "Resolved configuration for tenant {}: {:?}",
            identity.tenant_id,
            config.redacted()
        );
        Ok(config)
    }
}
