//! # tenant-credentials
//!
//! Per-tenant mobile-money credential resolution including:
//! - Session-to-tenant identity resolution
//! - Credential record lookup scoped to one tenant and environment
//! - AES-256-GCM decryption with zeroize-on-drop secrets
//! - Environment-aware configuration assembly
//! - A closed error taxonomy with sanitized, classified errors

pub mod classify;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod settings;
pub mod storage;
pub mod telemetry;
mod pipeline;

pub use classify::{ClassifiedError, ErrorCategory, ErrorClassifier, ErrorContext, Severity};
pub use config::{
    ConfigOverrides, ConfigurationAssembler, Environment, ServiceConfiguration, TenantScope,
};
pub use credential::{CredentialStoreReader, EncryptedCredentialRecord, PlaintextCredentials};
pub use crypto::{CredentialBlob, CredentialDecryptor, DecryptionEngine, MasterKey, SecretString};
pub use error::{LookupError, PipelineError, Result};
pub use identity::{IdentityResolver, OwnerRecord, SessionRecord, TenantIdentity};
pub use pipeline::CredentialPipeline;
pub use settings::{ResolverSettings, SettingsLoader};
pub use storage::{CredentialRecordLookup, InMemoryStore, SessionLookup};
