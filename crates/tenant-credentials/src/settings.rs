//! Resolver settings management
//!
//! Stores non-sensitive configuration in a plain JSON file. The master key is
//! never stored here; settings only name the environment variable holding it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Environment;
use crate::error::{PipelineError, Result};

/// Default environment variable holding the master key
pub const DEFAULT_MASTER_KEY_ENV: &str = "CREDENTIALS_ENCRYPTION_KEY";

const PRODUCTION_ENABLED_ENV: &str = "CREDENTIALS_PRODUCTION_ENABLED";
const STRICT_ENVIRONMENT_ENV: &str = "CREDENTIALS_STRICT_ENVIRONMENT";
const DEPLOYMENT_ENV: &str = "CREDENTIALS_DEPLOYMENT_ENV";

/// Resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverSettings {
    /// Settings file version
    pub version: u32,
    /// Name of the environment variable read once for the master key
    pub master_key_env: String,
    /// Allow production configurations without a per-request opt-in
    pub production_enabled: bool,
    /// Fail un-opted production requests instead of downgrading to sandbox
    pub strict_environment: bool,
    /// Where this process runs; production suppresses debug blocks in errors
    pub deployment_environment: Environment,
    pub default_timeout_ms: u64,
    pub default_retry_attempts: u32,
    pub default_rate_limit_per_minute: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            version: 1,
            master_key_env: DEFAULT_MASTER_KEY_ENV.to_string(),
            production_enabled: false,
            strict_environment: false,
            deployment_environment: Environment::Sandbox,
            default_timeout_ms: 30_000,
            default_retry_attempts: 3,
            default_rate_limit_per_minute: 60,
        }
    }
}

impl ResolverSettings {
    /// Apply overrides from process environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup(PRODUCTION_ENABLED_ENV) {
            self.production_enabled = parse_flag(PRODUCTION_ENABLED_ENV, &value)?;
        }
        if let Some(value) = lookup(STRICT_ENVIRONMENT_ENV) {
            self.strict_environment = parse_flag(STRICT_ENVIRONMENT_ENV, &value)?;
        }
        if let Some(value) = lookup(DEPLOYMENT_ENV) {
            self.deployment_environment = value
                .parse()
                .map_err(|_| PipelineError::Settings(format!("{}={}", DEPLOYMENT_ENV, value)))?;
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PipelineError::Settings(format!(
            "{}={} is not a boolean",
            name, value
        ))),
    }
}

/// Settings loader
pub struct SettingsLoader {
    settings_file: PathBuf,
}

impl SettingsLoader {
    pub fn new(settings_file: impl Into<PathBuf>) -> Self {
        Self {
            settings_file: settings_file.into(),
        }
    }

    /// Load settings from the file (or defaults), then apply environment overrides
    pub fn load(&self) -> Result<ResolverSettings> {
        let mut settings = Self::load_from_file(&self.settings_file)?;
        settings.apply_env()?;
        Ok(settings)
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<ResolverSettings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(ResolverSettings::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Settings(format!("{:?}: {}", path, e)))?;
        let settings: ResolverSettings = serde_json::from_str(&contents)
            .map_err(|e| PipelineError::Settings(format!("{:?}: {}", path, e)))?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self, settings: &ResolverSettings) -> Result<()> {
        let contents = serde_json::to_string_pretty(settings)
            .map_err(|e| PipelineError::Settings(e.to_string()))?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| PipelineError::Settings(e.to_string()))?;
        tokio::fs::rename(&temp_path, &self.settings_file)
            .await
            .map_err(|e| PipelineError::Settings(e.to_string()))?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }
}
