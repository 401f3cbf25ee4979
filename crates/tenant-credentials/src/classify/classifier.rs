//! Error classifier and the classified error contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::catalog::{lookup, ErrorCategory, ErrorSpec, Severity, UNKNOWN_ERROR};
use super::sanitize::sanitize_context;
use crate::config::Environment;
use crate::error::PipelineError;

/// Call-site context attached to a fault before classification
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub tenant_id: Option<String>,
    pub operation: Option<String>,
    pub environment: Option<Environment>,
    /// Free-form fields; sanitized before they reach the classified error
    pub extra: Map<String, Value>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: Some(operation.to_string()),
            ..Default::default()
        }
    }

    pub fn with_tenant(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        if let Some(tenant_id) = &self.tenant_id {
            map.insert("tenantId".to_string(), json!(tenant_id));
        }
        if let Some(operation) = &self.operation {
            map.insert("operation".to_string(), json!(operation));
        }
        if let Some(environment) = self.environment {
            map.insert("environment".to_string(), json!(environment));
        }
        map
    }
}

/// Uniform representation of any pipeline fault; never carries secret material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub code: String,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub status_code: u16,
    pub user_message: String,
    pub admin_message: String,
    pub sanitized_context: Map<String, Value>,
    pub should_retry: bool,
    pub timestamp: DateTime<Utc>,
    pub environment: Environment,
    pub request_id: Uuid,
}

impl ClassifiedError {
    /// Response body: `{success: false, error: {code, message, shouldRetry}}`,
    /// plus a `debug` block outside production
    pub fn to_response(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": {
                "code": self.code,
                "message": self.user_message,
                "shouldRetry": self.should_retry,
            }
        });

        if !self.environment.is_production() {
            body["debug"] = json!({
                "category": self.category,
                "severity": self.severity,
                "adminMessage": self.admin_message,
                "context": self.sanitized_context,
                "timestamp": self.timestamp,
                "requestId": self.request_id,
            });
        }

        body
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.user_message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Error classifier
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    /// Environment this process is deployed in
    deployment_environment: Environment,
}

impl ErrorClassifier {
    pub fn new(deployment_environment: Environment) -> Self {
        Self {
            deployment_environment,
        }
    }

    /// Classify a pipeline fault
    pub fn classify(&self, fault: &PipelineError, context: &ErrorContext) -> ClassifiedError {
        let spec = lookup(fault.code()).unwrap_or(&UNKNOWN_ERROR);
        self.build(spec, &fault.to_string(), context)
    }

    /// Classify a fault reported by code, e.g. from an outer layer
    ///
    /// Unknown codes classify as `UNKNOWN_ERROR`.
    pub fn classify_code(
        &self,
        code: &str,
        detail: &str,
        context: &ErrorContext,
    ) -> ClassifiedError {
        let spec = lookup(code).unwrap_or(&UNKNOWN_ERROR);
        self.build(spec, detail, context)
    }

    fn build(&self, spec: &ErrorSpec, detail: &str, context: &ErrorContext) -> ClassifiedError {
        // Production on either side wins so a production process never leaks debug detail
        let environment = match (self.deployment_environment, context.environment) {
            (Environment::Production, _) | (_, Some(Environment::Production)) => {
                Environment::Production
            }
            _ => Environment::Sandbox,
        };
        let sanitized_context = sanitize_context(&context.to_map(), environment);
        let admin_message = format!("{} ({})", spec.admin_message, detail);

        let classified = ClassifiedError {
            code: spec.code.to_string(),
            category: spec.category,
            severity: spec.severity,
            status_code: spec.status_code,
            user_message: spec.user_message.to_string(),
            admin_message,
            sanitized_context,
            should_retry: spec.should_retry,
            timestamp: Utc::now(),
            environment,
            request_id: Uuid::new_v4(),
        };

        log_classified(&classified, context.operation.as_deref());
        classified
    }
}

fn log_classified(classified: &ClassifiedError, operation: Option<&str>) {
    let operation = operation.unwrap_or("unknown");
    match classified.severity {
        Severity::Critical | Severity::High => error!(
            code = %classified.code,
            severity = ?classified.severity,
            request_id = %classified.request_id,
            operation,
            "{}",
            classified.admin_message
        ),
        Severity::Medium => warn!(
            code = %classified.code,
            request_id = %classified.request_id,
            operation,
            "{}",
            classified.admin_message
        ),
        Severity::Low => info!(
            code = %classified.code,
            request_id = %classified.request_id,
            operation,
            "{}",
            classified.admin_message
        ),
    }
}
