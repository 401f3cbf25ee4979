//! Error classification
//!
//! Maps every pipeline fault to a fixed, security-reviewed signal:
//! - a static catalog of category, severity, status, and retryability per code
//! - context sanitization that strips secrets and masks identifiers
//! - a renderer for the response layer

mod catalog;
mod classifier;
mod sanitize;

pub use catalog::{lookup, resolve_alias, ErrorCategory, ErrorSpec, Severity, UNKNOWN_ERROR};
pub use classifier::{ClassifiedError, ErrorClassifier, ErrorContext};
pub use sanitize::sanitize_context;
