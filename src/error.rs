//! Error types for xmlschema-psvi
//!
//! Instance validity problems are never returned as `Err`: they are reported
//! through an [`ErrorReporter`](crate::validators::exceptions::ErrorReporter)
//! and validation continues. The types here cover everything that aborts a
//! validation episode or rejects a malformed schema component.

use std::fmt;
use thiserror::Error;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xmlschema-psvi operations
#[derive(Error, Debug)]
pub enum Error {
    /// Fatal validation error raised by the error reporter
    #[error("fatal validation error: {0}")]
    Fatal(String),

    /// Schema component construction error
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Grammar resolver failure (e.g. an imported schema could not be loaded)
    #[error("resolver error: {0}")]
    Resolver(String),

    /// Invalid identity-constraint XPath expression
    #[error("xpath error: {0}")]
    XPath(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Resource limit exceeded
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The host event stream is inconsistent (unbalanced end tags etc.)
    #[error("event stream error: {0}")]
    EventStream(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Settings deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error in a schema component handed to the validator
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Error message
    pub message: String,
    /// The schema component the error refers to
    pub component: Option<String>,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            component: None,
        }
    }

    /// Set the component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref component) = self.component {
            write!(f, " (component: {})", component)?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaError {}
