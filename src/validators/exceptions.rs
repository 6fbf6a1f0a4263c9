//! XSD Validation Exceptions
//!
//! Instance validity errors are records delivered to an [`ErrorReporter`]
//! and never returned as `Err`. The [`ErrorContextStack`] keeps the error
//! codes of the nodes being validated, so that each element and attribute
//! can be given exactly the codes attributable to it.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

use super::messages::format_message;
use super::simple_types::InvalidValue;

/// Error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Warning
    Warning,
    /// Recoverable error
    Error,
    /// Unrecoverable error; aborts the validation episode
    Fatal,
}

/// A message key with its arguments, not yet located in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Message key
    pub key: &'static str,
    /// Message arguments
    pub args: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic
    pub fn new<I, S>(key: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<InvalidValue> for Diagnostic {
    fn from(e: InvalidValue) -> Self {
        Self {
            key: e.key,
            args: e.args,
        }
    }
}

/// A validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Message key (error code)
    pub key: String,
    /// Message arguments
    pub args: Vec<String>,
    /// Rendered message
    pub message: String,
    /// Severity
    pub severity: Severity,
    /// Path of the element being validated, if any
    pub path: Option<String>,
}

impl ValidationError {
    /// Create an error from a key and its arguments
    pub fn new(key: impl Into<String>, args: Vec<String>) -> Self {
        let key = key.into();
        let message = format_message(&key, &args);
        Self {
            key,
            args,
            message,
            severity: Severity::Error,
            path: None,
        }
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the element path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Whether the error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl From<Diagnostic> for ValidationError {
    fn from(d: Diagnostic) -> Self {
        ValidationError::new(d.key, d.args)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " (path: {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Receiver of validation errors.
///
/// Reporting is fire-and-continue: an implementation may only return `Err`
/// for fatal errors, which aborts the validation episode.
pub trait ErrorReporter {
    /// Receive an error
    fn report(&mut self, error: &ValidationError) -> Result<()>;

    /// Forget everything received so far
    fn reset(&mut self) {}
}

/// Reporter that keeps every error it receives
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    errors: Vec<ValidationError>,
}

impl CollectingReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors received so far
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Take the received errors
    pub fn take(&mut self) -> Vec<ValidationError> {
        std::mem::take(&mut self.errors)
    }

    /// Number of errors received
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no error was received
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&mut self, error: &ValidationError) -> Result<()> {
        self.errors.push(error.clone());
        if error.is_fatal() {
            return Err(Error::Fatal(error.message.clone()));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.errors.clear();
    }
}

/// Error codes of the nodes on the validation path.
///
/// A context is pushed when an element or attribute is entered. On exit it
/// is either merged (its codes stay visible to the enclosing context) or
/// popped (its codes are discarded).
#[derive(Debug, Default, Clone)]
pub struct ErrorContextStack {
    codes: Vec<String>,
    marks: Vec<usize>,
}

impl ErrorContextStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a node
    pub fn push_context(&mut self) {
        self.marks.push(self.codes.len());
    }

    /// Record an error code in the current context
    pub fn record(&mut self, code: impl Into<String>) {
        self.codes.push(code.into());
    }

    /// Leave a node, returning its codes and keeping them for the parent
    pub fn merge_context(&mut self) -> Vec<String> {
        let mark = self.marks.pop().unwrap_or(0);
        self.codes[mark..].to_vec()
    }

    /// Leave a node, taking its codes away from the parent
    pub fn pop_context(&mut self) -> Vec<String> {
        let mark = self.marks.pop().unwrap_or(0);
        self.codes.split_off(mark)
    }

    /// Number of open contexts
    pub fn depth(&self) -> usize {
        self.marks.len()
    }

    /// Drop all contexts and codes
    pub fn clear(&mut self) {
        self.codes.clear();
        self.marks.clear();
    }
}
