//! Error types for event binding.

use thiserror::Error;

/// Errors raised while turning `on*` attributes into handlers.
///
/// Each error is local to one attribute; the binding is skipped and the
/// remaining attributes are still processed.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventError {
    /// The value is not of the form `functionName(args)`.
    #[error("Malformed event handler for {attribute}: {value:?}")]
    MalformedCall { attribute: String, value: String },

    /// An argument is neither a literal nor a scope reference.
    #[error("Unsupported argument {expression:?} in {attribute}")]
    UnsupportedArgument {
        attribute: String,
        expression: String,
    },
}

impl EventError {
    /// The attribute the error belongs to.
    pub fn attribute(&self) -> &str {
        match self {
            EventError::MalformedCall { attribute, .. }
            | EventError::UnsupportedArgument { attribute, .. } => attribute,
        }
    }

    /// Check if this is a call-syntax error.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, EventError::MalformedCall { .. })
    }
}

/// Errors raised by an evaluation scope when a handler fires.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScopeError {
    /// The scope has no function with this name.
    #[error("Scope has no function {function}")]
    UnknownFunction { function: String },
}

impl ScopeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScopeError::UnknownFunction { .. })
    }
}

impl From<EventError> for crate::Error {
    fn from(err: EventError) -> Self {
        crate::Error::Event(err)
    }
}

impl From<ScopeError> for crate::Error {
    fn from(err: ScopeError) -> Self {
        crate::Error::Scope(err)
    }
}
