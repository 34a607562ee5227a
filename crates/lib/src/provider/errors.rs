//! Error types for the mapping provider boundary.

use thiserror::Error;

/// Errors raised by the provider capability table or by provider entities.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// The named type is not exposed by the provider namespace.
    #[error("Unknown constructor: {name}")]
    UnknownConstructor { name: String },

    /// A registered constructor rejected its arguments.
    #[error("Constructor {name} rejected its arguments: {reason}")]
    InvalidArguments { name: String, reason: String },

    /// The enum namespace does not exist.
    #[error("Unknown enum namespace: {namespace}")]
    UnknownNamespace { namespace: String },

    /// The namespace exists but does not contain the constant.
    #[error("Unknown constant {name} in enum {namespace}")]
    UnknownConstant { namespace: String, name: String },

    /// The entity has no such setter.
    #[error("Entity has no setter {setter}")]
    MissingSetter { setter: String },

    /// The entity refused the value passed to a setter.
    #[error("Setter {setter} rejected value: {reason}")]
    SetterRejected { setter: String, reason: String },

    /// The provider failed to construct an entity.
    #[error("Failed to construct {kind}: {reason}")]
    ConstructionFailed { kind: String, reason: String },
}

impl ProviderError {
    /// Check if this error is a namespace lookup failure.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            ProviderError::UnknownConstructor { .. }
                | ProviderError::UnknownNamespace { .. }
                | ProviderError::UnknownConstant { .. }
        )
    }
}

impl From<ProviderError> for crate::Error {
    fn from(err: ProviderError) -> Self {
        crate::Error::Provider(err)
    }
}
