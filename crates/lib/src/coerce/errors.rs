//! Error types for value coercion.
//!
//! None of these escape [`ValueCoercer::coerce`](super::ValueCoercer::coerce):
//! a rule that recognizes its syntax but cannot produce a value reports one of
//! these, the coercer logs it and degrades the value to
//! [`OptionValue::Unresolved`](crate::value::OptionValue::Unresolved).

use thiserror::Error;

use crate::provider::ProviderError;

#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoercionError {
    /// A constructor expression named a type outside the provider namespace.
    /// The expression is never evaluated.
    #[error("Constructor {name} is not exposed by the provider")]
    ConstructorRejected { name: String },

    /// The constructor exists but rejected the arguments.
    #[error("Constructor {name} failed: {source}")]
    ConstructorFailed {
        name: String,
        #[source]
        source: ProviderError,
    },

    /// The constructor argument list is not a literal list.
    #[error("Constructor {name} has non-literal arguments: {args}")]
    NonLiteralArguments { name: String, args: String },

    /// An enum-looking token did not resolve in the provider namespace.
    #[error("Unknown enum constant {namespace}.{name}")]
    UnknownEnumConstant { namespace: String, name: String },

    /// A coordinate-shaped list had invalid components.
    #[error("Invalid coordinate literal: {raw}")]
    InvalidCoordinate { raw: String },
}

impl CoercionError {
    /// Check if the provider namespace refused the value.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            CoercionError::ConstructorRejected { .. } | CoercionError::UnknownEnumConstant { .. }
        )
    }

    /// Check if this is a malformed coordinate.
    pub fn is_coordinate_error(&self) -> bool {
        matches!(self, CoercionError::InvalidCoordinate { .. })
    }
}

impl From<CoercionError> for crate::Error {
    fn from(err: CoercionError) -> Self {
        crate::Error::Coercion(err)
    }
}
