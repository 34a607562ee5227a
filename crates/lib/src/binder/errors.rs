//! Error types for entity binding.

use thiserror::Error;

use crate::provider::ProviderError;
use crate::registry::RegistryError;

/// Errors that prevent an entity from being built.
///
/// Attribute-level problems never end up here; they degrade the value and
/// are reported alongside the bound entity.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindError {
    /// A shape element without a `name` attribute.
    #[error("Shape element has no name attribute")]
    MissingShapeName,

    /// The `name` attribute does not select a known shape.
    #[error("Unknown shape: {name}")]
    UnknownShape { name: String },

    /// The provider could not construct the entity.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The map's object registry was in the wrong state.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl BindError {
    /// Check if the markup named no usable shape.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            BindError::MissingShapeName | BindError::UnknownShape { .. }
        )
    }
}

impl From<BindError> for crate::Error {
    fn from(err: BindError) -> Self {
        crate::Error::Bind(err)
    }
}
