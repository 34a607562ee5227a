//! Error types for deferred location resolution.

use thiserror::Error;

/// Errors reported by the geocoding and geolocation collaborators.
///
/// These never reach the caller of a resolution: every one of them ends in
/// the fallback coordinate being applied.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocationError {
    /// The geocoder failed for this address.
    #[error("Geocoding {address:?} failed: {reason}")]
    GeocodeFailed { address: String, reason: String },

    /// The geocoder answered with no results.
    #[error("No geocoding results for {address:?}")]
    NoResults { address: String },

    /// The device position could not be determined.
    #[error("Current position unavailable: {reason}")]
    PositionUnavailable { reason: String },

    /// The user or platform refused access to the device position.
    #[error("Current position access denied")]
    PermissionDenied,

    /// Resolution was requested outside an async runtime.
    #[error("No async runtime to resolve {raw:?}")]
    NoRuntime { raw: String },
}

impl From<LocationError> for crate::Error {
    fn from(err: LocationError) -> Self {
        crate::Error::Location(err)
    }
}
