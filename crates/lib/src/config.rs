//! Binding configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::value::Coordinate;

/// Errors raised while loading a [`BindingConfig`].
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The input is not a valid config document.
    #[error("Invalid binding config: {reason}")]
    Parse { reason: String },

    /// A field holds a value the binder cannot use.
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, ConfigError::Parse { .. })
    }
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}

/// Tunables for attribute binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Zoom applied to a map whose options carry none.
    pub default_zoom: f64,
    /// Applied when deferred resolution fails and no other fallback is given.
    pub fallback_location: Coordinate,
    /// Case-insensitive prefix that selects device geolocation.
    pub current_location_prefix: String,
    pub interpolation_start: String,
    pub interpolation_end: String,
    /// Attributes marking an element as produced by a repeated template.
    pub repeat_attributes: Vec<String>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            default_zoom: constants::DEFAULT_ZOOM,
            fallback_location: Coordinate::ORIGIN,
            current_location_prefix: constants::CURRENT_LOCATION_PREFIX.to_string(),
            interpolation_start: constants::INTERPOLATION_START.to_string(),
            interpolation_end: constants::INTERPOLATION_END.to_string(),
            repeat_attributes: constants::REPEAT_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BindingConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_zoom.is_finite() || self.default_zoom < 0.0 {
            return Err(ConfigError::InvalidField {
                field: "default_zoom",
                reason: format!("{} is not a valid zoom level", self.default_zoom),
            });
        }
        if self.interpolation_start.is_empty() || self.interpolation_end.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "interpolation_start",
                reason: "interpolation markers must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `raw` selects the device's current position.
    pub fn is_current_location(&self, raw: &str) -> bool {
        let raw = raw.trim();
        raw.is_empty()
            || raw
                .get(..self.current_location_prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(&self.current_location_prefix))
    }

    /// Whether `raw` contains an interpolation `start ... end` pair.
    pub fn is_interpolated(&self, raw: &str) -> bool {
        raw.find(&self.interpolation_start).is_some_and(|start| {
            raw[start + self.interpolation_start.len()..].contains(&self.interpolation_end)
        })
    }
}
