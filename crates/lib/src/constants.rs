//! Constants used throughout the binding layer.
//!
//! Central definitions for default option values and the attribute and
//! setter names the binder treats specially.

/// Zoom level applied to a map whose options carry no `zoom`.
pub const DEFAULT_ZOOM: f64 = 15.0;

/// Option keys that denote a geographic location.
pub const LOCATION_KEYS: [&str; 2] = ["center", "position"];

/// Case-insensitive prefix selecting device geolocation instead of geocoding.
pub const CURRENT_LOCATION_PREFIX: &str = "current";

/// Template interpolation markers.
pub const INTERPOLATION_START: &str = "{{";
pub const INTERPOLATION_END: &str = "}}";

/// Attribute names that mark an element as produced by a repeated template.
pub const REPEAT_ATTRIBUTES: [&str; 3] = ["ng-repeat", "ngRepeat", "data-ng-repeat"];

/// Map option holding the fallback used when a textual center cannot be resolved.
pub const GEO_FALLBACK_CENTER: &str = "geoFallbackCenter";

/// Shape attribute selecting the shape kind.
pub const SHAPE_NAME: &str = "name";

/// Options kept for ground overlays; everything else is dropped.
pub const GROUND_OVERLAY_OPTIONS: [&str; 5] = ["url", "bounds", "opacity", "clickable", "id"];

/// Setter used to re-center a map.
pub const SET_CENTER: &str = "setCenter";

/// Setter used to move a marker.
pub const SET_POSITION: &str = "setPosition";

/// Whether `key` denotes a location option.
pub fn is_location_key(key: &str) -> bool {
    LOCATION_KEYS.contains(&key)
}
