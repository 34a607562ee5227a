//! The provider's capability table.
//!
//! Coercion and control repair never reach into a global namespace. They are
//! handed a [`Namespace`]: a closed mapping from type names to constructor
//! functions and from enum namespace names to their constants. Anything not
//! registered here cannot be constructed or looked up.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::ProviderError;
use crate::value::{Coordinate, EnumConstant, OptionValue, Record, json_number};

/// Builds an option value from a literal argument list.
pub type Constructor = Arc<dyn Fn(&[Value]) -> Result<OptionValue, ProviderError> + Send + Sync>;

/// Read-only table of constructible types and enum namespaces.
#[derive(Clone, Default)]
pub struct Namespace {
    constructors: HashMap<String, Constructor>,
    enums: HashMap<String, BTreeSet<String>>,
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut constructors: Vec<_> = self.constructors.keys().collect();
        constructors.sort();
        f.debug_struct("Namespace")
            .field("constructors", &constructors)
            .field("enums", &self.enums)
            .finish()
    }
}

impl Namespace {
    /// An empty namespace. Nothing can be constructed or looked up.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard map namespace: `LatLng`, `LatLngBounds`, `Point`, `Size`
    /// and the usual map, control, marker and symbol enums.
    pub fn standard() -> Self {
        Namespace::empty()
            .with_constructor("LatLng", |args| match args {
                [lat, lng, ..] => json_number(lat)
                    .zip(json_number(lng))
                    .and_then(|(lat, lng)| Coordinate::new(lat, lng))
                    .map(OptionValue::Coordinate)
                    .ok_or_else(|| invalid("LatLng", "expected finite latitude and longitude")),
                _ => Err(invalid("LatLng", "expected (lat, lng)")),
            })
            .with_constructor("LatLngBounds", |args| match args {
                [Value::Array(sw), Value::Array(ne)] => {
                    let sw = Coordinate::from_json_pair(sw);
                    let ne = Coordinate::from_json_pair(ne);
                    match (sw, ne) {
                        (Some(sw), Some(ne)) => Ok(bounds_record(sw, ne)),
                        _ => Err(invalid("LatLngBounds", "corners must be [lat, lng] pairs")),
                    }
                }
                _ => Err(invalid("LatLngBounds", "expected ([lat, lng], [lat, lng])")),
            })
            .with_constructor("Point", |args| {
                numeric_pair("Point", args, "x", "y")
            })
            .with_constructor("Size", |args| {
                numeric_pair("Size", args, "width", "height")
            })
            .with_enum("MapTypeId", ["HYBRID", "ROADMAP", "SATELLITE", "TERRAIN"])
            .with_enum(
                "ControlPosition",
                [
                    "BOTTOM_CENTER",
                    "BOTTOM_LEFT",
                    "BOTTOM_RIGHT",
                    "LEFT_BOTTOM",
                    "LEFT_CENTER",
                    "LEFT_TOP",
                    "RIGHT_BOTTOM",
                    "RIGHT_CENTER",
                    "RIGHT_TOP",
                    "TOP_CENTER",
                    "TOP_LEFT",
                    "TOP_RIGHT",
                ],
            )
            .with_enum("MapTypeControlStyle", ["DEFAULT", "DROPDOWN_MENU", "HORIZONTAL_BAR"])
            .with_enum("ZoomControlStyle", ["DEFAULT", "LARGE", "SMALL"])
            .with_enum("ScaleControlStyle", ["DEFAULT"])
            .with_enum("NavigationControlStyle", ["ANDROID", "DEFAULT", "SMALL", "ZOOM_PAN"])
            .with_enum("Animation", ["BOUNCE", "DROP"])
            .with_enum(
                "SymbolPath",
                [
                    "BACKWARD_CLOSED_ARROW",
                    "BACKWARD_OPEN_ARROW",
                    "CIRCLE",
                    "FORWARD_CLOSED_ARROW",
                    "FORWARD_OPEN_ARROW",
                ],
            )
            .with_enum("StrokePosition", ["CENTER", "INSIDE", "OUTSIDE"])
    }

    /// Register (or replace) a constructor.
    pub fn with_constructor<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&[Value]) -> Result<OptionValue, ProviderError> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Register (or extend) an enum namespace.
    pub fn with_enum<I, S>(mut self, namespace: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enums
            .entry(namespace.into())
            .or_default()
            .extend(constants.into_iter().map(Into::into));
        self
    }

    pub fn has_constructor(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn has_enum(&self, namespace: &str) -> bool {
        self.enums.contains_key(namespace)
    }

    /// Construct a registered type from literal arguments.
    pub fn construct(&self, name: &str, args: &[Value]) -> Result<OptionValue, ProviderError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| ProviderError::UnknownConstructor {
                    name: name.to_string(),
                })?;
        constructor(args)
    }

    /// Look up `name` inside the enum `namespace`.
    pub fn lookup(&self, namespace: &str, name: &str) -> Result<EnumConstant, ProviderError> {
        let constants = self
            .enums
            .get(namespace)
            .ok_or_else(|| ProviderError::UnknownNamespace {
                namespace: namespace.to_string(),
            })?;
        if constants.contains(name) {
            Ok(EnumConstant::new(namespace, name))
        } else {
            Err(ProviderError::UnknownConstant {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
        }
    }
}

/// A bounds record with `southWest` and `northEast` corners.
pub fn bounds_record(south_west: Coordinate, north_east: Coordinate) -> OptionValue {
    let mut record = Record::new();
    record.insert("southWest".to_string(), south_west.into());
    record.insert("northEast".to_string(), north_east.into());
    OptionValue::Record(record)
}

fn numeric_pair(
    name: &str,
    args: &[Value],
    first: &str,
    second: &str,
) -> Result<OptionValue, ProviderError> {
    let (a, b) = match args {
        [a, b, ..] => (json_number(a), json_number(b)),
        _ => (None, None),
    };
    match (a, b) {
        (Some(a), Some(b)) => {
            let mut record = Record::new();
            record.insert(first.to_string(), OptionValue::Number(a));
            record.insert(second.to_string(), OptionValue::Number(b));
            Ok(OptionValue::Record(record))
        }
        _ => Err(invalid(name, &format!("expected ({first}, {second})"))),
    }
}

fn invalid(name: &str, reason: &str) -> ProviderError {
    ProviderError::InvalidArguments {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
