//! Typed option values produced from markup attributes.
//!
//! Markup only ever supplies strings. Everything downstream of coercion
//! (entity construction, setters, the provider) works with [`OptionValue`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A nested option group: field name to value.
pub type Record = BTreeMap<String, OptionValue>;

/// A validated latitude/longitude pair.
///
/// Both components are always finite. Construct through [`Coordinate::new`],
/// which rejects NaN and infinities instead of producing a partial value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// The origin, used as the placeholder position before deferred resolution.
    pub const ORIGIN: Coordinate = Coordinate { lat: 0.0, lng: 0.0 };

    /// Create a coordinate, returning `None` if either component is not finite.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if lat.is_finite() && lng.is_finite() {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Build a coordinate from a JSON `[lat, lng]` pair.
    ///
    /// Components may be numbers or numeric strings. Exactly two components
    /// are required.
    pub fn from_json_pair(items: &[serde_json::Value]) -> Option<Self> {
        match items {
            [lat, lng] => Self::new(json_number(lat)?, json_number(lng)?),
            _ => None,
        }
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = String;

    fn try_from([lat, lng]: [f64; 2]) -> Result<Self, Self::Error> {
        Coordinate::new(lat, lng).ok_or_else(|| format!("non-finite coordinate ({lat}, {lng})"))
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Read a JSON number, or a string that parses as a finite number.
pub(crate) fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// A named constant inside one of the provider's enum namespaces,
/// e.g. `MapTypeId.HYBRID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumConstant {
    pub namespace: String,
    pub name: String,
}

impl EnumConstant {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for EnumConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// A typed option value.
///
/// `Unresolved` carries the raw attribute text when no coercion rule produced
/// a typed value; consumers use it verbatim (an address, a URL, a color).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum OptionValue {
    Number(f64),
    Boolean(bool),
    String(String),
    Coordinate(Coordinate),
    CoordinateList(Vec<Coordinate>),
    /// A list that is not coordinates, e.g. `[{a: 1}]` or `["a", "b"]`.
    List(Vec<OptionValue>),
    Record(Record),
    Enum(EnumConstant),
    Unresolved(String),
}

impl OptionValue {
    /// Convert a parsed JSON value into an option value.
    ///
    /// Arrays become [`OptionValue::List`] and objects [`OptionValue::Record`];
    /// coordinate interpretation is the coercer's business, not this one's.
    /// Returns `None` for JSON `null`.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        Some(match value {
            serde_json::Value::Null => return None,
            serde_json::Value::Bool(b) => OptionValue::Boolean(b),
            serde_json::Value::Number(n) => OptionValue::Number(n.as_f64()?),
            serde_json::Value::String(s) => OptionValue::String(s),
            serde_json::Value::Array(items) => {
                OptionValue::List(items.into_iter().filter_map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => OptionValue::Record(
                map.into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            ),
        })
    }

    /// True for values that are still plain text (`String` or `Unresolved`).
    ///
    /// Location-valued fields in this state need deferred resolution.
    pub fn is_textual(&self) -> bool {
        matches!(self, OptionValue::String(_) | OptionValue::Unresolved(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) | OptionValue::Unresolved(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_coordinate(&self) -> Option<Coordinate> {
        match self {
            OptionValue::Coordinate(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_coordinates(&self) -> Option<&[Coordinate]> {
        match self {
            OptionValue::CoordinateList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            OptionValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Markup truthiness: `false`, `0`, empty text and the text `"false"` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Boolean(b) => *b,
            OptionValue::Number(n) => *n != 0.0,
            OptionValue::String(s) | OptionValue::Unresolved(s) => !s.is_empty() && s != "false",
            _ => true,
        }
    }
}

impl From<Coordinate> for OptionValue {
    fn from(c: Coordinate) -> Self {
        OptionValue::Coordinate(c)
    }
}

impl From<EnumConstant> for OptionValue {
    fn from(e: EnumConstant) -> Self {
        OptionValue::Enum(e)
    }
}

impl From<f64> for OptionValue {
    fn from(n: f64) -> Self {
        OptionValue::Number(n)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Boolean(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::String(s.to_string())
    }
}
