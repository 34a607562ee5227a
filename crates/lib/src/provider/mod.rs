//! The mapping provider boundary.
//!
//! Rendering is delegated to an external provider. This module defines the
//! only things the rest of the crate knows about it:
//!
//! * [`Namespace`]: the read-only table of constructible value types and enum
//!   namespaces, used by coercion and control repair.
//! * [`Entity`]: the setter contract every provider object (map, marker,
//!   shape) satisfies. Setters are addressed by name (`setCenter`), so the
//!   coercion and observation code never depends on concrete entity types.
//! * [`MapProvider`]: construction of entities and event subscription.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::events::EventHandler;
use crate::value::{OptionValue, Record};

mod errors;
mod namespace;

pub use errors::ProviderError;
pub use namespace::{Constructor, Namespace, bounds_record};

/// Process-unique identity of a provider entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

impl EntityId {
    /// Allocate a fresh id. Provider implementations call this once per entity.
    pub fn next() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Concrete provider type of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Map,
    Marker,
    Circle,
    Polygon,
    Polyline,
    Rectangle,
    GroundOverlay,
}

impl EntityKind {
    pub fn is_marker(&self) -> bool {
        matches!(self, EntityKind::Marker)
    }

    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            EntityKind::Circle
                | EntityKind::Polygon
                | EntityKind::Polyline
                | EntityKind::Rectangle
                | EntityKind::GroundOverlay
        )
    }

    /// Shape kind for a markup shape name.
    ///
    /// `image` is accepted as an alias of `groundOverlay`.
    pub fn from_shape_name(name: &str) -> Option<Self> {
        match name {
            "circle" => Some(EntityKind::Circle),
            "polygon" => Some(EntityKind::Polygon),
            "polyline" => Some(EntityKind::Polyline),
            "rectangle" => Some(EntityKind::Rectangle),
            "groundOverlay" | "image" => Some(EntityKind::GroundOverlay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Map => "map",
            EntityKind::Marker => "marker",
            EntityKind::Circle => "circle",
            EntityKind::Polygon => "polygon",
            EntityKind::Polyline => "polyline",
            EntityKind::Rectangle => "rectangle",
            EntityKind::GroundOverlay => "groundOverlay",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider object exposing `set<Field>` setters by name.
pub trait Entity: Send + Sync + fmt::Debug {
    fn id(&self) -> EntityId;

    fn kind(&self) -> EntityKind;

    /// Whether a setter with this exact name (e.g. `setCenter`) exists.
    fn has_setter(&self, setter: &str) -> bool;

    /// Invoke a setter by name.
    fn apply(&self, setter: &str, value: OptionValue) -> Result<(), ProviderError>;

    /// Current value of an option field, if the entity exposes it.
    fn get(&self, field: &str) -> Option<OptionValue>;

    /// Attach to (or with `None`, detach from) a map.
    fn attach(&self, map: Option<Arc<dyn Entity>>);

    /// The map this entity is attached to.
    fn map(&self) -> Option<Arc<dyn Entity>>;

    /// Explicit `id` option, used as the key in the map's collections.
    fn key(&self) -> Option<String> {
        match self.get("id")? {
            OptionValue::Number(n) => Some(n.to_string()),
            other => other.as_text().map(str::to_string),
        }
    }

    /// Whether the map should be re-centered on this entity.
    fn is_centered(&self) -> bool {
        self.get("centered").is_some_and(|v| v.is_truthy())
    }
}

/// Entity construction and event subscription.
pub trait MapProvider: Send + Sync {
    /// The provider's capability table.
    fn namespace(&self) -> &Namespace;

    /// Construct an entity of the given kind from typed options.
    fn create(&self, kind: EntityKind, options: Record) -> Result<Arc<dyn Entity>, ProviderError>;

    /// Subscribe `handler` to `event` (e.g. `zoom_changed`) on `target`.
    fn add_listener(
        &self,
        target: &Arc<dyn Entity>,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), ProviderError>;
}
