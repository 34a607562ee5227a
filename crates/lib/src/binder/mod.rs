//! Building provider entities from markup attributes.
//!
//! [`Binder`] wires the components together for the three element kinds:
//!
//! * **map**: options and control options, default zoom, deferred center,
//!   events, observers, then flushing the object registry;
//! * **marker**: options, placeholder position with deferred resolution,
//!   events, registration, observers;
//! * **shape**: the `name` attribute selects the shape kind, then as marker.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::attrs::RawAttributeSet;
use crate::coerce::ValueCoercer;
use crate::config::BindingConfig;
use crate::constants::{
    GEO_FALLBACK_CENTER, GROUND_OVERLAY_OPTIONS, SET_CENTER, SET_POSITION, SHAPE_NAME,
};
use crate::controls::{ControlOptionRepairer, ControlOptions};
use crate::events::{self, EvaluationScope, EventSynthesis};
use crate::location::{Dispatch, Geocoder, Geolocator, LocationResolver, ResolveOptions};
use crate::observer::ObserverSet;
use crate::provider::{Entity, EntityKind, MapProvider, bounds_record};
use crate::registry::{ObjectRegistry, Placement};
use crate::value::{Coordinate, OptionValue, Record};

mod errors;

pub use errors::BindError;

/// An entity built from markup, with everything bound to it.
#[derive(Debug)]
pub struct BoundEntity {
    pub entity: Arc<dyn Entity>,
    /// Handlers registered with the provider, and the attributes that failed.
    pub events: EventSynthesis,
    /// Repaired control options. Empty for markers and shapes.
    pub controls: ControlOptions,
    pub observers: ObserverSet,
    /// Deferred resolution of a textual location option.
    pub deferred: Option<Dispatch>,
    /// Registry placement. `None` for maps.
    pub placement: Option<Placement>,
}

impl BoundEntity {
    /// Route a change notification to the matching observer.
    pub fn notify(&self, name: &str, raw: &str) -> Option<crate::observer::ChangeOutcome> {
        self.observers.notify(name, raw)
    }

    /// The element is gone: remove the entity from its map's collections
    /// and detach it. Its observers are dropped with it.
    ///
    /// Returns whether `registry` held the entity.
    pub fn teardown(self, registry: &ObjectRegistry) -> bool {
        debug!(entity = %self.entity.id(), "tearing down bound entity");
        registry.remove(&self.entity)
    }
}

/// A textual location to resolve once the entity exists.
struct PendingLocation {
    setter: &'static str,
    raw: String,
    options: ResolveOptions,
}

/// Builds maps, markers and shapes through a [`MapProvider`].
#[derive(Clone)]
pub struct Binder {
    provider: Arc<dyn MapProvider>,
    coercer: ValueCoercer,
    repairer: ControlOptionRepairer,
    resolver: LocationResolver,
    config: BindingConfig,
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Binder {
    pub fn new(
        provider: Arc<dyn MapProvider>,
        geocoder: Arc<dyn Geocoder>,
        geolocator: Arc<dyn Geolocator>,
        config: BindingConfig,
    ) -> Self {
        let namespace = Arc::new(provider.namespace().clone());
        Self {
            coercer: ValueCoercer::new(namespace.clone()),
            repairer: ControlOptionRepairer::new(namespace),
            resolver: LocationResolver::new(geocoder, geolocator, &config),
            provider,
            config,
        }
    }

    pub fn coercer(&self) -> &ValueCoercer {
        &self.coercer
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Build a map and attach everything buffered in `registry` to it.
    pub fn bind_map(
        &self,
        attrs: &RawAttributeSet,
        scope: Arc<dyn EvaluationScope>,
        registry: &ObjectRegistry,
    ) -> Result<BoundEntity, BindError> {
        let mut options = self.coercer.options(attrs);
        let controls = self.repairer.repair(attrs);
        controls.merge_into(&mut options);

        options
            .entry("zoom".to_string())
            .or_insert(OptionValue::Number(self.config.default_zoom));

        let fallback = options
            .remove(GEO_FALLBACK_CENTER)
            .and_then(|v| v.as_coordinate())
            .unwrap_or(self.config.fallback_location);

        let has_center = matches!(options.get("center"), Some(OptionValue::Coordinate(_)));
        let pending = (!has_center).then(|| PendingLocation {
            setter: SET_CENTER,
            raw: location_text(options.remove("center")),
            options: ResolveOptions::default().with_fallback(fallback),
        });

        debug!(?options, "building map");
        let map = self.provider.create(EntityKind::Map, options)?;
        let deferred = pending.map(|p| self.dispatch(&map, p));
        let events = self.listen(&map, attrs, scope);
        let observers = self.observe(
            &map,
            attrs,
            ResolveOptions::default().with_fallback(fallback),
        );

        registry.flush(map.clone())?;

        Ok(BoundEntity {
            entity: map,
            events,
            controls,
            observers,
            deferred,
            placement: None,
        })
    }

    /// Build a marker and register it with the map's registry.
    pub fn bind_marker(
        &self,
        attrs: &RawAttributeSet,
        scope: Arc<dyn EvaluationScope>,
        registry: &ObjectRegistry,
    ) -> Result<BoundEntity, BindError> {
        let mut options = self.coercer.options(attrs);
        let pending = self.placeholder(&mut options, "position", SET_POSITION);

        debug!(?options, "building marker");
        let marker = self.provider.create(EntityKind::Marker, options)?;
        self.register(marker, attrs, scope, registry, pending)
    }

    /// Build the shape selected by the `name` attribute and register it.
    pub fn bind_shape(
        &self,
        attrs: &RawAttributeSet,
        scope: Arc<dyn EvaluationScope>,
        registry: &ObjectRegistry,
    ) -> Result<BoundEntity, BindError> {
        let normalized = attrs.normalized();
        let name = normalized
            .get(SHAPE_NAME)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(BindError::MissingShapeName)?;
        let kind = EntityKind::from_shape_name(name).ok_or_else(|| BindError::UnknownShape {
            name: name.to_string(),
        })?;

        let mut options = self.coercer.options(attrs);
        options.remove(SHAPE_NAME);

        let pending = match kind {
            EntityKind::Circle => self.placeholder(&mut options, "center", SET_CENTER),
            _ => None,
        };
        if matches!(kind, EntityKind::Rectangle | EntityKind::GroundOverlay) {
            convert_bounds(&mut options);
        }
        if kind == EntityKind::GroundOverlay {
            options.retain(|key, _| GROUND_OVERLAY_OPTIONS.contains(&key.as_str()));
        }

        debug!(%kind, ?options, "building shape");
        let shape = self.provider.create(kind, options)?;
        self.register(shape, attrs, scope, registry, pending)
    }

    /// Replace a non-coordinate location option with the origin and return
    /// the text to resolve later.
    fn placeholder(
        &self,
        options: &mut Record,
        key: &str,
        setter: &'static str,
    ) -> Option<PendingLocation> {
        if matches!(options.get(key), Some(OptionValue::Coordinate(_))) {
            return None;
        }
        let centered = options.get("centered").is_some_and(|v| v.is_truthy());
        let raw = location_text(options.insert(
            key.to_string(),
            OptionValue::Coordinate(Coordinate::ORIGIN),
        ));
        Some(PendingLocation {
            setter,
            raw,
            options: ResolveOptions::from_config(&self.config).centered(centered),
        })
    }

    fn register(
        &self,
        entity: Arc<dyn Entity>,
        attrs: &RawAttributeSet,
        scope: Arc<dyn EvaluationScope>,
        registry: &ObjectRegistry,
        pending: Option<PendingLocation>,
    ) -> Result<BoundEntity, BindError> {
        let events = self.listen(&entity, attrs, scope);
        let placement = registry.add_object(entity.clone())?;
        let deferred = pending.map(|p| self.dispatch(&entity, p));
        let resolve_options =
            ResolveOptions::from_config(&self.config).centered(entity.is_centered());
        let observers = self.observe(&entity, attrs, resolve_options);

        Ok(BoundEntity {
            entity,
            events,
            controls: ControlOptions::default(),
            observers,
            deferred,
            placement: Some(placement),
        })
    }

    /// Bind event attributes and subscribe them with the provider.
    ///
    /// A subscription the provider refuses is logged and dropped from the
    /// returned bindings.
    fn listen(
        &self,
        entity: &Arc<dyn Entity>,
        attrs: &RawAttributeSet,
        scope: Arc<dyn EvaluationScope>,
    ) -> EventSynthesis {
        let mut synthesis = events::synthesize(attrs, scope);
        synthesis.bindings.retain(|binding| {
            match self
                .provider
                .add_listener(entity, &binding.event, binding.handler.clone())
            {
                Ok(()) => true,
                Err(e) => {
                    let event = &binding.event;
                    warn!(entity = %entity.id(), %event, "Listener not registered: {e}");
                    false
                }
            }
        });
        synthesis
    }

    fn observe(
        &self,
        entity: &Arc<dyn Entity>,
        attrs: &RawAttributeSet,
        resolve_options: ResolveOptions,
    ) -> ObserverSet {
        ObserverSet::for_entity(
            entity,
            attrs,
            &self.config,
            &self.coercer,
            &self.resolver,
            resolve_options,
        )
    }

    fn dispatch(&self, entity: &Arc<dyn Entity>, pending: PendingLocation) -> Dispatch {
        self.resolver
            .dispatch(entity.clone(), pending.setter, &pending.raw, pending.options)
    }
}

/// The text of a location option that did not coerce to a coordinate.
fn location_text(value: Option<OptionValue>) -> String {
    match value {
        Some(OptionValue::String(s)) | Some(OptionValue::Unresolved(s)) => s,
        Some(OptionValue::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Turn a two-coordinate `bounds` list into a bounds record.
fn convert_bounds(options: &mut Record) {
    let Some(bounds) = options.get_mut("bounds") else {
        return;
    };
    let corners = match bounds.as_coordinates() {
        Some(&[south_west, north_east]) => Some((south_west, north_east)),
        Some(other) => {
            warn!(count = other.len(), "bounds need exactly two coordinates");
            None
        }
        None => None,
    };
    if let Some((south_west, north_east)) = corners {
        *bounds = bounds_record(south_west, north_east);
    }
}
