//! Map-owned collections of markers and shapes.
//!
//! Markers and shapes are usually built before their map. The registry starts
//! `NotReady`, buffering entities in creation order. [`ObjectRegistry::flush`]
//! moves it to `Ready` exactly once, attaching the buffered entities in that
//! order; from then on entities attach as soon as they are added.
//!
//! Attaching sets the entity's map, stores it under its `id` option (or its
//! position in the collection when it has none), and re-centers the map on
//! entities marked `centered`. [`ObjectRegistry::remove`] undoes it when the
//! element goes away.
//!
//! Entity and map callbacks run after the registry lock is released.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

use crate::location::recenter;
use crate::provider::{Entity, EntityId, EntityKind};

/// Errors raised by [`ObjectRegistry`].
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// `flush` was called on a registry that already has its map.
    #[error("Registry already attached to map {map}")]
    AlreadyReady { map: EntityId },

    /// Only markers and shapes live in a map's collections.
    #[error("Cannot register a {kind} with a map")]
    NotAttachable { kind: EntityKind },
}

impl RegistryError {
    pub fn is_already_ready(&self) -> bool {
        matches!(self, RegistryError::AlreadyReady { .. })
    }
}

impl From<RegistryError> for crate::Error {
    fn from(err: RegistryError) -> Self {
        crate::Error::Registry(err)
    }
}

/// Where an added entity ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Buffered until the map is ready.
    Pending,
    /// Attached under this key.
    Attached { key: String },
}

enum Lifecycle {
    NotReady { pending: Vec<Arc<dyn Entity>> },
    Ready { map: Arc<dyn Entity> },
}

/// A keyed collection preserving insertion order.
type Collection = Vec<(String, Arc<dyn Entity>)>;

struct RegistryState {
    lifecycle: Lifecycle,
    markers: Collection,
    shapes: Collection,
}

/// Buffers markers and shapes until their map exists, then owns the map's
/// keyed collections.
pub struct ObjectRegistry {
    state: Mutex<RegistryState>,
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ObjectRegistry")
            .field("ready", &matches!(state.lifecycle, Lifecycle::Ready { .. }))
            .field("markers", &state.markers.len())
            .field("shapes", &state.shapes.len())
            .finish()
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                lifecycle: Lifecycle::NotReady {
                    pending: Vec::new(),
                },
                markers: Vec::new(),
                shapes: Vec::new(),
            }),
        }
    }

    pub fn add_marker(&self, marker: Arc<dyn Entity>) -> Placement {
        self.add(marker)
    }

    pub fn add_shape(&self, shape: Arc<dyn Entity>) -> Placement {
        self.add(shape)
    }

    /// Add a marker or shape, classified by its provider kind.
    pub fn add_object(&self, object: Arc<dyn Entity>) -> Result<Placement, RegistryError> {
        let kind = object.kind();
        if !kind.is_marker() && !kind.is_shape() {
            return Err(RegistryError::NotAttachable { kind });
        }
        Ok(self.add(object))
    }

    /// Attach every buffered entity to `map`, in creation order.
    ///
    /// Valid once; later entities attach immediately.
    pub fn flush(&self, map: Arc<dyn Entity>) -> Result<Vec<String>, RegistryError> {
        let attachments: Vec<Attachment> = {
            let mut state = self.lock();
            let pending = match &mut state.lifecycle {
                Lifecycle::Ready { map } => {
                    return Err(RegistryError::AlreadyReady { map: map.id() });
                }
                Lifecycle::NotReady { pending } => std::mem::take(pending),
            };
            state.lifecycle = Lifecycle::Ready { map: map.clone() };

            debug!(map = %map.id(), count = pending.len(), "flushing buffered objects");
            pending
                .into_iter()
                .map(|entity| place(&mut state, &map, entity))
                .collect()
        };
        Ok(attachments.into_iter().map(Attachment::finish).collect())
    }

    /// Remove an entity, pending or attached, and detach it from the map.
    ///
    /// Returns `false` if the registry does not hold it.
    pub fn remove(&self, entity: &Arc<dyn Entity>) -> bool {
        let id = entity.id();
        let attached = {
            let mut state = self.lock();
            if let Lifecycle::NotReady { pending } = &mut state.lifecycle {
                let before = pending.len();
                pending.retain(|e| e.id() != id);
                if pending.len() != before {
                    debug!(entity = %id, "removed before attaching");
                    return true;
                }
            }
            let before = state.markers.len() + state.shapes.len();
            state.markers.retain(|(_, e)| e.id() != id);
            state.shapes.retain(|(_, e)| e.id() != id);
            state.markers.len() + state.shapes.len() != before
        };

        if attached {
            entity.attach(None);
            debug!(entity = %id, kind = %entity.kind(), "removed from map");
        }
        attached
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lock().lifecycle, Lifecycle::Ready { .. })
    }

    pub fn map(&self) -> Option<Arc<dyn Entity>> {
        match &self.lock().lifecycle {
            Lifecycle::Ready { map } => Some(map.clone()),
            Lifecycle::NotReady { .. } => None,
        }
    }

    /// Number of entities waiting for the map.
    pub fn pending_len(&self) -> usize {
        match &self.lock().lifecycle {
            Lifecycle::NotReady { pending } => pending.len(),
            Lifecycle::Ready { .. } => 0,
        }
    }

    /// Attached markers, in attach order.
    pub fn markers(&self) -> Vec<(String, Arc<dyn Entity>)> {
        self.lock().markers.clone()
    }

    pub fn marker(&self, key: &str) -> Option<Arc<dyn Entity>> {
        find(&self.lock().markers, key)
    }

    /// Attached shapes, in attach order.
    pub fn shapes(&self) -> Vec<(String, Arc<dyn Entity>)> {
        self.lock().shapes.clone()
    }

    pub fn shape(&self, key: &str) -> Option<Arc<dyn Entity>> {
        find(&self.lock().shapes, key)
    }

    fn add(&self, entity: Arc<dyn Entity>) -> Placement {
        let attachment = {
            let mut state = self.lock();
            let map = match &mut state.lifecycle {
                Lifecycle::NotReady { pending } => {
                    if !pending.iter().any(|e| e.id() == entity.id()) {
                        pending.push(entity);
                    }
                    return Placement::Pending;
                }
                Lifecycle::Ready { map } => map.clone(),
            };
            place(&mut state, &map, entity)
        };
        Placement::Attached {
            key: attachment.finish(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn find(collection: &Collection, key: &str) -> Option<Arc<dyn Entity>> {
    collection
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, e)| e.clone())
}

/// A collection slot taken under the lock. The entity itself is told about
/// its map by [`Attachment::finish`], once the lock is released.
struct Attachment {
    key: String,
    /// Entity and map to connect. `None` when the entity was already attached.
    connect: Option<(Arc<dyn Entity>, Arc<dyn Entity>)>,
}

impl Attachment {
    fn finish(self) -> String {
        let Some((entity, map)) = self.connect else {
            return self.key;
        };
        entity.attach(Some(map));

        if entity.is_centered() {
            let position = entity
                .get("position")
                .or_else(|| entity.get("center"))
                .and_then(|v| v.as_coordinate());
            if let Some(position) = position {
                recenter(&entity, position);
            }
        }

        debug!(
            entity = %entity.id(),
            kind = %entity.kind(),
            key = %self.key,
            "attached to map"
        );
        self.key
    }
}

/// Key one entity into its collection.
fn place(
    state: &mut RegistryState,
    map: &Arc<dyn Entity>,
    entity: Arc<dyn Entity>,
) -> Attachment {
    let collection = if entity.kind().is_marker() {
        &mut state.markers
    } else {
        &mut state.shapes
    };

    if let Some((key, _)) = collection.iter().find(|(_, e)| e.id() == entity.id()) {
        return Attachment {
            key: key.clone(),
            connect: None,
        };
    }

    let key = entity
        .key()
        .unwrap_or_else(|| collection.len().to_string());

    match collection.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => {
            warn!(%key, "replacing {} with the same key", entity.kind());
            slot.1 = entity.clone();
        }
        None => collection.push((key.clone(), entity.clone())),
    }

    Attachment {
        key,
        connect: Some((entity, map.clone())),
    }
}
