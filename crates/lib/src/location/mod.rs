//! Deferred location resolution.
//!
//! Text that should be a coordinate but is not (`center="Toronto"`,
//! `position="current-location"`) is resolved asynchronously and applied to
//! the target entity through a setter once known:
//!
//! * empty text, or text starting with the current-location keyword, asks the
//!   [`Geolocator`] for the device position;
//! * anything else is geocoded as an address by the [`Geocoder`].
//!
//! A failed resolution applies the fallback coordinate instead, so the target
//! is never left without a usable value.
//!
//! Each request takes a ticket from a monotonic counter when it is issued.
//! Only the latest ticket for a (target, setter) pair may apply its result;
//! a resolution that completes after a newer request was issued is discarded.
//! A request whose future is dropped before completing gives its ticket back.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::BindingConfig;
use crate::constants::SET_CENTER;
use crate::provider::{Entity, EntityId};
use crate::value::{Coordinate, OptionValue};

mod errors;

pub use errors::LocationError;

/// One geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub location: Coordinate,
}

impl GeocodeResult {
    pub fn new(location: Coordinate) -> Self {
        Self { location }
    }
}

/// Free-text address lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode an address. Results are ordered best match first.
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, LocationError>;
}

/// Device position lookup.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    /// Applied when resolution fails.
    pub fallback: Coordinate,
    /// Re-center the target's map on the resolved coordinate.
    pub center_on_resolve: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fallback: Coordinate::ORIGIN,
            center_on_resolve: false,
        }
    }
}

impl ResolveOptions {
    pub fn from_config(config: &BindingConfig) -> Self {
        Self {
            fallback: config.fallback_location,
            center_on_resolve: false,
        }
    }

    pub fn with_fallback(mut self, fallback: Coordinate) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn centered(mut self, center_on_resolve: bool) -> Self {
        self.center_on_resolve = center_on_resolve;
        self
    }
}

/// What a finished resolution did to its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The resolved coordinate was applied.
    Applied(Coordinate),
    /// Resolution failed; the fallback was applied.
    Fallback(Coordinate),
    /// A newer request for the same field was issued; nothing was applied.
    Superseded,
}

/// A resolution handed off by [`LocationResolver::dispatch`].
#[derive(Debug)]
pub enum Dispatch {
    /// Running on the current runtime.
    Spawned(JoinHandle<Resolution>),
    /// Finished synchronously.
    Completed(Resolution),
}

impl Dispatch {
    /// Wait for the resolution to finish.
    pub async fn finish(self) -> Option<Resolution> {
        match self {
            Dispatch::Spawned(handle) => handle.await.ok(),
            Dispatch::Completed(resolution) => Some(resolution),
        }
    }
}

type FieldKey = (EntityId, String);

struct ResolverInner {
    geocoder: Arc<dyn Geocoder>,
    geolocator: Arc<dyn Geolocator>,
    config: BindingConfig,
    tickets: Mutex<Tickets>,
}

#[derive(Default)]
struct Tickets {
    next: u64,
    /// Latest ticket issued per field. Removed once that ticket completes.
    latest: HashMap<FieldKey, u64>,
}

/// Resolves addresses and current-location keywords into coordinates and
/// applies them through entity setters.
///
/// Cheap to clone; clones share the ticket table.
#[derive(Clone)]
pub struct LocationResolver {
    inner: Arc<ResolverInner>,
}

impl fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationResolver")
            .field("current_prefix", &self.inner.config.current_location_prefix)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl LocationResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        geolocator: Arc<dyn Geolocator>,
        config: &BindingConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                geocoder,
                geolocator,
                config: config.clone(),
                tickets: Mutex::new(Tickets::default()),
            }),
        }
    }

    /// Whether `raw` selects the device position rather than an address.
    pub fn is_current_location(&self, raw: &str) -> bool {
        self.inner.config.is_current_location(raw)
    }

    /// Number of fields with a resolution still in flight.
    pub fn pending(&self) -> usize {
        self.lock_tickets().latest.len()
    }

    /// Request resolution of `raw` into `target.<setter>(coordinate)`.
    ///
    /// The request is issued immediately, superseding any earlier request
    /// for the same target and setter; the returned future performs the
    /// lookup and applies the result. Dropping the future without polling it
    /// still supersedes older requests, and releases its own ticket.
    pub fn resolve(
        &self,
        target: Arc<dyn Entity>,
        setter: &str,
        raw: &str,
        options: ResolveOptions,
    ) -> impl Future<Output = Resolution> + Send + use<> {
        let key: FieldKey = (target.id(), setter.to_string());
        let ticket = TicketGuard {
            ticket: self.issue(&key),
            resolver: self.clone(),
            key,
        };
        let raw = raw.trim().to_string();

        debug!(
            target = %ticket.key.0,
            setter = %ticket.key.1,
            ticket = ticket.ticket,
            raw = %raw,
            "location resolution requested"
        );

        async move {
            let lookup = ticket.resolver.lookup(&raw).await;
            ticket
                .resolver
                .complete(&ticket.key, ticket.ticket, &target, lookup, &options)
        }
    }

    /// [`resolve`](Self::resolve) on a background task.
    pub fn spawn(
        &self,
        target: Arc<dyn Entity>,
        setter: &str,
        raw: &str,
        options: ResolveOptions,
    ) -> JoinHandle<Resolution> {
        tokio::spawn(self.resolve(target, setter, raw, options))
    }

    /// Spawn the resolution on the current runtime.
    ///
    /// Outside a runtime the lookup cannot run, so the fallback is applied
    /// immediately instead.
    pub fn dispatch(
        &self,
        target: Arc<dyn Entity>,
        setter: &str,
        raw: &str,
        options: ResolveOptions,
    ) -> Dispatch {
        match Handle::try_current() {
            Ok(handle) => {
                Dispatch::Spawned(handle.spawn(self.resolve(target, setter, raw, options)))
            }
            Err(_) => {
                let key: FieldKey = (target.id(), setter.to_string());
                let ticket = self.issue(&key);
                let failure = Err(LocationError::NoRuntime {
                    raw: raw.to_string(),
                });
                Dispatch::Completed(self.complete(&key, ticket, &target, failure, &options))
            }
        }
    }

    async fn lookup(&self, raw: &str) -> Result<Coordinate, LocationError> {
        if self.is_current_location(raw) {
            return self.inner.geolocator.current_position().await;
        }
        let results = self.inner.geocoder.geocode(raw).await?;
        results
            .into_iter()
            .next()
            .map(|r| r.location)
            .ok_or_else(|| LocationError::NoResults {
                address: raw.to_string(),
            })
    }

    fn issue(&self, key: &FieldKey) -> u64 {
        let mut tickets = self.lock_tickets();
        tickets.next += 1;
        let ticket = tickets.next;
        tickets.latest.insert(key.clone(), ticket);
        ticket
    }

    /// Drop `ticket` if it is still the latest for `key`. Returns whether it was.
    fn retire(&self, key: &FieldKey, ticket: u64) -> bool {
        let mut tickets = self.lock_tickets();
        if tickets.latest.get(key) != Some(&ticket) {
            return false;
        }
        tickets.latest.remove(key);
        true
    }

    /// Apply a finished lookup if `ticket` is still the latest for `key`.
    ///
    /// The ticket table is unlocked before the setter runs; setters may call
    /// back into the resolver.
    fn complete(
        &self,
        key: &FieldKey,
        ticket: u64,
        target: &Arc<dyn Entity>,
        lookup: Result<Coordinate, LocationError>,
        options: &ResolveOptions,
    ) -> Resolution {
        if !self.retire(key, ticket) {
            debug!(target = %key.0, setter = %key.1, ticket, "stale location resolution discarded");
            return Resolution::Superseded;
        }

        let (resolution, coordinate) = match lookup {
            Ok(coordinate) => (Resolution::Applied(coordinate), coordinate),
            Err(e) => {
                let fallback = options.fallback;
                warn!(target = %key.0, setter = %key.1, "{e}; applying fallback {fallback}");
                (Resolution::Fallback(fallback), fallback)
            }
        };

        if let Err(e) = target.apply(&key.1, OptionValue::Coordinate(coordinate)) {
            warn!(target = %key.0, "Resolved location not applied: {e}");
        }
        if options.center_on_resolve && matches!(resolution, Resolution::Applied(_)) {
            recenter(target, coordinate);
        }
        resolution
    }

    fn lock_tickets(&self) -> MutexGuard<'_, Tickets> {
        self.inner.tickets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A ticket owned by an in-flight [`LocationResolver::resolve`] future.
struct TicketGuard {
    resolver: LocationResolver,
    key: FieldKey,
    ticket: u64,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        // No-op once `complete` retired the ticket or a newer one replaced it.
        self.resolver.retire(&self.key, self.ticket);
    }
}

/// Re-center the map `entity` is attached to.
pub(crate) fn recenter(entity: &Arc<dyn Entity>, coordinate: Coordinate) {
    let Some(map) = entity.map() else {
        debug!(entity = %entity.id(), "not attached to a map; skipping re-center");
        return;
    };
    if let Err(e) = map.apply(SET_CENTER, OptionValue::Coordinate(coordinate)) {
        warn!(map = %map.id(), "Re-center failed: {e}");
    }
}
