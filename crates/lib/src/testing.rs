//! In-memory fakes for the external collaborators.
//!
//! Available in unit tests and, with the `testing` feature, to downstream
//! test suites:
//!
//! * [`RecordingEntity`] / [`RecordingProvider`]: a provider that records
//!   every construction, setter call and listener.
//! * [`StaticGeocoder`] / [`StaticGeolocator`]: canned location answers.
//! * [`GatedGeocoder`]: a geocoder whose answers are released by the test,
//!   for exercising completion order.
//! * [`TestScope`]: an evaluation scope with fixed values that records calls.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::events::{EvaluationScope, EventHandler, ScopeError};
use crate::location::{GeocodeResult, Geocoder, Geolocator, LocationError};
use crate::provider::{Entity, EntityId, EntityKind, MapProvider, Namespace, ProviderError};
use crate::value::{Coordinate, OptionValue, Record};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Field written by a setter: `setCenter` → `center`.
fn setter_field(setter: &str) -> Option<String> {
    let rest = setter.strip_prefix("set")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

type ApplyHook = Arc<dyn Fn(&str) + Send + Sync>;

/// A provider entity that records setter calls.
///
/// Every `set<Field>` setter exists unless the entity was built with an
/// explicit setter list. A setter call also updates the field it names, so
/// [`Entity::get`] reflects the latest applied value.
pub struct RecordingEntity {
    id: EntityId,
    kind: EntityKind,
    setters: Option<BTreeSet<String>>,
    fields: Mutex<Record>,
    calls: Mutex<Vec<(String, OptionValue)>>,
    map: Mutex<Option<Arc<dyn Entity>>>,
    attach_count: Mutex<usize>,
    on_apply: Mutex<Option<ApplyHook>>,
}

impl fmt::Debug for RecordingEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingEntity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("calls", &lock(&self.calls).len())
            .finish_non_exhaustive()
    }
}

impl RecordingEntity {
    pub fn new(kind: EntityKind) -> Arc<Self> {
        Self::with_options(kind, Record::new())
    }

    pub fn with_options(kind: EntityKind, options: Record) -> Arc<Self> {
        Arc::new(Self {
            id: EntityId::next(),
            kind,
            setters: None,
            fields: Mutex::new(options),
            calls: Mutex::new(Vec::new()),
            map: Mutex::new(None),
            attach_count: Mutex::new(0),
            on_apply: Mutex::new(None),
        })
    }

    /// An entity exposing only the named setters.
    pub fn with_setters(kind: EntityKind, setters: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            id: EntityId::next(),
            kind,
            setters: Some(setters.iter().map(|s| s.to_string()).collect()),
            fields: Mutex::new(Record::new()),
            calls: Mutex::new(Vec::new()),
            map: Mutex::new(None),
            attach_count: Mutex::new(0),
            on_apply: Mutex::new(None),
        })
    }

    /// Run `hook` with the setter name after every successful setter call,
    /// the way a provider fires change listeners synchronously.
    pub fn on_apply(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *lock(&self.on_apply) = Some(Arc::new(hook));
    }

    /// Values passed to `setter`, in call order.
    pub fn calls(&self, setter: &str) -> Vec<OptionValue> {
        lock(&self.calls)
            .iter()
            .filter(|(name, _)| name == setter)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Every setter call, in order.
    pub fn all_calls(&self) -> Vec<(String, OptionValue)> {
        lock(&self.calls).clone()
    }

    /// Current fields: construction options overlaid with setter writes.
    pub fn options(&self) -> Record {
        lock(&self.fields).clone()
    }

    /// How many times the entity was attached to a map.
    pub fn attach_count(&self) -> usize {
        *lock(&self.attach_count)
    }
}

impl Entity for RecordingEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn has_setter(&self, setter: &str) -> bool {
        match &self.setters {
            Some(setters) => setters.contains(setter),
            None => setter_field(setter).is_some(),
        }
    }

    fn apply(&self, setter: &str, value: OptionValue) -> Result<(), ProviderError> {
        if !self.has_setter(setter) {
            return Err(ProviderError::MissingSetter {
                setter: setter.to_string(),
            });
        }
        if let Some(field) = setter_field(setter) {
            lock(&self.fields).insert(field, value.clone());
        }
        lock(&self.calls).push((setter.to_string(), value));
        let hook = lock(&self.on_apply).clone();
        if let Some(hook) = hook {
            hook(setter);
        }
        Ok(())
    }

    fn get(&self, field: &str) -> Option<OptionValue> {
        lock(&self.fields).get(field).cloned()
    }

    fn attach(&self, map: Option<Arc<dyn Entity>>) {
        if map.is_some() {
            *lock(&self.attach_count) += 1;
        }
        *lock(&self.map) = map;
    }

    fn map(&self) -> Option<Arc<dyn Entity>> {
        lock(&self.map).clone()
    }
}

/// A registered listener.
#[derive(Debug, Clone)]
pub struct Listener {
    pub target: EntityId,
    pub event: String,
    pub handler: EventHandler,
}

/// A provider that builds [`RecordingEntity`] values and records listeners.
#[derive(Debug)]
pub struct RecordingProvider {
    namespace: Namespace,
    created: Mutex<Vec<Arc<RecordingEntity>>>,
    listeners: Mutex<Vec<Listener>>,
    failing: Mutex<BTreeSet<&'static str>>,
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::with_namespace(Namespace::standard())
    }

    pub fn with_namespace(namespace: Namespace) -> Self {
        Self {
            namespace,
            created: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            failing: Mutex::new(BTreeSet::new()),
        }
    }

    /// Make construction of `kind` fail.
    pub fn fail_on(&self, kind: EntityKind) {
        lock(&self.failing).insert(kind.as_str());
    }

    /// Every entity constructed so far, in order.
    pub fn created(&self) -> Vec<Arc<RecordingEntity>> {
        lock(&self.created).clone()
    }

    pub fn created_of(&self, kind: EntityKind) -> Vec<Arc<RecordingEntity>> {
        lock(&self.created)
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn listeners(&self, target: EntityId) -> Vec<Listener> {
        lock(&self.listeners)
            .iter()
            .filter(|l| l.target == target)
            .cloned()
            .collect()
    }

    /// Fire `event` on `target`, invoking every matching handler.
    ///
    /// Returns the number of handlers invoked.
    pub fn fire(&self, target: EntityId, event: &str, payload: Value) -> Result<usize, ScopeError> {
        let handlers: Vec<EventHandler> = lock(&self.listeners)
            .iter()
            .filter(|l| l.target == target && l.event == event)
            .map(|l| l.handler.clone())
            .collect();
        for handler in &handlers {
            handler.invoke(payload.clone())?;
        }
        Ok(handlers.len())
    }
}

impl MapProvider for RecordingProvider {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn create(&self, kind: EntityKind, options: Record) -> Result<Arc<dyn Entity>, ProviderError> {
        if lock(&self.failing).contains(kind.as_str()) {
            return Err(ProviderError::ConstructionFailed {
                kind: kind.to_string(),
                reason: "construction disabled by test".to_string(),
            });
        }
        let entity = RecordingEntity::with_options(kind, options);
        lock(&self.created).push(entity.clone());
        Ok(entity)
    }

    fn add_listener(
        &self,
        target: &Arc<dyn Entity>,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), ProviderError> {
        lock(&self.listeners).push(Listener {
            target: target.id(),
            event: event.to_string(),
            handler,
        });
        Ok(())
    }
}

/// A geocoder answering from a fixed table.
///
/// Unknown addresses produce an empty result list.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    answers: HashMap<String, Coordinate>,
    failure: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: impl Into<String>, location: Coordinate) -> Self {
        self.answers.insert(address.into(), location);
        self
    }

    /// A geocoder whose every request fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Addresses requested so far.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, LocationError> {
        lock(&self.requests).push(address.to_string());
        if let Some(reason) = &self.failure {
            return Err(LocationError::GeocodeFailed {
                address: address.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .answers
            .get(address)
            .map(|location| vec![GeocodeResult::new(*location)])
            .unwrap_or_default())
    }
}

/// A geolocator with a fixed answer.
#[derive(Debug)]
pub struct StaticGeolocator {
    answer: Result<Coordinate, LocationError>,
    requests: Mutex<usize>,
}

impl StaticGeolocator {
    pub fn at(position: Coordinate) -> Self {
        Self {
            answer: Ok(position),
            requests: Mutex::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self::failing(LocationError::PositionUnavailable {
            reason: "no position source".to_string(),
        })
    }

    pub fn failing(error: LocationError) -> Self {
        Self {
            answer: Err(error),
            requests: Mutex::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        *lock(&self.requests)
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        *lock(&self.requests) += 1;
        self.answer.clone()
    }
}

type Gate = oneshot::Sender<Result<Coordinate, LocationError>>;

/// A geocoder that holds every request until the test releases it.
#[derive(Debug, Default)]
pub struct GatedGeocoder {
    gates: Mutex<HashMap<String, Vec<Gate>>>,
}

impl GatedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request for `address` is waiting.
    pub fn is_waiting(&self, address: &str) -> bool {
        lock(&self.gates)
            .get(address)
            .is_some_and(|gates| !gates.is_empty())
    }

    /// Yield until a request for `address` is waiting.
    pub async fn wait_for(&self, address: &str) {
        while !self.is_waiting(address) {
            tokio::task::yield_now().await;
        }
    }

    /// Answer the oldest waiting request for `address`.
    ///
    /// Returns `false` if no request was waiting.
    pub fn release(&self, address: &str, answer: Result<Coordinate, LocationError>) -> bool {
        let gate = {
            let mut gates = lock(&self.gates);
            match gates.get_mut(address) {
                Some(waiting) if !waiting.is_empty() => waiting.remove(0),
                _ => return false,
            }
        };
        gate.send(answer).is_ok()
    }
}

#[async_trait]
impl Geocoder for GatedGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, LocationError> {
        let (tx, rx) = oneshot::channel();
        lock(&self.gates)
            .entry(address.to_string())
            .or_default()
            .push(tx);
        match rx.await {
            Ok(answer) => answer.map(|location| vec![GeocodeResult::new(location)]),
            Err(_) => Err(LocationError::GeocodeFailed {
                address: address.to_string(),
                reason: "request abandoned".into(),
            }),
        }
    }
}

/// An evaluation scope with fixed values that records function calls.
#[derive(Debug, Default)]
pub struct TestScope {
    values: HashMap<String, Value>,
    functions: Option<BTreeSet<String>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl TestScope {
    /// A scope where every function exists.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Restrict callable functions to the given names.
    pub fn with_functions(mut self, names: &[&str]) -> Self {
        self.functions = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        lock(&self.calls).clone()
    }
}

impl EvaluationScope for TestScope {
    fn resolve(&self, path: &str) -> Option<Value> {
        if let Some(value) = self.values.get(path) {
            return Some(value.clone());
        }
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    fn call(&self, function: &str, args: &[Value]) -> Result<(), ScopeError> {
        let known = self
            .functions
            .as_ref()
            .is_none_or(|functions| functions.contains(function));
        if !known {
            return Err(ScopeError::UnknownFunction {
                function: function.to_string(),
            });
        }
        lock(&self.calls).push((function.to_string(), args.to_vec()));
        Ok(())
    }
}
