//! Live attribute observation.
//!
//! Attributes whose markup value contains an interpolation (`{{vm.zoom}}`)
//! change after the entity is built. Each such attribute gets an
//! [`AttributeObserver`] that re-coerces the new value and pushes it through
//! the entity's `set<Key>` setter. Location keys whose new value is still
//! text are resolved asynchronously instead. Empty values are ignored.
//!
//! Elements produced by a repeated template opt out entirely: each instance
//! is re-created rather than observed.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::attrs::{OptionKey, RawAttributeSet, camel_case, setter_name};
use crate::coerce::ValueCoercer;
use crate::config::BindingConfig;
use crate::constants::is_location_key;
use crate::location::{Dispatch, LocationResolver, ResolveOptions};
use crate::provider::{Entity, ProviderError};
use crate::value::OptionValue;

/// Keys of the attributes worth observing on one element.
///
/// Empty when the element carries any repeat attribute.
pub fn select_observable(attrs: &RawAttributeSet, config: &BindingConfig) -> Vec<OptionKey> {
    let repeated = config
        .repeat_attributes
        .iter()
        .any(|name| attrs.contains(name) || attrs.contains(&camel_case(name)));
    if repeated {
        debug!("repeated element; attributes are not observed");
        return Vec::new();
    }

    let keys: Vec<OptionKey> = attrs
        .normalized()
        .iter()
        .filter(|(_, value)| config.is_interpolated(value))
        .map(|(key, _)| key.to_string())
        .collect();
    debug!(?keys, "observed attributes");
    keys
}

/// What a change notification did.
#[derive(Debug)]
pub enum ChangeOutcome {
    /// The coerced value went straight to the setter.
    Applied(OptionValue),
    /// The value went to deferred location resolution.
    Deferred(Dispatch),
    /// The setter refused the value.
    Rejected(ProviderError),
    /// The target has no setter for this key.
    NoSetter,
    /// The new value was empty; nothing changed.
    Ignored,
}

impl ChangeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ChangeOutcome::Applied(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, ChangeOutcome::Deferred(_))
    }
}

/// Pushes changes of one attribute into one entity.
#[derive(Clone)]
pub struct AttributeObserver {
    target: Arc<dyn Entity>,
    key: OptionKey,
    setter: String,
    coercer: ValueCoercer,
    resolver: LocationResolver,
    resolve_options: ResolveOptions,
}

impl fmt::Debug for AttributeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeObserver")
            .field("target", &self.target.id())
            .field("key", &self.key)
            .field("setter", &self.setter)
            .finish_non_exhaustive()
    }
}

impl AttributeObserver {
    pub fn new(
        target: Arc<dyn Entity>,
        key: impl Into<OptionKey>,
        coercer: ValueCoercer,
        resolver: LocationResolver,
    ) -> Self {
        let key = key.into();
        Self {
            setter: setter_name(&key),
            target,
            key,
            coercer,
            resolver,
            resolve_options: ResolveOptions::default(),
        }
    }

    /// Options used when a change goes through deferred resolution.
    pub fn with_resolve_options(mut self, options: ResolveOptions) -> Self {
        self.resolve_options = options;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn setter(&self) -> &str {
        &self.setter
    }

    /// Handle a new raw value for the observed attribute.
    ///
    /// Deferred resolution is spawned on the current Tokio runtime; outside
    /// one the fallback location is applied.
    pub fn on_change(&self, raw: &str) -> ChangeOutcome {
        if raw.trim().is_empty() {
            debug!(key = %self.key, "empty value; change ignored");
            return ChangeOutcome::Ignored;
        }
        if !self.target.has_setter(&self.setter) {
            debug!(key = %self.key, setter = %self.setter, "no setter; change ignored");
            return ChangeOutcome::NoSetter;
        }

        let value = self.coercer.coerce(raw, &self.key);
        if is_location_key(&self.key) && value.is_textual() {
            return self.defer(raw);
        }

        debug!(target = %self.target.id(), setter = %self.setter, ?value, "applying change");
        match self.target.apply(&self.setter, value.clone()) {
            Ok(()) => ChangeOutcome::Applied(value),
            Err(e) => {
                warn!(key = %self.key, "Change not applied: {e}");
                ChangeOutcome::Rejected(e)
            }
        }
    }

    fn defer(&self, raw: &str) -> ChangeOutcome {
        ChangeOutcome::Deferred(self.resolver.dispatch(
            self.target.clone(),
            &self.setter,
            raw,
            self.resolve_options,
        ))
    }
}

/// Observers of one element, addressed by attribute key.
#[derive(Debug, Default, Clone)]
pub struct ObserverSet {
    observers: Vec<AttributeObserver>,
}

impl ObserverSet {
    /// Build observers for every observable attribute of `attrs`.
    pub fn for_entity(
        target: &Arc<dyn Entity>,
        attrs: &RawAttributeSet,
        config: &BindingConfig,
        coercer: &ValueCoercer,
        resolver: &LocationResolver,
        resolve_options: ResolveOptions,
    ) -> Self {
        let observers = select_observable(attrs, config)
            .into_iter()
            .map(|key| {
                AttributeObserver::new(target.clone(), key, coercer.clone(), resolver.clone())
                    .with_resolve_options(resolve_options)
            })
            .collect();
        Self { observers }
    }

    pub fn insert(&mut self, observer: AttributeObserver) {
        self.observers.retain(|o| o.key != observer.key);
        self.observers.push(observer);
    }

    pub fn get(&self, key: &str) -> Option<&AttributeObserver> {
        self.observers.iter().find(|o| o.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.observers.iter().map(|o| o.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Route a change notification. `name` may be in markup or camel casing.
    ///
    /// Returns `None` when the attribute is not observed.
    pub fn notify(&self, name: &str, raw: &str) -> Option<ChangeOutcome> {
        let observer = self.get(&camel_case(name))?;
        Some(observer.on_change(raw))
    }
}
