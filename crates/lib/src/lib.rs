//!
//! Mapbind: declarative map markup bound to a mapping provider.
//! This library turns string-valued markup attributes into typed options,
//! event handlers and live setter calls on provider entities.
//!
//! ## Core Concepts
//!
//! * **Attributes (`attrs::RawAttributeSet`)**: The markup side. Names arrive in markup casing and are camel-cased into option keys.
//! * **Coercion (`coerce::ValueCoercer`)**: An ordered ladder of syntactic rules turning one raw string into a typed `value::OptionValue`.
//! * **Provider (`provider::MapProvider`, `provider::Entity`)**: The external renderer. Entities are addressed through named `set<Field>` setters; constructors and enums are looked up in a read-only `provider::Namespace`.
//! * **Events (`events::synthesize`)**: `on<Event>="fn(args)"` attributes become handlers invoked on an `events::EvaluationScope`.
//! * **Controls (`controls::ControlOptionRepairer`)**: Loose `<name>ControlOptions` records repaired into JSON and resolved against provider enums.
//! * **Deferred locations (`location::LocationResolver`)**: Addresses and current-location keywords resolved asynchronously; only the latest request per field is applied, and failure applies a fallback.
//! * **Observation (`observer::ObserverSet`)**: Interpolated attributes re-coerced and pushed into setters when they change.
//! * **Registry (`registry::ObjectRegistry`)**: Markers and shapes buffered until their map exists, then attached in creation order.
//! * **Binder (`binder::Binder`)**: Builds maps, markers and shapes from attributes using all of the above.

pub mod attrs;
pub mod binder;
pub mod coerce;
pub mod config;
pub mod constants;
pub mod controls;
pub mod events;
pub mod location;
pub mod observer;
pub mod provider;
pub mod registry;
pub mod repair;
pub mod value;

/// Fakes of the external collaborators, for tests.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export the main entry points for easier access.
pub use attrs::RawAttributeSet;
pub use binder::{Binder, BoundEntity};
pub use coerce::ValueCoercer;
pub use config::BindingConfig;
pub use registry::ObjectRegistry;
pub use value::{Coordinate, EnumConstant, OptionValue, Record};

/// Result type used throughout the Mapbind library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Mapbind library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured coercion errors from the coerce module
    #[error(transparent)]
    Coercion(coerce::CoercionError),

    /// Structured event binding errors from the events module
    #[error(transparent)]
    Event(events::EventError),

    /// Errors raised by an evaluation scope while a handler runs
    #[error(transparent)]
    Scope(events::ScopeError),

    /// Structured control-options errors from the controls module
    #[error(transparent)]
    Repair(controls::RepairError),

    /// Structured resolution errors from the location module
    #[error(transparent)]
    Location(location::LocationError),

    /// Structured provider errors from the provider module
    #[error(transparent)]
    Provider(provider::ProviderError),

    /// Structured registry errors from the registry module
    #[error(transparent)]
    Registry(registry::RegistryError),

    /// Structured binding errors from the binder module
    #[error(transparent)]
    Bind(binder::BindError),

    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Coercion(_) => "coerce",
            Error::Event(_) | Error::Scope(_) => "events",
            Error::Repair(_) => "controls",
            Error::Location(_) => "location",
            Error::Provider(_) => "provider",
            Error::Registry(_) => "registry",
            Error::Bind(_) => "binder",
            Error::Config(_) => "config",
        }
    }

    /// Check if this error indicates a name was not found in a lookup table.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Provider(provider_err) => provider_err.is_lookup_error(),
            Error::Scope(scope_err) => scope_err.is_not_found(),
            Error::Bind(bind_err) => bind_err.is_shape_error(),
            _ => false,
        }
    }

    /// Check if this error came from malformed markup.
    pub fn is_markup_error(&self) -> bool {
        match self {
            Error::Event(event_err) => event_err.is_syntax_error(),
            Error::Repair(_) => true,
            Error::Coercion(coercion_err) => coercion_err.is_coordinate_error(),
            _ => false,
        }
    }

    /// Check if this error came from an external collaborator.
    pub fn is_collaborator_error(&self) -> bool {
        matches!(
            self,
            Error::Location(_) | Error::Provider(_) | Error::Scope(_)
        )
    }
}
