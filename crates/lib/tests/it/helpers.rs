use std::sync::Arc;

use mapbind::{
    Binder, BindingConfig, Coordinate, RawAttributeSet,
    events::EvaluationScope,
    location::{Geocoder, Geolocator, LocationResolver},
    provider::Namespace,
    testing::{RecordingProvider, StaticGeocoder, StaticGeolocator, TestScope},
    ValueCoercer,
};

// ==========================
// VALUE FACTORIES
// ==========================

pub fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).expect("finite test coordinate")
}

pub fn toronto() -> Coordinate {
    coord(43.6532, -79.3832)
}

pub fn attrs(pairs: &[(&str, &str)]) -> RawAttributeSet {
    pairs.iter().copied().collect()
}

// ==========================
// COMPONENT FACTORIES
// ==========================

pub fn standard_coercer() -> ValueCoercer {
    ValueCoercer::new(Arc::new(Namespace::standard()))
}

pub fn scope() -> Arc<dyn EvaluationScope> {
    Arc::new(TestScope::new())
}

/// A geocoder that knows Toronto, and a geolocator with no position.
pub fn toronto_geocoder() -> StaticGeocoder {
    StaticGeocoder::new().with("Toronto", toronto())
}

pub fn resolver_with(
    geocoder: Arc<dyn Geocoder>,
    geolocator: Arc<dyn Geolocator>,
) -> LocationResolver {
    LocationResolver::new(geocoder, geolocator, &BindingConfig::default())
}

/// A recording provider and a binder over it.
pub fn test_binder(geocoder: StaticGeocoder) -> (Arc<RecordingProvider>, Binder) {
    test_binder_with_config(geocoder, BindingConfig::default())
}

pub fn test_binder_with_config(
    geocoder: StaticGeocoder,
    config: BindingConfig,
) -> (Arc<RecordingProvider>, Binder) {
    let provider = Arc::new(RecordingProvider::new());
    let binder = Binder::new(
        provider.clone(),
        Arc::new(geocoder),
        Arc::new(StaticGeolocator::unavailable()),
        config,
    );
    (provider, binder)
}
