//! Deferred location resolution: fallbacks and completion ordering.

use std::sync::Arc;

use mapbind::{
    OptionValue,
    location::{LocationError, Resolution, ResolveOptions},
    provider::{Entity, EntityKind},
    testing::{GatedGeocoder, RecordingEntity, StaticGeocoder, StaticGeolocator},
};

use crate::helpers::*;

#[tokio::test]
async fn geocoding_failure_applies_fallback_exactly_once() {
    let geocoder = Arc::new(StaticGeocoder::failing("service down"));
    let resolver = resolver_with(geocoder.clone(), Arc::new(StaticGeolocator::unavailable()));
    let marker = RecordingEntity::new(EntityKind::Marker);
    let fallback = coord(-33.86, 151.2);

    let outcome = resolver
        .resolve(
            marker.clone(),
            "setPosition",
            "Sydney",
            ResolveOptions::default().with_fallback(fallback),
        )
        .await;

    assert_eq!(outcome, Resolution::Fallback(fallback));
    assert_eq!(geocoder.requests(), vec!["Sydney"]);
    assert_eq!(
        marker.all_calls(),
        vec![("setPosition".to_string(), OptionValue::Coordinate(fallback))]
    );
}

#[tokio::test]
async fn empty_geocoding_result_is_a_failure() {
    let resolver = resolver_with(
        Arc::new(StaticGeocoder::new()),
        Arc::new(StaticGeolocator::unavailable()),
    );
    let marker = RecordingEntity::new(EntityKind::Marker);
    let outcome = resolver
        .resolve(marker.clone(), "setPosition", "Nowhere", ResolveOptions::default())
        .await;
    assert_eq!(outcome, Resolution::Fallback(mapbind::Coordinate::ORIGIN));
    assert_eq!(marker.calls("setPosition").len(), 1);
}

#[tokio::test]
async fn denied_geolocation_applies_fallback() {
    let geolocator = Arc::new(StaticGeolocator::failing(LocationError::PermissionDenied));
    let resolver = resolver_with(Arc::new(StaticGeocoder::new()), geolocator.clone());
    let circle = RecordingEntity::new(EntityKind::Circle);

    let outcome = resolver
        .resolve(circle.clone(), "setCenter", "current-location", ResolveOptions::default())
        .await;

    assert_eq!(geolocator.requests(), 1);
    assert!(matches!(outcome, Resolution::Fallback(_)));
    assert_eq!(circle.calls("setCenter").len(), 1);
}

#[tokio::test]
async fn last_requested_wins_when_older_completes_last() {
    let geocoder = Arc::new(GatedGeocoder::new());
    let resolver = resolver_with(geocoder.clone(), Arc::new(StaticGeolocator::unavailable()));
    let marker = RecordingEntity::new(EntityKind::Marker);
    let (paris, rome) = (coord(48.85, 2.35), coord(41.9, 12.5));

    let first = resolver.spawn(marker.clone(), "setPosition", "Paris", ResolveOptions::default());
    let second = resolver.spawn(marker.clone(), "setPosition", "Rome", ResolveOptions::default());
    geocoder.wait_for("Paris").await;
    geocoder.wait_for("Rome").await;

    // Newer request completes first, older one afterwards.
    assert!(geocoder.release("Rome", Ok(rome)));
    assert_eq!(second.await.unwrap(), Resolution::Applied(rome));
    assert!(geocoder.release("Paris", Ok(paris)));
    assert_eq!(first.await.unwrap(), Resolution::Superseded);

    assert_eq!(marker.calls("setPosition"), vec![OptionValue::Coordinate(rome)]);
    assert_eq!(marker.get("position"), Some(OptionValue::Coordinate(rome)));
}

#[tokio::test]
async fn superseded_failure_does_not_apply_fallback() {
    let geocoder = Arc::new(GatedGeocoder::new());
    let resolver = resolver_with(geocoder.clone(), Arc::new(StaticGeolocator::unavailable()));
    let marker = RecordingEntity::new(EntityKind::Marker);

    let first = resolver.spawn(marker.clone(), "setPosition", "Paris", ResolveOptions::default());
    let second = resolver.spawn(marker.clone(), "setPosition", "Rome", ResolveOptions::default());
    geocoder.wait_for("Paris").await;
    geocoder.wait_for("Rome").await;

    geocoder.release(
        "Paris",
        Err(LocationError::GeocodeFailed {
            address: "Paris".into(),
            reason: "quota".into(),
        }),
    );
    assert_eq!(first.await.unwrap(), Resolution::Superseded);
    assert!(marker.calls("setPosition").is_empty());

    geocoder.release("Rome", Ok(coord(41.9, 12.5)));
    assert!(matches!(second.await.unwrap(), Resolution::Applied(_)));
    assert_eq!(marker.calls("setPosition").len(), 1);
    assert_eq!(resolver.pending(), 0);
}

#[tokio::test]
async fn resolution_recenters_the_owning_map() {
    let resolver = resolver_with(
        Arc::new(toronto_geocoder()),
        Arc::new(StaticGeolocator::unavailable()),
    );
    let map = RecordingEntity::new(EntityKind::Map);
    let marker = RecordingEntity::new(EntityKind::Marker);
    marker.attach(Some(map.clone()));

    let outcome = resolver
        .resolve(
            marker.clone(),
            "setPosition",
            "Toronto",
            ResolveOptions::default().centered(true),
        )
        .await;

    assert_eq!(outcome, Resolution::Applied(toronto()));
    assert_eq!(map.calls("setCenter"), vec![OptionValue::Coordinate(toronto())]);
}
