//! Whole-element binding flows.

use mapbind::{
    BindingConfig, EnumConstant, ObjectRegistry, OptionValue,
    binder::BindError,
    location::Resolution,
    observer::ChangeOutcome,
    provider::{Entity, EntityKind},
    testing::StaticGeocoder,
};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn markers_before_map_then_map_flushes() {
    let (provider, binder) = test_binder(toronto_geocoder());
    let registry = ObjectRegistry::new();

    let first = binder
        .bind_marker(&attrs(&[("position", "[1, 2]"), ("id", "a")]), scope(), &registry)
        .unwrap();
    let second = binder
        .bind_marker(&attrs(&[("position", "Toronto"), ("centered", "true")]), scope(), &registry)
        .unwrap();
    assert_eq!(registry.pending_len(), 2);

    let map = binder
        .bind_map(
            &attrs(&[("center", "[0, 0]"), ("map-type-id", "HYBRID")]),
            scope(),
            &registry,
        )
        .unwrap();

    assert!(registry.is_ready());
    let keys: Vec<_> = registry.markers().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["a", "1"]);
    assert_eq!(first.entity.map().map(|m| m.id()), Some(map.entity.id()));

    // Attaching centers on the placeholder; the resolved position re-centers.
    let map_entity = provider.created_of(EntityKind::Map)[0].clone();
    assert_eq!(
        map_entity.calls("setCenter"),
        vec![OptionValue::Coordinate(mapbind::Coordinate::ORIGIN)]
    );
    let resolution = second.deferred.unwrap().finish().await;
    assert_eq!(resolution, Some(Resolution::Applied(toronto())));
    assert_eq!(
        map_entity.calls("setCenter").last(),
        Some(&OptionValue::Coordinate(toronto()))
    );
    assert_eq!(
        map_entity.options()["mapTypeId"],
        OptionValue::Enum(EnumConstant::new("MapTypeId", "HYBRID"))
    );
}

#[tokio::test]
async fn observed_map_center_goes_through_resolution() {
    let (provider, binder) = test_binder(toronto_geocoder());
    let bound = binder
        .bind_map(
            &attrs(&[("center", "[1, 1]"), ("zoom", "{{vm.zoom}}"), ("center-x", "{{vm.c}}")]),
            scope(),
            &ObjectRegistry::new(),
        )
        .unwrap();
    let map = provider.created_of(EntityKind::Map)[0].clone();

    let zoom = bound.notify("zoom", "9").unwrap();
    assert!(zoom.is_applied());
    assert_eq!(map.calls("setZoom"), vec![OptionValue::Number(9.0)]);

    assert!(bound.notify("center", "Toronto").is_none(), "center is not interpolated");
}

#[tokio::test]
async fn observed_marker_position_resolves_text_and_applies_coordinates() {
    let (provider, binder) = test_binder(toronto_geocoder());
    let mut bound = binder
        .bind_marker(&attrs(&[("position", "{{vm.where}}")]), scope(), &ObjectRegistry::new())
        .unwrap();
    let marker = provider.created_of(EntityKind::Marker)[0].clone();

    // Initial interpolation text is not a coordinate: placeholder plus fallback.
    assert_eq!(
        marker.options().get("position").and_then(|v| v.as_coordinate()),
        Some(mapbind::Coordinate::ORIGIN)
    );
    bound.deferred.take().unwrap().finish().await;

    let ChangeOutcome::Deferred(dispatch) = bound.notify("position", "Toronto").unwrap() else {
        panic!("textual position should be deferred");
    };
    assert_eq!(dispatch.finish().await, Some(Resolution::Applied(toronto())));

    assert!(bound.notify("position", "[5, 6]").unwrap().is_applied());
    assert_eq!(
        marker.calls("setPosition").last(),
        Some(&OptionValue::Coordinate(coord(5.0, 6.0)))
    );
}

#[tokio::test]
async fn observed_position_of_centered_marker_recenters_map() {
    let (provider, binder) = test_binder(toronto_geocoder());
    let registry = ObjectRegistry::new();
    binder
        .bind_map(&attrs(&[("center", "[0, 0]")]), scope(), &registry)
        .unwrap();
    let mut bound = binder
        .bind_marker(
            &attrs(&[("position", "{{vm.addr}}"), ("centered", "true")]),
            scope(),
            &registry,
        )
        .unwrap();
    bound.deferred.take().unwrap().finish().await;
    let map = provider.created_of(EntityKind::Map)[0].clone();
    let before = map.calls("setCenter").len();

    let ChangeOutcome::Deferred(dispatch) = bound.notify("position", "Toronto").unwrap() else {
        panic!("textual position should be deferred");
    };
    assert_eq!(dispatch.finish().await, Some(Resolution::Applied(toronto())));

    let centers = map.calls("setCenter");
    assert_eq!(centers.len(), before + 1);
    assert_eq!(centers.last(), Some(&OptionValue::Coordinate(toronto())));
}

#[tokio::test]
async fn observed_center_of_centered_circle_recenters_map() {
    let (provider, binder) = test_binder(toronto_geocoder());
    let registry = ObjectRegistry::new();
    binder
        .bind_map(&attrs(&[("center", "[0, 0]")]), scope(), &registry)
        .unwrap();
    let mut bound = binder
        .bind_shape(
            &attrs(&[("name", "circle"), ("center", "{{vm.where}}"), ("centered", "true")]),
            scope(),
            &registry,
        )
        .unwrap();
    bound.deferred.take().unwrap().finish().await;

    let ChangeOutcome::Deferred(dispatch) = bound.notify("center", "Toronto").unwrap() else {
        panic!("textual center should be deferred");
    };
    assert_eq!(dispatch.finish().await, Some(Resolution::Applied(toronto())));

    let map = provider.created_of(EntityKind::Map)[0].clone();
    assert_eq!(
        map.calls("setCenter").last(),
        Some(&OptionValue::Coordinate(toronto()))
    );
}

#[test]
fn empty_change_notifications_are_ignored() {
    let (provider, binder) = test_binder(StaticGeocoder::new());
    let bound = binder
        .bind_marker(
            &attrs(&[("position", "[1, 2]"), ("zoom", "{{vm.zoom}}"), ("title", "{{vm.t}}")]),
            scope(),
            &ObjectRegistry::new(),
        )
        .unwrap();
    let marker = provider.created_of(EntityKind::Marker)[0].clone();

    assert!(matches!(bound.notify("zoom", ""), Some(ChangeOutcome::Ignored)));
    assert!(matches!(bound.notify("title", " "), Some(ChangeOutcome::Ignored)));
    assert!(marker.all_calls().is_empty());
}

#[test]
fn torn_down_repeated_marker_leaves_the_map() {
    let (provider, binder) = test_binder(StaticGeocoder::new());
    let registry = ObjectRegistry::new();
    binder
        .bind_map(&attrs(&[("center", "[0, 0]")]), scope(), &registry)
        .unwrap();

    let mut bound: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|id| {
            binder
                .bind_marker(
                    &attrs(&[("ng-repeat", "p in vm.places"), ("id", id), ("position", "[1, 2]")]),
                    scope(),
                    &registry,
                )
                .unwrap()
        })
        .collect();
    assert_eq!(registry.markers().len(), 2);

    let first = bound.remove(0);
    assert!(first.teardown(&registry));
    let keys: Vec<_> = registry.markers().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["b"]);

    let markers = provider.created_of(EntityKind::Marker);
    assert!(markers[0].map().is_none());
    assert!(markers[1].map().is_some());
}

#[test]
fn repeated_marker_is_not_observed() {
    let (_, binder) = test_binder(StaticGeocoder::new());
    let bound = binder
        .bind_marker(
            &attrs(&[
                ("ng-repeat", "p in vm.places"),
                ("position", "{{p.pos}}"),
                ("title", "{{p.name}}"),
            ]),
            scope(),
            &ObjectRegistry::new(),
        )
        .unwrap();
    assert!(bound.observers.is_empty());
}

#[test]
fn shape_events_fire_into_scope() {
    let scope = std::sync::Arc::new(
        mapbind::testing::TestScope::new().with_value("vm", json!({"id": 42})),
    );
    let (provider, binder) = test_binder(StaticGeocoder::new());
    let bound = binder
        .bind_shape(
            &attrs(&[
                ("name", "polyline"),
                ("path", "[[1,2],[3,4]]"),
                ("on-click", "picked(event, vm.id)"),
                ("on-bogus", "("),
            ]),
            scope.clone(),
            &ObjectRegistry::new(),
        )
        .unwrap();

    assert_eq!(bound.events.errors.len(), 1);
    assert_eq!(provider.listeners(bound.entity.id()).len(), 1);
    provider
        .fire(bound.entity.id(), "click", json!("payload"))
        .unwrap();
    assert_eq!(
        scope.calls(),
        vec![("picked".to_string(), vec![json!("payload"), json!(42)])]
    );
}

#[test]
fn custom_default_zoom() {
    let config = BindingConfig::from_json(r#"{"default_zoom": 4}"#).unwrap();
    let (provider, binder) = test_binder_with_config(StaticGeocoder::new(), config);
    binder
        .bind_map(&attrs(&[("center", "[1,2]")]), scope(), &ObjectRegistry::new())
        .unwrap();
    assert_eq!(
        provider.created_of(EntityKind::Map)[0].options()["zoom"],
        OptionValue::Number(4.0)
    );
}

#[test]
fn unknown_shape_builds_nothing() {
    let (provider, binder) = test_binder(StaticGeocoder::new());
    let registry = ObjectRegistry::new();
    let err = binder
        .bind_shape(&attrs(&[("name", "star")]), scope(), &registry)
        .unwrap_err();
    assert!(err.is_shape_error());
    assert!(matches!(err, BindError::UnknownShape { .. }));
    assert!(provider.created().is_empty());
    assert_eq!(registry.pending_len(), 0);

    let err: mapbind::Error = err.into();
    assert_eq!(err.module(), "binder");
}
