//! Buffer-then-flush attachment of markers and shapes.

use mapbind::{
    ObjectRegistry, OptionValue, Record,
    provider::{Entity, EntityKind},
    registry::Placement,
    testing::RecordingEntity,
};

use crate::helpers::*;

#[test]
fn flush_attaches_buffered_markers_in_creation_order() {
    let registry = ObjectRegistry::new();
    let m1 = RecordingEntity::new(EntityKind::Marker);
    let m2 = RecordingEntity::new(EntityKind::Marker);
    registry.add_marker(m1.clone());
    registry.add_marker(m2.clone());
    assert_eq!(registry.pending_len(), 2);
    assert!(registry.markers().is_empty());

    let map = RecordingEntity::new(EntityKind::Map);
    registry.flush(map.clone()).unwrap();

    let attached: Vec<_> = registry.markers().iter().map(|(_, e)| e.id()).collect();
    assert_eq!(attached, vec![m1.id(), m2.id()]);
    for marker in [&m1, &m2] {
        assert_eq!(marker.map().map(|m| m.id()), Some(map.id()));
    }

    let m3 = RecordingEntity::new(EntityKind::Marker);
    assert!(matches!(
        registry.add_marker(m3.clone()),
        Placement::Attached { .. }
    ));
    assert_eq!(m1.attach_count(), 1);
    assert_eq!(m2.attach_count(), 1);
    assert_eq!(m3.attach_count(), 1);
    assert_eq!(registry.markers().len(), 3);
}

#[test]
fn mixed_objects_keep_their_own_order() {
    let registry = ObjectRegistry::new();
    let circle = RecordingEntity::new(EntityKind::Circle);
    let marker = RecordingEntity::new(EntityKind::Marker);
    let polyline = RecordingEntity::new(EntityKind::Polyline);
    for object in [circle.clone(), marker.clone(), polyline.clone()] {
        registry.add_object(object).unwrap();
    }

    let keys = registry
        .flush(RecordingEntity::new(EntityKind::Map))
        .unwrap();
    assert_eq!(keys, vec!["0", "0", "1"]);

    let shapes: Vec<_> = registry.shapes().iter().map(|(_, e)| e.id()).collect();
    assert_eq!(shapes, vec![circle.id(), polyline.id()]);
    assert_eq!(registry.marker("0").map(|e| e.id()), Some(marker.id()));
}

#[test]
fn explicit_id_and_centering() {
    let registry = ObjectRegistry::new();
    let map = RecordingEntity::new(EntityKind::Map);
    registry.flush(map.clone()).unwrap();

    let mut options = Record::new();
    options.insert("id".into(), OptionValue::String("hq".into()));
    options.insert("centered".into(), OptionValue::Boolean(true));
    options.insert("position".into(), OptionValue::Coordinate(toronto()));
    let marker = RecordingEntity::with_options(EntityKind::Marker, options);

    assert_eq!(
        registry.add_marker(marker.clone()),
        Placement::Attached { key: "hq".into() }
    );
    assert_eq!(registry.marker("hq").map(|e| e.id()), Some(marker.id()));
    assert_eq!(map.calls("setCenter"), vec![OptionValue::Coordinate(toronto())]);
}

#[test]
fn second_flush_is_rejected() {
    let registry = ObjectRegistry::new();
    let first = RecordingEntity::new(EntityKind::Map);
    registry.flush(first.clone()).unwrap();
    assert!(registry.flush(RecordingEntity::new(EntityKind::Map)).is_err());
    assert_eq!(registry.map().map(|m| m.id()), Some(first.id()));
}
