//! Control option repair through the public API.

use std::sync::Arc;

use mapbind::{
    EnumConstant, OptionValue, Record,
    controls::{ControlOptionRepairer, RepairError},
    provider::Namespace,
};

use crate::helpers::*;

fn repairer() -> ControlOptionRepairer {
    ControlOptionRepairer::new(Arc::new(Namespace::standard()))
}

#[test]
fn position_is_a_control_position_constant() {
    let result = repairer().repair(&attrs(&[("zoomControlOptions", "{position: 'TOP_LEFT'}")]));
    let options = result.get("zoomControl").expect("zoom control options");
    assert_eq!(
        options["position"],
        OptionValue::Enum(EnumConstant::new("ControlPosition", "TOP_LEFT"))
    );
    assert_ne!(options["position"], OptionValue::String("TOP_LEFT".into()));
}

#[test]
fn several_controls_in_one_element() {
    let result = repairer().repair(&attrs(&[
        ("zoom-control", "true"),
        ("zoom-control-options", "{style:'large', position:'left_center'}"),
        (
            "map-type-control-options",
            "{mapTypeIds: ['ROADMAP', 'terrain'], position: 'TOP_CENTER'}",
        ),
        ("scale-control-options", "{style: 'default'}"),
    ]));

    assert!(result.errors.is_empty());
    assert_eq!(result.records.len(), 3);

    let zoom = result.get("zoomControl").unwrap();
    assert_eq!(
        zoom["style"],
        OptionValue::Enum(EnumConstant::new("ZoomControlStyle", "LARGE"))
    );
    assert_eq!(
        zoom["position"],
        OptionValue::Enum(EnumConstant::new("ControlPosition", "LEFT_CENTER"))
    );

    let map_type = result.get("mapTypeControl").unwrap();
    assert_eq!(
        map_type["mapTypeIds"],
        OptionValue::List(vec![
            OptionValue::Enum(EnumConstant::new("MapTypeId", "ROADMAP")),
            OptionValue::Enum(EnumConstant::new("MapTypeId", "TERRAIN")),
        ])
    );

    assert_eq!(
        result.get("scaleControl").unwrap()["style"],
        OptionValue::Enum(EnumConstant::new("ScaleControlStyle", "DEFAULT"))
    );
}

#[test]
fn broken_record_is_reported_with_its_attribute() {
    let result = repairer().repair(&attrs(&[
        ("streetViewControlOptions", "{position: 'TOP_LEFT'"),
        ("panControlOptions", "['TOP_LEFT']"),
        ("zoomControlOptions", "{position: 'RIGHT_TOP'}"),
    ]));

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.errors.len(), 2);
    assert!(matches!(
        &result.errors[0],
        RepairError::ParseFailed { attribute, raw, .. }
            if attribute == "streetViewControlOptions" && raw == "{position: 'TOP_LEFT'"
    ));
    assert!(matches!(
        &result.errors[1],
        RepairError::NotARecord { attribute, .. } if attribute == "panControlOptions"
    ));
}

#[test]
fn merged_under_options_keys() {
    let mut options = Record::new();
    repairer()
        .repair(&attrs(&[("rotate-control-options", "{position: 'BOTTOM_LEFT'}")]))
        .merge_into(&mut options);
    let rotate = options["rotateControlOptions"].as_record().unwrap();
    assert_eq!(
        rotate["position"],
        OptionValue::Enum(EnumConstant::new("ControlPosition", "BOTTOM_LEFT"))
    );
}
