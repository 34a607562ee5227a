//! Event attribute synthesis and handler invocation.

use std::sync::Arc;

use mapbind::events::{self, EvaluationScope, ScopeError};
use mapbind::testing::TestScope;
use serde_json::json;

use crate::helpers::*;

#[test]
fn click_handler_passes_event_then_arguments() {
    let scope = Arc::new(TestScope::new());
    let synthesis =
        events::synthesize(&attrs(&[("onClick", "doThat(event, 1, 2)")]), scope.clone());

    assert!(synthesis.errors.is_empty());
    let handler = synthesis.get("click").expect("click handler");
    handler.invoke(json!("e")).unwrap();

    assert_eq!(
        scope.calls(),
        vec![("doThat".to_string(), vec![json!("e"), json!(1), json!(2)])]
    );
}

#[test]
fn markup_names_map_to_event_ids() {
    let synthesis = events::synthesize(
        &attrs(&[
            ("on-zoom-changed", "zoomed()"),
            ("on-dragend", "dropped()"),
            ("on-bounds-changed", "moved()"),
        ]),
        scope(),
    );
    let ids: Vec<_> = synthesis.bindings.iter().map(|b| b.event.as_str()).collect();
    assert_eq!(ids, vec!["zoom_changed", "dragend", "bounds_changed"]);
}

#[test]
fn arguments_are_read_from_scope_at_bind_time() {
    let scope = Arc::new(
        TestScope::new()
            .with_value("vm", json!({"level": 7, "name": "north"}))
            .with_value("limit", json!(3)),
    );
    let synthesis = events::synthesize(
        &attrs(&[("on-zoom-changed", "zoomed(vm.level, limit, vm.missing, [1, 2])")]),
        scope.clone(),
    );
    let handler = synthesis.get("zoom_changed").expect("handler");
    assert_eq!(handler.function(), "zoomed");
    assert_eq!(
        handler.args(),
        &[json!(7), json!(3), json!(null), json!([1, 2])]
    );
}

#[test]
fn handler_without_event_placeholder_still_receives_payload() {
    let scope = Arc::new(TestScope::new());
    let synthesis = events::synthesize(&attrs(&[("onClick", "ping('a')")]), scope.clone());
    synthesis.get("click").unwrap().invoke(json!({"x": 1})).unwrap();
    assert_eq!(
        scope.calls(),
        vec![("ping".to_string(), vec![json!({"x": 1}), json!("a")])]
    );
}

#[test]
fn malformed_handlers_are_reported_and_skipped() {
    let synthesis = events::synthesize(
        &attrs(&[
            ("onClick", "not a call"),
            ("onDrag", "dragged(1 + 2)"),
            ("onDragend", "dropped(event)"),
        ]),
        scope(),
    );

    assert_eq!(synthesis.bindings.len(), 1);
    assert!(synthesis.get("dragend").is_some());
    assert_eq!(synthesis.errors.len(), 2);
    assert!(synthesis.errors[0].is_syntax_error());
    assert_eq!(synthesis.errors[0].attribute(), "onClick");
    assert!(!synthesis.errors[1].is_syntax_error());
    assert_eq!(synthesis.errors[1].attribute(), "onDrag");
}

#[test]
fn non_event_attributes_are_ignored() {
    let synthesis = events::synthesize(
        &attrs(&[("zoom", "10"), ("one", "x()"), ("onClick", "")]),
        scope(),
    );
    assert!(synthesis.is_empty());
    assert!(synthesis.errors.is_empty());
}

#[test]
fn unknown_scope_function_surfaces_at_invocation() {
    let scope: Arc<dyn EvaluationScope> =
        Arc::new(TestScope::new().with_functions(&["known"]));
    let synthesis = events::synthesize(&attrs(&[("onClick", "unknown()")]), scope);
    let err = synthesis
        .get("click")
        .unwrap()
        .invoke(json!(null))
        .unwrap_err();
    assert_eq!(
        err,
        ScopeError::UnknownFunction {
            function: "unknown".into()
        }
    );
    assert!(err.is_not_found());
}
