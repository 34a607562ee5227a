//! The individual coercion rules, in precedence order.
//!
//! Each rule returns:
//! * `None` when the raw text is not its syntax (try the next rule);
//! * `Some(Ok(value))` when it produced a value;
//! * `Some(Err(e))` when the syntax is recognized but the value is invalid.
//!   The ladder stops there and the value degrades to `Unresolved`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::CoercionError;
use crate::attrs::capitalize;
use crate::provider::Namespace;
use crate::repair;
use crate::value::{Coordinate, OptionValue, json_number};

pub(crate) type RuleResult = Option<Result<OptionValue, CoercionError>>;

/// Inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Camel-cased option key the value is for.
    pub key: &'a str,
    pub namespace: &'a Namespace,
}

static CONSTRUCTOR_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-zA-Z0-9]+)\((.*)\)$").expect("valid constructor pattern")
});

static DOTTED_ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-zA-Z0-9]+)\.([A-Z][A-Z0-9_]*)$").expect("valid dotted enum pattern")
});

static BARE_ENUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid bare enum pattern"));

/// 1. The whole string is a finite number.
pub fn numeric(raw: &str, _ctx: &RuleContext<'_>) -> RuleResult {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| Ok(OptionValue::Number(n)))
}

/// 2. A JSON-like literal after quote/key repair.
///
/// Lists are inspected by their first element: records pass through as a
/// list, nested lists are a coordinate list, and a numeric first element
/// makes the whole list one coordinate.
pub fn json_literal(raw: &str, _ctx: &RuleContext<'_>) -> RuleResult {
    let parsed = repair::parse_loose(raw).ok()?;
    match parsed {
        Value::Null => None,
        Value::Array(items) => list_literal(raw, items),
        other => OptionValue::from_json(other).map(Ok),
    }
}

fn list_literal(raw: &str, items: Vec<Value>) -> RuleResult {
    let first = items.first()?;
    let invalid = || CoercionError::InvalidCoordinate {
        raw: raw.to_string(),
    };

    if first.is_array() {
        let coordinates = items
            .iter()
            .map(|item| item.as_array().and_then(|pair| Coordinate::from_json_pair(pair)))
            .collect::<Option<Vec<_>>>();
        return Some(coordinates.map(OptionValue::CoordinateList).ok_or_else(invalid));
    }

    if !first.is_object() && json_number(first).is_some() {
        return Some(
            Coordinate::from_json_pair(&items)
                .map(OptionValue::Coordinate)
                .ok_or_else(invalid),
        );
    }

    OptionValue::from_json(Value::Array(items)).map(Ok)
}

/// 3. `Identifier(args)` naming a constructor in the provider namespace.
///
/// Identifiers that are not registered are rejected without looking at the
/// arguments; nothing is ever evaluated.
pub fn constructor(raw: &str, ctx: &RuleContext<'_>) -> RuleResult {
    let caps = CONSTRUCTOR_CALL.captures(raw.trim())?;
    let name = &caps[1];
    let args = &caps[2];

    if !ctx.namespace.has_constructor(name) {
        return Some(Err(CoercionError::ConstructorRejected {
            name: name.to_string(),
        }));
    }

    let args = match repair::parse_loose(&format!("[{args}]")) {
        Ok(Value::Array(args)) => args,
        _ => {
            return Some(Err(CoercionError::NonLiteralArguments {
                name: name.to_string(),
                args: args.to_string(),
            }));
        }
    };

    Some(
        ctx.namespace
            .construct(name, &args)
            .map_err(|source| CoercionError::ConstructorFailed {
                name: name.to_string(),
                source,
            }),
    )
}

/// 4. `Namespace.CONSTANT`.
pub fn dotted_enum(raw: &str, ctx: &RuleContext<'_>) -> RuleResult {
    let caps = DOTTED_ENUM.captures(raw.trim())?;
    Some(enum_constant(ctx.namespace, &caps[1], &caps[2]))
}

/// 5. A bare `CONSTANT`, looked up in the namespace named after the key
/// (`mapTypeId` → `MapTypeId`).
pub fn bare_enum(raw: &str, ctx: &RuleContext<'_>) -> RuleResult {
    let token = raw.trim();
    if !BARE_ENUM.is_match(token) {
        return None;
    }
    Some(enum_constant(ctx.namespace, &capitalize(ctx.key), token))
}

fn enum_constant(
    namespace: &Namespace,
    enum_name: &str,
    constant: &str,
) -> Result<OptionValue, CoercionError> {
    namespace
        .lookup(enum_name, constant)
        .map(OptionValue::Enum)
        .map_err(|_| CoercionError::UnknownEnumConstant {
            namespace: enum_name.to_string(),
            name: constant.to_string(),
        })
}
