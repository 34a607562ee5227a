//! Event attributes → bound handlers.
//!
//! An attribute such as `on-zoom-changed="zoomed(event, vm.level, 2)"`
//! becomes the event id `zoom_changed` and a handler that, when the provider
//! fires the event with payload `e`, calls `zoomed(e, <vm.level>, 2)` on the
//! evaluation scope.
//!
//! Arguments are evaluated once, at bind time. A leading `event` argument is
//! a placeholder for the payload supplied at invocation.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::attrs::{RawAttributeSet, is_event_key};
use crate::repair;

mod errors;

pub use errors::{EventError, ScopeError};

/// The host's evaluation context: values to read and functions to call.
pub trait EvaluationScope: Send + Sync {
    /// Resolve an identifier path such as `vm.level`. `None` means undefined.
    fn resolve(&self, path: &str) -> Option<Value>;

    /// Call the named function with fully evaluated arguments.
    fn call(&self, function: &str, args: &[Value]) -> Result<(), ScopeError>;
}

/// A callable handler with its arguments captured at bind time.
#[derive(Clone)]
pub struct EventHandler {
    function: String,
    args: Vec<Value>,
    scope: Arc<dyn EvaluationScope>,
}

impl EventHandler {
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The fixed arguments passed after the event payload.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Fire the handler: calls `function(event, ...args)` on the scope.
    pub fn invoke(&self, event: Value) -> Result<(), ScopeError> {
        let mut call_args = Vec::with_capacity(self.args.len() + 1);
        call_args.push(event);
        call_args.extend(self.args.iter().cloned());
        self.scope.call(&self.function, &call_args)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("function", &self.function)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// An event id paired with its handler.
#[derive(Debug, Clone)]
pub struct EventBinding {
    /// Lowercase, underscore-separated provider event name, e.g. `zoom_changed`.
    pub event: String,
    pub handler: EventHandler,
}

/// Result of binding all event attributes of one element.
#[derive(Debug, Default)]
pub struct EventSynthesis {
    /// Bindings in attribute order.
    pub bindings: Vec<EventBinding>,
    /// Attributes that could not be bound.
    pub errors: Vec<EventError>,
}

impl EventSynthesis {
    pub fn get(&self, event: &str) -> Option<&EventHandler> {
        self.bindings
            .iter()
            .find(|b| b.event == event)
            .map(|b| &b.handler)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*\((.*)\)\s*$")
        .expect("valid call pattern")
});

static IDENT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").expect("valid identifier pattern")
});

/// Event id for an `on*` key: `onZoomChanged` → `zoom_changed`.
pub fn event_id(key: &str) -> String {
    let name = key.strip_prefix("on").unwrap_or(key);
    let mut id = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                id.push('_');
            }
            id.extend(c.to_lowercase());
        } else {
            id.push(c);
        }
    }
    id
}

/// Bind every `on*` attribute of an element to `scope`.
///
/// Attribute names are camel-cased first. A malformed attribute is reported
/// in [`EventSynthesis::errors`] and skipped; a later attribute producing the
/// same event id replaces the earlier binding.
pub fn synthesize(attrs: &RawAttributeSet, scope: Arc<dyn EvaluationScope>) -> EventSynthesis {
    let mut synthesis = EventSynthesis::default();

    for (key, value) in attrs.normalized().iter() {
        if value.is_empty() || !is_event_key(key) {
            continue;
        }
        match bind(key, value, &scope) {
            Ok(binding) => {
                synthesis.bindings.retain(|b| b.event != binding.event);
                synthesis.bindings.push(binding);
            }
            Err(e) => {
                warn!("Skipping event attribute: {e}");
                synthesis.errors.push(e);
            }
        }
    }

    debug!(
        events = ?synthesis.bindings.iter().map(|b| b.event.as_str()).collect::<Vec<_>>(),
        "bound events"
    );
    synthesis
}

/// Bind a single event attribute.
pub fn bind(
    key: &str,
    value: &str,
    scope: &Arc<dyn EvaluationScope>,
) -> Result<EventBinding, EventError> {
    let malformed = || EventError::MalformedCall {
        attribute: key.to_string(),
        value: value.to_string(),
    };

    let caps = CALL.captures(value).ok_or_else(malformed)?;
    let function = caps[1].to_string();
    let mut exprs = split_args(&caps[2]).ok_or_else(malformed)?;

    if exprs.first().is_some_and(|first| first == "event") {
        exprs.remove(0);
    }

    let args = exprs
        .iter()
        .map(|expr| evaluate(key, expr, scope.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventBinding {
        event: event_id(key),
        handler: EventHandler {
            function,
            args,
            scope: Arc::clone(scope),
        },
    })
}

/// Evaluate one argument: a literal, or an identifier path read from the scope.
fn evaluate(attribute: &str, expr: &str, scope: &dyn EvaluationScope) -> Result<Value, EventError> {
    if let Ok(literal) = repair::parse_loose(expr) {
        return Ok(literal);
    }
    if IDENT_PATH.is_match(expr) {
        return Ok(scope.resolve(expr).unwrap_or_else(|| {
            debug!(attribute, expr, "argument is undefined in scope");
            Value::Null
        }));
    }
    Err(EventError::UnsupportedArgument {
        attribute: attribute.to_string(),
        expression: expr.to_string(),
    })
}

/// Split an argument list on top-level commas.
///
/// Commas inside quotes, brackets, braces or parentheses do not split.
/// Returns `None` for unbalanced input or an empty argument.
fn split_args(list: &str) -> Option<Vec<String>> {
    if list.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;

    for c in list.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '[' | '{' | '(' => {
                    depth += 1;
                    current.push(c);
                }
                ']' | '}' | ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return None;
                    }
                    current.push(c);
                }
                ',' if depth == 0 => {
                    args.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }

    if quote.is_some() || depth != 0 {
        return None;
    }
    args.push(current);

    let args: Vec<String> = args.into_iter().map(|a| a.trim().to_string()).collect();
    if args.iter().any(String::is_empty) {
        return None;
    }
    Some(args)
}
