//! Attribute string → typed option value.
//!
//! [`ValueCoercer`] runs an ordered ladder of syntactic rules over a raw
//! attribute string; the first rule that recognizes the text decides the
//! result. The order matters because later shapes are ambiguous with earlier
//! ones:
//!
//! | # | Rule | Example | Result |
//! |---|------|---------|--------|
//! | 1 | [`CoercionRule::Numeric`] | `15` | `Number(15)` |
//! | 2 | [`CoercionRule::JsonLiteral`] | `[40.7, -74.2]`, `{a: 'b'}` | coordinate / list / record / scalar |
//! | 3 | [`CoercionRule::Constructor`] | `LatLng(40.7, -74.2)` | whatever the registered constructor builds |
//! | 4 | [`CoercionRule::DottedEnum`] | `MapTypeId.HYBRID` | `Enum` |
//! | 5 | [`CoercionRule::BareEnum`] | `HYBRID` (key `mapTypeId`) | `Enum` |
//! | - | fallback | `the cn tower` | `Unresolved` |
//!
//! Coercion never fails outward. A rule that recognizes its syntax but cannot
//! produce a value is logged and the raw text is passed through as
//! [`OptionValue::Unresolved`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::attrs::{RawAttributeSet, control_name, is_event_key};
use crate::provider::Namespace;
use crate::value::{OptionValue, Record};

mod errors;
pub mod rules;

pub use errors::CoercionError;
pub use rules::RuleContext;

/// One step of the coercion ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionRule {
    Numeric,
    JsonLiteral,
    Constructor,
    DottedEnum,
    BareEnum,
}

impl CoercionRule {
    /// All rules, in the order they are tried.
    pub const LADDER: [CoercionRule; 5] = [
        CoercionRule::Numeric,
        CoercionRule::JsonLiteral,
        CoercionRule::Constructor,
        CoercionRule::DottedEnum,
        CoercionRule::BareEnum,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CoercionRule::Numeric => "numeric",
            CoercionRule::JsonLiteral => "json",
            CoercionRule::Constructor => "constructor",
            CoercionRule::DottedEnum => "dotted-enum",
            CoercionRule::BareEnum => "bare-enum",
        }
    }

    /// Try this rule alone.
    pub fn apply(
        &self,
        raw: &str,
        ctx: &RuleContext<'_>,
    ) -> Option<Result<OptionValue, CoercionError>> {
        match self {
            CoercionRule::Numeric => rules::numeric(raw, ctx),
            CoercionRule::JsonLiteral => rules::json_literal(raw, ctx),
            CoercionRule::Constructor => rules::constructor(raw, ctx),
            CoercionRule::DottedEnum => rules::dotted_enum(raw, ctx),
            CoercionRule::BareEnum => rules::bare_enum(raw, ctx),
        }
    }
}

/// The outcome of running the ladder, with the rule that decided it.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercion {
    /// `None` when no rule recognized the text.
    pub rule: Option<CoercionRule>,
    pub value: OptionValue,
    /// Set when the deciding rule recognized the syntax but rejected the value.
    pub error: Option<CoercionError>,
}

/// Converts raw attribute strings into typed option values.
///
/// Stateless apart from the provider namespace it was built with: the same
/// raw string and key always coerce to the same value.
#[derive(Debug, Clone)]
pub struct ValueCoercer {
    namespace: Arc<Namespace>,
}

impl ValueCoercer {
    pub fn new(namespace: Arc<Namespace>) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Coerce one raw attribute value for the option `key`.
    pub fn coerce(&self, raw: &str, key: &str) -> OptionValue {
        self.explain(raw, key).value
    }

    /// Coerce and report which rule decided the value.
    pub fn explain(&self, raw: &str, key: &str) -> Coercion {
        let ctx = RuleContext {
            key,
            namespace: &self.namespace,
        };

        for rule in CoercionRule::LADDER {
            match rule.apply(raw, &ctx) {
                None => continue,
                Some(Ok(value)) => {
                    return Coercion {
                        rule: Some(rule),
                        value,
                        error: None,
                    };
                }
                Some(Err(error)) => {
                    warn!(key, raw, rule = rule.name(), "{error}; passing value through");
                    return Coercion {
                        rule: Some(rule),
                        value: OptionValue::Unresolved(raw.to_string()),
                        error: Some(error),
                    };
                }
            }
        }

        Coercion {
            rule: None,
            value: OptionValue::Unresolved(raw.to_string()),
            error: None,
        }
    }

    /// Coerce every plain option attribute into an options record.
    ///
    /// Attribute names are camel-cased first. Event attributes (`onX`),
    /// `<name>ControlOptions` attributes and empty values are skipped; those
    /// are handled by the event synthesizer and the control repairer.
    pub fn options(&self, attrs: &RawAttributeSet) -> Record {
        let mut options = Record::new();
        for (key, raw) in attrs.normalized().iter() {
            if raw.is_empty() || is_event_key(key) || control_name(key).is_some() {
                continue;
            }
            options.insert(key.to_string(), self.coerce(raw, key));
        }
        debug!(?options, "coerced options");
        options
    }
}
