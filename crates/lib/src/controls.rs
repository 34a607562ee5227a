//! Control sub-option repair.
//!
//! `zoom-control-options="{style: 'small', position: 'top_left'}"` is loose
//! quasi-JSON. It is repaired into JSON, parsed, and field-normalized:
//!
//! * `style` resolves through `<ControlName>Style` (`ZoomControlStyle.SMALL`);
//! * `position` resolves through `ControlPosition`;
//! * `mapTypeIds` maps each element through `MapTypeId`;
//! * any other string is upper-cased.
//!
//! A value that fails to parse drops that control's options only.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::attrs::{RawAttributeSet, capitalize, control_name};
use crate::provider::Namespace;
use crate::repair;
use crate::value::{OptionValue, Record};

/// Errors raised while repairing `<name>ControlOptions` attributes.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepairError {
    /// The repaired text is not valid JSON.
    #[error("Invalid options for {attribute}: {raw:?} ({reason})")]
    ParseFailed {
        attribute: String,
        raw: String,
        reason: String,
    },

    /// The text parsed, but not to a record.
    #[error("Options for {attribute} must be a record: {raw:?}")]
    NotARecord { attribute: String, raw: String },
}

impl RepairError {
    pub fn attribute(&self) -> &str {
        match self {
            RepairError::ParseFailed { attribute, .. }
            | RepairError::NotARecord { attribute, .. } => attribute,
        }
    }
}

impl From<RepairError> for crate::Error {
    fn from(err: RepairError) -> Self {
        crate::Error::Repair(err)
    }
}

/// Repaired sub-options of one control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlOptionRecord {
    /// Control name, e.g. `zoomControl`.
    pub control: String,
    pub options: Record,
}

impl ControlOptionRecord {
    /// Key under which the record goes into map options: `zoomControlOptions`.
    pub fn option_key(&self) -> String {
        format!("{}Options", self.control)
    }
}

/// Result of repairing every control-options attribute of an element.
#[derive(Debug, Default, Clone)]
pub struct ControlOptions {
    /// Records in attribute order.
    pub records: Vec<ControlOptionRecord>,
    pub errors: Vec<RepairError>,
}

impl ControlOptions {
    pub fn get(&self, control: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.control == control)
            .map(|r| &r.options)
    }

    /// Merge every record into `options` under its `<name>ControlOptions` key.
    pub fn merge_into(&self, options: &mut Record) {
        for record in &self.records {
            options.insert(record.option_key(), OptionValue::Record(record.options.clone()));
        }
    }
}

/// Repairs `<name>ControlOptions` attributes into structured records.
#[derive(Debug, Clone)]
pub struct ControlOptionRepairer {
    namespace: Arc<Namespace>,
}

impl ControlOptionRepairer {
    pub fn new(namespace: Arc<Namespace>) -> Self {
        Self { namespace }
    }

    /// Repair every control-options attribute. Names are camel-cased first.
    pub fn repair(&self, attrs: &RawAttributeSet) -> ControlOptions {
        let mut result = ControlOptions::default();

        for (key, raw) in attrs.normalized().iter() {
            let Some(control) = control_name(key) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            match self.repair_one(key, control, raw) {
                Ok(options) => {
                    result.records.retain(|r| r.control != control);
                    result.records.push(ControlOptionRecord {
                        control: control.to_string(),
                        options,
                    });
                }
                Err(e) => {
                    warn!("Dropping control options: {e}");
                    result.errors.push(e);
                }
            }
        }

        debug!(controls = ?result.records, "repaired control options");
        result
    }

    fn repair_one(&self, attribute: &str, control: &str, raw: &str) -> Result<Record, RepairError> {
        let parsed = repair::parse_loose(raw).map_err(|e| RepairError::ParseFailed {
            attribute: attribute.to_string(),
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;
        let Value::Object(fields) = parsed else {
            return Err(RepairError::NotARecord {
                attribute: attribute.to_string(),
                raw: raw.to_string(),
            });
        };

        let style_enum = format!("{}Style", capitalize(control));
        let mut options = Record::new();
        for (field, value) in fields {
            let normalized = match (field.as_str(), value) {
                ("style", Value::String(s)) => self.constant(&style_enum, &s),
                ("position", Value::String(s)) => self.constant("ControlPosition", &s),
                ("mapTypeIds", Value::Array(ids)) => OptionValue::List(
                    ids.into_iter()
                        .filter_map(|id| match id {
                            Value::String(s) => Some(self.constant("MapTypeId", &s)),
                            other => OptionValue::from_json(other),
                        })
                        .collect(),
                ),
                (_, Value::String(s)) => OptionValue::String(s.to_uppercase()),
                (_, other) => match OptionValue::from_json(other) {
                    Some(v) => v,
                    None => continue,
                },
            };
            options.insert(field, normalized);
        }
        Ok(options)
    }

    /// Resolve an enum literal, upper-cased. Unknown constants pass through
    /// as `Unresolved` text.
    fn constant(&self, namespace: &str, literal: &str) -> OptionValue {
        let name = literal.to_uppercase();
        match self.namespace.lookup(namespace, &name) {
            Ok(constant) => OptionValue::Enum(constant),
            Err(e) => {
                warn!("Control option constant not resolved: {e}");
                OptionValue::Unresolved(name)
            }
        }
    }
}
