//! Raw markup attributes and key normalization.
//!
//! The markup layer hands over attribute names in markup casing
//! (`stroke-color`, `on-zoom-changed`) with string values. Everything past
//! this module speaks in camel-cased [`OptionKey`]s.

use std::sync::LazyLock;

use regex::Regex;

/// A camel-cased attribute name, e.g. `strokeColor`.
pub type OptionKey = String;

static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:\-_]+(.)").expect("valid separator pattern"));

/// Camel-case a markup attribute name.
///
/// Every run of `:`, `-` or `_` followed by a character is replaced by that
/// character upper-cased, except at the very start of the name where the
/// character is kept as-is.
pub fn camel_case(name: &str) -> OptionKey {
    SPECIAL_CHARS
        .replace_all(name, |caps: &regex::Captures<'_>| {
            let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
            let letter = &caps[1];
            if whole == 0 {
                letter.to_string()
            } else {
                letter.to_uppercase()
            }
        })
        .into_owned()
}

/// Upper-case the first character: `mapTypeId` → `MapTypeId`.
pub fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Setter method name for an option key: `center` → `setCenter`.
pub fn setter_name(key: &str) -> String {
    format!("set{}", capitalize(key))
}

/// True for event attributes, `on` followed by an uppercase letter.
pub fn is_event_key(key: &str) -> bool {
    key.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Control name for a `<name>ControlOptions` key: `zoomControlOptions` → `zoomControl`.
pub fn control_name(key: &str) -> Option<&str> {
    key.strip_suffix("Options")
        .filter(|name| name.len() > "Control".len() && name.ends_with("Control"))
}

/// An ordered snapshot of one element's attributes.
///
/// Insertion order is kept; inserting an existing name replaces its value in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttributeSet {
    entries: Vec<(String, String)>,
}

impl RawAttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop framework-internal attributes (names starting with `$`) and
    /// camel-case the remaining names.
    ///
    /// When two markup names normalize to the same key, the later one wins.
    pub fn normalized(&self) -> RawAttributeSet {
        let mut out = RawAttributeSet::new();
        for (name, value) in self.iter() {
            if name.starts_with('$') {
                continue;
            }
            out.insert(camel_case(name), value);
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawAttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = RawAttributeSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}
