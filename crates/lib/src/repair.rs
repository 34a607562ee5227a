//! Quasi-JSON repair.
//!
//! Markup authors write option literals the way they would in a script:
//! `{position: 'TOP_LEFT'}`. This is a minimal regex-driven repair into JSON,
//! not a JSON5 parser:
//!
//! 1. single quotes become double quotes;
//! 2. outside double-quoted strings, every bare key (`word:`) gets quoted.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SEGMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^"]+)|("[^"]*")"#).expect("valid segment pattern"));

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([$\w]+)\s*:").expect("valid key pattern"));

/// Rewrite a loosely quoted literal into JSON syntax.
///
/// Text already inside a double-quoted string is left untouched.
pub fn jsonize(raw: &str) -> String {
    let normalized = raw.replace('\'', "\"");
    SEGMENTS
        .replace_all(&normalized, |caps: &Captures<'_>| match caps.get(1) {
            Some(plain) => BARE_KEY
                .replace_all(plain.as_str(), r#""${1}":"#)
                .into_owned(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Repair and parse. Returns the parse error on failure.
pub fn parse_loose(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(&jsonize(raw))
}
