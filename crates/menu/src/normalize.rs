//! Raw payload -> `MenuForest`.
//!
//! Accepts the canonical `{ mainNavigation, profileSection, config }` shape
//! and the legacy bare-array shape. Badge encodings are recovered locally and
//! never fail the payload. Normalizing an already-normalized forest (after
//! serializing it back to JSON) yields the same forest.

use serde_json::{Number, Value};

use navshell_core::{NavError, NavResult};

use crate::model::{Badge, MenuConfig, MenuForest, MenuNode};

/// Convert an untrusted menu payload into the canonical forest.
pub fn normalize_payload(raw: Value) -> NavResult<MenuForest> {
    match raw {
        Value::Array(_) => {
            let main_navigation: Vec<MenuNode> = serde_json::from_value(raw)
                .map_err(|e| NavError::malformed(format!("legacy menu array: {e}")))?;
            tracing::debug!(nodes = main_navigation.len(), "normalized legacy menu payload");
            Ok(MenuForest {
                main_navigation,
                profile_section: None,
                config: MenuConfig::default(),
            })
        }
        Value::Object(_) => {
            let forest: MenuForest = serde_json::from_value(raw)
                .map_err(|e| NavError::malformed(format!("menu payload: {e}")))?;
            tracing::debug!(
                nodes = forest.main_navigation.len(),
                version = forest.version().map(|v| v.as_str()),
                "normalized menu payload"
            );
            Ok(forest)
        }
        other => Err(NavError::malformed(format!(
            "expected an object or array, got {}",
            json_type(&other)
        ))),
    }
}

/// Collapse any raw badge encoding into a `Badge`.
///
/// - strings are trimmed; blank or quoted-empty strings are `None`
/// - strings starting with `{`/`[` are parsed as JSON, falling back to the
///   raw text when they do not describe a count
/// - numeric strings become counts, other strings stay as text
/// - non-string values are used as-is when they describe a count, else `None`
pub fn normalize_badge(raw: &Value) -> Badge {
    match raw {
        Value::String(s) => normalize_badge_text(s),
        Value::Null | Value::Bool(_) => Badge::None,
        other => structured_badge(other).unwrap_or(Badge::None),
    }
}

fn normalize_badge_text(s: &str) -> Badge {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "\"\"" || trimmed == "''" {
        return Badge::None;
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str::<Value>(trimmed)
            .ok()
            .and_then(|parsed| structured_badge(&parsed))
            .unwrap_or_else(|| Badge::Text(trimmed.to_string()));
    }

    match trimmed.parse::<i64>() {
        Ok(count) => Badge::Count(count),
        Err(_) => Badge::Text(trimmed.to_string()),
    }
}

/// Interpret already-structured JSON as a badge, if it describes one.
fn structured_badge(value: &Value) -> Option<Badge> {
    match value {
        Value::Number(n) => count_from_number(n).map(Badge::Count),
        Value::Object(map) => {
            let count = map.get("count").and_then(count_from_value)?;
            let color = map
                .get("color")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|c| !c.is_empty());

            Some(match color {
                Some(color) => Badge::Labeled {
                    count,
                    color: color.to_string(),
                },
                None => Badge::Count(count),
            })
        }
        Value::Array(items) => match items.first() {
            None => Some(Badge::None),
            Some(first) => structured_badge(first),
        },
        _ => None,
    }
}

fn count_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => count_from_number(n),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn count_from_number(n: &Number) -> Option<i64> {
    n.as_i64()
        .or_else(|| n.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
        .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
