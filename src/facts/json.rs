//! JSON navigation helpers shared by the fact collectors: dot-path lookup
//! over a decoded document, TOML transcoding, and the expected-value /
//! expected-formula comparison.

use crate::Result;
use crate::facts::eval;
use ohno::{IntoAppError, bail};
use regex::Regex;
use serde_json::Value;

/// Navigate a dot path like `package.version` or `deps.0.name` through a
/// JSON value. A leading `.` is tolerated. Array segments are decimal
/// indices. A missing segment is an error.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Result<&'a Value> {
    let mut current = value;
    for segment in path.trim_start_matches('.').split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(v) => v,
                None => bail!("path segment '{segment}' does not exist"),
            },
            Value::Array(items) => {
                let index = segment.parse::<usize>().into_app_err_with(|| format!("invalid array index '{segment}'"))?;
                match items.get(index) {
                    Some(v) => v,
                    None => bail!("array index {index} out of bounds"),
                }
            }
            _ => bail!("path segment '{segment}' applied to a scalar"),
        };
    }

    Ok(current)
}

/// Render an extracted value the way it is compared: strings bare, other
/// scalars in their JSON form.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Transcode TOML text to a JSON value so one lookup path works for both.
pub fn toml_to_json(content: &str) -> Result<Value> {
    let value: toml::Value = toml::from_str(content).into_app_err("Failed to parse TOML content")?;
    serde_json::to_value(value).into_app_err("Failed to transcode TOML to JSON")
}

/// Compare an extracted value against a fact's expectation: a non-empty
/// formula wins, otherwise the expected value is a regex. Neither set is
/// an error.
pub fn compare_extracted(value: &str, expected_value: &str, expected_formula: &str) -> Result<bool> {
    if expected_value.is_empty() && expected_formula.is_empty() {
        bail!("expected value or formula not provided");
    }

    if !expected_formula.is_empty() {
        return eval::expression(&format!("{value} {expected_formula}"));
    }

    let pattern = Regex::new(expected_value).into_app_err_with(|| format!("invalid expected value pattern '{expected_value}'"))?;
    Ok(pattern.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_object_path() {
        let doc = json!({ "package": { "version": "1.2.3" } });
        let v = lookup(&doc, "package.version").unwrap();
        assert_eq!(value_to_string(v), "1.2.3");
    }

    #[test]
    fn test_lookup_tolerates_leading_dot() {
        let doc = json!({ "a": { "b": 2 } });
        assert_eq!(value_to_string(lookup(&doc, ".a.b").unwrap()), "2");
    }

    #[test]
    fn test_lookup_array_index() {
        let doc = json!({ "deps": [ { "name": "serde" }, { "name": "tokio" } ] });
        assert_eq!(value_to_string(lookup(&doc, "deps.1.name").unwrap()), "tokio");
    }

    #[test]
    fn test_lookup_missing_segment_errors() {
        let doc = json!({ "a": 1 });
        assert!(lookup(&doc, "b").is_err());
        assert!(lookup(&doc, "a.b").is_err());
    }

    #[test]
    fn test_toml_to_json() {
        let doc = toml_to_json("[package]\nname = \"demo\"\nversion = \"0.1.0\"\n").unwrap();
        assert_eq!(value_to_string(lookup(&doc, "package.name").unwrap()), "demo");
    }

    #[test]
    fn test_compare_formula_wins_over_value() {
        assert!(compare_extracted("0.9", "nope", "> 0.5").unwrap());
    }

    #[test]
    fn test_compare_expected_value_is_a_regex() {
        assert!(compare_extracted("v1.2.3", r"^v\d+", "").unwrap());
        assert!(!compare_extracted("main", r"^v\d+", "").unwrap());
    }

    #[test]
    fn test_compare_requires_an_expectation() {
        assert!(compare_extracted("x", "", "").is_err());
    }
}
