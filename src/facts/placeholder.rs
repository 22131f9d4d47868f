//! `${...}` placeholder substitution over fact fields at bind time.
//!
//! Supported names: `component.name`, `component.slug`, `component.type`,
//! `component.tribe`, `component.squad`, and `component.labels.<label>`.
//! An unknown name is an error so typos fail at bind time rather than
//! producing silently wrong facts.

use crate::Result;
use crate::model::Component;
use ohno::bail;
use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap_or_else(|e| panic!("invalid regex: {e}")));

/// Substitute every `${...}` placeholder in `input` with the matching
/// component property.
pub fn substitute(input: &str, component: &Component) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for captures in PLACEHOLDER.captures_iter(input) {
        let whole = captures.get(0).unwrap_or_else(|| unreachable!("capture 0 always exists"));
        let name = captures.get(1).map_or("", |m| m.as_str());

        output.push_str(&input[last..whole.start()]);
        output.push_str(&resolve(name, component)?);
        last = whole.end();
    }

    output.push_str(&input[last..]);
    Ok(output)
}

fn resolve(name: &str, component: &Component) -> Result<String> {
    if let Some(label) = name.strip_prefix("component.labels.") {
        return resolve_label(label, component);
    }

    Ok(match name {
        "component.name" => component.spec.name.clone(),
        "component.slug" => component.spec.slug.clone(),
        "component.type" => component.metadata.component_type.clone(),
        "component.tribe" => component.spec.tribe.clone(),
        "component.squad" => component.spec.squad.clone(),
        _ => bail!("unknown placeholder '${{{name}}}'"),
    })
}

/// Labels of the form `key:value` resolve to their value; a bare label
/// resolves to itself.
fn resolve_label(label: &str, component: &Component) -> Result<String> {
    for entry in &component.spec.labels {
        if entry == label {
            return Ok(entry.clone());
        }

        if let Some(value) = entry.strip_prefix(label).and_then(|rest| rest.strip_prefix(':')) {
            return Ok(value.to_owned());
        }
    }

    bail!("component '{}' has no label '{label}'", component.spec.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component() -> Component {
        let mut c = Component::default();
        c.metadata.component_type = "service".to_owned();
        c.spec.name = "api".to_owned();
        c.spec.slug = "svc-api".to_owned();
        c.spec.tribe = "platform".to_owned();
        c.spec.squad = "core".to_owned();
        c.spec.labels = vec!["tier:1".to_owned(), "critical".to_owned()];
        c
    }

    #[test]
    fn test_substitutes_basic_properties() {
        let out = substitute("https://metrics.example.com/${component.slug}?name=${component.name}", &component()).unwrap();
        assert_eq!(out, "https://metrics.example.com/svc-api?name=api");
    }

    #[test]
    fn test_substitutes_type_tribe_squad() {
        let out = substitute("${component.type}/${component.tribe}/${component.squad}", &component()).unwrap();
        assert_eq!(out, "service/platform/core");
    }

    #[test]
    fn test_label_value_resolution() {
        assert_eq!(substitute("${component.labels.tier}", &component()).unwrap(), "1");
        assert_eq!(substitute("${component.labels.critical}", &component()).unwrap(), "critical");
    }

    #[test]
    fn test_missing_label_is_an_error() {
        assert!(substitute("${component.labels.owner}", &component()).is_err());
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        assert!(substitute("${component.color}", &component()).is_err());
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        assert_eq!(substitute("plain text", &component()).unwrap(), "plain text");
    }
}
