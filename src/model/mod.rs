//! Resource model: the YAML document kinds managed by the catalog and their
//! shared building blocks (facts, links, documents, slugs).

mod component;
mod fact;
mod kind;
mod metric;
mod metric_source;
mod scorecard;

pub use component::{Component, ComponentMetadata, ComponentMetricSource, ComponentSpec, Document, Link};
pub use fact::{Fact, FactAuth, FactOperations, FactSource, FactType};
pub use kind::Kind;
pub use metric::{Metric, MetricFormat, MetricMetadata, MetricSpec};
pub use metric_source::{MetricSource, MetricSourceMetadata, MetricSourceSpec, STATUS_ACTIVE, STATUS_INACTIVE};
pub use scorecard::{Criterion, HasMetricValue, Scorecard, ScorecardMetadata, ScorecardSpec};

/// Compute the stable slug for a component from its name and type.
///
/// The slug is a pure function of `(name, type)` and must never change across
/// runs: it is the reference the remote catalog is queried by when an ID is
/// missing. Types are matched case-insensitively; unrecognized types map to
/// the `unknown` prefix.
#[must_use]
pub fn slug(name: &str, component_type: &str) -> String {
    let short = match component_type.to_ascii_lowercase().as_str() {
        "service" => "svc",
        "cloud-resource" => "cr",
        "website" => "web",
        "application" => "app",
        _ => "unknown",
    };
    format!("{short}-{name}")
}

/// Compound name of a metric source: `"{metric}-{component slug}"`.
#[must_use]
pub fn metric_source_name(metric_name: &str, component_name: &str, component_type: &str) -> String {
    format!("{metric_name}-{}", slug(component_name, component_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_known_types() {
        assert_eq!(slug("foo", "service"), "svc-foo");
        assert_eq!(slug("bar", "cloud-resource"), "cr-bar");
        assert_eq!(slug("site", "website"), "web-site");
        assert_eq!(slug("tool", "application"), "app-tool");
    }

    #[test]
    fn test_slug_unknown_type() {
        assert_eq!(slug("foo", "satellite"), "unknown-foo");
        assert_eq!(slug("foo", ""), "unknown-foo");
    }

    #[test]
    fn test_slug_case_insensitive_on_type() {
        assert_eq!(slug("foo", "Service"), "svc-foo");
        assert_eq!(slug("foo", "CLOUD-RESOURCE"), "cr-foo");
    }

    #[test]
    fn test_slug_is_pure() {
        assert_eq!(slug("api", "service"), slug("api", "service"));
    }

    #[test]
    fn test_metric_source_name() {
        assert_eq!(metric_source_name("coverage", "api", "service"), "coverage-svc-api");
    }
}
