use serde::{Deserialize, Serialize};

/// The resource kinds managed by the catalog. The lowercase form doubles as
/// the state file stem (`<stateDir>/<kind>.yaml`) and the config filename
/// prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Kind {
    Component,
    Metric,
    Scorecard,
    MetricSource,
}

impl Kind {
    /// Every kind, in apply order: metrics before scorecards (criteria
    /// reference metric IDs) and components last.
    pub const ALL: [Self; 4] = [Self::Metric, Self::Scorecard, Self::Component, Self::MetricSource];

    /// The filename stem used for both state files and config globbing.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Metric => "metric",
            Self::Scorecard => "scorecard",
            Self::MetricSource => "metricsource",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn test_file_stem_matches_display() {
        for kind in [Kind::Component, Kind::Metric, Kind::Scorecard, Kind::MetricSource] {
            assert_eq!(kind.file_stem(), kind.to_string());
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Kind::from_str("Component").unwrap(), Kind::Component);
        assert_eq!(Kind::from_str("metricsource").unwrap(), Kind::MetricSource);
        assert!(Kind::from_str("widget").is_err());
    }
}
