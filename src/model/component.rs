use crate::model::FactOperations;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A catalog component as declared in config or recorded in state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Component {
    pub api_version: String,
    pub kind: String,
    pub metadata: ComponentMetadata,
    pub spec: ComponentSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentMetadata {
    pub name: String,
    pub component_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentSpec {
    pub id: Option<String>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub config_version: i64,
    pub type_id: String,
    pub owner_id: String,
    pub tribe: String,
    pub squad: String,
    pub depends_on: Vec<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub links: Vec<Link>,
    pub documents: Vec<Document>,
    pub labels: Vec<String>,
    pub metric_sources: BTreeMap<String, ComponentMetricSource>,
}

/// A metric source bound to a component, as recorded in component state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentMetricSource {
    pub id: String,
    pub name: String,
    pub metric: String,
    pub facts: FactOperations,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Link {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub documentation_category_id: String,
    pub url: String,
}

impl Component {
    #[must_use]
    pub fn unique_key(&self) -> &str {
        &self.spec.name
    }

    /// Desired-state equality for drift detection. Remote identifiers,
    /// metric sources, and documents are excluded: identifiers are copied
    /// from state before comparison, and the nested collections run their
    /// own drift inside the update path.
    #[must_use]
    pub fn same_desired(a: &Self, b: &Self) -> bool {
        a.spec.name == b.spec.name
            && a.spec.description == b.spec.description
            && a.spec.config_version == b.spec.config_version
            && a.spec.type_id == b.spec.type_id
            && a.spec.owner_id == b.spec.owner_id
            && a.spec.labels == b.spec.labels
            && a.spec.depends_on == b.spec.depends_on
            && a.spec.fields == b.spec.fields
            && Link::same_set(&a.spec.links, &b.spec.links)
    }
}

impl Link {
    /// Content key: what makes two links "the same link" regardless of
    /// remote ID.
    #[must_use]
    pub fn content_key(&self) -> (&str, &str, &str) {
        (&self.link_type, &self.name, &self.url)
    }

    /// Equality by content key, ignoring remote IDs.
    #[must_use]
    pub fn same_set(a: &[Self], b: &[Self]) -> bool {
        if a.len() != b.len() {
            return false;
        }

        let keys: std::collections::BTreeSet<_> = a.iter().map(Self::content_key).collect();
        b.iter().all(|link| keys.contains(&link.content_key()))
    }

    /// Collapse duplicates by content key and order deterministically.
    ///
    /// When duplicates collide, a link carrying a remote ID wins over an
    /// ID-less one; among ID-less duplicates the last one wins. The result
    /// is sorted by type, then name, then URL.
    #[must_use]
    pub fn unique_and_sort(links: Vec<Self>) -> Vec<Self> {
        let mut unique: BTreeMap<(String, String, String), Self> = BTreeMap::new();
        for link in links {
            let key = (link.link_type.clone(), link.name.clone(), link.url.clone());
            match unique.get(&key) {
                Some(existing) if !existing.id.is_empty() && link.id.is_empty() => {}
                _ => {
                    let _ = unique.insert(key, link);
                }
            }
        }

        unique.into_values().collect()
    }
}

impl Document {
    /// Content key for dedupe: title, URL, and type.
    #[must_use]
    pub fn content_key(&self) -> (&str, &str, &str) {
        (&self.title, &self.url, &self.doc_type)
    }

    /// Collapse duplicates by content key and sort by title. ID-bearing
    /// duplicates win so a remote identifier is never dropped.
    #[must_use]
    pub fn unique_and_sort(documents: Vec<Self>) -> Vec<Self> {
        let mut unique: BTreeMap<(String, String, String), Self> = BTreeMap::new();
        for doc in documents {
            let key = (doc.title.clone(), doc.url.clone(), doc.doc_type.clone());
            match unique.get(&key) {
                Some(existing) if !existing.id.is_empty() && doc.id.is_empty() => {}
                _ => {
                    let _ = unique.insert(key, doc);
                }
            }
        }

        let mut result: Vec<_> = unique.into_values().collect();
        result.sort_by(|a, b| a.title.cmp(&b.title));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, name: &str, link_type: &str, url: &str) -> Link {
        Link {
            id: id.to_owned(),
            name: name.to_owned(),
            link_type: link_type.to_owned(),
            url: url.to_owned(),
        }
    }

    #[test]
    fn test_unique_and_sort_collapses_duplicates() {
        let links = vec![
            link("", "docs", "DOCUMENT", "https://x/docs"),
            link("l-1", "docs", "DOCUMENT", "https://x/docs"),
        ];

        let result = Link::unique_and_sort(links);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "l-1");
    }

    #[test]
    fn test_unique_and_sort_keeps_existing_id_over_idless() {
        let links = vec![
            link("l-1", "docs", "DOCUMENT", "https://x/docs"),
            link("", "docs", "DOCUMENT", "https://x/docs"),
        ];

        let result = Link::unique_and_sort(links);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "l-1");
    }

    #[test]
    fn test_unique_and_sort_orders_by_type_then_name_then_url() {
        let links = vec![
            link("", "zeta", "REPOSITORY", "https://x/z"),
            link("", "alpha", "REPOSITORY", "https://x/a"),
            link("", "beta", "DASHBOARD", "https://x/b"),
        ];

        let result = Link::unique_and_sort(links);
        let order: Vec<_> = result.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(order, vec!["beta", "alpha", "zeta"]);
    }

    #[test]
    fn test_link_equality_ignores_ids() {
        let a = vec![link("l-1", "docs", "DOCUMENT", "https://x/docs")];
        let b = vec![link("", "docs", "DOCUMENT", "https://x/docs")];
        assert!(Link::same_set(&a, &b));
    }

    #[test]
    fn test_link_equality_ignores_order() {
        let a = vec![link("", "a", "T", "u1"), link("", "b", "T", "u2")];
        let b = vec![link("", "b", "T", "u2"), link("", "a", "T", "u1")];
        assert!(Link::same_set(&a, &b));
    }

    #[test]
    fn test_documents_dedupe_and_sort_by_title() {
        let documents = vec![
            Document {
                title: "Runbook".to_owned(),
                url: "https://x/run".to_owned(),
                ..Document::default()
            },
            Document {
                title: "Architecture".to_owned(),
                url: "https://x/arch".to_owned(),
                ..Document::default()
            },
            Document {
                id: "d-1".to_owned(),
                title: "Runbook".to_owned(),
                url: "https://x/run".to_owned(),
                ..Document::default()
            },
        ];

        let result = Document::unique_and_sort(documents);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].title, "Architecture");
        assert_eq!(result[1].title, "Runbook");
        assert_eq!(result[1].id, "d-1");
    }

    #[test]
    fn test_same_desired_ignores_metric_sources() {
        let mut a = Component::default();
        a.spec.name = "api".to_owned();
        let mut b = a.clone();
        let _ = b
            .spec
            .metric_sources
            .insert("coverage".to_owned(), ComponentMetricSource::default());

        assert!(Component::same_desired(&a, &b));
    }
}
