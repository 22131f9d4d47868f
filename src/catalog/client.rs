use crate::catalog::CatalogError;
use crate::model::{Component, Criterion, Document, Metric, Scorecard};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub type CatalogResult<T> = core::result::Result<T, CatalogError>;

/// What the remote returns for a component looked up or created by slug:
/// its ID plus the remote identifiers of its links.
#[derive(Debug, Clone, Default)]
pub struct RemoteComponent {
    pub id: String,
    pub links: Vec<crate::model::Link>,
}

/// What the remote returns for a scorecard: its ID plus criterion name →
/// criterion ID.
#[derive(Debug, Clone, Default)]
pub struct RemoteScorecard {
    pub id: String,
    pub criteria_ids: BTreeMap<String, String>,
}

/// Nested criteria drift shipped with a scorecard update.
#[derive(Debug, Clone, Default)]
pub struct CriteriaDiff {
    pub created: Vec<Criterion>,
    pub updated: Vec<Criterion>,
    pub deleted_ids: Vec<String>,
}

/// The remote catalog capability set consumed by the reconcilers.
///
/// Every method crosses the network; implementations classify failures into
/// [`CatalogError`] so the reconciler can run its already-exists/not-found
/// pivot without parsing messages itself.
pub trait CatalogClient {
    async fn create_component(&self, component: &Component) -> CatalogResult<RemoteComponent>;

    /// Update a component; the returned value carries the remote IDs of the
    /// links as they exist after the update.
    async fn update_component(&self, component: &Component) -> CatalogResult<RemoteComponent>;
    async fn delete_component(&self, id: &str) -> CatalogResult<()>;
    async fn get_component_by_slug(&self, slug: &str) -> CatalogResult<RemoteComponent>;

    async fn create_metric(&self, metric: &Metric) -> CatalogResult<String>;
    async fn update_metric(&self, metric: &Metric) -> CatalogResult<()>;
    async fn delete_metric(&self, id: &str) -> CatalogResult<()>;
    async fn get_metric_by_name(&self, name: &str) -> CatalogResult<String>;

    async fn create_scorecard(&self, scorecard: &Scorecard) -> CatalogResult<RemoteScorecard>;

    /// Update the scorecard body and apply the nested criteria diff.
    /// Returns criterion name → ID for criteria created by the diff.
    async fn update_scorecard(&self, scorecard: &Scorecard, diff: &CriteriaDiff) -> CatalogResult<BTreeMap<String, String>>;

    async fn delete_scorecard(&self, id: &str) -> CatalogResult<()>;
    async fn get_scorecard_by_name(&self, name: &str) -> CatalogResult<RemoteScorecard>;

    async fn add_document(&self, component_id: &str, document: &Document) -> CatalogResult<String>;
    async fn update_document(&self, component_id: &str, document: &Document) -> CatalogResult<()>;
    async fn remove_document(&self, component_id: &str, document_id: &str) -> CatalogResult<()>;

    /// Replace the API specifications attached to a component with the
    /// content of one discovered specification file.
    async fn set_api_specifications(&self, component_id: &str, file_name: &str, content: &str) -> CatalogResult<()>;

    async fn set_dependency(&self, dependent_id: &str, provider_id: &str) -> CatalogResult<()>;
    async fn unset_dependency(&self, dependent_id: &str, provider_id: &str) -> CatalogResult<()>;

    async fn create_metric_source(&self, metric_id: &str, component_id: &str, name: &str) -> CatalogResult<String>;
    async fn delete_metric_source(&self, id: &str) -> CatalogResult<()>;

    async fn push_metric(&self, metric_source_id: &str, value: f64, timestamp: DateTime<Utc>) -> CatalogResult<()>;
}
