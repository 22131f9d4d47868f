use crate::catalog::client::{CatalogClient, CatalogResult, CriteriaDiff, RemoteComponent, RemoteScorecard};
use crate::catalog::error::CatalogError;
use crate::catalog::graphql;
use crate::model::{Component, Criterion, Document, Link, Metric, Scorecard};
use chrono::{DateTime, Utc};
use ohno::{IntoAppError, app_err};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;

/// Log target for the remote catalog client
const LOG_TARGET: &str = "catalog";

/// Remote catalog client speaking GraphQL over HTTPS, plus the REST
/// gateway endpoint for metric value ingestion.
#[derive(Debug, Clone)]
pub struct CompassClient {
    client: reqwest::Client,
    host: String,
    cloud_id: String,
}

#[derive(Debug, Deserialize)]
struct RemoteMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<RemoteMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MutationStatus {
    success: bool,
    errors: Vec<RemoteMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ComponentNode {
    id: String,
    links: Vec<LinkNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LinkNode {
    id: String,
    name: String,
    #[serde(rename = "type")]
    link_type: String,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IdNode {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NamedNode {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ScorecardNode {
    id: String,
    #[serde(rename = "criterias")]
    criteria: Vec<NamedNode>,
}

impl ScorecardNode {
    fn into_remote(self) -> RemoteScorecard {
        RemoteScorecard {
            id: self.id,
            criteria_ids: self.criteria.into_iter().map(|c| (c.name, c.id)).collect(),
        }
    }
}

impl ComponentNode {
    fn into_remote(self) -> RemoteComponent {
        RemoteComponent {
            id: self.id,
            links: self
                .links
                .into_iter()
                .map(|l| Link {
                    id: l.id,
                    name: l.name,
                    link_type: l.link_type,
                    url: l.url,
                })
                .collect(),
        }
    }
}

impl CompassClient {
    /// Create a client. `host` is the catalog origin, e.g.
    /// `https://example.atlassian.net`; the token is sent as
    /// `Authorization: Basic <token>` on every request.
    pub fn new(token: &str, host: impl Into<String>, cloud_id: impl Into<String>) -> crate::Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Basic {token}")).into_app_err("Invalid catalog token")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth);
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("fact-catalog")
                .default_headers(headers)
                .build()
                .into_app_err("Failed to build HTTP client")?,
            host: host.into(),
            cloud_id: cloud_id.into(),
        })
    }

    async fn run(&self, query: &str, variables: serde_json::Value) -> CatalogResult<serde_json::Value> {
        let url = format!("{}/gateway/api/graphql", self.host);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(CatalogError::Unauthorized);
        }

        if !status.is_success() {
            return Err(CatalogError::Transport(app_err!("catalog returned HTTP {status} for '{url}'")));
        }

        let body: GraphQlResponse = resp.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            log::warn!(target: LOG_TARGET, "GraphQL request rejected: {}", messages.join("; "));
            return Err(CatalogError::from_remote_messages(messages));
        }

        body.data.ok_or_else(|| CatalogError::Transport(app_err!("catalog response has no data")))
    }

    /// Extract `data.compass.<op>` from a response and decode it.
    fn op_payload<T: DeserializeOwned>(data: &serde_json::Value, op: &str) -> CatalogResult<T> {
        let node = data
            .pointer(&format!("/compass/{op}"))
            .ok_or_else(|| CatalogError::Transport(app_err!("catalog response is missing '{op}'")))?;

        serde_json::from_value(node.clone()).map_err(|e| CatalogError::Transport(app_err!("failed to decode '{op}' payload: {e}")))
    }

    /// Run a mutation whose payload carries only `success` and `errors`.
    async fn mutate(&self, query: &str, op: &str, variables: serde_json::Value) -> CatalogResult<serde_json::Value> {
        let data = self.run(query, variables).await?;
        let status: MutationStatus = Self::op_payload(&data, op)?;
        check_success(&status, op)?;
        Ok(data)
    }
}

fn check_success(status: &MutationStatus, op: &str) -> CatalogResult<()> {
    if status.success {
        return Ok(());
    }

    let messages: Vec<String> = status.errors.iter().map(|e| e.message.clone()).collect();
    log::debug!(target: LOG_TARGET, "'{op}' refused: {}", messages.join("; "));
    Err(CatalogError::from_remote_messages(messages))
}

fn component_details(component: &Component) -> serde_json::Value {
    let links: Vec<_> = component
        .spec
        .links
        .iter()
        .map(|l| json!({ "type": l.link_type, "name": l.name, "url": l.url }))
        .collect();

    let mut details = json!({
        "name": component.spec.name,
        "slug": component.spec.slug,
        "description": component.spec.description,
        "typeId": component.spec.type_id,
        "links": links,
        "labels": component.spec.labels,
        "fields": component.spec.fields,
    });

    if !component.spec.owner_id.is_empty() {
        details["ownerId"] = json!(component.spec.owner_id);
    }

    details
}

fn criterion_details(criterion: &Criterion, with_id: bool) -> serde_json::Value {
    let hmv = &criterion.has_metric_value;
    let mut value = json!({
        "weight": hmv.weight,
        "name": hmv.name,
        "metricDefinitionId": hmv.metric_definition_id,
        "comparatorValue": hmv.comparator_value,
        "comparator": hmv.comparator,
    });

    if with_id && let Some(id) = &hmv.id {
        value["id"] = json!(id);
    }

    json!({ "hasMetricValue": value })
}

fn scorecard_details(scorecard: &Scorecard) -> serde_json::Value {
    let criteria: Vec<_> = scorecard.spec.criteria.iter().map(|c| criterion_details(c, false)).collect();

    let mut details = json!({
        "name": scorecard.spec.name,
        "description": scorecard.spec.description,
        "state": scorecard.spec.state,
        "componentTypeIds": scorecard.spec.component_type_ids,
        "importance": scorecard.spec.importance,
        "scoringStrategyType": scorecard.spec.scoring_strategy_type,
        "criterias": criteria,
    });

    if !scorecard.spec.owner_id.is_empty() {
        details["ownerId"] = json!(scorecard.spec.owner_id);
    }

    details
}

impl CatalogClient for CompassClient {
    async fn create_component(&self, component: &Component) -> CatalogResult<RemoteComponent> {
        let variables = json!({ "cloudId": self.cloud_id, "componentDetails": component_details(component) });
        let data = self.run(graphql::CREATE_COMPONENT, variables).await?;

        let status: MutationStatus = Self::op_payload(&data, "createComponent")?;
        check_success(&status, "createComponent")?;

        let node = data
            .pointer("/compass/createComponent/componentDetails")
            .cloned()
            .ok_or_else(|| CatalogError::Transport(app_err!("createComponent response has no component details")))?;
        let node: ComponentNode = serde_json::from_value(node).map_err(|e| CatalogError::Transport(e.into()))?;
        Ok(node.into_remote())
    }

    async fn update_component(&self, component: &Component) -> CatalogResult<RemoteComponent> {
        let id = component.spec.id.as_deref().unwrap_or_default();
        let mut details = component_details(component);
        details["id"] = json!(id);

        let data = self.mutate(graphql::UPDATE_COMPONENT, "updateComponent", json!({ "componentDetails": details })).await?;

        let node = data
            .pointer("/compass/updateComponent/componentDetails")
            .cloned()
            .ok_or_else(|| CatalogError::Transport(app_err!("updateComponent response has no component details")))?;
        let node: ComponentNode = serde_json::from_value(node).map_err(|e| CatalogError::Transport(e.into()))?;
        Ok(node.into_remote())
    }

    async fn delete_component(&self, id: &str) -> CatalogResult<()> {
        let _ = self.mutate(graphql::DELETE_COMPONENT, "deleteComponent", json!({ "id": id })).await?;
        Ok(())
    }

    async fn get_component_by_slug(&self, slug: &str) -> CatalogResult<RemoteComponent> {
        let variables = json!({ "cloudId": self.cloud_id, "slug": slug });
        let data = self.run(graphql::GET_COMPONENT_BY_SLUG, variables).await?;

        let node = data.pointer("/compass/componentByReference").cloned().filter(|n| !n.is_null());
        let Some(node) = node else {
            return Err(CatalogError::NotFound);
        };

        let node: ComponentNode = serde_json::from_value(node).map_err(|e| CatalogError::Transport(e.into()))?;
        if node.id.is_empty() {
            return Err(CatalogError::NotFound);
        }

        Ok(node.into_remote())
    }

    async fn create_metric(&self, metric: &Metric) -> CatalogResult<String> {
        let variables = json!({
            "cloudId": self.cloud_id,
            "name": metric.spec.name,
            "description": metric.spec.description,
            "unit": metric.spec.format.unit,
        });
        let data = self.run(graphql::CREATE_METRIC, variables).await?;

        let status: MutationStatus = Self::op_payload(&data, "createMetricDefinition")?;
        check_success(&status, "createMetricDefinition")?;

        let created: IdNode = Self::op_payload(
            &data,
            "createMetricDefinition/createdMetricDefinition",
        )?;
        Ok(created.id)
    }

    async fn update_metric(&self, metric: &Metric) -> CatalogResult<()> {
        let variables = json!({
            "cloudId": self.cloud_id,
            "id": metric.spec.id,
            "name": metric.spec.name,
            "description": metric.spec.description,
            "unit": metric.spec.format.unit,
        });
        let _ = self.mutate(graphql::UPDATE_METRIC, "updateMetricDefinition", variables).await?;
        Ok(())
    }

    async fn delete_metric(&self, id: &str) -> CatalogResult<()> {
        let _ = self.mutate(graphql::DELETE_METRIC, "deleteMetricDefinition", json!({ "id": id })).await?;
        Ok(())
    }

    async fn get_metric_by_name(&self, name: &str) -> CatalogResult<String> {
        let data = self.run(graphql::SEARCH_METRICS, json!({ "cloudId": self.cloud_id })).await?;

        let nodes = data
            .pointer("/compass/metricDefinitions/nodes")
            .cloned()
            .ok_or_else(|| CatalogError::Transport(app_err!("metric search response has no nodes")))?;
        let nodes: Vec<NamedNode> = serde_json::from_value(nodes).map_err(|e| CatalogError::Transport(e.into()))?;

        nodes
            .into_iter()
            .find(|n| n.name == name)
            .map(|n| n.id)
            .ok_or(CatalogError::NotFound)
    }

    async fn create_scorecard(&self, scorecard: &Scorecard) -> CatalogResult<RemoteScorecard> {
        let variables = json!({ "cloudId": self.cloud_id, "scorecardDetails": scorecard_details(scorecard) });
        let data = self.run(graphql::CREATE_SCORECARD, variables).await?;

        let status: MutationStatus = Self::op_payload(&data, "createScorecard")?;
        check_success(&status, "createScorecard")?;

        let node: ScorecardNode = Self::op_payload(&data, "createScorecard/scorecardDetails")?;
        Ok(node.into_remote())
    }

    async fn update_scorecard(&self, scorecard: &Scorecard, diff: &CriteriaDiff) -> CatalogResult<BTreeMap<String, String>> {
        let id = scorecard.spec.id.as_deref().unwrap_or_default();
        let mut details = scorecard_details(scorecard);
        if let Some(map) = details.as_object_mut() {
            let _ = map.remove("criterias");
        }
        details["createCriteria"] = serde_json::Value::Array(diff.created.iter().map(|c| criterion_details(c, false)).collect());
        details["updateCriteria"] = serde_json::Value::Array(diff.updated.iter().map(|c| criterion_details(c, true)).collect());
        details["deleteCriteria"] = serde_json::Value::Array(diff.deleted_ids.iter().map(|i| json!({ "id": i })).collect());

        let variables = json!({ "scorecardId": id, "scorecardDetails": details });
        let data = self.run(graphql::UPDATE_SCORECARD, variables).await?;

        let status: MutationStatus = Self::op_payload(&data, "updateScorecard")?;
        check_success(&status, "updateScorecard")?;

        let node: ScorecardNode = Self::op_payload(&data, "updateScorecard/scorecardDetails")?;
        Ok(node.into_remote().criteria_ids)
    }

    async fn delete_scorecard(&self, id: &str) -> CatalogResult<()> {
        let _ = self.mutate(graphql::DELETE_SCORECARD, "deleteScorecard", json!({ "id": id })).await?;
        Ok(())
    }

    async fn get_scorecard_by_name(&self, name: &str) -> CatalogResult<RemoteScorecard> {
        let data = self.run(graphql::SEARCH_SCORECARDS, json!({ "cloudId": self.cloud_id })).await?;

        let nodes = data
            .pointer("/compass/scorecards/nodes")
            .cloned()
            .ok_or_else(|| CatalogError::Transport(app_err!("scorecard search response has no nodes")))?;
        let nodes: Vec<serde_json::Value> = serde_json::from_value(nodes).map_err(|e| CatalogError::Transport(e.into()))?;

        for node in nodes {
            if node.get("name").and_then(serde_json::Value::as_str) == Some(name) {
                let node: ScorecardNode = serde_json::from_value(node).map_err(|e| CatalogError::Transport(e.into()))?;
                return Ok(node.into_remote());
            }
        }

        Err(CatalogError::NotFound)
    }

    async fn add_document(&self, component_id: &str, document: &Document) -> CatalogResult<String> {
        let variables = json!({
            "input": {
                "componentId": component_id,
                "title": document.title,
                "documentationCategoryId": document.documentation_category_id,
                "url": document.url,
            }
        });
        let data = self.run(graphql::ADD_DOCUMENT, variables).await?;

        let status: MutationStatus = Self::op_payload(&data, "addDocument")?;
        check_success(&status, "addDocument")?;

        let created: IdNode = Self::op_payload(&data, "addDocument/documentDetails")?;
        Ok(created.id)
    }

    async fn update_document(&self, _component_id: &str, document: &Document) -> CatalogResult<()> {
        let variables = json!({
            "input": {
                "id": document.id,
                "title": document.title,
                "documentationCategoryId": document.documentation_category_id,
                "url": document.url,
            }
        });
        let _ = self.mutate(graphql::UPDATE_DOCUMENT, "updateDocument", variables).await?;
        Ok(())
    }

    async fn remove_document(&self, _component_id: &str, document_id: &str) -> CatalogResult<()> {
        let variables = json!({ "input": { "id": document_id } });
        let _ = self.mutate(graphql::DELETE_DOCUMENT, "deleteDocument", variables).await?;
        Ok(())
    }

    async fn set_api_specifications(&self, component_id: &str, file_name: &str, content: &str) -> CatalogResult<()> {
        let url = format!("{}/gateway/api/compass/v1/component/{component_id}/api-specs", self.host);
        let body = json!({ "fileName": file_name, "specification": content });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(CatalogError::Unauthorized);
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Transport(app_err!("API specification upload returned HTTP {status}: {text}")));
        }

        log::debug!(target: LOG_TARGET, "Uploaded API specification '{file_name}' for component '{component_id}'");
        Ok(())
    }

    async fn set_dependency(&self, dependent_id: &str, provider_id: &str) -> CatalogResult<()> {
        let variables = json!({ "dependentId": dependent_id, "providerId": provider_id });
        let _ = self.mutate(graphql::CREATE_RELATIONSHIP, "createRelationship", variables).await?;
        Ok(())
    }

    async fn unset_dependency(&self, dependent_id: &str, provider_id: &str) -> CatalogResult<()> {
        let variables = json!({ "dependentId": dependent_id, "providerId": provider_id });
        let _ = self.mutate(graphql::DELETE_RELATIONSHIP, "deleteRelationship", variables).await?;
        Ok(())
    }

    async fn create_metric_source(&self, metric_id: &str, component_id: &str, name: &str) -> CatalogResult<String> {
        let variables = json!({ "metricId": metric_id, "componentId": component_id, "externalId": name });
        let data = self.run(graphql::CREATE_METRIC_SOURCE, variables).await?;

        let status: MutationStatus = Self::op_payload(&data, "createMetricSource")?;
        check_success(&status, "createMetricSource")?;

        let created: IdNode = Self::op_payload(&data, "createMetricSource/createdMetricSource")?;
        Ok(created.id)
    }

    async fn delete_metric_source(&self, id: &str) -> CatalogResult<()> {
        let _ = self.mutate(graphql::DELETE_METRIC_SOURCE, "deleteMetricSource", json!({ "id": id })).await?;
        Ok(())
    }

    async fn push_metric(&self, metric_source_id: &str, value: f64, timestamp: DateTime<Utc>) -> CatalogResult<()> {
        let url = format!("{}/gateway/api/compass/v1/metrics", self.host);
        let body = json!({
            "metricSourceId": metric_source_id,
            "value": value.to_string(),
            "timestamp": timestamp.to_rfc3339(),
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(CatalogError::Unauthorized);
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Transport(app_err!("metric push returned HTTP {status}: {text}")));
        }

        log::debug!(target: LOG_TARGET, "Pushed value {value} for metric source '{metric_source_id}'");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HasMetricValue;

    #[test]
    fn test_component_details_omits_empty_owner() {
        let mut component = Component::default();
        component.spec.name = "api".to_owned();

        let details = component_details(&component);
        assert!(details.get("ownerId").is_none());

        component.spec.owner_id = "owner-1".to_owned();
        let details = component_details(&component);
        assert_eq!(details["ownerId"], json!("owner-1"));
    }

    #[test]
    fn test_criterion_details_includes_id_only_on_update() {
        let criterion = Criterion {
            has_metric_value: HasMetricValue {
                id: Some("crit-1".to_owned()),
                name: "has coverage".to_owned(),
                ..HasMetricValue::default()
            },
        };

        let create = criterion_details(&criterion, false);
        assert!(create["hasMetricValue"].get("id").is_none());

        let update = criterion_details(&criterion, true);
        assert_eq!(update["hasMetricValue"]["id"], json!("crit-1"));
    }

    #[test]
    fn test_op_payload_navigates_compass_envelope() {
        let data = json!({ "compass": { "deleteComponent": { "success": true, "errors": [] } } });
        let status: MutationStatus = CompassClient::op_payload(&data, "deleteComponent").unwrap();
        assert!(status.success);
    }

    #[test]
    fn test_op_payload_missing_node_is_transport_error() {
        let data = json!({ "compass": {} });
        let result: CatalogResult<MutationStatus> = CompassClient::op_payload(&data, "deleteComponent");
        assert!(matches!(result, Err(CatalogError::Transport(_))));
    }

    #[test]
    fn test_scorecard_node_maps_criteria_by_name() {
        let node: ScorecardNode = serde_json::from_value(json!({
            "id": "sc-1",
            "criterias": [ { "id": "crit-1", "name": "has coverage" } ],
        }))
        .unwrap();

        let remote = node.into_remote();
        assert_eq!(remote.id, "sc-1");
        assert_eq!(remote.criteria_ids.get("has coverage").map(String::as_str), Some("crit-1"));
    }
}
