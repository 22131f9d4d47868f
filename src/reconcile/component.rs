use crate::Result;
use crate::catalog::{CatalogClient, CatalogError, CatalogResult, RemoteComponent};
use crate::codehost::CodeHost;
use crate::drift;
use crate::model::{self, Component, Document, Kind, Link};
use crate::owner::OwnerDirectory;
use crate::reconcile::{RunReport, note_failure};
use crate::state::{StateStore, load_config};
use ohno::app_err;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Log target for the reconcilers
const LOG_TARGET: &str = "reconcile";

/// README locations probed on the code host, in order of preference.
const README_CANDIDATES: [&str; 6] = [
    "docs/README.md",
    "README.md",
    "index.md",
    "readme.md",
    "docs/readme.md",
    "docs/index.md",
];

/// Provider every component implicitly depends on.
const DEFAULT_PROVIDER: &str = "kubernetes";

/// Folders probed for an API specification, in order of preference.
const API_SPEC_FOLDERS: [&str; 5] = ["", "docs", "doc", ".of", "openapi"];

/// File names recognized as an API specification.
const API_SPEC_FILES: [&str; 6] = [
    "openapi.yaml",
    "openapi.yml",
    "openapi.json",
    "swagger.yaml",
    "swagger.yml",
    "swagger.json",
];

/// Reconcile components against the remote catalog.
///
/// Each desired component is normalized before drift: the slug is computed,
/// the owner is resolved to an ID plus chat/project links, an empty
/// description is backfilled from the repository, and links are deduplicated
/// and sorted. Normalization makes the desired form identical to what a
/// previous run persisted, so a clean tree produces zero remote calls.
pub async fn reconcile_components<C: CatalogClient, H: CodeHost>(
    client: &C,
    host: &H,
    owners: &OwnerDirectory,
    store: &StateStore,
    config_dir: &Path,
    recursive: bool,
) -> Result<RunReport> {
    let state = store.load_state::<Component>()?;
    let config = load_config::<Component>(config_dir, recursive)?;

    let mut report = RunReport::default();
    let mut failed_names = BTreeSet::new();
    let mut normalized = Vec::with_capacity(config.len());
    for mut component in config {
        match normalize(host, owners, &mut component).await {
            Ok(()) => normalized.push(component),
            Err(e) => {
                log::error!(target: LOG_TARGET, "component '{}': {e}", component.spec.name);
                report.failed += 1;
                let _ = failed_names.insert(component.spec.name);
            }
        }
    }

    // Items that failed normalization are carried through untouched: no
    // remote calls, state entry preserved.
    let (state, untouched): (Vec<Component>, Vec<Component>) = state.into_iter().partition(|c| !failed_names.contains(&c.spec.name));

    let state_by_name: BTreeMap<String, Component> = state.iter().map(|c| (c.spec.name.clone(), c.clone())).collect();

    let drift = drift::detect(
        state,
        normalized,
        |c| c.spec.name.clone(),
        |c| c.spec.id.clone(),
        |c, id| c.spec.id = id,
        Component::same_desired,
    );

    let mut out: Vec<Component> = untouched;

    for component in drift.deleted {
        match &component.spec.id {
            None => report.deleted += 1,
            Some(id) => match client.delete_component(id).await {
                Ok(()) | Err(CatalogError::NotFound) => report.deleted += 1,
                Err(e) => {
                    note_failure(&mut report, Kind::Component, &component.spec.name, "delete", &e)?;
                    out.push(component);
                }
            },
        }
    }

    for mut component in drift.unchanged {
        if let Some(existing) = state_by_name.get(&component.spec.name) {
            component.spec.metric_sources = existing.spec.metric_sources.clone();
            adopt_link_ids(&mut component.spec.links, &existing.spec.links);
        }
        finish_component(client, host, &mut component, &state_by_name, &mut report).await?;
        out.push(component);
        report.unchanged += 1;
    }

    for mut component in drift.created {
        match client.create_component(&component).await {
            Ok(remote) => {
                adopt_remote(&mut component, &remote);
                finish_component(client, host, &mut component, &state_by_name, &mut report).await?;
                out.push(component);
                report.created += 1;
            }
            Err(CatalogError::AlreadyExists) => match adopt_and_update(client, &mut component).await {
                Ok(()) => {
                    finish_component(client, host, &mut component, &state_by_name, &mut report).await?;
                    out.push(component);
                    report.updated += 1;
                }
                Err(e) => note_failure(&mut report, Kind::Component, &component.spec.name, "create", &e)?,
            },
            Err(e) => note_failure(&mut report, Kind::Component, &component.spec.name, "create", &e)?,
        }
    }

    for mut component in drift.updated {
        if let Some(existing) = state_by_name.get(&component.spec.name) {
            component.spec.metric_sources = existing.spec.metric_sources.clone();
            adopt_link_ids(&mut component.spec.links, &existing.spec.links);
        }

        match client.update_component(&component).await {
            Ok(remote) => {
                adopt_link_ids(&mut component.spec.links, &remote.links);
                finish_component(client, host, &mut component, &state_by_name, &mut report).await?;
                out.push(component);
                report.updated += 1;
            }
            Err(CatalogError::NotFound) => match adopt_and_update(client, &mut component).await {
                Ok(()) => {
                    finish_component(client, host, &mut component, &state_by_name, &mut report).await?;
                    out.push(component);
                    report.updated += 1;
                }
                Err(e) => note_failure(&mut report, Kind::Component, &component.spec.name, "update", &e)?,
            },
            Err(e) => note_failure(&mut report, Kind::Component, &component.spec.name, "update", &e)?,
        }
    }

    store.write_state(out)?;
    Ok(report)
}

/// Nested reconciliation that runs for every surviving component:
/// documents against state plus the discovered README, dependency edges
/// against what state recorded, and the best-effort API specification
/// upload. Failures here are per-item.
async fn finish_component<C: CatalogClient, H: CodeHost>(
    client: &C,
    host: &H,
    component: &mut Component,
    state_by_name: &BTreeMap<String, Component>,
    report: &mut RunReport,
) -> Result<()> {
    let state_docs = state_by_name
        .get(&component.spec.name)
        .map(|c| c.spec.documents.clone())
        .unwrap_or_default();
    if let Err(e) = reconcile_documents(client, host, component, &state_docs).await {
        note_failure(report, Kind::Component, &component.spec.name, "documents", &e)?;
        component.spec.documents = state_docs;
    }

    if let Err(e) = reconcile_dependencies(client, component, state_by_name).await {
        note_failure(report, Kind::Component, &component.spec.name, "dependencies", &e)?;
        component.spec.depends_on = state_by_name
            .get(&component.spec.name)
            .map(|existing| existing.spec.depends_on.clone())
            .unwrap_or_default();
    }

    upload_api_spec(client, host, component).await;

    Ok(())
}

/// Find the repository's API specification and push it to the catalog.
/// Discovery misses and upload failures are both tolerated; the catalog
/// keeps whatever it had.
async fn upload_api_spec<C: CatalogClient, H: CodeHost>(client: &C, host: &H, component: &Component) {
    let Some(component_id) = component.spec.id.as_deref() else {
        return;
    };
    let Some((path, content)) = discover_api_spec(host, &component.metadata.name).await else {
        return;
    };

    if let Err(e) = client.set_api_specifications(component_id, &path, &content).await {
        log::warn!(
            target: LOG_TARGET,
            "component '{}': API specification upload failed: {e}",
            component.spec.name
        );
    }
}

async fn discover_api_spec<H: CodeHost>(host: &H, repo: &str) -> Option<(String, String)> {
    for folder in API_SPEC_FOLDERS {
        for file in API_SPEC_FILES {
            let path = if folder.is_empty() { file.to_owned() } else { format!("{folder}/{file}") };
            if let Ok(content) = host.get_file_content(repo, &path).await {
                return Some((path, content));
            }
        }
    }

    None
}

async fn normalize<H: CodeHost>(host: &H, owners: &OwnerDirectory, component: &mut Component) -> Result<()> {
    component.spec.slug = model::slug(&component.spec.name, &component.metadata.component_type);

    if component.spec.tribe.is_empty() || component.spec.squad.is_empty() {
        log::warn!(
            target: LOG_TARGET,
            "component '{}': tribe or squad not set, keeping declared owner",
            component.spec.name
        );
    } else {
        let owner = owners
            .resolve(&component.spec.tribe, &component.spec.squad)
            .map_err(|e| app_err!("owner resolution failed: {e}"))?;

        component.spec.owner_id = owner.owner_id;
        for (name, url) in &owner.slack_channels {
            component.spec.links.push(Link {
                id: String::new(),
                name: name.clone(),
                link_type: "CHAT_CHANNEL".to_owned(),
                url: url.clone(),
            });
        }
        for (name, url) in &owner.projects {
            component.spec.links.push(Link {
                id: String::new(),
                name: name.clone(),
                link_type: "PROJECT".to_owned(),
                url: url.clone(),
            });
        }
    }

    if component.spec.description.is_empty() {
        component.spec.description = match host.get_repo_description(&component.metadata.name).await {
            Ok(description) if !description.is_empty() => description,
            Ok(_) => format!("Component {}", component.spec.name),
            Err(e) => {
                log::warn!(
                    target: LOG_TARGET,
                    "component '{}': could not read repository description: {e}",
                    component.spec.name
                );
                format!("Component {}", component.spec.name)
            }
        };
    }

    // Everything runs on the cluster, so the edge is implicit.
    if component.spec.name != DEFAULT_PROVIDER && !component.spec.depends_on.iter().any(|d| d == DEFAULT_PROVIDER) {
        component.spec.depends_on.push(DEFAULT_PROVIDER.to_owned());
    }

    component.spec.links = Link::unique_and_sort(std::mem::take(&mut component.spec.links));
    Ok(())
}

/// Copy remote link IDs onto ID-less local links matching by content.
fn adopt_link_ids(links: &mut [Link], known: &[Link]) {
    for link in links.iter_mut() {
        if link.id.is_empty() {
            if let Some(existing) = known.iter().find(|k| !k.id.is_empty() && k.content_key() == link.content_key()) {
                link.id = existing.id.clone();
            }
        }
    }
}

fn adopt_remote(component: &mut Component, remote: &RemoteComponent) {
    component.spec.id = Some(remote.id.clone());
    adopt_link_ids(&mut component.spec.links, &remote.links);
}

/// The already-exists / not-found pivot: resolve the remote component by
/// slug, adopt its identity, and retry the update exactly once.
async fn adopt_and_update<C: CatalogClient>(client: &C, component: &mut Component) -> CatalogResult<()> {
    let remote = client.get_component_by_slug(&component.spec.slug).await?;
    adopt_remote(component, &remote);
    let remote = client.update_component(component).await?;
    adopt_link_ids(&mut component.spec.links, &remote.links);
    Ok(())
}

/// Reconcile a component's documents: the desired set is the declared
/// documents overlaid with the discovered README, keyed by title. State
/// documents missing from the desired set are removed remotely.
async fn reconcile_documents<C: CatalogClient, H: CodeHost>(
    client: &C,
    host: &H,
    component: &mut Component,
    state_docs: &[Document],
) -> CatalogResult<()> {
    let Some(component_id) = component.spec.id.clone() else {
        return Ok(());
    };

    let mut desired: BTreeMap<String, Document> = component
        .spec
        .documents
        .drain(..)
        .map(|d| (d.title.clone(), d))
        .collect();
    if let Some(readme) = discover_readme(host, &component.metadata.name).await {
        let _ = desired.insert(readme.title.clone(), readme);
    }

    let state_by_title: BTreeMap<&str, &Document> = state_docs.iter().map(|d| (d.title.as_str(), d)).collect();

    for doc in state_docs {
        if !desired.contains_key(&doc.title) && !doc.id.is_empty() {
            match client.remove_document(&component_id, &doc.id).await {
                Ok(()) | Err(CatalogError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }
    }

    for doc in desired.values_mut() {
        match state_by_title.get(doc.title.as_str()) {
            None => {
                doc.id = client.add_document(&component_id, doc).await?;
            }
            Some(existing) => {
                doc.id = existing.id.clone();
                doc.documentation_category_id = existing.documentation_category_id.clone();
                if doc.url != existing.url {
                    client.update_document(&component_id, doc).await?;
                }
            }
        }
    }

    component.spec.documents = Document::unique_and_sort(desired.into_values().collect());
    Ok(())
}

/// Locate the repository README and turn it into a document pointing at the
/// default branch. Discovery is best-effort: any code host failure means no
/// discovered document.
async fn discover_readme<H: CodeHost>(host: &H, repo: &str) -> Option<Document> {
    let properties = match host.get_repo_properties(repo).await {
        Ok(properties) => properties,
        Err(e) => {
            log::warn!(target: LOG_TARGET, "repo '{repo}': could not read properties: {e}");
            return None;
        }
    };
    let default_branch = properties.get("DefaultBranch").map_or("main", String::as_str);

    for path in README_CANDIDATES {
        match host.get_file_exists(repo, path).await {
            Ok(true) => {
                return Some(Document {
                    id: String::new(),
                    title: "README".to_owned(),
                    doc_type: "OTHER".to_owned(),
                    documentation_category_id: String::new(),
                    url: format!("{}/blob/{default_branch}/{path}", host.get_repo_url(repo)),
                });
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!(target: LOG_TARGET, "repo '{repo}': README probe '{path}' failed: {e}");
                return None;
            }
        }
    }

    None
}

/// Apply dependency edge changes relative to what state recorded. A
/// component absent from state has an empty baseline, so every declared
/// edge is set at creation time. Providers are resolved through state; a
/// component created in this run becomes a valid provider on the next one.
async fn reconcile_dependencies<C: CatalogClient>(
    client: &C,
    component: &Component,
    state_by_name: &BTreeMap<String, Component>,
) -> CatalogResult<()> {
    let Some(component_id) = component.spec.id.as_deref() else {
        return Ok(());
    };
    let baseline: &[String] = state_by_name
        .get(&component.spec.name)
        .map_or(&[], |existing| existing.spec.depends_on.as_slice());

    for provider in baseline {
        if !component.spec.depends_on.contains(provider) {
            if let Some(provider_id) = provider_id(state_by_name, provider, &component.spec.name) {
                match client.unset_dependency(component_id, provider_id).await {
                    Ok(()) | Err(CatalogError::NotFound) => {}
                    Err(e) => return Err(e),
                }
            }
        }
    }

    for provider in &component.spec.depends_on {
        if !baseline.contains(provider) {
            if let Some(provider_id) = provider_id(state_by_name, provider, &component.spec.name) {
                client.set_dependency(component_id, provider_id).await?;
            }
        }
    }

    Ok(())
}

fn provider_id<'a>(state_by_name: &'a BTreeMap<String, Component>, provider: &str, dependent: &str) -> Option<&'a str> {
    let id = state_by_name.get(provider).and_then(|c| c.spec.id.as_deref());
    if id.is_none() {
        log::warn!(target: LOG_TARGET, "component '{dependent}': provider '{provider}' not found in state");
    }

    id
}
