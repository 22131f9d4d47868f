use crate::Result;
use crate::codehost::CodeHost;
use crate::facts::code_host::CodeHostCollector;
use crate::facts::component::ComponentCollector;
use crate::facts::json_api::JsonApiCollector;
use crate::model::{Component, Fact, FactOperations, FactSource};
use ohno::bail;

/// Log target for the fact engine
const LOG_TARGET: &str = "facts";

/// Evaluates a `FactOperations` value to a single number by dispatching
/// each fact to the collector matching its source.
#[derive(Debug)]
pub struct FactEngine<H> {
    code_host: CodeHostCollector<H>,
    json_api: JsonApiCollector,
    component: ComponentCollector,
}

impl<H: CodeHost> FactEngine<H> {
    pub fn new(host: H, components: impl IntoIterator<Item = Component>) -> crate::Result<Self> {
        Ok(Self {
            code_host: CodeHostCollector::new(host),
            json_api: JsonApiCollector::new()?,
            component: ComponentCollector::new(components),
        })
    }

    /// Base URL for `json-api` facts with relative URIs.
    #[must_use]
    pub fn with_json_api_base(mut self, base_url: Option<String>) -> Self {
        self.json_api = self.json_api.with_base_url(base_url);
        self
    }

    /// Reduce the operations to a value.
    ///
    /// With `all` or `any` present the result is boolean-as-float: 1.0 iff
    /// every `all` fact checks true and (when `any` is non-empty) at least
    /// one `any` fact checks true. Otherwise a set `inspect` fact yields
    /// its numeric value, and a fully empty operations value yields 0.0.
    pub async fn evaluate(&self, operations: &FactOperations) -> Result<f64> {
        if !operations.all.is_empty() || !operations.any.is_empty() {
            return self.evaluate_conditions(operations).await;
        }

        if let Some(inspect) = &operations.inspect {
            return self.inspect(inspect).await;
        }

        Ok(0.0)
    }

    async fn evaluate_conditions(&self, operations: &FactOperations) -> Result<f64> {
        if !self.all_succeed(&operations.all).await? {
            return Ok(0.0);
        }

        if self.any_succeeds(&operations.any).await? { Ok(1.0) } else { Ok(0.0) }
    }

    /// Short-circuits on the first false; unknown sources are skipped.
    async fn all_succeed(&self, facts: &[Fact]) -> Result<bool> {
        for fact in facts {
            if fact.source == FactSource::Unknown {
                log::debug!(target: LOG_TARGET, "Skipping fact '{}' with unknown source", fact.name);
                continue;
            }

            if !self.check(fact).await? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// An empty set succeeds; otherwise short-circuits on the first true.
    async fn any_succeeds(&self, facts: &[Fact]) -> Result<bool> {
        if facts.is_empty() {
            return Ok(true);
        }

        for fact in facts {
            if fact.source == FactSource::Unknown {
                log::debug!(target: LOG_TARGET, "Skipping fact '{}' with unknown source", fact.name);
                continue;
            }

            if self.check(fact).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn check(&self, fact: &Fact) -> Result<bool> {
        match fact.source {
            FactSource::CodeHost => self.code_host.check(fact).await,
            FactSource::JsonApi => self.json_api.check(fact).await,
            FactSource::Component => self.component.check(fact),
            FactSource::Unknown => bail!("fact '{}': invalid source for check", fact.name),
        }
    }

    async fn inspect(&self, fact: &Fact) -> Result<f64> {
        match fact.source {
            FactSource::CodeHost => self.code_host.inspect(fact).await,
            FactSource::JsonApi => self.json_api.inspect(fact).await,
            FactSource::Component => self.component.inspect(fact),
            FactSource::Unknown => bail!("fact '{}': invalid source for inspect", fact.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codehost::{CodeHostError, CodeHostResult};
    use crate::model::FactType;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Code host stub: a set of existing files, plus a counter of checks
    /// performed so short-circuiting is observable.
    #[derive(Debug, Default)]
    struct StubHost {
        files: BTreeMap<String, String>,
        checks: Mutex<usize>,
    }

    impl StubHost {
        fn with_files(files: &[(&str, &str)]) -> Self {
            Self {
                files: files.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
                checks: Mutex::new(0),
            }
        }

        fn checks(&self) -> usize {
            *self.checks.lock().unwrap()
        }
    }

    impl CodeHost for &StubHost {
        async fn get_file_content(&self, repo: &str, path: &str) -> CodeHostResult<String> {
            self.files.get(&format!("{repo}/{path}")).cloned().ok_or(CodeHostError::NotFound)
        }

        async fn get_file_exists(&self, repo: &str, path: &str) -> CodeHostResult<bool> {
            *self.checks.lock().unwrap() += 1;
            Ok(self.files.contains_key(&format!("{repo}/{path}")))
        }

        async fn get_repo_properties(&self, _repo: &str) -> CodeHostResult<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }

        async fn get_repo_description(&self, _repo: &str) -> CodeHostResult<String> {
            Ok(String::new())
        }

        async fn search(&self, _repo: &str, _query: &str) -> CodeHostResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn get_repo_url(&self, repo: &str) -> String {
            format!("https://example.com/{repo}")
        }
    }

    fn file_exists_fact(repo: &str, path: &str) -> Fact {
        Fact {
            name: format!("{path} exists"),
            source: FactSource::CodeHost,
            fact_type: FactType::FileExists,
            repo: repo.to_owned(),
            file_path: path.to_owned(),
            ..Fact::default()
        }
    }

    #[tokio::test]
    async fn test_empty_operations_yield_zero() {
        let host = StubHost::default();
        let engine = FactEngine::new(&host, []).unwrap();

        let value = engine.evaluate(&FactOperations::default()).await.unwrap();
        assert!((value - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_all_true_yields_one() {
        let host = StubHost::with_files(&[("r/Dockerfile", "FROM scratch")]);
        let engine = FactEngine::new(&host, []).unwrap();

        let ops = FactOperations {
            all: vec![file_exists_fact("r", "Dockerfile")],
            ..FactOperations::default()
        };
        assert!((engine.evaluate(&ops).await.unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_all_false_yields_zero() {
        let host = StubHost::default();
        let engine = FactEngine::new(&host, []).unwrap();

        let ops = FactOperations {
            all: vec![file_exists_fact("r", "Dockerfile")],
            ..FactOperations::default()
        };
        assert!((engine.evaluate(&ops).await.unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_any_alone() {
        let host = StubHost::with_files(&[("r/Makefile", "all:")]);
        let engine = FactEngine::new(&host, []).unwrap();

        let ops = FactOperations {
            any: vec![file_exists_fact("r", "Dockerfile"), file_exists_fact("r", "Makefile")],
            ..FactOperations::default()
        };
        assert!((engine.evaluate(&ops).await.unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_all_short_circuits_after_first_false() {
        let host = StubHost::default();
        let engine = FactEngine::new(&host, []).unwrap();

        let ops = FactOperations {
            all: vec![
                file_exists_fact("r", "missing-1"),
                file_exists_fact("r", "missing-2"),
                file_exists_fact("r", "missing-3"),
            ],
            ..FactOperations::default()
        };
        let _ = engine.evaluate(&ops).await.unwrap();
        assert_eq!(host.checks(), 1);
    }

    #[tokio::test]
    async fn test_unknown_source_skipped_in_all() {
        let host = StubHost::with_files(&[("r/Dockerfile", "FROM scratch")]);
        let engine = FactEngine::new(&host, []).unwrap();

        let mut odd = file_exists_fact("r", "whatever");
        odd.source = FactSource::Unknown;

        let ops = FactOperations {
            all: vec![odd, file_exists_fact("r", "Dockerfile")],
            ..FactOperations::default()
        };
        assert!((engine.evaluate(&ops).await.unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_inspect_with_unknown_source_is_fatal() {
        let host = StubHost::default();
        let engine = FactEngine::new(&host, []).unwrap();

        let mut fact = file_exists_fact("r", "x");
        fact.source = FactSource::Unknown;
        let ops = FactOperations {
            inspect: Some(fact),
            ..FactOperations::default()
        };
        assert!(engine.evaluate(&ops).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_fact_type_is_fatal() {
        let host = StubHost::default();
        let engine = FactEngine::new(&host, []).unwrap();

        let mut fact = file_exists_fact("r", "x");
        fact.fact_type = FactType::Unknown;
        let ops = FactOperations {
            all: vec![fact],
            ..FactOperations::default()
        };
        assert!(engine.evaluate(&ops).await.is_err());
    }
}
