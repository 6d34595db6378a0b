// Loading CLI input files

use anyhow::{Context, Result};
use async_trait::async_trait;
use riskgate_core::{AuthContext, ConfigHandle, RiskConfig, SharedClock};
use riskgate_decision::{ExternalLookup, ExternalSource};
use riskgate_enrichment::{EnrichmentProvider, EnrichmentRequest, EnrichmentService};
use riskgate_policy::{InMemoryPolicyStore, PolicyDraft, PolicyResolver};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One canned provider answer from an `--enrichment` file
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentFixture {
    pub source: ExternalSource,
    pub provider: String,
    pub data_type: String,
    pub payload: Value,
}

/// Provider answering a fixed payload
#[derive(Debug)]
struct FixtureProvider {
    name: String,
    payload: Value,
}

#[async_trait]
impl EnrichmentProvider for FixtureProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _request: &EnrichmentRequest) -> riskgate_core::Result<Value> {
        Ok(self.payload.clone())
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn load_context(path: &Path) -> Result<AuthContext> {
    serde_json::from_str(&read(path)?).with_context(|| format!("parsing context {}", path.display()))
}

/// Configuration from `path` (with `RISKGATE_*` overrides), or the defaults
pub fn load_config(path: Option<&Path>) -> Result<ConfigHandle> {
    match path {
        Some(path) => ConfigHandle::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => {
            let mut config = RiskConfig::default();
            config.merge_with_env().context("applying RISKGATE_* overrides")?;
            Ok(ConfigHandle::new(config))
        }
    }
}

/// Resolver over an in-memory store seeded from a JSON array of drafts
pub fn load_policies(path: Option<&Path>, clock: SharedClock) -> Result<Arc<PolicyResolver>> {
    let resolver = Arc::new(PolicyResolver::new(Arc::new(InMemoryPolicyStore::new()), clock));
    let Some(path) = path else {
        return Ok(resolver);
    };
    let drafts: Vec<PolicyDraft> = serde_json::from_str(&read(path)?)
        .with_context(|| format!("parsing policies {}", path.display()))?;
    let count = drafts.len();
    for draft in drafts {
        let name = draft.name.clone();
        resolver
            .create(draft)
            .with_context(|| format!("creating policy '{name}'"))?;
    }
    info!(count, path = %path.display(), "policies loaded");
    Ok(resolver)
}

/// Enrichment service and lookups built from a JSON array of fixtures
pub fn load_enrichment(
    path: &Path,
    config: ConfigHandle,
    clock: SharedClock,
) -> Result<(Arc<EnrichmentService>, Vec<ExternalLookup>)> {
    let fixtures: Vec<EnrichmentFixture> = serde_json::from_str(&read(path)?)
        .with_context(|| format!("parsing enrichment {}", path.display()))?;
    let mut service = EnrichmentService::new(config, clock);
    let mut lookups = Vec::with_capacity(fixtures.len());
    for fixture in fixtures {
        service
            .register(Arc::new(FixtureProvider {
                name: fixture.provider.clone(),
                payload: fixture.payload,
            }))
            .with_context(|| format!("registering provider '{}'", fixture.provider))?;
        lookups.push(ExternalLookup::new(fixture.source, fixture.provider, fixture.data_type));
    }
    Ok((Arc::new(service), lookups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgate_core::{system_clock, Framework, Region};
    use std::io::Write;

    fn file(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn policies_seed_the_resolver() {
        let f = file(
            r#"[{"name": "eu", "region": "EU", "framework": "GDPR", "slug": "base",
                 "settings": {"authentication_factors": 2}}]"#,
        );
        let resolver = load_policies(Some(f.path()), system_clock()).unwrap();
        let found = resolver.resolve(Region::Eu, Framework::Gdpr, None);
        assert_eq!(found.policy().map(|p| p.id.as_str()), Some("EU:GDPR:base"));
    }

    #[test]
    fn invalid_policy_aborts_loading() {
        let f = file(r#"[{"name": "eu", "region": "EU", "framework": "GDPR"}]"#);
        assert!(load_policies(Some(f.path()), system_clock()).is_err());
    }

    #[test]
    fn enrichment_fixtures_become_lookups() {
        let f = file(
            r#"[{"source": "bureau", "provider": "acme", "data_type": "credit_report",
                 "payload": {"risk_level": "HIGH"}}]"#,
        );
        let (service, lookups) =
            load_enrichment(f.path(), ConfigHandle::default(), system_clock()).unwrap();
        assert_eq!(service.providers().collect::<Vec<_>>(), vec!["acme"]);
        assert_eq!(lookups[0].source, ExternalSource::Bureau);
    }

    #[test]
    fn context_parses_with_defaults() {
        let f = file(r#"{"subject_id": "u", "session_id": "s"}"#);
        let ctx = load_context(f.path()).unwrap();
        assert_eq!(ctx.region, Region::Global);
    }
}
