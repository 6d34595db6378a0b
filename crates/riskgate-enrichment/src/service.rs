//! Enrichment service: provider registry, cache and timeouts

use futures::FutureExt;
use riskgate_core::{ConfigHandle, CrossRiskLevel, Deadline, Result, RiskError, SharedClock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cache::EnrichmentCache;
use crate::provider::{EnrichmentProvider, EnrichmentRequest, EnrichmentResponse};

/// Result of one enrichment call
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// The provider (or the cache) answered
    Fetched {
        /// The answer
        response: EnrichmentResponse,
        /// Whether it came from the cache
        cache_hit: bool,
    },
    /// The provider did not answer within the budget
    TimedOut {
        /// Provider name
        provider: String,
    },
    /// The provider returned an error or an unusable payload
    Failed {
        /// Provider name
        provider: String,
        /// Error description
        reason: String,
    },
    /// No provider is registered under the requested name
    UnknownProvider {
        /// Requested provider name
        provider: String,
    },
}

impl EnrichmentOutcome {
    /// The response, when one was obtained
    pub fn response(&self) -> Option<&EnrichmentResponse> {
        match self {
            EnrichmentOutcome::Fetched { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Reported risk level, when a response carried one
    pub fn risk_level(&self) -> Option<CrossRiskLevel> {
        self.response().and_then(|r| r.risk_level)
    }

    /// Whether a response was obtained
    pub fn is_fetched(&self) -> bool {
        matches!(self, EnrichmentOutcome::Fetched { .. })
    }

    /// Whether the call failed to produce data for any reason
    pub fn is_unavailable(&self) -> bool {
        !self.is_fetched()
    }
}

impl fmt::Display for EnrichmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentOutcome::Fetched { response, cache_hit } => write!(
                f,
                "{} answered (cache_hit={cache_hit})",
                response.provider
            ),
            EnrichmentOutcome::TimedOut { provider } => write!(f, "{provider} timed out"),
            EnrichmentOutcome::Failed { provider, reason } => write!(f, "{provider} failed: {reason}"),
            EnrichmentOutcome::UnknownProvider { provider } => write!(f, "unknown provider {provider}"),
        }
    }
}

/// Time-bounded, cached access to registered providers
///
/// Requests with contextual parameters skip the cache in both directions.
/// Never returns an error: every failure becomes an [`EnrichmentOutcome`].
pub struct EnrichmentService {
    providers: BTreeMap<String, Arc<dyn EnrichmentProvider>>,
    cache: Arc<EnrichmentCache>,
    config: ConfigHandle,
    clock: SharedClock,
}

impl fmt::Debug for EnrichmentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentService")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl EnrichmentService {
    /// Service with no providers and a cache using the configured TTL
    pub fn new(config: ConfigHandle, clock: SharedClock) -> Self {
        let ttl = config.current().enrichment.ttl();
        Self {
            providers: BTreeMap::new(),
            cache: Arc::new(EnrichmentCache::new(ttl, Arc::clone(&clock))),
            config,
            clock,
        }
    }

    /// Register `provider` under its name; names must be unique
    pub fn register(&mut self, provider: Arc<dyn EnrichmentProvider>) -> Result<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(RiskError::invalid(format!("provider '{name}' already registered")));
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_provider(mut self, provider: Arc<dyn EnrichmentProvider>) -> Result<Self> {
        self.register(provider)?;
        Ok(self)
    }

    /// Registered provider names
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// The shared cache
    pub fn cache(&self) -> &Arc<EnrichmentCache> {
        &self.cache
    }

    /// Enrich with the configured timeout
    #[instrument(skip_all, fields(provider = %request.provider, data_type = %request.data_type))]
    pub async fn enrich(&self, request: &EnrichmentRequest) -> EnrichmentOutcome {
        self.run(request, None).await
    }

    /// Enrich, giving up at `deadline` if it comes before the timeout
    #[instrument(skip_all, fields(provider = %request.provider, data_type = %request.data_type))]
    pub async fn enrich_with_deadline(
        &self,
        request: &EnrichmentRequest,
        deadline: Deadline,
    ) -> EnrichmentOutcome {
        self.run(request, Some(deadline)).await
    }

    async fn run(&self, request: &EnrichmentRequest, deadline: Option<Deadline>) -> EnrichmentOutcome {
        let Some(provider) = self.providers.get(&request.provider).cloned() else {
            warn!("no enrichment provider registered under this name");
            return EnrichmentOutcome::UnknownProvider {
                provider: request.provider.clone(),
            };
        };

        let settings = self.config.current().enrichment.clone();
        self.cache.set_ttl(settings.ttl());
        let budget = settings.timeout();
        let budget: Duration = deadline.map_or(budget, |d| d.clamp(budget));

        let lookup = AssertUnwindSafe(self.lookup(provider, request)).catch_unwind();
        let outcome = match tokio::time::timeout(budget, lookup).await {
            Ok(Ok(Ok((payload, cache_hit)))) => EnrichmentOutcome::Fetched {
                response: EnrichmentResponse::from_payload(request, payload, self.clock.now()),
                cache_hit,
            },
            Ok(Ok(Err(err))) => EnrichmentOutcome::Failed {
                provider: request.provider.clone(),
                reason: err.to_string(),
            },
            Ok(Err(_panic)) => EnrichmentOutcome::Failed {
                provider: request.provider.clone(),
                reason: "provider panicked".to_string(),
            },
            Err(_elapsed) => EnrichmentOutcome::TimedOut {
                provider: request.provider.clone(),
            },
        };

        match &outcome {
            EnrichmentOutcome::Fetched { cache_hit, response } => {
                debug!(cache_hit, risk_level = ?response.risk_level, "enrichment complete");
            }
            other => warn!(outcome = %other, "enrichment unavailable"),
        }
        outcome
    }

    async fn lookup(
        &self,
        provider: Arc<dyn EnrichmentProvider>,
        request: &EnrichmentRequest,
    ) -> Result<(Value, bool)> {
        let provider = provider.as_ref();
        let fetch = || async move {
            let payload = provider.fetch(request).await?;
            if payload.is_null() {
                return Err(RiskError::enrichment(format!(
                    "provider '{}' returned an empty payload",
                    request.provider
                )));
            }
            Ok(payload)
        };

        if request.bypasses_cache() {
            return Ok((fetch().await?, false));
        }
        self.cache
            .get_or_fetch(&request.data_type, &request.provider, &request.subject_id, fetch)
            .await
    }
}
