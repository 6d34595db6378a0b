//! End-to-end decision pipeline
//!
//! ```text
//!            ┌─► RiskAggregator (local signals) ──────────────┐
//! context ───┼─► RuleEvaluationEngine (policies + rules) ─────┼─► combiner ─► DecisionReport
//!            └─► EnrichmentService (bureau, ML enhancer) ─────┘
//! ```
//!
//! The three branches run concurrently under the caller's deadline. The
//! required factors come from the stricter of the local level and the
//! combined level.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use riskgate_core::{
    AuthContext, ConfigHandle, Deadline, RiskAssessment, RiskLevel, SharedClock,
};
use riskgate_enrichment::{EnrichmentRequest, EnrichmentService};
use riskgate_policy::PolicyResolver;
use riskgate_rules::{RuleEvaluationEngine, RuleRegistry, ValidationReport};
use riskgate_signals::{RiskAggregator, SignalRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, instrument};

use crate::combiner::{
    CombinedDecision, CrossSystemRiskCombiner, ExternalAssessment, ExternalSource, RuleVerdict,
};

/// Context attribute whose object is sent as contextual enrichment parameters
pub const ENRICHMENT_PARAMS_ATTRIBUTE: &str = "enrichment_params";

/// An external lookup made for every decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLookup {
    /// Kind of provider
    pub source: ExternalSource,
    /// Registered provider name
    pub provider: String,
    /// Data type requested
    pub data_type: String,
}

impl ExternalLookup {
    /// Build a lookup
    pub fn new(source: ExternalSource, provider: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            source,
            provider: provider.into(),
            data_type: data_type.into(),
        }
    }

    fn request(&self, context: &AuthContext) -> EnrichmentRequest {
        let mut request = EnrichmentRequest::new(&context.subject_id, &self.data_type, &self.provider);
        if let Some(Value::Object(params)) = context.attribute(ENRICHMENT_PARAMS_ATTRIBUTE) {
            request.context_params = Some(params.clone());
        }
        request
    }
}

/// Everything known about one decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionReport {
    /// Subject of the attempt
    pub subject_id: String,
    /// Session of the attempt
    pub session_id: String,
    /// Level the required factors were derived from
    pub risk_level: RiskLevel,
    /// Factors the subject must present
    pub required_factors: Vec<String>,
    /// Local signal assessment
    pub assessment: RiskAssessment,
    /// Rule evaluation, when it ran
    pub validation: Option<ValidationReport>,
    /// Cross-system verdict
    pub combined: CombinedDecision,
    /// Sub-evaluations that did not complete (`signal:`, `rule:`, `enrichment:` prefixed)
    pub incomplete: Vec<String>,
    /// When the decision was made
    pub decided_at: DateTime<Utc>,
    /// Wall time of the whole pipeline
    pub processing_time_ms: u64,
}

impl DecisionReport {
    /// Whether every sub-evaluation completed
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }
}

/// Shared decision pipeline, built once and reused across requests
#[derive(Debug, Clone)]
pub struct RiskGate {
    aggregator: RiskAggregator,
    rules: RuleEvaluationEngine,
    enrichment: Option<Arc<EnrichmentService>>,
    lookups: Vec<ExternalLookup>,
    combiner: CrossSystemRiskCombiner,
    config: ConfigHandle,
    clock: SharedClock,
}

impl RiskGate {
    /// Assemble a gate from its parts; no enrichment until configured
    pub fn new(
        aggregator: RiskAggregator,
        rules: RuleEvaluationEngine,
        config: ConfigHandle,
        clock: SharedClock,
    ) -> Self {
        Self {
            aggregator,
            rules,
            enrichment: None,
            lookups: Vec::new(),
            combiner: CrossSystemRiskCombiner::new(config.clone()),
            config,
            clock,
        }
    }

    /// Gate with every built-in processor and rule
    pub fn with_builtins(config: ConfigHandle, resolver: Arc<PolicyResolver>, clock: SharedClock) -> Self {
        let aggregator = RiskAggregator::new(SignalRegistry::with_builtins(), config.clone(), Arc::clone(&clock));
        let rules = RuleEvaluationEngine::new(
            RuleRegistry::with_builtins(),
            resolver,
            config.clone(),
            Arc::clone(&clock),
        );
        Self::new(aggregator, rules, config, clock)
    }

    /// Consult `service` for each of `lookups` on every decision
    pub fn with_enrichment(mut self, service: Arc<EnrichmentService>, lookups: Vec<ExternalLookup>) -> Self {
        self.enrichment = Some(service);
        self.lookups = lookups;
        self
    }

    /// Decide with per-component budgets only
    #[instrument(skip_all, fields(session_id = %context.session_id))]
    pub async fn decide(&self, context: &AuthContext) -> DecisionReport {
        self.run(context, None).await
    }

    /// Decide, returning a best-effort report once `deadline` passes
    #[instrument(skip_all, fields(session_id = %context.session_id))]
    pub async fn decide_with_deadline(&self, context: &AuthContext, deadline: Deadline) -> DecisionReport {
        self.run(context, Some(deadline)).await
    }

    async fn run(&self, context: &AuthContext, deadline: Option<Deadline>) -> DecisionReport {
        let started = Instant::now();
        let config = self.config.current();

        let signals = async {
            match deadline {
                Some(deadline) => self.aggregator.evaluate_with_deadline(context, deadline).await,
                None => self.aggregator.evaluate(context).await,
            }
        };
        let rules = async {
            match deadline {
                Some(deadline) if deadline.is_expired() => RuleVerdict::Unavailable {
                    reason: "deadline expired before rule evaluation".to_string(),
                },
                Some(deadline) => {
                    RuleVerdict::Evaluated(self.rules.evaluate_with_deadline(context, deadline).await)
                }
                None => RuleVerdict::Evaluated(self.rules.evaluate(context).await),
            }
        };
        let external = self.enrich(context, deadline);
        let (assessment, verdict, external) = tokio::join!(signals, rules, external);

        let combined = self.combiner.combine_from(started, &verdict, &external);

        let combined_level = combined.final_risk_level.to_risk_level();
        let risk_level = assessment.level.max(combined_level);
        let required_factors = config.required_factors(risk_level);

        let mut incomplete: Vec<String> = assessment
            .skipped_processors
            .iter()
            .map(|name| format!("signal:{name}"))
            .collect();
        match &verdict {
            RuleVerdict::Evaluated(report) => {
                incomplete.extend(report.incomplete_rules.iter().map(|id| format!("rule:{id}")));
            }
            RuleVerdict::Unavailable { .. } => incomplete.push("rule:*".to_string()),
        }
        incomplete.extend(
            external
                .iter()
                .filter(|a| a.outcome.is_unavailable())
                .map(|a| format!("enrichment:{}", a.source)),
        );

        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            local = %assessment.level,
            combined = %combined.final_risk_level,
            level = %risk_level,
            factors = required_factors.len(),
            incomplete = incomplete.len(),
            elapsed_ms = processing_time_ms,
            "risk decision made"
        );

        DecisionReport {
            subject_id: context.subject_id.clone(),
            session_id: context.session_id.clone(),
            risk_level,
            required_factors,
            assessment,
            validation: match verdict {
                RuleVerdict::Evaluated(report) => Some(report),
                RuleVerdict::Unavailable { .. } => None,
            },
            combined,
            incomplete,
            decided_at: self.clock.now(),
            processing_time_ms,
        }
    }

    async fn enrich(&self, context: &AuthContext, deadline: Option<Deadline>) -> Vec<ExternalAssessment> {
        let Some(service) = &self.enrichment else {
            return Vec::new();
        };
        let lookups = self.lookups.iter().map(|lookup| async move {
            let request = lookup.request(context);
            let outcome = match deadline {
                Some(deadline) => service.enrich_with_deadline(&request, deadline).await,
                None => service.enrich(&request).await,
            };
            ExternalAssessment {
                source: lookup.source,
                outcome,
            }
        });
        join_all(lookups).await
    }
}
