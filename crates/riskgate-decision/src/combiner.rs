//! Cross-system risk combination
//!
//! Blends the rule engine's implied risk with external enrichment risk:
//!
//! ```text
//! internal = max declared level of triggered rules   (Low when none)
//! external = strictest level reported by providers    (optional)
//! final    = 0.7 × internal + 0.3 × external          (internal alone if absent)
//! ```
//!
//! Ordinals run 1 (VeryLow) to 5 (VeryHigh) and the blend is re-bucketed
//! with [`CrossRiskLevel::from_score`]. When the rule engine could not run
//! or an enrichment call failed, the combiner answers Medium with one
//! synthetic factor naming the failures.

use riskgate_core::{CombinerSettings, ConfigHandle, CrossRiskLevel};
use riskgate_enrichment::EnrichmentOutcome;
use riskgate_rules::ValidationReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Weight of the rule engine's verdict in the blend
pub const INTERNAL_WEIGHT: f64 = 0.7;

/// Weight of the external risk level in the blend
pub const EXTERNAL_WEIGHT: f64 = 0.3;

/// Internal level when no rule was triggered
pub const UNTRIGGERED_LEVEL: CrossRiskLevel = CrossRiskLevel::Low;

/// Level returned when an input is unavailable
pub const FALLBACK_LEVEL: CrossRiskLevel = CrossRiskLevel::Medium;

/// Where a risk factor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorSource {
    /// A triggered validation rule
    Rule,
    /// An external provider's reported level
    Enrichment,
    /// The combiner itself (fallback)
    Combiner,
}

/// Kind of external provider consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSource {
    /// Credit bureau
    Bureau,
    /// ML signal enhancer
    MlEnhancer,
}

impl fmt::Display for ExternalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalSource::Bureau => f.write_str("bureau"),
            ExternalSource::MlEnhancer => f.write_str("ml_enhancer"),
        }
    }
}

/// One external lookup and what came back
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalAssessment {
    /// Kind of provider
    pub source: ExternalSource,
    /// Result of the lookup
    pub outcome: EnrichmentOutcome,
}

/// What the rule engine produced
#[derive(Debug, Clone, PartialEq)]
pub enum RuleVerdict {
    /// The engine ran
    Evaluated(ValidationReport),
    /// The engine did not run
    Unavailable {
        /// Why
        reason: String,
    },
}

impl RuleVerdict {
    /// The report, when the engine ran
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            RuleVerdict::Evaluated(report) => Some(report),
            RuleVerdict::Unavailable { .. } => None,
        }
    }
}

/// Explanation entry of a combined decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Origin of the factor
    pub source: FactorSource,
    /// Rule id or provider name
    pub reference: String,
    /// Short name
    pub name: String,
    /// What was found
    pub description: String,
    /// Declared or reported level
    pub severity: CrossRiskLevel,
    /// Configured score-impact hint for `severity`
    pub score_impact: f64,
}

/// Final cross-system verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedDecision {
    /// Re-bucketed blended level
    pub final_risk_level: CrossRiskLevel,
    /// Ordered explanation
    pub risk_factors: Vec<RiskFactor>,
    /// Whether an ML enhancer level contributed
    pub ml_enhanced: bool,
    /// Level reported by the credit bureau, if any
    pub bureau_risk_level: Option<CrossRiskLevel>,
    /// Blended ordinal score before re-bucketing
    pub blended_score: f64,
    /// Time spent producing the decision
    pub processing_time_ms: u64,
}

impl CombinedDecision {
    /// Whether this is the fail-safe answer
    pub fn is_fallback(&self) -> bool {
        self.risk_factors
            .iter()
            .any(|factor| factor.source == FactorSource::Combiner)
    }
}

/// `INTERNAL_WEIGHT × internal + EXTERNAL_WEIGHT × external`
pub fn blend(internal: CrossRiskLevel, external: Option<CrossRiskLevel>) -> f64 {
    let internal = f64::from(internal.ordinal());
    match external {
        Some(external) => INTERNAL_WEIGHT * internal + EXTERNAL_WEIGHT * f64::from(external.ordinal()),
        None => internal,
    }
}

/// Blends rule-engine and external risk into a [`CombinedDecision`]
#[derive(Debug, Clone, Default)]
pub struct CrossSystemRiskCombiner {
    config: ConfigHandle,
}

impl CrossSystemRiskCombiner {
    /// Combiner reading score-impact hints from `config`
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }

    /// Combine, timing from now
    pub fn combine(&self, rules: &RuleVerdict, external: &[ExternalAssessment]) -> CombinedDecision {
        self.combine_from(Instant::now(), rules, external)
    }

    /// Combine, reporting processing time since `started`
    #[instrument(skip_all)]
    pub fn combine_from(
        &self,
        started: Instant,
        rules: &RuleVerdict,
        external: &[ExternalAssessment],
    ) -> CombinedDecision {
        let settings = self.config.current().combiner.clone();
        let bureau_risk_level = strictest(external, Some(ExternalSource::Bureau));

        let mut failures = Vec::new();
        if let RuleVerdict::Unavailable { reason } = rules {
            failures.push(format!("rule evaluation unavailable: {reason}"));
        }
        for assessment in external.iter().filter(|a| a.outcome.is_unavailable()) {
            failures.push(format!("{} enrichment unavailable: {}", assessment.source, assessment.outcome));
        }

        if !failures.is_empty() {
            warn!(failures = failures.len(), "combining with unavailable inputs; falling back");
            let description = failures.join("; ");
            return CombinedDecision {
                final_risk_level: FALLBACK_LEVEL,
                risk_factors: vec![RiskFactor {
                    source: FactorSource::Combiner,
                    reference: "fallback".to_string(),
                    name: "Incomplete risk inputs".to_string(),
                    description,
                    severity: FALLBACK_LEVEL,
                    score_impact: settings.score_impact(FALLBACK_LEVEL),
                }],
                ml_enhanced: false,
                bureau_risk_level,
                blended_score: f64::from(FALLBACK_LEVEL.ordinal()),
                processing_time_ms: elapsed_ms(started),
            };
        }

        let mut risk_factors = rule_factors(rules.report(), &settings);
        let internal = risk_factors
            .iter()
            .map(|factor| factor.severity)
            .max()
            .unwrap_or(UNTRIGGERED_LEVEL);

        let external_level = strictest(external, None);
        risk_factors.extend(enrichment_factors(external, &settings));
        let ml_enhanced = strictest(external, Some(ExternalSource::MlEnhancer)).is_some();

        let blended_score = blend(internal, external_level);
        let final_risk_level = CrossRiskLevel::from_score(blended_score);
        debug!(
            internal = %internal,
            external = ?external_level,
            blended = blended_score,
            level = %final_risk_level,
            "cross-system risk combined"
        );

        CombinedDecision {
            final_risk_level,
            risk_factors,
            ml_enhanced,
            bureau_risk_level,
            blended_score,
            processing_time_ms: elapsed_ms(started),
        }
    }
}

/// One factor per triggered rule, in report order
fn rule_factors(report: Option<&ValidationReport>, settings: &CombinerSettings) -> Vec<RiskFactor> {
    let Some(report) = report else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    let mut factors = Vec::new();
    for result in report.triggered() {
        if !seen.insert(result.rule_id.as_str()) {
            continue;
        }
        let (name, description, severity) = match report.rule(&result.rule_id) {
            Some(rule) => (
                rule.name.clone(),
                format!("{}: {}", rule.description, result.message),
                rule.risk_level,
            ),
            None => (
                result.rule_id.clone(),
                result.message.clone(),
                result.severity.implied_risk(),
            ),
        };
        factors.push(RiskFactor {
            source: FactorSource::Rule,
            reference: result.rule_id.clone(),
            name,
            description,
            severity,
            score_impact: settings.score_impact(severity),
        });
    }
    factors
}

fn enrichment_factors(external: &[ExternalAssessment], settings: &CombinerSettings) -> Vec<RiskFactor> {
    external
        .iter()
        .filter_map(|assessment| {
            let response = assessment.outcome.response()?;
            let level = response.risk_level?;
            Some(RiskFactor {
                source: FactorSource::Enrichment,
                reference: response.provider.clone(),
                name: format!("{} risk", assessment.source),
                description: format!("{} reported {} for {}", response.provider, level, response.data_type),
                severity: level,
                score_impact: settings.score_impact(level),
            })
        })
        .collect()
}

fn strictest(external: &[ExternalAssessment], source: Option<ExternalSource>) -> Option<CrossRiskLevel> {
    external
        .iter()
        .filter(|a| source.map_or(true, |s| a.source == s))
        .filter_map(|a| a.outcome.risk_level())
        .max()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
