//! Rule evaluation engine
//!
//! ```text
//! AuthContext ─► resolve policy per framework ─► select applicable rules
//!             ─► drop disabled rules ─► run concurrently (timeout + panic guard)
//!             ─► apply severity overrides ─► score ─► ValidationReport
//! ```
//!
//! One slow or failing rule never blocks the others. A rule that errors is
//! reported as a synthetic `Error` result; a rule that runs out of time is
//! listed in `incomplete_rules` and left out of scoring.

use futures::future::join_all;
use futures::FutureExt;
use riskgate_core::{AuthContext, ConfigHandle, Deadline, SharedClock};
use riskgate_policy::PolicyResolver;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::registry::RuleRegistry;
use crate::result::{
    AppliedPolicy, EvaluatedRule, ValidationReport, ValidationResult, ValidationStatus,
};
use crate::rule::{RuleOutcome, RuleOverride, ValidationContext, ValidationRule};
use crate::scoring::{adjust_for_benchmark, overall_status, raw_score, IndustryBenchmarks};

/// Selects, runs and scores validation rules for a context
#[derive(Debug, Clone)]
pub struct RuleEvaluationEngine {
    registry: RuleRegistry,
    resolver: Arc<PolicyResolver>,
    config: ConfigHandle,
    clock: SharedClock,
    benchmarks: IndustryBenchmarks,
}

impl RuleEvaluationEngine {
    /// Create an engine with the default industry benchmarks
    pub fn new(
        registry: RuleRegistry,
        resolver: Arc<PolicyResolver>,
        config: ConfigHandle,
        clock: SharedClock,
    ) -> Self {
        Self {
            registry,
            resolver,
            config,
            clock,
            benchmarks: IndustryBenchmarks::default(),
        }
    }

    /// Replace the industry benchmarks
    pub fn with_benchmarks(mut self, benchmarks: IndustryBenchmarks) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    /// The registered rules
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Evaluate `context` with per-rule budgets only
    #[instrument(skip_all, fields(session_id = %context.session_id, region = %context.region))]
    pub async fn evaluate(&self, context: &AuthContext) -> ValidationReport {
        self.run(context, None).await
    }

    /// Evaluate `context`, reporting rules that miss `deadline` as incomplete
    #[instrument(skip_all, fields(session_id = %context.session_id, region = %context.region))]
    pub async fn evaluate_with_deadline(
        &self,
        context: &AuthContext,
        deadline: Deadline,
    ) -> ValidationReport {
        self.run(context, Some(deadline)).await
    }

    /// Resolve the policy of every framework in `context`
    pub fn prepare(&self, context: &AuthContext) -> (ValidationContext, Vec<AppliedPolicy>) {
        let mut validation = ValidationContext::new(context.clone());
        let mut applied = Vec::with_capacity(context.frameworks.len());
        for &framework in &context.frameworks {
            let resolution = self
                .resolver
                .resolve(context.region, framework, Some(context.industry));
            match resolution.into_policy() {
                Some(policy) => {
                    applied.push(AppliedPolicy {
                        framework,
                        policy_id: Some(policy.id.clone()),
                        policy_version: Some(policy.version),
                    });
                    validation = validation.with_policy(policy);
                }
                None => applied.push(AppliedPolicy {
                    framework,
                    policy_id: None,
                    policy_version: None,
                }),
            }
        }
        (validation, applied)
    }

    async fn run(&self, context: &AuthContext, deadline: Option<Deadline>) -> ValidationReport {
        let config = self.config.current();
        let (validation, applied) = self.prepare(context);
        let overrides = collect_overrides(&validation);

        let selected: Vec<Arc<dyn ValidationRule>> = self
            .registry
            .applicable(context)
            .into_iter()
            .filter(|rule| {
                let disabled =
                    overrides.get(&rule.descriptor().id) == Some(&RuleOverride::Disabled);
                if disabled {
                    debug!(rule = %rule.descriptor().id, "rule disabled by policy override");
                }
                !disabled
            })
            .collect();

        let budget = config.rule_timeout();
        let budget = deadline.map_or(budget, |d| d.clamp(budget));
        let outcomes = join_all(
            selected
                .iter()
                .map(|rule| run_rule(Arc::clone(rule), &validation, budget)),
        )
        .await;

        let mut results = Vec::new();
        let mut incomplete = Vec::new();
        for outcome in outcomes {
            match outcome {
                RuleOutcome::Completed(rule_results) => results.extend(rule_results),
                RuleOutcome::Failed { rule, reason } => {
                    warn!(rule = %rule, error = %reason, "validation rule failed");
                    results.push(ValidationResult::error(rule, format!("rule failed: {reason}")));
                }
                RuleOutcome::TimedOut { rule } => {
                    warn!(rule = %rule, "validation rule timed out");
                    incomplete.push(rule);
                }
            }
        }
        // Synthetic Error results keep their fixed severity
        for result in results.iter_mut().filter(|r| r.status != ValidationStatus::Error) {
            if let Some(RuleOverride::Severity(severity)) = overrides.get(&result.rule_id) {
                result.severity = *severity;
            }
        }

        let rules = selected
            .iter()
            .map(|rule| {
                let d = rule.descriptor();
                EvaluatedRule {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    description: d.description.clone(),
                    risk_level: d.risk_level,
                }
            })
            .collect();

        let report = self.build_report(context, applied, rules, results, incomplete);
        debug!(
            score = report.compliance_score,
            status = %report.overall_status,
            results = report.results.len(),
            incomplete = report.incomplete_rules.len(),
            "rule evaluation complete"
        );
        report
    }

    fn build_report(
        &self,
        context: &AuthContext,
        policies: Vec<AppliedPolicy>,
        rules: Vec<EvaluatedRule>,
        results: Vec<ValidationResult>,
        incomplete_rules: Vec<String>,
    ) -> ValidationReport {
        let count = |status: ValidationStatus| results.iter().filter(|r| r.status == status).count();
        let benchmark = self.benchmarks.for_industry(context.industry);
        let raw = raw_score(&results).unwrap_or(100.0);
        let compliance_score = adjust_for_benchmark(raw, benchmark);

        ValidationReport {
            region: context.region,
            industry: context.industry,
            frameworks: context.frameworks.clone(),
            policies,
            rules,
            passed_count: count(ValidationStatus::Pass),
            failed_count: count(ValidationStatus::Fail),
            warning_count: count(ValidationStatus::Warning),
            error_count: count(ValidationStatus::Error),
            raw_score: raw,
            compliance_score,
            benchmark,
            overall_status: overall_status(&results, compliance_score),
            results,
            incomplete_rules,
            evaluated_at: self.clock.now(),
        }
    }
}

/// Merge `override_rules` of every resolved policy
///
/// A rule disabled by any policy stays disabled; conflicting severities
/// resolve to the highest.
fn collect_overrides(context: &ValidationContext) -> BTreeMap<String, RuleOverride> {
    let mut merged: BTreeMap<String, RuleOverride> = BTreeMap::new();
    for policy in context.policies.values() {
        for (rule_id, directive) in &policy.override_rules {
            let Some(parsed) = RuleOverride::parse(directive) else {
                warn!(policy = %policy.id, rule = %rule_id, directive = %directive, "ignoring unknown rule override");
                continue;
            };
            let next = match (merged.get(rule_id), parsed) {
                (Some(RuleOverride::Disabled), _) => RuleOverride::Disabled,
                (Some(RuleOverride::Severity(current)), RuleOverride::Severity(new)) => {
                    RuleOverride::Severity((*current).max(new))
                }
                (_, parsed) => parsed,
            };
            merged.insert(rule_id.clone(), next);
        }
    }
    merged
}

async fn run_rule(
    rule: Arc<dyn ValidationRule>,
    context: &ValidationContext,
    budget: Duration,
) -> RuleOutcome {
    let id = rule.descriptor().id.clone();
    let guarded = AssertUnwindSafe(rule.validate(context)).catch_unwind();

    match tokio::time::timeout(budget, guarded).await {
        Ok(Ok(Ok(mut results))) => {
            for result in &mut results {
                if result.rule_id.is_empty() {
                    result.rule_id = id.clone();
                }
            }
            RuleOutcome::Completed(results)
        }
        Ok(Ok(Err(err))) => RuleOutcome::Failed {
            rule: id,
            reason: err.to_string(),
        },
        Ok(Err(_panic)) => RuleOutcome::Failed {
            rule: id,
            reason: "rule panicked".to_string(),
        },
        Err(_elapsed) => RuleOutcome::TimedOut { rule: id },
    }
}
