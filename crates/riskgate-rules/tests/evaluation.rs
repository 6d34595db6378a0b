//! Rule engine behavior: precedence, overrides, isolation and timing

use proptest::prelude::*;
use riskgate_core::{ConfigHandle, Deadline, Framework, Region};
use riskgate_policy::PolicyResolver;
use riskgate_rules::{
    adjust_for_benchmark, raw_score, RuleEvaluationEngine, RuleRegistry, Severity,
    ValidationResult, ValidationRule, ValidationStatus,
};
use riskgate_testkit::{
    compliant_gdpr_context, context, epoch_time, gdpr_draft, resolver, FailingRule, ManualClock,
    StubRule,
};
use std::sync::Arc;
use std::time::Duration;

fn setup() -> Arc<PolicyResolver> {
    let (_, shared) = ManualClock::shared(epoch_time());
    resolver(shared).1
}

fn engine(rules: Vec<Arc<dyn ValidationRule>>, resolver: Arc<PolicyResolver>) -> RuleEvaluationEngine {
    let mut registry = RuleRegistry::new();
    for rule in rules {
        registry.register(rule).unwrap();
    }
    let (_, shared) = ManualClock::shared(epoch_time());
    RuleEvaluationEngine::new(registry, resolver, ConfigHandle::default(), shared)
}

#[tokio::test]
async fn critical_failure_overrides_a_high_score() {
    let mut rules: Vec<Arc<dyn ValidationRule>> = (0..19)
        .map(|i| Arc::new(StubRule::passing(&format!("pass_{i}"), Severity::Critical)) as _)
        .collect();
    rules.push(Arc::new(StubRule::failing("breach", Severity::Critical)));

    let report = engine(rules, setup()).evaluate(&context()).await;

    assert!((report.raw_score - 95.0).abs() < 1e-9);
    assert!(report.compliance_score > 95.0);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.passed_count, 19);
    assert_eq!(report.overall_status, ValidationStatus::Fail);
}

#[tokio::test]
async fn compliant_context_passes_builtin_rules() {
    let resolver = setup();
    resolver.create(gdpr_draft(Region::Eu, "base")).unwrap();
    let (_, shared) = ManualClock::shared(epoch_time());
    let engine = RuleEvaluationEngine::new(
        RuleRegistry::with_builtins(),
        resolver,
        ConfigHandle::default(),
        shared,
    );

    let report = engine.evaluate(&compliant_gdpr_context()).await;

    assert_eq!(report.policies.len(), 1);
    assert_eq!(report.policies[0].framework, Framework::Gdpr);
    assert_eq!(report.policies[0].policy_id.as_deref(), Some("EU:GDPR:base"));
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.error_count, 0);
    assert_eq!(report.compliance_score, 100.0);
    assert_eq!(report.overall_status, ValidationStatus::Pass);
    assert!(report.rule("hipaa_phi_access_logging").is_none());
    assert!(report.rule("consent_recording").is_some());
}

#[tokio::test]
async fn policy_overrides_disable_and_escalate() {
    let resolver = setup();
    resolver
        .create(
            gdpr_draft(Region::Eu, "strict")
                .with_override("noisy", "disabled")
                .with_override("minor", "severity:critical")
                .with_override("other", "mute-for-a-while"),
        )
        .unwrap();
    let noisy = Arc::new(StubRule::failing("noisy", Severity::High));
    let minor = Arc::new(StubRule::failing("minor", Severity::Low));
    let other = Arc::new(StubRule::passing("other", Severity::Low));
    let rules: Vec<Arc<dyn ValidationRule>> = vec![noisy.clone(), minor, other];
    let engine = engine(rules, resolver);

    let ctx = context().with_region(Region::Eu).with_framework(Framework::Gdpr);
    let report = engine.evaluate(&ctx).await;

    assert_eq!(noisy.calls(), 0);
    assert!(report.rule("noisy").is_none());
    let minor_result = report.results.iter().find(|r| r.rule_id == "minor").unwrap();
    assert_eq!(minor_result.severity, Severity::Critical);
    let other_result = report.results.iter().find(|r| r.rule_id == "other").unwrap();
    assert_eq!(other_result.severity, Severity::Low);
    assert_eq!(report.overall_status, ValidationStatus::Fail);
}

#[tokio::test]
async fn erroring_rule_becomes_an_error_result() {
    let rules: Vec<Arc<dyn ValidationRule>> = vec![
        Arc::new(FailingRule::new("broken")),
        Arc::new(StubRule::passing("ok", Severity::Medium)),
    ];

    let report = engine(rules, setup()).evaluate(&context()).await;

    assert_eq!(report.error_count, 1);
    let broken = report.results.iter().find(|r| r.rule_id == "broken").unwrap();
    assert_eq!(broken.status, ValidationStatus::Error);
    assert_eq!(report.triggered().count(), 1);
    assert!(report.is_complete());
    assert!(report.raw_score < 50.0);
}

#[tokio::test]
async fn severity_override_leaves_error_results_at_high() {
    let resolver = setup();
    resolver
        .create(gdpr_draft(Region::Eu, "lenient").with_override("broken", "severity:low"))
        .unwrap();
    let rules: Vec<Arc<dyn ValidationRule>> = vec![Arc::new(FailingRule::new("broken"))];

    let ctx = context().with_region(Region::Eu).with_framework(Framework::Gdpr);
    let report = engine(rules, resolver).evaluate(&ctx).await;

    let broken = report.results.iter().find(|r| r.rule_id == "broken").unwrap();
    assert_eq!(broken.status, ValidationStatus::Error);
    assert_eq!(broken.severity, Severity::High);
}

#[tokio::test(start_paused = true)]
async fn slow_rule_is_incomplete_and_unscored() {
    let slow = Arc::new(StubRule::failing("slow", Severity::Critical).with_delay(Duration::from_secs(5)));
    let rules: Vec<Arc<dyn ValidationRule>> =
        vec![slow, Arc::new(StubRule::passing("fast", Severity::High))];

    let report = engine(rules, setup()).evaluate(&context()).await;

    assert_eq!(report.incomplete_rules, vec!["slow"]);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.compliance_score, 100.0);
    assert_eq!(report.overall_status, ValidationStatus::Pass);
    assert!(report.rule("slow").is_some());
}

#[tokio::test(start_paused = true)]
async fn deadline_cuts_rules_short() {
    let rules: Vec<Arc<dyn ValidationRule>> = vec![
        Arc::new(StubRule::passing("steady", Severity::High).with_delay(Duration::from_millis(400))),
        Arc::new(StubRule::passing("quick", Severity::High)),
    ];
    let engine = engine(rules, setup());

    let relaxed = engine.evaluate(&context()).await;
    assert!(relaxed.is_complete());

    let rushed = engine
        .evaluate_with_deadline(&context(), Deadline::after(Duration::from_millis(100)))
        .await;
    assert_eq!(rushed.incomplete_rules, vec!["steady"]);
}

#[tokio::test]
async fn no_applicable_rules_scores_full_marks() {
    let scoped = riskgate_rules::RuleDescriptor::new("eu_only", "EU only", Severity::High)
        .in_regions([Region::Eu]);
    let rules: Vec<Arc<dyn ValidationRule>> =
        vec![Arc::new(StubRule::scoped(scoped, ValidationStatus::Fail))];

    let report = engine(rules, setup())
        .evaluate(&context().with_region(Region::Us))
        .await;

    assert!(report.results.is_empty());
    assert_eq!(report.raw_score, 100.0);
    assert_eq!(report.overall_status, ValidationStatus::Pass);
}

#[tokio::test]
async fn repeated_evaluation_is_stable() {
    let resolver = setup();
    resolver.create(gdpr_draft(Region::Eu, "base")).unwrap();
    let (_, shared) = ManualClock::shared(epoch_time());
    let engine = RuleEvaluationEngine::new(
        RuleRegistry::with_builtins(),
        resolver,
        ConfigHandle::default(),
        shared,
    );
    let ctx = compliant_gdpr_context().with_attribute("consent_recorded", false);

    let first = engine.evaluate(&ctx).await;
    let second = engine.evaluate(&ctx).await;

    assert_eq!(first, second);
    assert_eq!(first.failed_count, 1);
}

fn arb_result() -> impl Strategy<Value = ValidationResult> {
    let status = prop_oneof![
        Just(ValidationStatus::Pass),
        Just(ValidationStatus::Warning),
        Just(ValidationStatus::Fail),
        Just(ValidationStatus::Error),
        Just(ValidationStatus::NotApplicable),
    ];
    let severity = prop_oneof![
        Just(Severity::Critical),
        Just(Severity::High),
        Just(Severity::Medium),
        Just(Severity::Low),
        Just(Severity::Info),
    ];
    (status, severity)
        .prop_map(|(status, severity)| ValidationResult::new("r", status, severity, ""))
}

proptest! {
    #[test]
    fn scores_stay_within_bounds(
        results in prop::collection::vec(arb_result(), 0..12),
        benchmark in 0.0f64..=100.0,
    ) {
        if let Some(raw) = raw_score(&results) {
            prop_assert!((0.0..=100.0).contains(&raw));
            let adjusted = adjust_for_benchmark(raw, benchmark);
            prop_assert!(adjusted >= raw && adjusted <= 100.0);
        }
    }
}
