//! Enrichment service behavior: caching, expiry and failure isolation

use assert_matches::assert_matches;
use riskgate_core::{ConfigHandle, CrossRiskLevel, Deadline, RiskConfig};
use riskgate_enrichment::{EnrichmentOutcome, EnrichmentRequest, EnrichmentService};
use riskgate_testkit::{epoch_time, ManualClock, StubProvider};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn service(provider: Arc<StubProvider>) -> (Arc<ManualClock>, EnrichmentService) {
    let (clock, shared) = ManualClock::shared(epoch_time());
    let service = EnrichmentService::new(ConfigHandle::default(), shared)
        .with_provider(provider)
        .unwrap();
    (clock, service)
}

fn credit(subject: &str) -> EnrichmentRequest {
    EnrichmentRequest::new(subject, "credit_report", "bureau")
}

#[tokio::test]
async fn second_lookup_is_served_from_cache() {
    let provider = Arc::new(StubProvider::reporting("bureau", "HIGH"));
    let (_, service) = service(provider.clone());

    let first = service.enrich(&credit("user-1")).await;
    let second = service.enrich(&credit("user-1")).await;

    assert_matches!(first, EnrichmentOutcome::Fetched { cache_hit: false, .. });
    assert_matches!(second, EnrichmentOutcome::Fetched { cache_hit: true, .. });
    assert_eq!(second.risk_level(), Some(CrossRiskLevel::High));
    assert_eq!(provider.calls(), 1);

    let stats = service.cache().stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[tokio::test]
async fn cache_keys_separate_subjects() {
    let provider = Arc::new(StubProvider::reporting("bureau", "LOW"));
    let (_, service) = service(provider.clone());

    service.enrich(&credit("user-1")).await;
    service.enrich(&credit("user-2")).await;

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let provider = Arc::new(StubProvider::reporting("bureau", "MEDIUM"));
    let (clock, service) = service(provider.clone());

    service.enrich(&credit("user-1")).await;
    clock.advance_secs(900);
    assert_matches!(
        service.enrich(&credit("user-1")).await,
        EnrichmentOutcome::Fetched { cache_hit: true, .. }
    );

    clock.advance_secs(1);
    assert_matches!(
        service.enrich(&credit("user-1")).await,
        EnrichmentOutcome::Fetched { cache_hit: false, .. }
    );
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn purge_drops_only_expired_entries() {
    let provider = Arc::new(StubProvider::reporting("bureau", "MEDIUM"));
    let (clock, service) = service(provider);

    service.enrich(&credit("old")).await;
    clock.advance_secs(600);
    service.enrich(&credit("fresh")).await;
    clock.advance_secs(600);

    assert_eq!(service.cache().purge_expired(), 1);
    assert_eq!(service.cache().stats().entries, 1);
}

#[tokio::test]
async fn contextual_parameters_skip_the_cache() {
    let provider = Arc::new(StubProvider::reporting("bureau", "LOW"));
    let (_, service) = service(provider.clone());
    let request = credit("user-1").with_param("amount", 5_000);

    service.enrich(&request).await;
    let again = service.enrich(&request).await;

    assert_matches!(again, EnrichmentOutcome::Fetched { cache_hit: false, .. });
    assert_eq!(provider.calls(), 2);
    assert_eq!(service.cache().stats().entries, 0);
}

#[tokio::test]
async fn provider_errors_are_outcomes_and_not_cached() {
    let provider = Arc::new(StubProvider::failing("bureau"));
    let (_, service) = service(provider.clone());

    let outcome = service.enrich(&credit("user-1")).await;
    assert_matches!(outcome, EnrichmentOutcome::Failed { ref provider, .. } if provider == "bureau");
    assert!(outcome.is_unavailable());

    service.enrich(&credit("user-1")).await;
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn null_payload_counts_as_failure() {
    let provider = Arc::new(StubProvider::answering("bureau", serde_json::Value::Null));
    let (_, service) = service(provider);

    assert_matches!(
        service.enrich(&credit("user-1")).await,
        EnrichmentOutcome::Failed { .. }
    );
}

#[tokio::test]
async fn unrecognised_risk_level_is_left_unset() {
    let provider = Arc::new(StubProvider::answering("bureau", json!({ "risk_level": "SPICY" })));
    let (_, service) = service(provider);

    let outcome = service.enrich(&credit("user-1")).await;
    assert!(outcome.is_fetched());
    assert_eq!(outcome.risk_level(), None);
}

#[tokio::test(start_paused = true)]
async fn hanging_provider_times_out() {
    let provider = Arc::new(StubProvider::hanging("bureau", Duration::from_secs(30)));
    let (_, service) = service(provider);

    let outcome = service.enrich(&credit("user-1")).await;

    assert_matches!(outcome, EnrichmentOutcome::TimedOut { .. });
    assert!(outcome.is_unavailable());
    assert_eq!(service.cache().stats().entries, 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_shortens_the_provider_budget() {
    let provider = Arc::new(StubProvider::hanging("bureau", Duration::from_millis(500)));
    let (_, service) = service(provider);

    let patient = service.enrich(&credit("user-1")).await;
    assert!(patient.is_fetched());

    let hurried = service
        .enrich_with_deadline(&credit("user-2"), Deadline::after(Duration::from_millis(100)))
        .await;
    assert_matches!(hurried, EnrichmentOutcome::TimedOut { .. });
}

#[tokio::test]
async fn ttl_follows_configuration_changes() {
    let provider = Arc::new(StubProvider::reporting("bureau", "LOW"));
    let (clock, shared) = ManualClock::shared(epoch_time());
    let config = ConfigHandle::default();
    let service = EnrichmentService::new(config.clone(), shared)
        .with_provider(provider.clone())
        .unwrap();

    let mut short = RiskConfig::default();
    short.enrichment.ttl_secs = 10;
    config.replace(short).unwrap();

    service.enrich(&credit("user-1")).await;
    clock.advance_secs(10);
    assert_matches!(
        service.enrich(&credit("user-1")).await,
        EnrichmentOutcome::Fetched { cache_hit: true, .. }
    );
    clock.advance_secs(1);
    service.enrich(&credit("user-1")).await;

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn shortened_ttl_expires_entries_already_cached() {
    let provider = Arc::new(StubProvider::reporting("bureau", "LOW"));
    let (clock, shared) = ManualClock::shared(epoch_time());
    let config = ConfigHandle::default();
    let service = EnrichmentService::new(config.clone(), shared)
        .with_provider(provider.clone())
        .unwrap();

    service.enrich(&credit("user-1")).await;

    let mut short = RiskConfig::default();
    short.enrichment.ttl_secs = 10;
    config.replace(short).unwrap();
    clock.advance_secs(11);

    assert_matches!(
        service.enrich(&credit("user-1")).await,
        EnrichmentOutcome::Fetched { cache_hit: false, .. }
    );
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn unknown_provider_is_reported() {
    let provider = Arc::new(StubProvider::reporting("bureau", "LOW"));
    let (_, service) = service(provider);

    let outcome = service
        .enrich(&EnrichmentRequest::new("user-1", "score", "nobody"))
        .await;
    assert_matches!(outcome, EnrichmentOutcome::UnknownProvider { .. });
}
