//! Resolution tiers and policy lifecycle against the in-memory store

use assert_matches::assert_matches;
use chrono::Duration;
use riskgate_core::{Framework, Industry, Region, RiskError, SharedClock};
use riskgate_policy::{MatchTier, PolicyStatus, PolicyUpdate, Resolution};
use riskgate_testkit::{epoch_time, gdpr_draft, hipaa_draft, resolver, ManualClock};
use std::sync::Arc;

fn clock() -> (Arc<ManualClock>, SharedClock) {
    ManualClock::shared(epoch_time())
}

fn resolved_id(resolution: &Resolution) -> Option<&str> {
    resolution.policy().map(|p| p.id.as_str())
}

#[test]
fn most_specific_tier_wins() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    resolver.create(gdpr_draft(Region::Eu, "base")).unwrap();
    resolver
        .create(gdpr_draft(Region::Eu, "fin").with_industry(Industry::Finance))
        .unwrap();
    resolver.create(gdpr_draft(Region::Global, "world")).unwrap();

    let finance = resolver.resolve(Region::Eu, Framework::Gdpr, Some(Industry::Finance));
    assert_matches!(&finance, Resolution::Found { tier: MatchTier::RegionIndustry, .. });
    assert_eq!(resolved_id(&finance), Some("EU:GDPR:fin"));

    let health = resolver.resolve(Region::Eu, Framework::Gdpr, Some(Industry::Healthcare));
    assert_matches!(&health, Resolution::Found { tier: MatchTier::Region, .. });
    assert_eq!(resolved_id(&health), Some("EU:GDPR:base"));

    let elsewhere = resolver.resolve(Region::Us, Framework::Gdpr, None);
    assert_matches!(&elsewhere, Resolution::Found { tier: MatchTier::GlobalFallback, .. });
    assert_eq!(resolved_id(&elsewhere), Some("GLOBAL:GDPR:world"));

    assert_eq!(resolver.resolve(Region::Eu, Framework::Hipaa, None), Resolution::NotFound);
}

#[test]
fn global_fallback_prefers_industry_match() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    resolver.create(gdpr_draft(Region::Global, "any")).unwrap();
    resolver
        .create(gdpr_draft(Region::Global, "banks").with_industry(Industry::Finance))
        .unwrap();

    let found = resolver.resolve(Region::Brazil, Framework::Gdpr, Some(Industry::Finance));
    assert_eq!(resolved_id(&found), Some("GLOBAL:GDPR:banks"));

    let found = resolver.resolve(Region::Brazil, Framework::Gdpr, Some(Industry::Retail));
    assert_eq!(resolved_id(&found), Some("GLOBAL:GDPR:any"));
}

#[test]
fn global_lookup_does_not_fall_back_to_itself() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    resolver
        .create(gdpr_draft(Region::Global, "banks").with_industry(Industry::Finance))
        .unwrap();

    let found = resolver.resolve(Region::Global, Framework::Gdpr, Some(Industry::Retail));
    assert_eq!(found, Resolution::NotFound);
}

#[test]
fn repeated_lookups_agree() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    for slug in ["b", "a", "c"] {
        resolver.create(gdpr_draft(Region::Eu, slug)).unwrap();
    }

    let first = resolver.resolve(Region::Eu, Framework::Gdpr, None);
    assert_eq!(resolved_id(&first), Some("EU:GDPR:a"));
    for _ in 0..10 {
        assert_eq!(resolver.resolve(Region::Eu, Framework::Gdpr, None), first);
    }
}

#[test]
fn inactive_policy_falls_through_to_global() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    resolver.create(gdpr_draft(Region::Eu, "base")).unwrap();
    resolver.create(gdpr_draft(Region::Global, "world")).unwrap();

    let update = PolicyUpdate {
        status: Some(PolicyStatus::Inactive),
        ..PolicyUpdate::default()
    };
    resolver.update("EU:GDPR:base", update).unwrap();

    let found = resolver.resolve(Region::Eu, Framework::Gdpr, None);
    assert_eq!(resolved_id(&found), Some("GLOBAL:GDPR:world"));
}

#[test]
fn expired_policy_stops_resolving_until_renewed() {
    let (clock, shared) = clock();
    let (_, resolver) = resolver(shared);
    let mut draft = hipaa_draft(Region::Us, "care");
    draft.expires_at = Some(clock.time() + Duration::hours(1));
    resolver.create(draft).unwrap();

    assert!(resolver.resolve(Region::Us, Framework::Hipaa, None).is_found());

    clock.advance(Duration::hours(2));
    assert_eq!(resolver.resolve(Region::Us, Framework::Hipaa, None), Resolution::NotFound);

    let renewed = resolver.renew("US:HIPAA:care", Duration::days(30)).unwrap();
    assert_eq!(renewed.version, 2);
    assert_eq!(renewed.expires_at, Some(clock.time() + Duration::days(30)));
    assert!(resolver.resolve(Region::Us, Framework::Hipaa, None).is_found());
}

#[test]
fn revoked_policy_is_kept_but_never_resolves() {
    let (_, shared) = clock();
    let (store, resolver) = resolver(shared);
    resolver.create(gdpr_draft(Region::Eu, "base")).unwrap();

    assert_matches!(
        resolver.revoke("EU:GDPR:base", "  "),
        Err(RiskError::Invalid { .. })
    );

    let revoked = resolver.revoke("EU:GDPR:base", "breach").unwrap();
    assert_eq!(revoked.status, PolicyStatus::Revoked);
    assert_eq!(revoked.revocation_reason.as_deref(), Some("breach"));
    assert_eq!(store.len(), 1);
    assert_eq!(resolver.resolve(Region::Eu, Framework::Gdpr, None), Resolution::NotFound);

    assert!(resolver
        .update("EU:GDPR:base", PolicyUpdate::setting("session_timeout_minutes", 10))
        .is_err());

    let renewed = resolver.renew("EU:GDPR:base", Duration::days(1)).unwrap();
    assert_eq!(renewed.status, PolicyStatus::Active);
    assert!(renewed.revocation_reason.is_none());
    assert!(renewed.revoked_at.is_none());
}

#[test]
fn mutations_on_missing_policy_are_not_found() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    assert_matches!(
        resolver.update("EU:GDPR:nope", PolicyUpdate::default()),
        Err(RiskError::NotFound { .. })
    );
    assert_matches!(
        resolver.revoke("EU:GDPR:nope", "gone"),
        Err(RiskError::NotFound { .. })
    );
}

#[test]
fn concurrent_updates_serialize() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    resolver.create(gdpr_draft(Region::Eu, "base")).unwrap();

    std::thread::scope(|scope| {
        for minutes in 1..=8u64 {
            let resolver = &resolver;
            scope.spawn(move || {
                resolver
                    .update("EU:GDPR:base", PolicyUpdate::setting("session_timeout_minutes", minutes))
                    .unwrap();
            });
        }
    });

    let policy = resolver.get("EU:GDPR:base").unwrap().unwrap();
    assert_eq!(policy.version, 9);
}

#[test]
fn listing_filters_by_region() {
    let (_, shared) = clock();
    let (_, resolver) = resolver(shared);
    resolver.create(gdpr_draft(Region::Eu, "a")).unwrap();
    resolver.create(hipaa_draft(Region::Us, "b")).unwrap();

    assert_eq!(resolver.list(None).unwrap().len(), 2);
    let eu = resolver.list(Some(Region::Eu)).unwrap();
    assert_eq!(eu.len(), 1);
    assert_eq!(eu[0].id, "EU:GDPR:a");
}
