//! Context and policy fixtures

use riskgate_core::{AuthContext, Framework, Industry, Region, SharedClock};
use riskgate_policy::{InMemoryPolicyStore, PolicyDraft, PolicyResolver};
use serde_json::json;
use std::sync::Arc;

/// Bare context for `user-1` / `session-1`
pub fn context() -> AuthContext {
    AuthContext::new("user-1", "session-1")
}

/// Context whose built-in signals all read as benign
pub fn low_risk_context() -> AuthContext {
    context()
        .with_attribute("country", "DE")
        .with_attribute("known_countries", json!(["DE"]))
        .with_attribute("device_id", "laptop-1")
        .with_attribute("known_devices", json!(["laptop-1"]))
        .with_attribute("device_trusted", true)
        .with_attribute("failed_attempts", 0)
        .with_attribute("logins_last_hour", 1)
        .with_attribute("behavior_anomaly_score", 0.1)
        .with_attribute("ip_address", "198.51.100.4")
        .with_attribute("ip_reputation", 0.0)
        .with_attribute("resource_sensitivity", "internal")
        .with_attribute("local_hour", 10)
}

/// Context whose built-in signals all read as hostile
pub fn high_risk_context() -> AuthContext {
    context()
        .with_attribute("country", "KP")
        .with_attribute("known_countries", json!(["DE"]))
        .with_attribute("device_id", "unknown-9")
        .with_attribute("known_devices", json!(["laptop-1"]))
        .with_attribute("is_rooted", true)
        .with_attribute("is_emulator", true)
        .with_attribute("failed_attempts", 5)
        .with_attribute("logins_last_hour", 12)
        .with_attribute("behavior_anomaly_score", 0.9)
        .with_attribute("ip_address", "185.220.101.1")
        .with_attribute("is_tor", true)
        .with_attribute("resource_sensitivity", "restricted")
        .with_attribute("action", "admin")
        .with_attribute("local_hour", 3)
        .with_attribute("is_weekend", true)
}

/// EU context bound by GDPR that satisfies the built-in GDPR rules
pub fn compliant_gdpr_context() -> AuthContext {
    low_risk_context()
        .with_region(Region::Eu)
        .with_industry(Industry::Finance)
        .with_framework(Framework::Gdpr)
        .with_attribute("enrolled_factors", json!(["password", "totp"]))
        .with_attribute("consent_recorded", true)
        .with_attribute("encryption_at_rest", true)
        .with_attribute("session_timeout_minutes", 15)
}

/// Resolver over an empty in-memory store
pub fn resolver(clock: SharedClock) -> (Arc<InMemoryPolicyStore>, Arc<PolicyResolver>) {
    let store = Arc::new(InMemoryPolicyStore::new());
    let resolver = Arc::new(PolicyResolver::new(store.clone(), clock));
    (store, resolver)
}

/// Valid GDPR draft for `region` with slug `slug`
pub fn gdpr_draft(region: Region, slug: &str) -> PolicyDraft {
    PolicyDraft::new(format!("GDPR {slug}"), region, Framework::Gdpr)
        .with_setting("authentication_factors", 2)
        .with_setting("session_timeout_minutes", 30)
        .with_slug(slug)
}

/// Valid HIPAA draft for `region` with slug `slug`
pub fn hipaa_draft(region: Region, slug: &str) -> PolicyDraft {
    PolicyDraft::new(format!("HIPAA {slug}"), region, Framework::Hipaa)
        .with_setting("authentication_factors", 2)
        .with_setting("phi_access_logging", true)
        .with_slug(slug)
}
