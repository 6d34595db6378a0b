//! Framework-minimum validation of policy settings
//!
//! Runs synchronously on every create, update and renew. All violations are
//! collected so the caller sees the complete list at once.

use riskgate_core::{Framework, Result, RiskError};
use serde_json::{Map, Value};

/// Minimum number of authentication factors demanded by `framework`
pub fn minimum_factors(framework: Framework) -> Option<usize> {
    match framework {
        Framework::Gdpr | Framework::Lgpd | Framework::Hipaa | Framework::PciDss => Some(2),
        _ => None,
    }
}

/// Number of factors configured in `authentication_factors`
///
/// Accepts either a count or a list of factor names.
pub fn configured_factors(settings: &Map<String, Value>) -> Option<usize> {
    match settings.get("authentication_factors")? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Validate `settings` against the minimums of `framework`
pub fn validate_settings(framework: Framework, settings: &Map<String, Value>) -> Result<()> {
    let mut violations = Vec::new();

    if let Some(minimum) = minimum_factors(framework) {
        match configured_factors(settings) {
            Some(count) if count >= minimum => {}
            Some(count) => violations.push(format!(
                "authentication_factors must be at least {minimum}, got {count}"
            )),
            None => violations.push(format!(
                "authentication_factors is required (at least {minimum})"
            )),
        }
    }

    if framework == Framework::Hipaa && settings.get("phi_access_logging") != Some(&Value::Bool(true)) {
        violations.push("phi_access_logging must be true".to_string());
    }

    if framework == Framework::Pndsb {
        let has_alternatives = settings
            .get("authentication_alternatives")
            .and_then(Value::as_array)
            .is_some_and(|alternatives| !alternatives.is_empty());
        if !has_alternatives {
            violations.push("authentication_alternatives must list at least one alternative".to_string());
        }
    }

    if let Some(timeout) = settings.get("session_timeout_minutes") {
        if !timeout.as_u64().is_some_and(|minutes| minutes > 0) {
            violations.push("session_timeout_minutes must be a positive integer".to_string());
        }
    }

    if let Some(retention) = settings.get("data_retention_days") {
        if retention.as_u64().is_none() {
            violations.push("data_retention_days must be a non-negative integer".to_string());
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(RiskError::policy_validation(framework.code(), violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn settings(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn gdpr_needs_two_factors() {
        assert!(validate_settings(Framework::Gdpr, &settings(json!({"authentication_factors": 2}))).is_ok());
        assert!(validate_settings(
            Framework::Gdpr,
            &settings(json!({"authentication_factors": ["password", "totp"]}))
        )
        .is_ok());
        assert_matches!(
            validate_settings(Framework::Lgpd, &settings(json!({"authentication_factors": 1}))),
            Err(RiskError::PolicyValidation { .. })
        );
    }

    #[test]
    fn hipaa_reports_every_violation() {
        let err = validate_settings(Framework::Hipaa, &settings(json!({"authentication_factors": 1})))
            .unwrap_err();
        match err {
            RiskError::PolicyValidation { framework, violations } => {
                assert_eq!(framework, "HIPAA");
                assert_eq!(violations.len(), 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn pndsb_needs_alternatives() {
        assert!(validate_settings(Framework::Pndsb, &settings(json!({}))).is_err());
        assert!(validate_settings(
            Framework::Pndsb,
            &settings(json!({"authentication_alternatives": []}))
        )
        .is_err());
        assert!(validate_settings(
            Framework::Pndsb,
            &settings(json!({"authentication_alternatives": ["voice_otp"]}))
        )
        .is_ok());
    }

    #[test]
    fn frameworks_without_minimums_accept_empty_settings() {
        assert!(validate_settings(Framework::Soc2, &Map::new()).is_ok());
    }

    #[test]
    fn generic_settings_are_type_checked() {
        let bad = settings(json!({"session_timeout_minutes": 0, "data_retention_days": "forever"}));
        let err = validate_settings(Framework::Soc2, &bad).unwrap_err();
        assert_matches!(err, RiskError::PolicyValidation { ref violations, .. } if violations.len() == 2);
    }
}
