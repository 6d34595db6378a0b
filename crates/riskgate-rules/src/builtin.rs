//! Built-in compliance rules
//!
//! Each rule compares what the context reports about the system under
//! evaluation (attributes) with what the resolved policy demands (settings).
//! Requirement references are labels only; the rules do not encode
//! regulatory text.

use async_trait::async_trait;
use riskgate_core::{CrossRiskLevel, Framework, Industry, Region, Result, RiskError};
use riskgate_policy::{configured_factors, minimum_factors};
use serde_json::Value;
use std::sync::Arc;

use crate::result::{Severity, ValidationResult};
use crate::rule::{RuleDescriptor, ValidationContext, ValidationRule};

/// Closed set of rules shipped with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinRule {
    /// Enrolled factors meet the framework minimum
    MultiFactor,
    /// PHI access is logged
    PhiAccessLogging,
    /// Alternatives to the primary authenticator are offered
    AuthenticationAlternatives,
    /// Consent is recorded before processing
    ConsentRecording,
    /// Session timeout within the policy ceiling
    SessionTimeout,
    /// Data encrypted at rest
    EncryptionAtRest,
}

impl BuiltinRule {
    /// Every built-in rule, in registration order
    pub const ALL: [BuiltinRule; 6] = [
        BuiltinRule::MultiFactor,
        BuiltinRule::PhiAccessLogging,
        BuiltinRule::AuthenticationAlternatives,
        BuiltinRule::ConsentRecording,
        BuiltinRule::SessionTimeout,
        BuiltinRule::EncryptionAtRest,
    ];

    /// Instantiate the rule
    pub fn build(self) -> Arc<dyn ValidationRule> {
        match self {
            BuiltinRule::MultiFactor => Arc::new(MultiFactorRule::new()),
            BuiltinRule::PhiAccessLogging => Arc::new(PhiAccessLoggingRule::new()),
            BuiltinRule::AuthenticationAlternatives => Arc::new(AuthenticationAlternativesRule::new()),
            BuiltinRule::ConsentRecording => Arc::new(ConsentRecordingRule::new()),
            BuiltinRule::SessionTimeout => Arc::new(SessionTimeoutRule::new()),
            BuiltinRule::EncryptionAtRest => Arc::new(EncryptionAtRestRule::new()),
        }
    }
}

fn enrolled_factor_count(context: &ValidationContext) -> Result<Option<usize>> {
    if let Some(list) = context.auth.attr_str_list("enrolled_factors")? {
        return Ok(Some(list.len()));
    }
    Ok(context
        .auth
        .attr_u64("enrolled_factor_count")?
        .and_then(|n| usize::try_from(n).ok()))
}

/// Enrolled factors must meet the strictest framework minimum in play
#[derive(Debug, Clone)]
pub struct MultiFactorRule {
    descriptor: RuleDescriptor,
}

impl MultiFactorRule {
    /// Rule id
    pub const ID: &'static str = "mfa_minimum_factors";

    /// Create the rule
    pub fn new() -> Self {
        Self {
            descriptor: RuleDescriptor::new(Self::ID, "Multi-factor minimum", Severity::High)
                .describe("Subject has enrolled at least the number of factors the applicable frameworks require"),
        }
    }
}

impl Default for MultiFactorRule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValidationRule for MultiFactorRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        let mut required: Option<(usize, Framework)> = None;
        for framework in context.frameworks_among(&[]) {
            let from_policy = context
                .policy(framework)
                .and_then(|p| configured_factors(&p.settings));
            if let Some(count) = from_policy.or_else(|| minimum_factors(framework)) {
                if required.map_or(true, |(current, _)| count > current) {
                    required = Some((count, framework));
                }
            }
        }

        let Some((required, framework)) = required else {
            return Ok(vec![ValidationResult::not_applicable(
                Self::ID,
                "no framework in scope sets a factor minimum",
            )]);
        };
        let requirement = format!("{}-MFA", framework.code());

        let result = match enrolled_factor_count(context)? {
            None => ValidationResult::warning(
                Self::ID,
                self.descriptor.severity,
                "enrolled factors unknown",
            ),
            Some(enrolled) if enrolled >= required => ValidationResult::pass(
                Self::ID,
                self.descriptor.severity,
                format!("{enrolled} factors enrolled, {required} required"),
            ),
            Some(enrolled) => ValidationResult::fail(
                Self::ID,
                self.descriptor.severity,
                format!("{enrolled} factors enrolled, {required} required by {framework}"),
            )
            .with_metadata("enrolled", enrolled)
            .with_metadata("required", required),
        };
        Ok(vec![result.with_requirements([requirement])])
    }
}

/// Access to protected health information must be logged
#[derive(Debug, Clone)]
pub struct PhiAccessLoggingRule {
    descriptor: RuleDescriptor,
}

impl PhiAccessLoggingRule {
    /// Rule id
    pub const ID: &'static str = "hipaa_phi_access_logging";

    /// Create the rule
    pub fn new() -> Self {
        Self {
            descriptor: RuleDescriptor::new(Self::ID, "PHI access logging", Severity::Critical)
                .describe("Access to protected health information is audit-logged")
                .in_industries([Industry::Healthcare])
                .for_frameworks([Framework::Hipaa]),
        }
    }
}

impl Default for PhiAccessLoggingRule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValidationRule for PhiAccessLoggingRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        let severity = self.descriptor.severity;
        let result = match context.auth.attr_bool("phi_access_logging")? {
            Some(true) => ValidationResult::pass(Self::ID, severity, "PHI access logging enabled"),
            Some(false) => ValidationResult::fail(Self::ID, severity, "PHI access logging disabled"),
            None => ValidationResult::fail(Self::ID, severity, "PHI access logging not reported"),
        };
        Ok(vec![result.with_requirements(["HIPAA-164.312(b)"])])
    }
}

/// Users must be offered an alternative to the primary authenticator
#[derive(Debug, Clone)]
pub struct AuthenticationAlternativesRule {
    descriptor: RuleDescriptor,
}

impl AuthenticationAlternativesRule {
    /// Rule id
    pub const ID: &'static str = "pndsb_authentication_alternatives";

    /// Create the rule
    pub fn new() -> Self {
        Self {
            descriptor: RuleDescriptor::new(Self::ID, "Authentication alternatives", Severity::Medium)
                .describe("At least one policy-approved alternative authenticator is available")
                .for_frameworks([Framework::Pndsb]),
        }
    }
}

impl Default for AuthenticationAlternativesRule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValidationRule for AuthenticationAlternativesRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        let severity = self.descriptor.severity;
        let approved: Vec<&str> = context
            .setting(Framework::Pndsb, "authentication_alternatives")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let offered = context
            .auth
            .attr_str_list("available_alternatives")?
            .unwrap_or_default();

        let result = if offered.is_empty() {
            ValidationResult::fail(Self::ID, severity, "no alternative authenticator offered")
        } else if approved.is_empty() || offered.iter().any(|o| approved.contains(o)) {
            ValidationResult::pass(Self::ID, severity, "alternative authenticator offered")
        } else {
            ValidationResult::warning(
                Self::ID,
                severity,
                "alternatives offered but none approved by policy",
            )
        };
        Ok(vec![result.with_requirements(["PNDSB-ACCESSIBILITY"])])
    }
}

/// Consent must be recorded before personal data is processed
#[derive(Debug, Clone)]
pub struct ConsentRecordingRule {
    descriptor: RuleDescriptor,
}

impl ConsentRecordingRule {
    /// Rule id
    pub const ID: &'static str = "consent_recording";

    /// Create the rule
    pub fn new() -> Self {
        Self {
            descriptor: RuleDescriptor::new(Self::ID, "Consent recording", Severity::High)
                .describe("Data subject consent is recorded")
                .for_frameworks([Framework::Gdpr, Framework::Lgpd]),
        }
    }
}

impl Default for ConsentRecordingRule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValidationRule for ConsentRecordingRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        let severity = self.descriptor.severity;
        let requirements: Vec<String> = context
            .frameworks_among(&self.descriptor.frameworks)
            .map(|f| match f {
                Framework::Gdpr => "GDPR-Art7".to_string(),
                other => format!("{}-CONSENT", other.code()),
            })
            .collect();
        let result = match context.auth.attr_bool("consent_recorded")? {
            Some(true) => ValidationResult::pass(Self::ID, severity, "consent recorded"),
            Some(false) => ValidationResult::fail(Self::ID, severity, "consent not recorded"),
            None => ValidationResult::warning(Self::ID, severity, "consent state unknown"),
        };
        Ok(vec![result.with_requirements(requirements)])
    }
}

/// Session timeout must not exceed the strictest policy ceiling
#[derive(Debug, Clone)]
pub struct SessionTimeoutRule {
    descriptor: RuleDescriptor,
}

impl SessionTimeoutRule {
    /// Rule id
    pub const ID: &'static str = "session_timeout_ceiling";

    /// Create the rule
    pub fn new() -> Self {
        Self {
            descriptor: RuleDescriptor::new(Self::ID, "Session timeout", Severity::Medium)
                .describe("Session timeout does not exceed the policy ceiling"),
        }
    }
}

impl Default for SessionTimeoutRule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValidationRule for SessionTimeoutRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        let severity = self.descriptor.severity;
        let ceiling = context
            .policies
            .values()
            .filter_map(|p| p.settings.get("session_timeout_minutes").and_then(Value::as_u64))
            .min();
        let Some(ceiling) = ceiling else {
            return Ok(vec![ValidationResult::not_applicable(
                Self::ID,
                "no policy sets a session timeout",
            )]);
        };

        let result = match context.auth.attr_u64("session_timeout_minutes")? {
            None => ValidationResult::warning(Self::ID, severity, "session timeout not reported"),
            Some(actual) if actual <= ceiling => ValidationResult::pass(
                Self::ID,
                severity,
                format!("session timeout {actual}m within {ceiling}m"),
            ),
            Some(actual) if actual <= ceiling.saturating_mul(2) => ValidationResult::warning(
                Self::ID,
                severity,
                format!("session timeout {actual}m exceeds {ceiling}m"),
            ),
            Some(actual) => ValidationResult::fail(
                Self::ID,
                severity,
                format!("session timeout {actual}m far exceeds {ceiling}m"),
            ),
        };
        Ok(vec![result.with_metadata("ceiling_minutes", ceiling)])
    }
}

/// Stored data must be encrypted
#[derive(Debug, Clone)]
pub struct EncryptionAtRestRule {
    descriptor: RuleDescriptor,
}

impl EncryptionAtRestRule {
    /// Rule id
    pub const ID: &'static str = "encryption_at_rest";

    /// Create the rule
    pub fn new() -> Self {
        Self {
            descriptor: RuleDescriptor::new(Self::ID, "Encryption at rest", Severity::Critical)
                .describe("Personal and regulated data is encrypted at rest")
                .for_frameworks([Framework::Hipaa, Framework::PciDss, Framework::Gdpr])
                .in_regions([Region::Global])
                .with_risk(CrossRiskLevel::VeryHigh),
        }
    }
}

impl Default for EncryptionAtRestRule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValidationRule for EncryptionAtRestRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        let severity = self.descriptor.severity;
        let result = match context.auth.attr_bool("encryption_at_rest")? {
            Some(true) => ValidationResult::pass(Self::ID, severity, "data encrypted at rest"),
            Some(false) => ValidationResult::fail(Self::ID, severity, "data not encrypted at rest"),
            None => ValidationResult::warning(Self::ID, severity, "encryption at rest not reported"),
        };
        let algorithm = context.auth.attr_str("encryption_algorithm")?;
        if let Some(algorithm) = algorithm {
            if algorithm.trim().is_empty() {
                return Err(RiskError::rule("encryption_algorithm is empty"));
            }
        }
        let requirements: Vec<String> = context
            .frameworks_among(&self.descriptor.frameworks)
            .map(|f| format!("{}-ENCRYPTION", f.code()))
            .collect();
        Ok(vec![result.with_requirements(requirements)])
    }
}
