//! Validation rule stubs

use async_trait::async_trait;
use riskgate_core::{CrossRiskLevel, Result, RiskError};
use riskgate_rules::{
    RuleDescriptor, Severity, ValidationContext, ValidationResult, ValidationRule, ValidationStatus,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Reports one result with a fixed status and counts calls
#[derive(Debug)]
pub struct StubRule {
    descriptor: RuleDescriptor,
    status: ValidationStatus,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubRule {
    /// Rule applying everywhere
    pub fn new(id: &str, status: ValidationStatus, severity: Severity) -> Self {
        Self::scoped(RuleDescriptor::new(id, id, severity), status)
    }

    /// Rule with a custom descriptor
    pub fn scoped(descriptor: RuleDescriptor, status: ValidationStatus) -> Self {
        Self {
            descriptor,
            status,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Passing rule
    pub fn passing(id: &str, severity: Severity) -> Self {
        Self::new(id, ValidationStatus::Pass, severity)
    }

    /// Failing rule
    pub fn failing(id: &str, severity: Severity) -> Self {
        Self::new(id, ValidationStatus::Fail, severity)
    }

    /// Declare a cross-system risk level
    pub fn with_risk(mut self, level: CrossRiskLevel) -> Self {
        self.descriptor = self.descriptor.with_risk(level);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Times `validate` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValidationRule for StubRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, _context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(vec![ValidationResult::new(
            self.descriptor.id.clone(),
            self.status,
            self.descriptor.severity,
            format!("stub {}", self.status),
        )])
    }
}

/// Always returns an error
#[derive(Debug)]
pub struct FailingRule {
    descriptor: RuleDescriptor,
}

impl FailingRule {
    /// Failing rule applying everywhere
    pub fn new(id: &str) -> Self {
        Self {
            descriptor: RuleDescriptor::new(id, id, Severity::Medium),
        }
    }
}

#[async_trait]
impl ValidationRule for FailingRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    async fn validate(&self, _context: &ValidationContext) -> Result<Vec<ValidationResult>> {
        Err(RiskError::rule(format!("{} cannot evaluate", self.descriptor.id)))
    }
}
