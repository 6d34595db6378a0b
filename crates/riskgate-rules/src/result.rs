//! Validation results and reports

use chrono::{DateTime, Utc};
use riskgate_core::{CrossRiskLevel, Framework, Industry, Region};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use riskgate_core::RiskError;

/// Outcome of one requirement check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Requirement met
    Pass,
    /// Requirement partially met
    Warning,
    /// Requirement not met
    Fail,
    /// The rule could not be evaluated
    Error,
    /// The requirement does not apply; excluded from scoring
    NotApplicable,
}

impl ValidationStatus {
    /// Scoring outcome: Pass 1, Warning 0.5, Fail/Error 0, NotApplicable none
    pub fn outcome(&self) -> Option<f64> {
        match self {
            ValidationStatus::Pass => Some(1.0),
            ValidationStatus::Warning => Some(0.5),
            ValidationStatus::Fail | ValidationStatus::Error => Some(0.0),
            ValidationStatus::NotApplicable => None,
        }
    }

    /// Whether the result flags a problem that feeds cross-system risk
    pub fn is_triggered(&self) -> bool {
        matches!(self, ValidationStatus::Fail | ValidationStatus::Error)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationStatus::Pass => "pass",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Fail => "fail",
            ValidationStatus::Error => "error",
            ValidationStatus::NotApplicable => "not_applicable",
        };
        f.write_str(s)
    }
}

/// Severity of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational only; weight 0
    Info,
    /// Weight 0.5
    Low,
    /// Weight 1
    Medium,
    /// Weight 2
    High,
    /// Weight 4
    Critical,
}

impl Severity {
    /// Scoring weight
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 4.0,
            Severity::High => 2.0,
            Severity::Medium => 1.0,
            Severity::Low => 0.5,
            Severity::Info => 0.0,
        }
    }

    /// Cross-system level implied by a severity
    pub fn implied_risk(&self) -> CrossRiskLevel {
        match self {
            Severity::Critical => CrossRiskLevel::VeryHigh,
            Severity::High => CrossRiskLevel::High,
            Severity::Medium => CrossRiskLevel::Medium,
            Severity::Low => CrossRiskLevel::Low,
            Severity::Info => CrossRiskLevel::VeryLow,
        }
    }
}

impl FromStr for Severity {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(RiskError::invalid(format!("unknown severity '{other}'"))),
        }
    }
}

/// Result of one rule for one requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Rule that produced the result
    pub rule_id: String,
    /// Requirement references covered by the check
    pub requirement_ids: Vec<String>,
    /// Outcome
    pub status: ValidationStatus,
    /// Severity
    pub severity: Severity,
    /// Human-readable explanation
    pub message: String,
    /// Rule-specific detail
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ValidationResult {
    /// Result with the given status
    pub fn new(
        rule_id: impl Into<String>,
        status: ValidationStatus,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            requirement_ids: Vec::new(),
            status,
            severity,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Passing result
    pub fn pass(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(rule_id, ValidationStatus::Pass, severity, message)
    }

    /// Warning result
    pub fn warning(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(rule_id, ValidationStatus::Warning, severity, message)
    }

    /// Failing result
    pub fn fail(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(rule_id, ValidationStatus::Fail, severity, message)
    }

    /// Synthetic result for a rule that could not run
    pub fn error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, ValidationStatus::Error, Severity::High, message)
    }

    /// Result for a requirement that does not apply
    pub fn not_applicable(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, ValidationStatus::NotApplicable, Severity::Info, message)
    }

    /// Attach requirement references
    pub fn with_requirements<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirement_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Summary of a rule that took part in an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedRule {
    /// Rule id
    pub id: String,
    /// Rule name
    pub name: String,
    /// What the rule checks
    pub description: String,
    /// Declared cross-system risk when the rule is triggered
    pub risk_level: CrossRiskLevel,
}

/// Policy consulted for one framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPolicy {
    /// Framework that was resolved
    pub framework: Framework,
    /// Winning policy id; `None` when engine defaults applied
    pub policy_id: Option<String>,
    /// Version of the winning policy
    pub policy_version: Option<u32>,
}

/// Aggregated outcome of one rule evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Region evaluated
    pub region: Region,
    /// Industry evaluated
    pub industry: Industry,
    /// Frameworks evaluated
    pub frameworks: Vec<Framework>,
    /// Policies consulted, one per framework
    pub policies: Vec<AppliedPolicy>,
    /// Rules that ran (or were attempted), in registry order
    pub rules: Vec<EvaluatedRule>,
    /// Every result, in rule order
    pub results: Vec<ValidationResult>,
    /// Results with status Pass
    pub passed_count: usize,
    /// Results with status Fail
    pub failed_count: usize,
    /// Results with status Warning
    pub warning_count: usize,
    /// Results with status Error
    pub error_count: usize,
    /// Severity-weighted score before benchmark adjustment
    pub raw_score: f64,
    /// Benchmark-adjusted compliance score in `[0, 100]`
    pub compliance_score: f64,
    /// Industry benchmark used for the adjustment
    pub benchmark: f64,
    /// Critical-fail precedence, then score thresholds
    pub overall_status: ValidationStatus,
    /// Rules that did not finish in time
    pub incomplete_rules: Vec<String>,
    /// When the report was produced
    pub evaluated_at: DateTime<Utc>,
}

impl ValidationReport {
    /// Fail if any Fail, else Warning if any Warning, else Pass
    pub fn worst_status(&self) -> ValidationStatus {
        if self.failed_count > 0 {
            ValidationStatus::Fail
        } else if self.warning_count > 0 {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Pass
        }
    }

    /// Summary of a rule that took part in the evaluation
    pub fn rule(&self, id: &str) -> Option<&EvaluatedRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Results that feed cross-system risk
    pub fn triggered(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| r.status.is_triggered())
    }

    /// Whether every selected rule finished
    pub fn is_complete(&self) -> bool {
        self.incomplete_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_follow_status() {
        assert_eq!(ValidationStatus::Pass.outcome(), Some(1.0));
        assert_eq!(ValidationStatus::Warning.outcome(), Some(0.5));
        assert_eq!(ValidationStatus::Error.outcome(), Some(0.0));
        assert_eq!(ValidationStatus::NotApplicable.outcome(), None);
    }

    #[test]
    fn synthetic_errors_are_high_severity() {
        let r = ValidationResult::error("r1", "boom");
        assert_eq!(r.severity, Severity::High);
        assert!(r.status.is_triggered());
    }

    #[test]
    fn severity_parses() {
        assert_eq!("Critical".parse::<Severity>().ok(), Some(Severity::Critical));
        assert!("urgent".parse::<Severity>().is_err());
    }
}
