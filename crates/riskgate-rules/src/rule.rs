//! Validation rule trait, descriptors and evaluation context

use async_trait::async_trait;
use riskgate_core::{AuthContext, CrossRiskLevel, Framework, Industry, Region, Result};
use riskgate_policy::RegionalPolicy;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::result::{Severity, ValidationResult};

/// Static description of a rule and its applicability
///
/// Empty `regions`, `industries` or `frameworks` mean "any". `Region::Global`
/// and `Industry::General` in a list also match every context.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDescriptor {
    /// Unique rule id
    pub id: String,
    /// Display name
    pub name: String,
    /// What the rule checks
    pub description: String,
    /// Regions the rule applies to
    pub regions: Vec<Region>,
    /// Industries the rule applies to
    pub industries: Vec<Industry>,
    /// Frameworks the rule applies to
    pub frameworks: Vec<Framework>,
    /// Default severity of the rule's results
    pub severity: Severity,
    /// Cross-system risk declared when the rule is triggered
    pub risk_level: CrossRiskLevel,
}

impl RuleDescriptor {
    /// Descriptor applying everywhere, with risk implied by `severity`
    pub fn new(id: impl Into<String>, name: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            regions: Vec::new(),
            industries: Vec::new(),
            frameworks: Vec::new(),
            severity,
            risk_level: severity.implied_risk(),
        }
    }

    /// Set the description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restrict to regions
    pub fn in_regions(mut self, regions: impl IntoIterator<Item = Region>) -> Self {
        self.regions = regions.into_iter().collect();
        self
    }

    /// Restrict to industries
    pub fn in_industries(mut self, industries: impl IntoIterator<Item = Industry>) -> Self {
        self.industries = industries.into_iter().collect();
        self
    }

    /// Restrict to frameworks
    pub fn for_frameworks(mut self, frameworks: impl IntoIterator<Item = Framework>) -> Self {
        self.frameworks = frameworks.into_iter().collect();
        self
    }

    /// Override the declared cross-system risk
    pub fn with_risk(mut self, level: CrossRiskLevel) -> Self {
        self.risk_level = level;
        self
    }

    /// Whether the rule applies to `context`
    pub fn applies_to(&self, context: &AuthContext) -> bool {
        // An unscoped region or industry list reads as listing Global or
        // General, so a rule built without scopes runs everywhere
        let region_ok = self.regions.is_empty()
            || self
                .regions
                .iter()
                .any(|r| *r == Region::Global || *r == context.region);
        let industry_ok = self.industries.is_empty()
            || self
                .industries
                .iter()
                .any(|i| *i == Industry::General || *i == context.industry);
        let framework_ok = self.frameworks.is_empty()
            || self
                .frameworks
                .iter()
                .any(|f| context.frameworks.contains(f));
        region_ok && industry_ok && framework_ok
    }
}

/// Everything a rule may look at
///
/// The context describes the system state being checked; the resolved
/// policies carry the requirements it is checked against.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// The authentication context under evaluation
    pub auth: AuthContext,
    /// Effective policy per framework, where one resolved
    pub policies: BTreeMap<Framework, RegionalPolicy>,
}

impl ValidationContext {
    /// Context with no resolved policies
    pub fn new(auth: AuthContext) -> Self {
        Self {
            auth,
            policies: BTreeMap::new(),
        }
    }

    /// Attach the resolved policy for its framework
    pub fn with_policy(mut self, policy: RegionalPolicy) -> Self {
        self.policies.insert(policy.framework, policy);
        self
    }

    /// Resolved policy for `framework`
    pub fn policy(&self, framework: Framework) -> Option<&RegionalPolicy> {
        self.policies.get(&framework)
    }

    /// Setting `key` of the policy resolved for `framework`
    pub fn setting(&self, framework: Framework, key: &str) -> Option<&Value> {
        self.policy(framework)?.settings.get(key)
    }

    /// Frameworks in the context that appear in `wanted` (or all, if empty)
    pub fn frameworks_among<'a>(&'a self, wanted: &'a [Framework]) -> impl Iterator<Item = Framework> + 'a {
        self.auth
            .frameworks
            .iter()
            .copied()
            .filter(move |f| wanted.is_empty() || wanted.contains(f))
    }
}

/// A compliance check scoped by region, industry and framework
///
/// Rules report findings as [`ValidationResult`]s; an `Err` means the rule
/// could not run at all and becomes a synthetic error result.
#[async_trait]
pub trait ValidationRule: Send + Sync {
    /// Static description and applicability
    fn descriptor(&self) -> &RuleDescriptor;

    /// Check `context`
    async fn validate(&self, context: &ValidationContext) -> Result<Vec<ValidationResult>>;
}

/// Outcome of running one rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The rule ran and reported results
    Completed(Vec<ValidationResult>),
    /// The rule returned an error or panicked
    Failed {
        /// Rule id
        rule: String,
        /// Error description
        reason: String,
    },
    /// The rule did not finish within its budget
    TimedOut {
        /// Rule id
        rule: String,
    },
}

/// What a policy's `override_rules` entry does to a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOverride {
    /// Skip the rule
    Disabled,
    /// Report the rule's results at this severity
    Severity(Severity),
}

impl RuleOverride {
    /// Parse `"disabled"` or `"severity:<level>"`; other directives are ignored
    pub fn parse(directive: &str) -> Option<Self> {
        let directive = directive.trim();
        if directive.eq_ignore_ascii_case("disabled") {
            return Some(RuleOverride::Disabled);
        }
        let (key, level) = directive.split_once(':')?;
        if !key.trim().eq_ignore_ascii_case("severity") {
            return None;
        }
        level.parse().ok().map(RuleOverride::Severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scopes_apply_everywhere() {
        let d = RuleDescriptor::new("r", "r", Severity::Low);
        assert!(d.applies_to(&AuthContext::new("u", "s").with_region(Region::Japan)));
        assert_eq!(d.risk_level, CrossRiskLevel::Low);
    }

    #[test]
    fn framework_scope_requires_a_match() {
        let d = RuleDescriptor::new("r", "r", Severity::High).for_frameworks([Framework::Hipaa]);
        let ctx = AuthContext::new("u", "s").with_framework(Framework::Gdpr);
        assert!(!d.applies_to(&ctx));
        assert!(d.applies_to(&ctx.with_framework(Framework::Hipaa)));
    }

    #[test]
    fn region_and_industry_scopes() {
        let d = RuleDescriptor::new("r", "r", Severity::High)
            .in_regions([Region::Eu, Region::Uk])
            .in_industries([Industry::Finance]);
        let ctx = AuthContext::new("u", "s")
            .with_region(Region::Eu)
            .with_industry(Industry::Finance);
        assert!(d.applies_to(&ctx));
        assert!(!d.applies_to(&ctx.clone().with_region(Region::Us)));
        assert!(!d.applies_to(&ctx.with_industry(Industry::Retail)));
    }

    #[test]
    fn override_directives() {
        assert_eq!(RuleOverride::parse("disabled"), Some(RuleOverride::Disabled));
        assert_eq!(
            RuleOverride::parse("severity:critical"),
            Some(RuleOverride::Severity(Severity::Critical))
        );
        assert_eq!(RuleOverride::parse("severity:extreme"), None);
        assert_eq!(RuleOverride::parse("mute"), None);
    }
}
