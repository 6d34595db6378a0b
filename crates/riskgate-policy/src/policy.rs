//! Regional policy records

use chrono::{DateTime, Utc};
use riskgate_core::{Framework, Industry, Region};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    /// Considered by resolution
    Active,
    /// Switched off, may be re-enabled by update
    Inactive,
    /// Waiting for sign-off
    PendingApproval,
    /// Superseded but retained
    Deprecated,
    /// Withdrawn; retained for audit, only `renew` reactivates it
    Revoked,
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicyStatus::Active => "active",
            PolicyStatus::Inactive => "inactive",
            PolicyStatus::PendingApproval => "pending_approval",
            PolicyStatus::Deprecated => "deprecated",
            PolicyStatus::Revoked => "revoked",
        };
        f.write_str(s)
    }
}

/// A region/industry/framework scoped bundle of compliance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalPolicy {
    /// `REGION:FRAMEWORK:suffix`
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Region the policy applies to
    pub region: Region,
    /// Industry restriction; `None` applies to every industry
    pub industry: Option<Industry>,
    /// Framework the settings satisfy
    pub framework: Framework,
    /// Lifecycle state
    pub status: PolicyStatus,
    /// Framework settings (`authentication_factors`, `phi_access_logging`, ...)
    pub settings: Map<String, Value>,
    /// Per-rule overrides: `"disabled"` or `"severity:<level>"`
    #[serde(default)]
    pub override_rules: BTreeMap<String, String>,
    /// Bumped by every mutation
    pub version: u32,
    /// Latest compliance score recorded against this policy
    pub validation_score: Option<f64>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// End of validity; `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Why the policy was revoked
    pub revocation_reason: Option<String>,
    /// When the policy was revoked
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RegionalPolicy {
    /// Active and not past its expiry
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.status == PolicyStatus::Active && self.expires_at.map_or(true, |at| now <= at)
    }

    /// Whether the policy covers `industry`
    pub fn covers_industry(&self, industry: Option<Industry>) -> bool {
        match (self.industry, industry) {
            (None, _) => true,
            (Some(restricted), Some(requested)) => restricted == requested,
            (Some(_), None) => false,
        }
    }
}

/// Store key prefix shared by every policy of `region` and `framework`
pub fn policy_prefix(region: Region, framework: Framework) -> String {
    format!("{}:{}:", region.code(), framework.code())
}

/// Full policy id
pub fn policy_id(region: Region, framework: Framework, suffix: &str) -> String {
    format!("{}{suffix}", policy_prefix(region, framework))
}

/// Input to [`crate::PolicyResolver::create`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDraft {
    /// Human-readable name
    pub name: String,
    /// Region
    pub region: Region,
    /// Industry restriction
    #[serde(default)]
    pub industry: Option<Industry>,
    /// Framework
    pub framework: Framework,
    /// Initial settings
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Initial override rules
    #[serde(default)]
    pub override_rules: BTreeMap<String, String>,
    /// Initial status, `Active` when omitted
    #[serde(default)]
    pub status: Option<PolicyStatus>,
    /// End of validity
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Id suffix; a random one is generated when omitted
    #[serde(default)]
    pub slug: Option<String>,
}

impl PolicyDraft {
    /// Draft with no settings
    pub fn new(name: impl Into<String>, region: Region, framework: Framework) -> Self {
        Self {
            name: name.into(),
            region,
            industry: None,
            framework,
            settings: Map::new(),
            override_rules: BTreeMap::new(),
            status: None,
            expires_at: None,
            slug: None,
        }
    }

    /// Restrict to an industry
    pub fn with_industry(mut self, industry: Industry) -> Self {
        self.industry = Some(industry);
        self
    }

    /// Set a setting
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Add an override rule
    pub fn with_override(mut self, rule_id: impl Into<String>, directive: impl Into<String>) -> Self {
        self.override_rules.insert(rule_id.into(), directive.into());
        self
    }

    /// Set the initial status
    pub fn with_status(mut self, status: PolicyStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Use a fixed id suffix
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

/// Input to [`crate::PolicyResolver::update`]
///
/// Settings and override rules are merged key by key; a `null` setting or
/// an empty override directive removes the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    /// Settings to merge
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Override rules to merge
    #[serde(default)]
    pub override_rules: BTreeMap<String, String>,
    /// New status; `Revoked` is only reachable through `revoke`
    #[serde(default)]
    pub status: Option<PolicyStatus>,
    /// New compliance score
    #[serde(default)]
    pub validation_score: Option<f64>,
    /// New name
    #[serde(default)]
    pub name: Option<String>,
}

impl PolicyUpdate {
    /// Update that only merges one setting
    pub fn setting(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut update = Self::default();
        update.settings.insert(key.into(), value.into());
        update
    }

    /// Update that records a compliance score
    pub fn score(score: f64) -> Self {
        Self {
            validation_score: Some(score),
            ..Self::default()
        }
    }

    /// Apply to `policy` (without validation or version bump)
    pub(crate) fn merge_into(&self, policy: &mut RegionalPolicy) {
        for (key, value) in &self.settings {
            if value.is_null() {
                policy.settings.remove(key);
            } else {
                policy.settings.insert(key.clone(), value.clone());
            }
        }
        for (rule_id, directive) in &self.override_rules {
            if directive.is_empty() {
                policy.override_rules.remove(rule_id);
            } else {
                policy.override_rules.insert(rule_id.clone(), directive.clone());
            }
        }
        if let Some(status) = self.status {
            policy.status = status;
        }
        if let Some(score) = self.validation_score {
            policy.validation_score = Some(score.clamp(0.0, 100.0));
        }
        if let Some(name) = &self.name {
            policy.name.clone_from(name);
        }
    }
}
