//! Policy resolution and lifecycle
//!
//! # Resolution order
//!
//! For a `(region, framework, industry)` lookup the first tier with an
//! effective (active, unexpired) candidate wins:
//!
//! 1. `region` + `industry` + `framework`
//! 2. `region` + `framework`, no industry restriction
//! 3. `GLOBAL` + `framework` (industry match first, then unrestricted),
//!    skipped when `region` is already `GLOBAL`
//!
//! Within a tier the highest version wins, then the most recent update,
//! then the smallest id, so repeated lookups against an unchanged store
//! always return the same policy. Finding nothing is not an error: callers
//! fall back to engine defaults.
//!
//! # Mutations
//!
//! `create`, `update`, `revoke` and `renew` serialize per policy id and
//! validate before writing, so the store never holds a partially applied
//! change. Reads take no per-id lock.

use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use riskgate_core::{Framework, Industry, Region, Result, RiskError, SharedClock};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::policy::{
    policy_id, policy_prefix, PolicyDraft, PolicyStatus, PolicyUpdate, RegionalPolicy,
};
use crate::store::PolicyStore;
use crate::validation::validate_settings;

/// Which resolution tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Region, industry and framework all matched
    RegionIndustry,
    /// Region and framework matched an unrestricted policy
    Region,
    /// Fell back to the global policy for the framework
    GlobalFallback,
}

/// Outcome of [`PolicyResolver::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A policy applies
    Found {
        /// The winning policy
        policy: RegionalPolicy,
        /// Tier that produced it
        tier: MatchTier,
    },
    /// No policy applies; use engine defaults
    NotFound,
}

impl Resolution {
    /// The winning policy, if any
    pub fn policy(&self) -> Option<&RegionalPolicy> {
        match self {
            Resolution::Found { policy, .. } => Some(policy),
            Resolution::NotFound => None,
        }
    }

    /// Consume into the winning policy
    pub fn into_policy(self) -> Option<RegionalPolicy> {
        match self {
            Resolution::Found { policy, .. } => Some(policy),
            Resolution::NotFound => None,
        }
    }

    /// Whether a policy was found
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }
}

/// Resolves and mutates regional policies
pub struct PolicyResolver {
    store: Arc<dyn PolicyStore>,
    clock: SharedClock,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl fmt::Debug for PolicyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyResolver")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl PolicyResolver {
    /// Create a resolver over `store`
    pub fn new(store: Arc<dyn PolicyStore>, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Find the most specific effective policy
    #[instrument(skip(self))]
    pub fn resolve(
        &self,
        region: Region,
        framework: Framework,
        industry: Option<Industry>,
    ) -> Resolution {
        let now = self.clock.now();
        let effective = |scope: Region| -> Vec<RegionalPolicy> {
            match self.store.get_all(&policy_prefix(scope, framework)) {
                Ok(policies) => policies
                    .into_iter()
                    .filter(|p| p.region == scope && p.framework == framework)
                    .filter(|p| p.is_effective(now))
                    .collect(),
                Err(err) => {
                    warn!(region = %scope, framework = %framework, error = %err, "policy store unavailable during resolution");
                    Vec::new()
                }
            }
        };

        let regional = effective(region);
        if let Some(industry) = industry {
            if let Some(policy) = pick(regional.iter().filter(|p| p.industry == Some(industry))) {
                return found(policy, MatchTier::RegionIndustry);
            }
        }
        if let Some(policy) = pick(regional.iter().filter(|p| p.industry.is_none())) {
            return found(policy, MatchTier::Region);
        }

        if region != Region::Global {
            let global = effective(Region::Global);
            let industry_match = industry
                .and_then(|industry| pick(global.iter().filter(|p| p.industry == Some(industry))));
            if let Some(policy) = industry_match.or_else(|| pick(global.iter().filter(|p| p.industry.is_none()))) {
                return found(policy, MatchTier::GlobalFallback);
            }
        }

        debug!("no applicable policy; engine defaults apply");
        Resolution::NotFound
    }

    /// Policy by id, in any status
    pub fn get(&self, id: &str) -> Result<Option<RegionalPolicy>> {
        self.store.get(id)
    }

    /// Every policy, optionally limited to one region
    pub fn list(&self, region: Option<Region>) -> Result<Vec<RegionalPolicy>> {
        let prefix = region.map(|r| format!("{}:", r.code())).unwrap_or_default();
        self.store.get_all(&prefix)
    }

    /// Validate and store a new policy at version 1
    #[instrument(skip(self, draft), fields(region = %draft.region, framework = %draft.framework))]
    pub fn create(&self, draft: PolicyDraft) -> Result<RegionalPolicy> {
        if draft.status == Some(PolicyStatus::Revoked) {
            return Err(RiskError::invalid("a policy cannot be created revoked"));
        }
        validate_settings(draft.framework, &draft.settings)?;

        let slug = draft
            .slug
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        if slug.is_empty() || slug.contains(':') {
            return Err(RiskError::invalid(format!("invalid policy slug '{slug}'")));
        }
        let id = policy_id(draft.region, draft.framework, &slug);

        let lock = self.lock_for(&id);
        let _guard = lock.lock();
        if self.store.get(&id)?.is_some() {
            return Err(RiskError::invalid(format!("policy '{id}' already exists")));
        }

        let now = self.clock.now();
        let policy = RegionalPolicy {
            id: id.clone(),
            name: draft.name,
            region: draft.region,
            industry: draft.industry,
            framework: draft.framework,
            status: draft.status.unwrap_or(PolicyStatus::Active),
            settings: draft.settings,
            override_rules: draft.override_rules,
            version: 1,
            validation_score: None,
            created_at: now,
            updated_at: now,
            expires_at: draft.expires_at,
            revocation_reason: None,
            revoked_at: None,
        };
        self.store.upsert(&id, policy.clone())?;
        info!(policy_id = %id, "policy created");
        Ok(policy)
    }

    /// Merge `update` into the policy, re-validate and bump the version
    #[instrument(skip(self, update))]
    pub fn update(&self, id: &str, update: PolicyUpdate) -> Result<RegionalPolicy> {
        if update.status == Some(PolicyStatus::Revoked) {
            return Err(RiskError::invalid("use revoke to revoke a policy"));
        }
        self.mutate(id, |policy| {
            if policy.status == PolicyStatus::Revoked {
                return Err(RiskError::invalid(format!(
                    "policy '{}' is revoked; renew it before updating",
                    policy.id
                )));
            }
            update.merge_into(policy);
            validate_settings(policy.framework, &policy.settings)
        })
    }

    /// Withdraw the policy; it stays in the store for audit
    #[instrument(skip(self))]
    pub fn revoke(&self, id: &str, reason: &str) -> Result<RegionalPolicy> {
        if reason.trim().is_empty() {
            return Err(RiskError::invalid("a revocation reason is required"));
        }
        let now = self.clock.now();
        self.mutate(id, |policy| {
            policy.status = PolicyStatus::Revoked;
            policy.revocation_reason = Some(reason.to_string());
            policy.revoked_at = Some(now);
            Ok(())
        })
    }

    /// Reactivate the policy for `valid_for` from now
    #[instrument(skip(self))]
    pub fn renew(&self, id: &str, valid_for: ChronoDuration) -> Result<RegionalPolicy> {
        if valid_for <= ChronoDuration::zero() {
            return Err(RiskError::invalid("renewal period must be positive"));
        }
        let now = self.clock.now();
        self.mutate(id, |policy| {
            validate_settings(policy.framework, &policy.settings)?;
            policy.status = PolicyStatus::Active;
            policy.expires_at = Some(now + valid_for);
            policy.revocation_reason = None;
            policy.revoked_at = None;
            Ok(())
        })
    }

    /// Record the latest compliance score measured against the policy
    ///
    /// Bookkeeping only: version and `updated_at` are left alone so the
    /// score never changes which policy resolves.
    pub fn set_validation_score(&self, id: &str, score: f64) -> Result<RegionalPolicy> {
        if !score.is_finite() {
            return Err(RiskError::invalid("validation score must be finite"));
        }
        let lock = self.lock_existing(id)?;
        let _guard = lock.lock();

        let mut policy = self
            .store
            .get(id)?
            .ok_or_else(|| RiskError::not_found(format!("policy '{id}'")))?;
        policy.validation_score = Some(score.clamp(0.0, 100.0));
        self.store.upsert(id, policy.clone())?;
        debug!(policy_id = %id, score = policy.validation_score, "validation score recorded");
        Ok(policy)
    }

    fn mutate<F>(&self, id: &str, apply: F) -> Result<RegionalPolicy>
    where
        F: FnOnce(&mut RegionalPolicy) -> Result<()>,
    {
        let lock = self.lock_existing(id)?;
        let _guard = lock.lock();

        let mut policy = self
            .store
            .get(id)?
            .ok_or_else(|| RiskError::not_found(format!("policy '{id}'")))?;
        apply(&mut policy)?;
        policy.version += 1;
        policy.updated_at = self.clock.now();
        self.store.upsert(id, policy.clone())?;
        info!(policy_id = %id, version = policy.version, status = %policy.status, "policy mutated");
        Ok(policy)
    }

    /// Write lock of a stored policy; unknown ids get no lock entry
    fn lock_existing(&self, id: &str) -> Result<Arc<Mutex<()>>> {
        if self.store.get(id)?.is_none() {
            return Err(RiskError::not_found(format!("policy '{id}'")));
        }
        Ok(self.lock_for(id))
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock();
        Arc::clone(locks.entry(id.to_string()).or_default())
    }
}

fn found(policy: &RegionalPolicy, tier: MatchTier) -> Resolution {
    debug!(policy_id = %policy.id, ?tier, "policy resolved");
    Resolution::Found {
        policy: policy.clone(),
        tier,
    }
}

fn pick<'a>(candidates: impl Iterator<Item = &'a RegionalPolicy>) -> Option<&'a RegionalPolicy> {
    candidates.max_by(|a, b| precedence(a, b))
}

/// Higher version, then later update, then smaller id
fn precedence(a: &RegionalPolicy, b: &RegionalPolicy) -> Ordering {
    a.version
        .cmp(&b.version)
        .then(a.updated_at.cmp(&b.updated_at))
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPolicyStore;
    use riskgate_core::system_clock;

    fn resolver() -> PolicyResolver {
        PolicyResolver::new(Arc::new(InMemoryPolicyStore::new()), system_clock())
    }

    fn gdpr(region: Region) -> PolicyDraft {
        PolicyDraft::new("gdpr", region, Framework::Gdpr).with_setting("authentication_factors", 2)
    }

    #[test]
    fn create_rejects_invalid_settings_without_writing() {
        let r = resolver();
        let draft = PolicyDraft::new("bad", Region::Eu, Framework::Gdpr)
            .with_setting("authentication_factors", 1)
            .with_slug("bad");
        assert!(r.create(draft).is_err());
        assert_eq!(r.get("EU:GDPR:bad").unwrap(), None);
    }

    #[test]
    fn unknown_ids_leave_no_write_lock() {
        let r = resolver();
        assert!(r.revoke("EU:GDPR:missing", "gone").is_err());
        assert!(r.set_validation_score("EU:GDPR:missing", 80.0).is_err());
        assert!(r.write_locks.lock().is_empty());

        r.create(gdpr(Region::Eu).with_slug("base")).unwrap();
        r.set_validation_score("EU:GDPR:base", 80.0).unwrap();
        assert_eq!(r.write_locks.lock().len(), 1);
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let r = resolver();
        r.create(gdpr(Region::Eu).with_slug("base")).unwrap();
        assert!(r.create(gdpr(Region::Eu).with_slug("base")).is_err());
    }

    #[test]
    fn update_bumps_version_and_revalidates() {
        let r = resolver();
        let created = r.create(gdpr(Region::Eu)).unwrap();
        let updated = r
            .update(&created.id, PolicyUpdate::setting("session_timeout_minutes", 15))
            .unwrap();
        assert_eq!(updated.version, 2);
        assert!(updated.updated_at >= created.updated_at);

        let rejected = r.update(&created.id, PolicyUpdate::setting("authentication_factors", 1));
        assert!(rejected.is_err());
        assert_eq!(r.get(&created.id).unwrap().map(|p| p.version), Some(2));
    }

    #[test]
    fn precedence_prefers_newer_versions_then_smaller_ids() {
        let r = resolver();
        let a = r.create(gdpr(Region::Eu).with_slug("a")).unwrap();
        let b = r.create(gdpr(Region::Eu).with_slug("b")).unwrap();
        // Same version: smaller id wins only when update times tie
        let winner = r.resolve(Region::Eu, Framework::Gdpr, None).into_policy().unwrap();
        assert!(winner.id == a.id || winner.id == b.id);

        r.update(&b.id, PolicyUpdate::setting("note", "v2")).unwrap();
        let winner = r.resolve(Region::Eu, Framework::Gdpr, None).into_policy().unwrap();
        assert_eq!(winner.id, b.id);
    }

    #[test]
    fn validation_score_leaves_version_alone() {
        let r = resolver();
        let created = r.create(gdpr(Region::Eu)).unwrap();
        let scored = r.set_validation_score(&created.id, 120.0).unwrap();
        assert_eq!(scored.validation_score, Some(100.0));
        assert_eq!(scored.version, created.version);
        assert!(r.set_validation_score("EU:GDPR:missing", 50.0).is_err());
    }
}
