//! Policy store interface and in-memory implementation
//!
//! The resolver treats persistence as a key-value collaborator keyed by
//! policy id. Ids start with `REGION:FRAMEWORK:` so resolution can list
//! candidates with a prefix scan.

use parking_lot::RwLock;
use riskgate_core::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::policy::RegionalPolicy;

/// Key-value persistence for policies
pub trait PolicyStore: Send + Sync {
    /// Policy by id
    fn get(&self, id: &str) -> Result<Option<RegionalPolicy>>;

    /// Every policy whose id starts with `prefix`, ordered by id
    fn get_all(&self, prefix: &str) -> Result<Vec<RegionalPolicy>>;

    /// Insert or replace the policy stored under `id`
    fn upsert(&self, id: &str, policy: RegionalPolicy) -> Result<()>;

    /// Remove the policy under `id`; returns whether it existed
    fn delete(&self, id: &str) -> Result<bool>;
}

/// Copy-on-write in-memory store
///
/// Readers clone an `Arc` of the current map and never observe a write in
/// progress. Writers replace the whole map.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    snapshot: RwLock<Arc<BTreeMap<String, RegionalPolicy>>>,
}

impl InMemoryPolicyStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent view of every stored policy
    pub fn snapshot(&self) -> Arc<BTreeMap<String, RegionalPolicy>> {
        Arc::clone(&self.snapshot.read())
    }

    /// Number of stored policies
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn get(&self, id: &str) -> Result<Option<RegionalPolicy>> {
        Ok(self.snapshot().get(id).cloned())
    }

    fn get_all(&self, prefix: &str) -> Result<Vec<RegionalPolicy>> {
        let snapshot = self.snapshot();
        Ok(snapshot
            .range(prefix.to_string()..)
            .take_while(|(id, _)| id.starts_with(prefix))
            .map(|(_, policy)| policy.clone())
            .collect())
    }

    fn upsert(&self, id: &str, policy: RegionalPolicy) -> Result<()> {
        let mut guard = self.snapshot.write();
        let mut next = BTreeMap::clone(&guard);
        next.insert(id.to_string(), policy);
        *guard = Arc::new(next);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut guard = self.snapshot.write();
        if !guard.contains_key(id) {
            return Ok(false);
        }
        let mut next = BTreeMap::clone(&guard);
        next.remove(id);
        *guard = Arc::new(next);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{policy_id, PolicyStatus};
    use chrono::Utc;
    use riskgate_core::{Framework, Region};

    fn policy(region: Region, framework: Framework, suffix: &str) -> RegionalPolicy {
        let now = Utc::now();
        RegionalPolicy {
            id: policy_id(region, framework, suffix),
            name: suffix.to_string(),
            region,
            industry: None,
            framework,
            status: PolicyStatus::Active,
            settings: serde_json::Map::new(),
            override_rules: BTreeMap::new(),
            version: 1,
            validation_score: None,
            created_at: now,
            updated_at: now,
            expires_at: None,
            revocation_reason: None,
            revoked_at: None,
        }
    }

    #[test]
    fn prefix_scan_returns_only_matching_ids() {
        let store = InMemoryPolicyStore::new();
        for p in [
            policy(Region::Eu, Framework::Gdpr, "a"),
            policy(Region::Eu, Framework::Gdpr, "b"),
            policy(Region::Eu, Framework::Hipaa, "c"),
            policy(Region::Us, Framework::Gdpr, "d"),
        ] {
            store.upsert(&p.id.clone(), p).unwrap();
        }
        let ids: Vec<String> = store
            .get_all("EU:GDPR:")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["EU:GDPR:a", "EU:GDPR:b"]);
        assert_eq!(store.get_all("").unwrap().len(), 4);
    }

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let store = InMemoryPolicyStore::new();
        let p = policy(Region::Eu, Framework::Gdpr, "a");
        store.upsert(&p.id.clone(), p).unwrap();
        let before = store.snapshot();

        assert!(store.delete("EU:GDPR:a").unwrap());
        assert!(!store.delete("EU:GDPR:a").unwrap());
        assert_eq!(before.len(), 1);
        assert!(store.is_empty());
    }
}
