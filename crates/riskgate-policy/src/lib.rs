//! # riskgate-policy
//!
//! Region, industry and framework scoped compliance policies.
//!
//! - [`RegionalPolicy`] records with an explicit lifecycle
//!   (create → update → revoke → renew), each mutation bumping `version`.
//! - [`PolicyStore`]: the key-value persistence seam, with a copy-on-write
//!   [`InMemoryPolicyStore`].
//! - [`validate_settings`]: framework minimums enforced at mutation time.
//! - [`PolicyResolver`]: most-specific-match lookup with global fallback.

pub mod policy;
pub mod resolver;
pub mod store;
pub mod validation;

pub use policy::{
    policy_id, policy_prefix, PolicyDraft, PolicyStatus, PolicyUpdate, RegionalPolicy,
};
pub use resolver::{MatchTier, PolicyResolver, Resolution};
pub use store::{InMemoryPolicyStore, PolicyStore};
pub use validation::{configured_factors, minimum_factors, validate_settings};
