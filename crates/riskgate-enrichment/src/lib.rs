//! # riskgate-enrichment
//!
//! External risk data for the decision pipeline.
//!
//! - [`EnrichmentProvider`]: the seam to a data provider (credit bureau,
//!   fraud consortium, ...). Transport is the provider's concern.
//! - [`EnrichmentCache`]: TTL cache keyed by data type, provider and
//!   subject, with lazy expiry and hit/miss counters.
//! - [`EnrichmentService`]: provider lookup, cache bypass for contextual
//!   requests and a hard timeout. Failures surface as
//!   [`EnrichmentOutcome`] values, never as errors.

pub mod cache;
pub mod provider;
pub mod service;

pub use cache::{CacheKey, CacheStats, EnrichmentCache};
pub use provider::{EnrichmentProvider, EnrichmentRequest, EnrichmentResponse};
pub use service::{EnrichmentOutcome, EnrichmentService};
