//! # riskgate-decision
//!
//! The final step of a risk decision.
//!
//! - [`CrossSystemRiskCombiner`]: blends the rule engine's verdict with
//!   external risk levels using fixed asymmetric weights and fails safe to
//!   Medium when an input is missing.
//! - [`RiskGate`]: the shared pipeline object running local signals, rule
//!   evaluation and enrichment concurrently under one deadline and turning
//!   the result into required authentication factors.

pub mod combiner;
pub mod gate;

pub use combiner::{
    blend, CombinedDecision, CrossSystemRiskCombiner, ExternalAssessment, ExternalSource,
    FactorSource, RiskFactor, RuleVerdict, EXTERNAL_WEIGHT, FALLBACK_LEVEL, INTERNAL_WEIGHT,
    UNTRIGGERED_LEVEL,
};
pub use gate::{DecisionReport, ExternalLookup, RiskGate, ENRICHMENT_PARAMS_ATTRIBUTE};
