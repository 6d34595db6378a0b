//! # riskgate-rules
//!
//! Compliance validation for authentication contexts.
//!
//! - [`ValidationRule`]: an async check scoped by region, industry and
//!   framework through its [`RuleDescriptor`].
//! - [`RuleRegistry`]: explicit, ordered registration; [`BuiltinRule`]
//!   lists the rules shipped with the engine.
//! - [`RuleEvaluationEngine`]: resolves the policy of each framework,
//!   applies policy overrides, runs rules concurrently and scores the
//!   results against industry benchmarks.

pub mod builtin;
pub mod engine;
pub mod registry;
pub mod result;
pub mod rule;
pub mod scoring;

pub use builtin::{
    AuthenticationAlternativesRule, BuiltinRule, ConsentRecordingRule, EncryptionAtRestRule,
    MultiFactorRule, PhiAccessLoggingRule, SessionTimeoutRule,
};
pub use engine::RuleEvaluationEngine;
pub use registry::RuleRegistry;
pub use result::{
    AppliedPolicy, EvaluatedRule, Severity, ValidationReport, ValidationResult, ValidationStatus,
};
pub use rule::{RuleDescriptor, RuleOutcome, RuleOverride, ValidationContext, ValidationRule};
pub use scoring::{
    adjust_for_benchmark, overall_status, raw_score, IndustryBenchmarks, BENCHMARK_BOOST,
};
