//! # riskgate-core
//!
//! Shared vocabulary of the riskgate workspace: the unified error type,
//! risk levels, signals and assessments, the authentication context,
//! regional/industry/framework scoping, the hot-reloadable configuration
//! and the clock effect.
//!
//! Everything above this crate depends on it; it depends on nothing in the
//! workspace.

pub mod config;
pub mod context;
pub mod errors;
pub mod jurisdiction;
pub mod levels;
pub mod signal;
pub mod time;

pub use config::{
    assurance, factor_strength, CombinerSettings, ConfigHandle, EnrichmentSettings,
    FactorRequirements, RiskConfig, RiskThresholds,
};
pub use context::AuthContext;
pub use errors::{Result, RiskError};
pub use jurisdiction::{Framework, Industry, Region};
pub use levels::{CrossRiskLevel, RiskLevel};
pub use signal::{RiskAssessment, RiskSignal, SignalCategory};
pub use time::{system_clock, Deadline, PhysicalClock, SharedClock, SystemClock};
