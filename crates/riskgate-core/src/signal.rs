//! Risk signals and assessments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::levels::RiskLevel;

/// Category of a risk signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    /// Geolocation and travel
    Location,
    /// Device trust and posture
    Device,
    /// Behavioral patterns and velocity
    Behavior,
    /// Time-of-access patterns
    Time,
    /// Network reputation and anonymizers
    Network,
    /// Sensitivity of the requested resource
    Resource,
    /// Historical account activity
    History,
    /// External threat intelligence
    ThreatIntel,
}

impl SignalCategory {
    /// Stable lower-case name, used as the `signal_weights` config key
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Location => "location",
            SignalCategory::Device => "device",
            SignalCategory::Behavior => "behavior",
            SignalCategory::Time => "time",
            SignalCategory::Network => "network",
            SignalCategory::Resource => "resource",
            SignalCategory::History => "history",
            SignalCategory::ThreatIntel => "threat_intel",
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted, confidence-scored risk observation
///
/// `value` and `confidence` are always within `[0, 1]` and `weight` is
/// finite and non-negative; the constructor clamps out-of-range inputs and
/// maps NaN to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSignal {
    /// Name of the processor that produced the signal
    pub name: String,
    /// Signal category
    pub category: SignalCategory,
    /// Risk value in `[0, 1]`
    pub value: f64,
    /// Relative weight in the aggregate
    pub weight: f64,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Processor-specific detail for explainability
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl RiskSignal {
    /// Create a signal, clamping inputs into their valid ranges
    pub fn new(
        name: impl Into<String>,
        category: SignalCategory,
        value: f64,
        weight: f64,
        confidence: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            value: unit_interval(value),
            weight: non_negative(weight),
            confidence: unit_interval(confidence),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace the weight, keeping it finite and non-negative
    pub fn reweighted(mut self, weight: f64) -> Self {
        self.weight = non_negative(weight);
        self
    }

    /// Contribution to the weighted sum: `value * weight * confidence`
    pub fn weighted_value(&self) -> f64 {
        self.value * self.weight * self.confidence
    }
}

fn unit_interval(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

/// Result of aggregating every signal of one evaluation
///
/// Immutable once returned. `required_factors` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Discretized level
    pub level: RiskLevel,
    /// Aggregate score in `[0, 100]`
    pub score: f64,
    /// Surviving signals, in processor registration order
    pub signals: Vec<RiskSignal>,
    /// When the assessment was produced
    pub timestamp: DateTime<Utc>,
    /// Session the assessment belongs to
    pub session_id: String,
    /// Ordered authentication factors required at `level`
    pub required_factors: Vec<String>,
    /// Processors that failed or did not finish and were left out
    #[serde(default)]
    pub skipped_processors: Vec<String>,
}

impl RiskAssessment {
    /// Whether every registered processor contributed a signal
    pub fn is_complete(&self) -> bool {
        self.skipped_processors.is_empty()
    }
}
