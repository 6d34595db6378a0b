//! Discrete risk levels
//!
//! Two ordered scales are used:
//!
//! - [`RiskLevel`]: the four-step internal scale produced by signal
//!   aggregation and used to pick required authentication factors.
//! - [`CrossRiskLevel`]: the five-step scale shared with external providers
//!   (credit bureau, ML enhancer) and used by cross-system combination.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::RiskError;

/// Internal risk level derived from the aggregate signal score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Below the medium threshold
    Low,
    /// At or above the medium threshold
    Medium,
    /// At or above the high threshold
    High,
    /// At or above the critical threshold
    Critical,
}

impl RiskLevel {
    /// All levels in ascending order
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Stable lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-step risk scale shared with external systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossRiskLevel {
    /// Ordinal 1
    VeryLow,
    /// Ordinal 2
    Low,
    /// Ordinal 3
    Medium,
    /// Ordinal 4
    High,
    /// Ordinal 5
    VeryHigh,
}

impl CrossRiskLevel {
    /// All levels in ascending order
    pub const ALL: [CrossRiskLevel; 5] = [
        CrossRiskLevel::VeryLow,
        CrossRiskLevel::Low,
        CrossRiskLevel::Medium,
        CrossRiskLevel::High,
        CrossRiskLevel::VeryHigh,
    ];

    /// Ordinal score in `1..=5`
    pub fn ordinal(&self) -> u8 {
        match self {
            CrossRiskLevel::VeryLow => 1,
            CrossRiskLevel::Low => 2,
            CrossRiskLevel::Medium => 3,
            CrossRiskLevel::High => 4,
            CrossRiskLevel::VeryHigh => 5,
        }
    }

    /// Re-bucket a (possibly blended) ordinal score.
    ///
    /// Boundaries: `<1.5` VeryLow, `<2.5` Low, `<3.5` Medium, `<4.5` High,
    /// otherwise VeryHigh.
    pub fn from_score(score: f64) -> Self {
        if score < 1.5 {
            CrossRiskLevel::VeryLow
        } else if score < 2.5 {
            CrossRiskLevel::Low
        } else if score < 3.5 {
            CrossRiskLevel::Medium
        } else if score < 4.5 {
            CrossRiskLevel::High
        } else {
            CrossRiskLevel::VeryHigh
        }
    }

    /// Project onto the internal four-step scale
    pub fn to_risk_level(&self) -> RiskLevel {
        match self {
            CrossRiskLevel::VeryLow | CrossRiskLevel::Low => RiskLevel::Low,
            CrossRiskLevel::Medium => RiskLevel::Medium,
            CrossRiskLevel::High => RiskLevel::High,
            CrossRiskLevel::VeryHigh => RiskLevel::Critical,
        }
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossRiskLevel::VeryLow => "VERY_LOW",
            CrossRiskLevel::Low => "LOW",
            CrossRiskLevel::Medium => "MEDIUM",
            CrossRiskLevel::High => "HIGH",
            CrossRiskLevel::VeryHigh => "VERY_HIGH",
        }
    }
}

impl fmt::Display for CrossRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrossRiskLevel {
    type Err = RiskError;

    /// Accepts `VERY_HIGH`, `very_high`, `very-high` and `VeryHigh`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "verylow" => Ok(CrossRiskLevel::VeryLow),
            "low" => Ok(CrossRiskLevel::Low),
            "medium" => Ok(CrossRiskLevel::Medium),
            "high" => Ok(CrossRiskLevel::High),
            "veryhigh" => Ok(CrossRiskLevel::VeryHigh),
            _ => Err(RiskError::invalid(format!("unknown risk level '{s}'"))),
        }
    }
}
