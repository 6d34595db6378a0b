//! Severity-weighted compliance scoring and industry benchmarks

use riskgate_core::Industry;
use std::collections::BTreeMap;

use crate::result::{Severity, ValidationResult, ValidationStatus};

/// Multiplier applied when the raw score beats the industry benchmark
pub const BENCHMARK_BOOST: f64 = 1.05;

/// Score at or above which the overall status is Pass
pub const PASS_SCORE: f64 = 90.0;

/// Score at or above which the overall status is Warning
pub const WARNING_SCORE: f64 = 70.0;

/// `100 × Σ(weight × outcome) / Σ weight` over applicable results
///
/// NotApplicable results are excluded. `None` when no result carries weight.
pub fn raw_score(results: &[ValidationResult]) -> Option<f64> {
    let (earned, possible) = results
        .iter()
        .filter_map(|r| r.status.outcome().map(|o| (r.severity.weight(), o)))
        .fold((0.0, 0.0), |(earned, possible), (weight, outcome)| {
            (earned + weight * outcome, possible + weight)
        });
    if possible > 0.0 {
        Some((earned / possible * 100.0).clamp(0.0, 100.0))
    } else {
        None
    }
}

/// Raw score boosted by [`BENCHMARK_BOOST`] when it beats `benchmark`
pub fn adjust_for_benchmark(raw: f64, benchmark: f64) -> f64 {
    if raw > benchmark {
        (raw * BENCHMARK_BOOST).min(100.0)
    } else {
        raw
    }
}

/// Any critical Fail forces Fail; otherwise the score decides
pub fn overall_status(results: &[ValidationResult], score: f64) -> ValidationStatus {
    let critical_fail = results
        .iter()
        .any(|r| r.status == ValidationStatus::Fail && r.severity == Severity::Critical);
    if critical_fail {
        ValidationStatus::Fail
    } else if score >= PASS_SCORE {
        ValidationStatus::Pass
    } else if score >= WARNING_SCORE {
        ValidationStatus::Warning
    } else {
        ValidationStatus::Fail
    }
}

/// Expected compliance score per industry
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryBenchmarks {
    scores: BTreeMap<Industry, f64>,
    fallback: f64,
}

impl Default for IndustryBenchmarks {
    fn default() -> Self {
        let scores = [
            (Industry::Healthcare, 85.0),
            (Industry::Finance, 88.0),
            (Industry::Government, 85.0),
            (Industry::Education, 75.0),
            (Industry::Retail, 78.0),
            (Industry::Technology, 80.0),
            (Industry::General, 75.0),
        ]
        .into_iter()
        .collect();
        Self {
            scores,
            fallback: 75.0,
        }
    }
}

impl IndustryBenchmarks {
    /// Benchmark for `industry`
    pub fn for_industry(&self, industry: Industry) -> f64 {
        self.scores.get(&industry).copied().unwrap_or(self.fallback)
    }

    /// Replace the benchmark of one industry
    pub fn with(mut self, industry: Industry, score: f64) -> Self {
        self.scores.insert(industry, score.clamp(0.0, 100.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: ValidationStatus, severity: Severity) -> ValidationResult {
        ValidationResult::new("r", status, severity, "")
    }

    #[test]
    fn score_weights_by_severity() {
        let results = vec![
            result(ValidationStatus::Pass, Severity::Critical),
            result(ValidationStatus::Fail, Severity::High),
            result(ValidationStatus::Warning, Severity::Medium),
            result(ValidationStatus::NotApplicable, Severity::Critical),
        ];
        // (4 + 0 + 0.5) / (4 + 2 + 1)
        let expected = 4.5 / 7.0 * 100.0;
        assert!((raw_score(&results).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn nothing_weighted_scores_none() {
        assert_eq!(raw_score(&[]), None);
        assert_eq!(raw_score(&[result(ValidationStatus::Pass, Severity::Info)]), None);
    }

    #[test]
    fn boost_only_above_benchmark() {
        assert_eq!(adjust_for_benchmark(80.0, 85.0), 80.0);
        assert_eq!(adjust_for_benchmark(85.0, 85.0), 85.0);
        assert!((adjust_for_benchmark(90.0, 85.0) - 94.5).abs() < 1e-9);
        assert_eq!(adjust_for_benchmark(98.0, 85.0), 100.0);
    }

    #[test]
    fn critical_fail_wins_over_high_score() {
        let results = vec![result(ValidationStatus::Fail, Severity::Critical)];
        assert_eq!(overall_status(&results, 95.0), ValidationStatus::Fail);
    }

    #[test]
    fn score_thresholds() {
        assert_eq!(overall_status(&[], 90.0), ValidationStatus::Pass);
        assert_eq!(overall_status(&[], 70.0), ValidationStatus::Warning);
        assert_eq!(overall_status(&[], 69.9), ValidationStatus::Fail);
    }

    #[test]
    fn default_benchmarks() {
        let b = IndustryBenchmarks::default();
        assert_eq!(b.for_industry(Industry::Finance), 88.0);
        assert_eq!(b.for_industry(Industry::Retail), 78.0);
        assert_eq!(b.with(Industry::Retail, 90.0).for_industry(Industry::Retail), 90.0);
    }
}
