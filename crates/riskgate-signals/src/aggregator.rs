//! Confidence-weighted risk aggregation
//!
//! Runs every registered processor concurrently, each under its own time
//! budget, and folds the surviving signals into one score:
//!
//! ```text
//! score = Σ(value · weight · confidence) / Σ(weight) · 100      (0 if Σweight = 0)
//! ```
//!
//! The score is discretized with the configured thresholds and the level is
//! mapped to the configured factor list. A processor that errors, panics or
//! runs out of time is logged and left out; it never fails the evaluation.

use futures::future::join_all;
use futures::FutureExt;
use riskgate_core::{
    AuthContext, ConfigHandle, Deadline, RiskAssessment, RiskConfig, RiskSignal, SharedClock,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::processor::{SignalProcessor, SignalRegistry};

/// What one processor produced during an evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    /// The processor produced a signal
    Produced(RiskSignal),
    /// The processor returned an error or panicked
    Failed {
        /// Processor name
        processor: String,
        /// Failure description
        reason: String,
    },
    /// The processor exceeded its budget
    TimedOut {
        /// Processor name
        processor: String,
    },
}

/// Weighted mean of `signals` scaled to `[0, 100]`
pub fn aggregate_score(signals: &[RiskSignal]) -> f64 {
    let (weighted, total_weight) = signals.iter().fold((0.0, 0.0), |(sum, weights), signal| {
        (sum + signal.weighted_value(), weights + signal.weight)
    });
    if total_weight > 0.0 {
        (weighted / total_weight * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Build an assessment from already collected signals
pub fn assess(
    signals: Vec<RiskSignal>,
    config: &RiskConfig,
    session_id: impl Into<String>,
    timestamp: chrono::DateTime<chrono::Utc>,
) -> RiskAssessment {
    let score = aggregate_score(&signals);
    let level = config.thresholds.classify(score);
    RiskAssessment {
        level,
        score,
        signals,
        timestamp,
        session_id: session_id.into(),
        required_factors: config.required_factors(level),
        skipped_processors: Vec::new(),
    }
}

/// Runs signal processors and turns their output into a [`RiskAssessment`]
#[derive(Debug, Clone)]
pub struct RiskAggregator {
    registry: SignalRegistry,
    config: ConfigHandle,
    clock: SharedClock,
}

impl RiskAggregator {
    /// Create an aggregator over `registry`
    pub fn new(registry: SignalRegistry, config: ConfigHandle, clock: SharedClock) -> Self {
        Self {
            registry,
            config,
            clock,
        }
    }

    /// The processors this aggregator runs
    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// Evaluate `context` with per-processor budgets only
    #[instrument(skip_all, fields(session_id = %context.session_id))]
    pub async fn evaluate(&self, context: &AuthContext) -> RiskAssessment {
        self.run(context, None).await
    }

    /// Evaluate `context`, returning whatever completed before `deadline`
    #[instrument(skip_all, fields(session_id = %context.session_id))]
    pub async fn evaluate_with_deadline(
        &self,
        context: &AuthContext,
        deadline: Deadline,
    ) -> RiskAssessment {
        self.run(context, Some(deadline)).await
    }

    /// Run every processor and report each outcome in registration order
    pub async fn collect(
        &self,
        context: &AuthContext,
        config: &RiskConfig,
        deadline: Option<Deadline>,
    ) -> Vec<SignalOutcome> {
        let budget = config.processor_timeout();
        let runs = self.registry.iter().map(|processor| {
            let budget = deadline.map_or(budget, |d| d.clamp(budget));
            run_processor(Arc::clone(processor), context, config, budget)
        });
        join_all(runs).await
    }

    async fn run(&self, context: &AuthContext, deadline: Option<Deadline>) -> RiskAssessment {
        let config = self.config.current();
        let outcomes = self.collect(context, &config, deadline).await;

        let mut signals = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                SignalOutcome::Produced(signal) => signals.push(signal),
                SignalOutcome::Failed { processor, reason } => {
                    warn!(processor = %processor, error = %reason, "signal processor failed; skipping");
                    skipped.push(processor);
                }
                SignalOutcome::TimedOut { processor } => {
                    warn!(processor = %processor, "signal processor timed out; skipping");
                    skipped.push(processor);
                }
            }
        }

        let mut assessment = assess(signals, &config, &context.session_id, self.clock.now());
        assessment.skipped_processors = skipped;
        debug!(
            score = assessment.score,
            level = %assessment.level,
            signals = assessment.signals.len(),
            skipped = assessment.skipped_processors.len(),
            "risk assessment complete"
        );
        assessment
    }
}

async fn run_processor(
    processor: Arc<dyn SignalProcessor>,
    context: &AuthContext,
    config: &RiskConfig,
    budget: Duration,
) -> SignalOutcome {
    let name = processor.name().to_string();
    let guarded = AssertUnwindSafe(processor.process(context)).catch_unwind();

    match tokio::time::timeout(budget, guarded).await {
        Ok(Ok(Ok(signal))) => {
            let weight = config
                .weight_for(signal.category)
                .unwrap_or(signal.weight);
            SignalOutcome::Produced(signal.reweighted(weight))
        }
        Ok(Ok(Err(err))) => SignalOutcome::Failed {
            processor: name,
            reason: err.to_string(),
        },
        Ok(Err(_panic)) => SignalOutcome::Failed {
            processor: name,
            reason: "processor panicked".to_string(),
        },
        Err(_elapsed) => SignalOutcome::TimedOut { processor: name },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgate_core::{RiskLevel, SignalCategory};

    #[test]
    fn empty_signal_set_scores_zero() {
        assert_eq!(aggregate_score(&[]), 0.0);
    }

    #[test]
    fn zero_weight_signals_score_zero() {
        let s = RiskSignal::new("x", SignalCategory::Device, 1.0, 0.0, 1.0);
        assert_eq!(aggregate_score(&[s]), 0.0);
    }

    #[test]
    fn location_and_device_example() {
        let signals = vec![
            RiskSignal::new("location", SignalCategory::Location, 0.6, 0.25, 0.8),
            RiskSignal::new("device", SignalCategory::Device, 0.7, 0.2, 0.85),
        ];
        let expected = (0.6 * 0.25 * 0.8 + 0.7 * 0.2 * 0.85) / (0.25 + 0.2) * 100.0;
        let score = aggregate_score(&signals);
        assert!((score - expected).abs() < 1e-9);
        assert!((score - 53.11).abs() < 0.01);

        let assessment = assess(signals, &RiskConfig::default(), "s", chrono::Utc::now());
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert_eq!(assessment.required_factors, vec!["password", "totp"]);
    }
}
