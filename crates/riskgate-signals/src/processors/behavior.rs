//! Behavioral signal
//!
//! Reads `failed_attempts`, `logins_last_hour` and `behavior_anomaly_score`
//! (an upstream model output in `[0, 1]`).

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskError, RiskSignal, SignalCategory};

use crate::processor::SignalProcessor;

/// Scores failed attempts, login velocity and behavioral anomalies
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorProcessor;

#[async_trait]
impl SignalProcessor for BehaviorProcessor {
    fn name(&self) -> &str {
        "behavior"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Behavior
    }

    fn default_weight(&self) -> f64 {
        0.2
    }

    async fn process(&self, context: &AuthContext) -> Result<RiskSignal> {
        let failed = context.attr_u64("failed_attempts")?;
        let velocity = context.attr_u64("logins_last_hour")?;
        let anomaly = context.attr_f64("behavior_anomaly_score")?;

        if let Some(score) = anomaly {
            if !(0.0..=1.0).contains(&score) {
                return Err(RiskError::signal(format!(
                    "behavior_anomaly_score {score} outside [0, 1]"
                )));
            }
        }

        let inputs = [failed.is_some(), velocity.is_some(), anomaly.is_some()]
            .iter()
            .filter(|present| **present)
            .count();

        let failed_component = failed.map_or(0.0, |n| (n as f64 * 0.15).min(0.6));
        let velocity_component = match velocity {
            Some(n) if n > 10 => 0.3,
            Some(n) if n > 5 => 0.15,
            _ => 0.0,
        };
        let anomaly_component = anomaly.map_or(0.0, |a| a * 0.5);

        let value = if inputs == 0 {
            0.3
        } else {
            failed_component + velocity_component + anomaly_component
        };
        let confidence = 0.45 + 0.15 * inputs as f64;

        Ok(
            RiskSignal::new(self.name(), self.category(), value, self.default_weight(), confidence)
                .with_metadata("failed_attempts", failed.unwrap_or(0))
                .with_metadata("logins_last_hour", velocity.unwrap_or(0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_inputs_is_mildly_risky_and_unsure() {
        let signal = BehaviorProcessor
            .process(&AuthContext::new("u", "s"))
            .await
            .unwrap();
        assert_eq!(signal.value, 0.3);
        assert!((signal.confidence - 0.45).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failed_attempts_cap_at_point_six() {
        let ctx = AuthContext::new("u", "s").with_attribute("failed_attempts", 12);
        let signal = BehaviorProcessor.process(&ctx).await.unwrap();
        assert!((signal.value - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn anomaly_score_out_of_range_fails() {
        let ctx = AuthContext::new("u", "s").with_attribute("behavior_anomaly_score", 3.0);
        assert!(BehaviorProcessor.process(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn components_add_up() {
        let ctx = AuthContext::new("u", "s")
            .with_attribute("failed_attempts", 2)
            .with_attribute("logins_last_hour", 7)
            .with_attribute("behavior_anomaly_score", 0.4);
        let signal = BehaviorProcessor.process(&ctx).await.unwrap();
        assert!((signal.value - (0.3 + 0.15 + 0.2)).abs() < 1e-9);
        assert!((signal.confidence - 0.9).abs() < 1e-9);
    }
}
