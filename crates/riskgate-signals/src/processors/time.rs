//! Time-of-access signal
//!
//! Reads `local_hour` (`0..=23`), optional `usual_hour_start` /
//! `usual_hour_end` overrides and `is_weekend`.

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskError, RiskSignal, SignalCategory};

use crate::processor::SignalProcessor;

/// Scores access outside the subject's usual hours
#[derive(Debug, Clone, Copy)]
pub struct TimeProcessor {
    usual_start: u64,
    usual_end: u64,
}

impl Default for TimeProcessor {
    fn default() -> Self {
        Self {
            usual_start: 7,
            usual_end: 20,
        }
    }
}

impl TimeProcessor {
    /// Processor with explicit default working hours (`start..end`)
    pub fn new(usual_start: u64, usual_end: u64) -> Self {
        Self {
            usual_start,
            usual_end,
        }
    }
}

fn hour_attr(context: &AuthContext, key: &str) -> Result<Option<u64>> {
    match context.attr_u64(key)? {
        Some(hour) if hour > 23 => Err(RiskError::signal(format!("{key} {hour} is not an hour"))),
        other => Ok(other),
    }
}

#[async_trait]
impl SignalProcessor for TimeProcessor {
    fn name(&self) -> &str {
        "time"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Time
    }

    fn default_weight(&self) -> f64 {
        0.1
    }

    async fn process(&self, context: &AuthContext) -> Result<RiskSignal> {
        let Some(hour) = hour_attr(context, "local_hour")? else {
            return Ok(RiskSignal::new(
                self.name(),
                self.category(),
                0.3,
                self.default_weight(),
                0.2,
            ));
        };
        let start = hour_attr(context, "usual_hour_start")?.unwrap_or(self.usual_start);
        let end = hour_attr(context, "usual_hour_end")?.unwrap_or(self.usual_end);
        let weekend = context.attr_bool("is_weekend")?.unwrap_or(false);

        // Windows may wrap past midnight (e.g. 22..6 for night shifts)
        let within = if start <= end {
            (start..end).contains(&hour)
        } else {
            hour >= start || hour < end
        };

        let mut value: f64 = if within {
            0.1
        } else if hour < 5 {
            0.7
        } else {
            0.5
        };
        if weekend {
            value += 0.15;
        }

        Ok(
            RiskSignal::new(self.name(), self.category(), value, self.default_weight(), 0.7)
                .with_metadata("local_hour", hour)
                .with_metadata("within_usual_hours", within),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn office_hours_are_low_risk() {
        let ctx = AuthContext::new("u", "s").with_attribute("local_hour", 10);
        let signal = TimeProcessor::default().process(&ctx).await.unwrap();
        assert!((signal.value - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn night_shift_window_wraps_midnight() {
        let ctx = AuthContext::new("u", "s")
            .with_attribute("local_hour", 2)
            .with_attribute("usual_hour_start", 22)
            .with_attribute("usual_hour_end", 6);
        let signal = TimeProcessor::default().process(&ctx).await.unwrap();
        assert!((signal.value - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn small_hours_on_weekend() {
        let ctx = AuthContext::new("u", "s")
            .with_attribute("local_hour", 3)
            .with_attribute("is_weekend", true);
        let signal = TimeProcessor::default().process(&ctx).await.unwrap();
        assert!((signal.value - 0.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn invalid_hour_fails() {
        let ctx = AuthContext::new("u", "s").with_attribute("local_hour", 31);
        assert!(TimeProcessor::default().process(&ctx).await.is_err());
    }
}
