//! Resource sensitivity signal
//!
//! Reads `resource_sensitivity` (`public`, `internal`, `confidential`,
//! `restricted`, `top_secret`) and `action` (`read`, `write`, `delete`,
//! `admin`).

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskError, RiskSignal, SignalCategory};

use crate::processor::SignalProcessor;

/// Scores how much damage a compromised session could do
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceProcessor;

fn sensitivity_value(tier: &str) -> Result<f64> {
    match tier.to_ascii_lowercase().as_str() {
        "public" => Ok(0.0),
        "internal" => Ok(0.2),
        "confidential" => Ok(0.5),
        "restricted" => Ok(0.8),
        "top_secret" => Ok(1.0),
        other => Err(RiskError::signal(format!("unknown resource_sensitivity '{other}'"))),
    }
}

fn action_uplift(action: &str) -> f64 {
    match action.to_ascii_lowercase().as_str() {
        "write" | "update" => 0.1,
        "delete" => 0.2,
        "admin" | "transfer" => 0.3,
        _ => 0.0,
    }
}

#[async_trait]
impl SignalProcessor for ResourceProcessor {
    fn name(&self) -> &str {
        "resource"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Resource
    }

    fn default_weight(&self) -> f64 {
        0.1
    }

    async fn process(&self, context: &AuthContext) -> Result<RiskSignal> {
        let action = context.attr_str("action")?.unwrap_or("read");
        let Some(tier) = context.attr_str("resource_sensitivity")? else {
            return Ok(RiskSignal::new(
                self.name(),
                self.category(),
                0.2 + action_uplift(action),
                self.default_weight(),
                0.5,
            )
            .with_metadata("action", action));
        };

        let value = sensitivity_value(tier)? + action_uplift(action);
        Ok(
            RiskSignal::new(self.name(), self.category(), value, self.default_weight(), 0.95)
                .with_metadata("sensitivity", tier)
                .with_metadata("action", action),
        )
    }
}
