//! Device trust signal
//!
//! Reads `device_id`, `known_devices`, `device_trusted`, `is_rooted`,
//! `is_emulator` and `device_age_days`.

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskSignal, SignalCategory};

use crate::processor::SignalProcessor;

/// Scores device familiarity and posture
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceProcessor;

#[async_trait]
impl SignalProcessor for DeviceProcessor {
    fn name(&self) -> &str {
        "device"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Device
    }

    fn default_weight(&self) -> f64 {
        0.2
    }

    async fn process(&self, context: &AuthContext) -> Result<RiskSignal> {
        let Some(device_id) = context.attr_str("device_id")? else {
            return Ok(RiskSignal::new(
                self.name(),
                self.category(),
                0.6,
                self.default_weight(),
                0.4,
            )
            .with_metadata("reason", "no device fingerprint"));
        };

        let known = context
            .attr_str_list("known_devices")?
            .map(|devices| devices.contains(&device_id));
        let trusted = context.attr_bool("device_trusted")?.unwrap_or(false);
        let rooted = context.attr_bool("is_rooted")?.unwrap_or(false);
        let emulator = context.attr_bool("is_emulator")?.unwrap_or(false);
        let age_days = context.attr_f64("device_age_days")?;

        let mut value: f64 = 0.1;
        if known == Some(false) {
            value += 0.35;
        }
        if trusted && !rooted {
            value -= 0.1;
        }
        if rooted {
            value += 0.4;
        }
        if emulator {
            value += 0.3;
        }
        if age_days.is_some_and(|days| days < 1.0) {
            value += 0.15;
        }

        let confidence = if known.is_some() { 0.85 } else { 0.7 };

        Ok(
            RiskSignal::new(self.name(), self.category(), value, self.default_weight(), confidence)
                .with_metadata("device_id", device_id)
                .with_metadata("known_device", known.unwrap_or(false))
                .with_metadata("rooted", rooted)
                .with_metadata("emulator", emulator),
        )
    }
}
