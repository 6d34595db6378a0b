//! Network reputation signal
//!
//! Reads `ip_address`, `is_tor`, `is_proxy`, `is_vpn`, `is_hosting` and
//! `ip_reputation` (`0` clean, `1` known bad).

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskError, RiskSignal, SignalCategory};

use crate::processor::SignalProcessor;

/// Scores anonymizers, hosting ranges and IP reputation
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkProcessor;

#[async_trait]
impl SignalProcessor for NetworkProcessor {
    fn name(&self) -> &str {
        "network"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Network
    }

    fn default_weight(&self) -> f64 {
        0.15
    }

    async fn process(&self, context: &AuthContext) -> Result<RiskSignal> {
        let ip = context.attr_str("ip_address")?;
        let tor = context.attr_bool("is_tor")?.unwrap_or(false);
        let proxy = context.attr_bool("is_proxy")?.unwrap_or(false);
        let vpn = context.attr_bool("is_vpn")?.unwrap_or(false);
        let hosting = context.attr_bool("is_hosting")?.unwrap_or(false);
        let reputation = context.attr_f64("ip_reputation")?;

        if let Some(rep) = reputation {
            if !(0.0..=1.0).contains(&rep) {
                return Err(RiskError::signal(format!("ip_reputation {rep} outside [0, 1]")));
            }
        }

        let mut value: f64 = 0.05;
        if proxy {
            value += 0.4;
        }
        if vpn {
            value += 0.2;
        }
        if hosting {
            value += 0.3;
        }
        value += reputation.unwrap_or(0.0) * 0.6;
        if tor {
            value = value.max(0.9);
        }

        let confidence = match (ip.is_some(), reputation.is_some()) {
            (true, true) => 0.9,
            (true, false) => 0.75,
            (false, _) => 0.4,
        };

        let mut signal =
            RiskSignal::new(self.name(), self.category(), value, self.default_weight(), confidence)
                .with_metadata("tor", tor)
                .with_metadata("proxy", proxy)
                .with_metadata("vpn", vpn);
        if let Some(ip) = ip {
            signal = signal.with_metadata("ip_address", ip);
        }
        Ok(signal)
    }
}
