//! Enrichment provider stubs

use async_trait::async_trait;
use riskgate_core::{Result, RiskError};
use riskgate_enrichment::{EnrichmentProvider, EnrichmentRequest};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Behavior {
    Answer(Value),
    Fail,
    Hang(Duration),
}

/// Scripted provider with a call counter
#[derive(Debug)]
pub struct StubProvider {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl StubProvider {
    /// Provider answering `payload`
    pub fn answering(name: &str, payload: Value) -> Self {
        Self::with_behavior(name, Behavior::Answer(payload))
    }

    /// Provider reporting `risk_level` (canonical spelling, e.g. `VERY_HIGH`)
    pub fn reporting(name: &str, risk_level: &str) -> Self {
        Self::answering(name, json!({ "risk_level": risk_level }))
    }

    /// Provider that always errors
    pub fn failing(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Fail)
    }

    /// Provider that sleeps for `delay` and then answers an empty object
    pub fn hanging(name: &str, delay: Duration) -> Self {
        Self::with_behavior(name, Behavior::Hang(delay))
    }

    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Times `fetch` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Answer(payload) => Ok(payload.clone()),
            Behavior::Fail => Err(RiskError::enrichment(format!("{} is down", self.name))),
            Behavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(json!({}))
            }
        }
    }
}
