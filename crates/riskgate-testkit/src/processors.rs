//! Signal processor stubs

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskError, RiskSignal, SignalCategory};
use riskgate_signals::SignalProcessor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Returns a fixed signal and counts calls
#[derive(Debug)]
pub struct StubProcessor {
    name: String,
    category: SignalCategory,
    value: f64,
    weight: f64,
    confidence: f64,
    calls: AtomicUsize,
}

impl StubProcessor {
    /// Stub emitting `value` with `weight` and `confidence`
    pub fn new(name: &str, category: SignalCategory, value: f64, weight: f64, confidence: f64) -> Self {
        Self {
            name: name.to_string(),
            category,
            value,
            weight,
            confidence,
            calls: AtomicUsize::new(0),
        }
    }

    /// Times `process` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalProcessor for StubProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> SignalCategory {
        self.category
    }

    fn default_weight(&self) -> f64 {
        self.weight
    }

    async fn process(&self, _context: &AuthContext) -> Result<RiskSignal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RiskSignal::new(
            &self.name,
            self.category,
            self.value,
            self.weight,
            self.confidence,
        ))
    }
}

/// Always returns an error
#[derive(Debug)]
pub struct FailingProcessor {
    name: String,
    category: SignalCategory,
}

impl FailingProcessor {
    /// Failing stub
    pub fn new(name: &str, category: SignalCategory) -> Self {
        Self {
            name: name.to_string(),
            category,
        }
    }
}

#[async_trait]
impl SignalProcessor for FailingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> SignalCategory {
        self.category
    }

    fn default_weight(&self) -> f64 {
        0.1
    }

    async fn process(&self, _context: &AuthContext) -> Result<RiskSignal> {
        Err(RiskError::signal(format!("{} unavailable", self.name)))
    }
}

/// Panics when processing
#[derive(Debug)]
pub struct PanickingProcessor {
    name: String,
}

impl PanickingProcessor {
    /// Panicking stub
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl SignalProcessor for PanickingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Behavior
    }

    fn default_weight(&self) -> f64 {
        0.1
    }

    async fn process(&self, _context: &AuthContext) -> Result<RiskSignal> {
        panic!("{} exploded", self.name);
    }
}

/// Sleeps before answering like [`StubProcessor`]
#[derive(Debug)]
pub struct SlowProcessor {
    inner: StubProcessor,
    delay: Duration,
}

impl SlowProcessor {
    /// Stub answering `value` after `delay`
    pub fn new(name: &str, category: SignalCategory, value: f64, delay: Duration) -> Self {
        Self {
            inner: StubProcessor::new(name, category, value, 0.2, 0.9),
            delay,
        }
    }
}

#[async_trait]
impl SignalProcessor for SlowProcessor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn category(&self) -> SignalCategory {
        self.inner.category()
    }

    fn default_weight(&self) -> f64 {
        self.inner.default_weight()
    }

    async fn process(&self, context: &AuthContext) -> Result<RiskSignal> {
        tokio::time::sleep(self.delay).await;
        self.inner.process(context).await
    }
}
