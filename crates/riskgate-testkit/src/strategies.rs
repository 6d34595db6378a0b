//! Proptest strategies

use proptest::prelude::*;
use riskgate_core::{RiskSignal, SignalCategory};

/// Any signal category
pub fn arb_category() -> impl Strategy<Value = SignalCategory> {
    prop_oneof![
        Just(SignalCategory::Location),
        Just(SignalCategory::Device),
        Just(SignalCategory::Behavior),
        Just(SignalCategory::Time),
        Just(SignalCategory::Network),
        Just(SignalCategory::Resource),
        Just(SignalCategory::History),
        Just(SignalCategory::ThreatIntel),
    ]
}

/// Signal with value and confidence in `[0, 1]` and weight in `[0, 1]`
pub fn arb_signal() -> impl Strategy<Value = RiskSignal> {
    (arb_category(), 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0).prop_map(
        |(category, value, weight, confidence)| {
            RiskSignal::new(category.as_str(), category, value, weight, confidence)
        },
    )
}

/// Between one and eight signals
pub fn arb_signals() -> impl Strategy<Value = Vec<RiskSignal>> {
    prop::collection::vec(arb_signal(), 1..8)
}
