//! # riskgate-signals
//!
//! Local risk signals for authentication attempts.
//!
//! - [`SignalProcessor`]: one method, one signal; registered explicitly
//!   through [`SignalRegistry`].
//! - Built-in processors for location, device, behavior, network, resource
//!   sensitivity and time of access.
//! - [`RiskAggregator`]: concurrent, bulkheaded execution of every
//!   registered processor and confidence-weighted combination into a
//!   [`riskgate_core::RiskAssessment`].

pub mod aggregator;
pub mod processor;
pub mod processors;

pub use aggregator::{aggregate_score, assess, RiskAggregator, SignalOutcome};
pub use processor::{ProcessorKind, SignalProcessor, SignalRegistry};
pub use processors::{
    BehaviorProcessor, DeviceProcessor, LocationProcessor, NetworkProcessor, ResourceProcessor,
    TimeProcessor,
};
