//! Signal processor interface and registry
//!
//! Processors are registered explicitly at startup. The built-in set is a
//! closed enum ([`ProcessorKind`]) addressable by name, so deployments can
//! pick processors from configuration; custom processors are added as
//! trait objects through [`SignalRegistry::register`].

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskError, RiskSignal, SignalCategory};
use std::fmt;
use std::sync::Arc;

use crate::processors::{
    BehaviorProcessor, DeviceProcessor, LocationProcessor, NetworkProcessor, ResourceProcessor,
    TimeProcessor,
};

/// Produces one risk signal from an authentication context
///
/// Implementations must treat the context as read-only. Returning `Err`
/// excludes the processor from the current aggregation; it never fails the
/// evaluation as a whole.
#[async_trait]
pub trait SignalProcessor: Send + Sync {
    /// Unique processor name
    fn name(&self) -> &str;

    /// Category of the produced signal
    fn category(&self) -> SignalCategory;

    /// Weight used when the configuration has none for this category
    fn default_weight(&self) -> f64;

    /// Evaluate the context
    async fn process(&self, context: &AuthContext) -> Result<RiskSignal>;
}

/// Built-in processors, addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    /// [`LocationProcessor`]
    Location,
    /// [`DeviceProcessor`]
    Device,
    /// [`BehaviorProcessor`]
    Behavior,
    /// [`NetworkProcessor`]
    Network,
    /// [`ResourceProcessor`]
    Resource,
    /// [`TimeProcessor`]
    Time,
}

impl ProcessorKind {
    /// Every built-in, in default registration order
    pub const ALL: [ProcessorKind; 6] = [
        ProcessorKind::Location,
        ProcessorKind::Device,
        ProcessorKind::Behavior,
        ProcessorKind::Network,
        ProcessorKind::Resource,
        ProcessorKind::Time,
    ];

    /// Registry name
    pub fn name(&self) -> &'static str {
        match self {
            ProcessorKind::Location => "location",
            ProcessorKind::Device => "device",
            ProcessorKind::Behavior => "behavior",
            ProcessorKind::Network => "network",
            ProcessorKind::Resource => "resource",
            ProcessorKind::Time => "time",
        }
    }

    /// Look up a built-in by registry name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Construct the processor
    pub fn build(&self) -> Arc<dyn SignalProcessor> {
        match self {
            ProcessorKind::Location => Arc::new(LocationProcessor::default()),
            ProcessorKind::Device => Arc::new(DeviceProcessor),
            ProcessorKind::Behavior => Arc::new(BehaviorProcessor),
            ProcessorKind::Network => Arc::new(NetworkProcessor),
            ProcessorKind::Resource => Arc::new(ResourceProcessor),
            ProcessorKind::Time => Arc::new(TimeProcessor::default()),
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered set of processors run by the aggregator
#[derive(Clone, Default)]
pub struct SignalRegistry {
    processors: Vec<Arc<dyn SignalProcessor>>,
}

impl SignalRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in processor
    pub fn with_builtins() -> Self {
        Self {
            processors: ProcessorKind::ALL.iter().map(ProcessorKind::build).collect(),
        }
    }

    /// Registry with the named built-ins, in the given order
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut registry = Self::new();
        for name in names {
            let name = name.as_ref();
            let kind = ProcessorKind::from_name(name)
                .ok_or_else(|| RiskError::invalid(format!("unknown signal processor '{name}'")))?;
            registry.register(kind.build())?;
        }
        Ok(registry)
    }

    /// Add a processor; names must be unique
    pub fn register(&mut self, processor: Arc<dyn SignalProcessor>) -> Result<()> {
        if self.processors.iter().any(|p| p.name() == processor.name()) {
            return Err(RiskError::invalid(format!(
                "signal processor '{}' is already registered",
                processor.name()
            )));
        }
        self.processors.push(processor);
        Ok(())
    }

    /// Builder-style [`SignalRegistry::register`]
    pub fn with(mut self, processor: Arc<dyn SignalProcessor>) -> Result<Self> {
        self.register(processor)?;
        Ok(self)
    }

    /// Registered processors in order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SignalProcessor>> {
        self.processors.iter()
    }

    /// Registered names in order
    pub fn names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Number of processors
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether no processor is registered
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("processors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_in_default_order() {
        let registry = SignalRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["location", "device", "behavior", "network", "resource", "time"]
        );
    }

    #[test]
    fn from_names_rejects_unknown_and_duplicates() {
        assert!(SignalRegistry::from_names(&["device", "weather"]).is_err());
        assert!(SignalRegistry::from_names(&["device", "device"]).is_err());

        let registry = SignalRegistry::from_names(&["network", "device"]).unwrap();
        assert_eq!(registry.names(), vec!["network", "device"]);
    }

    #[test]
    fn kinds_report_matching_names() {
        for kind in ProcessorKind::ALL {
            assert_eq!(kind.build().name(), kind.name());
            assert_eq!(ProcessorKind::from_name(kind.name()), Some(kind));
        }
    }
}
