//! Explicit rule registry

use riskgate_core::{AuthContext, Result, RiskError};
use std::fmt;
use std::sync::Arc;

use crate::builtin::BuiltinRule;
use crate::rule::{RuleDescriptor, ValidationRule};

/// Ordered set of rules with unique ids
///
/// Registration order is evaluation and reporting order.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of every built-in rule
    pub fn with_builtins() -> Self {
        Self {
            rules: BuiltinRule::ALL.iter().map(|rule| rule.build()).collect(),
        }
    }

    /// Add `rule`; ids must be unique
    pub fn register(&mut self, rule: Arc<dyn ValidationRule>) -> Result<()> {
        let id = &rule.descriptor().id;
        if id.trim().is_empty() {
            return Err(RiskError::invalid("rule id must not be empty"));
        }
        if self.get(id).is_some() {
            return Err(RiskError::invalid(format!("rule '{id}' already registered")));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, rule: Arc<dyn ValidationRule>) -> Result<Self> {
        self.register(rule)?;
        Ok(self)
    }

    /// Rule by id
    pub fn get(&self, id: &str) -> Option<&Arc<dyn ValidationRule>> {
        self.rules.iter().find(|rule| rule.descriptor().id == id)
    }

    /// Descriptor of every registered rule
    pub fn descriptors(&self) -> impl Iterator<Item = &RuleDescriptor> {
        self.rules.iter().map(|rule| rule.descriptor())
    }

    /// Registered ids in order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.descriptors().map(|d| d.id.as_str())
    }

    /// Rules whose scope matches `context`, in registration order
    pub fn applicable(&self, context: &AuthContext) -> Vec<Arc<dyn ValidationRule>> {
        self.rules
            .iter()
            .filter(|rule| rule.descriptor().applies_to(context))
            .cloned()
            .collect()
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
