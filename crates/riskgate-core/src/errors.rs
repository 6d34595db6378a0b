//! Unified error type for riskgate
//!
//! Only configuration loading and explicit policy mutations surface these
//! errors to callers. Evaluation paths (`evaluate`, `resolve`, `combine`)
//! convert failures into tagged outcomes and always return a decision.

use serde::{Deserialize, Serialize};

/// Unified error type for all riskgate operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum RiskError {
    /// Invalid input or argument
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Policy settings violate the minimums of their framework
    #[error("Policy validation failed for {framework}: {}", violations.join("; "))]
    PolicyValidation {
        /// Framework whose minimums were violated
        framework: String,
        /// One entry per violated requirement
        violations: Vec<String>,
    },

    /// A signal processor failed
    #[error("Signal processor error: {message}")]
    Signal {
        /// Error message describing the processor failure
        message: String,
    },

    /// A validation rule failed to run
    #[error("Rule error: {message}")]
    Rule {
        /// Error message describing the rule failure
        message: String,
    },

    /// External enrichment provider failed
    #[error("Enrichment error: {message}")]
    Enrichment {
        /// Error message describing the provider failure
        message: String,
    },

    /// Operation exceeded its time budget
    #[error("Timeout after {timeout_ms}ms")]
    Timeout {
        /// Budget that was exceeded
        timeout_ms: u64,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Policy store operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl RiskError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a policy validation error
    pub fn policy_validation(framework: impl Into<String>, violations: Vec<String>) -> Self {
        Self::PolicyValidation {
            framework: framework.into(),
            violations,
        }
    }

    /// Create a signal processor error
    pub fn signal(message: impl Into<String>) -> Self {
        Self::Signal {
            message: message.into(),
        }
    }

    /// Create a rule error
    pub fn rule(message: impl Into<String>) -> Self {
        Self::Rule {
            message: message.into(),
        }
    }

    /// Create an enrichment error
    pub fn enrichment(message: impl Into<String>) -> Self {
        Self::Enrichment {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Standard Result type for riskgate operations
pub type Result<T> = std::result::Result<T, RiskError>;

impl From<serde_json::Error> for RiskError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid(format!("JSON: {err}"))
    }
}

impl From<toml::de::Error> for RiskError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML: {err}"))
    }
}

impl From<std::io::Error> for RiskError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}
