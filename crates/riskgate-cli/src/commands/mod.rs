// Command modules for the riskgate CLI

/// Configuration check and display
pub mod config;

/// Full decision pipeline over one context
pub mod evaluate;

// Policy resolution
pub mod resolve;
