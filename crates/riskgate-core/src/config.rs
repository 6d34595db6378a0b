//! Risk engine configuration
//!
//! Configuration is layered: compiled-in defaults, then a TOML file, then
//! `RISKGATE_*` environment overrides. Every layer is validated before it
//! takes effect.
//!
//! # Hot reload
//!
//! [`ConfigHandle`] holds the active configuration as an `Arc` snapshot.
//! Evaluations take one snapshot at their start, so a reload never changes
//! thresholds halfway through an evaluation. A reload that fails validation
//! leaves the previous snapshot in place.
//!
//! ```toml
//! processor_timeout_ms = 500
//!
//! [thresholds]
//! medium = 50.0
//! high = 75.0
//! critical = 90.0
//!
//! [factor_requirements]
//! low = ["password"]
//! medium = ["password", "totp"]
//!
//! [signal_weights]
//! location = 0.25
//! device = 0.2
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{Result, RiskError};
use crate::levels::{CrossRiskLevel, RiskLevel};
use crate::signal::SignalCategory;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "RISKGATE_";

/// Ascending score cutoffs for discretizing the aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Floor of the Low band
    pub low: f64,
    /// Scores at or above this are at least Medium
    pub medium: f64,
    /// Scores at or above this are at least High
    pub high: f64,
    /// Scores at or above this are Critical
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: 0.0,
            medium: 50.0,
            high: 75.0,
            critical: 90.0,
        }
    }
}

impl RiskThresholds {
    /// Discretize a score, checking from the top down
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score >= self.critical {
            RiskLevel::Critical
        } else if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn validate(&self) -> Result<()> {
        let cutoffs = [self.low, self.medium, self.high, self.critical];
        if cutoffs.iter().any(|c| !c.is_finite() || *c < 0.0 || *c > 100.0) {
            return Err(RiskError::config("thresholds must lie within [0, 100]"));
        }
        if !cutoffs.windows(2).all(|w| w[0] < w[1]) {
            return Err(RiskError::config(format!(
                "thresholds must be strictly ascending, got low={} medium={} high={} critical={}",
                self.low, self.medium, self.high, self.critical
            )));
        }
        Ok(())
    }
}

/// Ordered authentication factors required at each risk level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorRequirements {
    /// Factors at Low
    pub low: Vec<String>,
    /// Factors at Medium
    pub medium: Vec<String>,
    /// Factors at High
    pub high: Vec<String>,
    /// Factors at Critical
    pub critical: Vec<String>,
}

impl Default for FactorRequirements {
    fn default() -> Self {
        let owned = |factors: &[&str]| -> Vec<String> {
            factors.iter().map(|f| (*f).to_string()).collect()
        };
        Self {
            low: owned(&["password"]),
            medium: owned(&["password", "totp"]),
            high: owned(&["password", "totp", "push_notification"]),
            critical: owned(&["password", "totp", "hardware_key", "biometric"]),
        }
    }
}

impl FactorRequirements {
    /// Factors configured for `level`
    pub fn for_level(&self, level: RiskLevel) -> &[String] {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
            RiskLevel::Critical => &self.critical,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.low.is_empty() {
            return Err(RiskError::config(
                "factor_requirements.low must name at least one factor",
            ));
        }
        for pair in RiskLevel::ALL.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            let lower_assurance = assurance(self.for_level(lower));
            let higher_assurance = assurance(self.for_level(higher));
            if higher_assurance < lower_assurance {
                return Err(RiskError::config(format!(
                    "factor_requirements.{higher} provides less assurance than factor_requirements.{lower}"
                )));
            }
        }
        Ok(())
    }
}

/// Relative assurance strength of a named authentication factor
pub fn factor_strength(factor: &str) -> u8 {
    match factor {
        "password" | "pin" => 1,
        "email" | "email_otp" | "sms" | "sms_otp" => 2,
        "totp" | "push_notification" | "push" => 3,
        "biometric" => 4,
        "hardware_key" | "webauthn" | "fido2" => 5,
        _ => 1,
    }
}

/// Assurance of a factor list: strongest factor first, then total strength
pub fn assurance(factors: &[String]) -> (u8, u32) {
    let strongest = factors.iter().map(|f| factor_strength(f)).max().unwrap_or(0);
    let total = factors.iter().map(|f| u32::from(factor_strength(f))).sum();
    (strongest, total)
}

/// External enrichment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Lifetime of cached provider responses
    pub ttl_secs: u64,
    /// Budget for one provider call
    pub timeout_ms: u64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 900,
            timeout_ms: 2_000,
        }
    }
}

impl EnrichmentSettings {
    /// Cache lifetime as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Provider call budget as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Score-impact hints attached to risk factors, per declared level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinerSettings {
    /// Impact of a VeryLow factor
    pub very_low_impact: f64,
    /// Impact of a Low factor
    pub low_impact: f64,
    /// Impact of a Medium factor
    pub medium_impact: f64,
    /// Impact of a High factor
    pub high_impact: f64,
    /// Impact of a VeryHigh factor
    pub very_high_impact: f64,
}

impl Default for CombinerSettings {
    fn default() -> Self {
        Self {
            very_low_impact: 0.0,
            low_impact: 5.0,
            medium_impact: 15.0,
            high_impact: 30.0,
            very_high_impact: 50.0,
        }
    }
}

impl CombinerSettings {
    /// Score-impact hint for a factor declared at `level`
    pub fn score_impact(&self, level: CrossRiskLevel) -> f64 {
        match level {
            CrossRiskLevel::VeryLow => self.very_low_impact,
            CrossRiskLevel::Low => self.low_impact,
            CrossRiskLevel::Medium => self.medium_impact,
            CrossRiskLevel::High => self.high_impact,
            CrossRiskLevel::VeryHigh => self.very_high_impact,
        }
    }
}

/// Complete risk engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Score cutoffs
    pub thresholds: RiskThresholds,
    /// Factors per level
    pub factor_requirements: FactorRequirements,
    /// Weight per signal category name; overrides processor defaults
    pub signal_weights: BTreeMap<String, f64>,
    /// Budget for a single signal processor
    pub processor_timeout_ms: u64,
    /// Budget for a single validation rule
    pub rule_timeout_ms: u64,
    /// External enrichment
    pub enrichment: EnrichmentSettings,
    /// Cross-system combination
    pub combiner: CombinerSettings,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let signal_weights = [
            (SignalCategory::Location, 0.25),
            (SignalCategory::Device, 0.2),
            (SignalCategory::Behavior, 0.2),
            (SignalCategory::Network, 0.15),
            (SignalCategory::Resource, 0.1),
            (SignalCategory::Time, 0.1),
        ]
        .into_iter()
        .map(|(category, weight)| (category.as_str().to_string(), weight))
        .collect();

        Self {
            thresholds: RiskThresholds::default(),
            factor_requirements: FactorRequirements::default(),
            signal_weights,
            processor_timeout_ms: 500,
            rule_timeout_ms: 1_000,
            enrichment: EnrichmentSettings::default(),
            combiner: CombinerSettings::default(),
        }
    }
}

impl RiskConfig {
    /// Parse and validate a TOML document layered over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RiskConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file layered over the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RiskError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `RISKGATE_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_env_from(std::env::vars())
    }

    /// Apply `RISKGATE_*` overrides from an explicit variable list
    ///
    /// Recognized keys: `THRESHOLDS_{LOW,MEDIUM,HIGH,CRITICAL}`,
    /// `FACTORS_{LOW,MEDIUM,HIGH,CRITICAL}` (comma separated),
    /// `SIGNAL_WEIGHTS_<CATEGORY>`, `PROCESSOR_TIMEOUT_MS`,
    /// `RULE_TIMEOUT_MS`, `ENRICHMENT_TTL_SECS`, `ENRICHMENT_TIMEOUT_MS`.
    /// Unrecognized keys are ignored.
    pub fn merge_env_from<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let name = name.to_ascii_lowercase();
            let value = value.trim();

            match name.as_str() {
                "thresholds_low" => self.thresholds.low = parse_env(&key, value)?,
                "thresholds_medium" => self.thresholds.medium = parse_env(&key, value)?,
                "thresholds_high" => self.thresholds.high = parse_env(&key, value)?,
                "thresholds_critical" => self.thresholds.critical = parse_env(&key, value)?,
                "factors_low" => self.factor_requirements.low = split_list(value),
                "factors_medium" => self.factor_requirements.medium = split_list(value),
                "factors_high" => self.factor_requirements.high = split_list(value),
                "factors_critical" => self.factor_requirements.critical = split_list(value),
                "processor_timeout_ms" => self.processor_timeout_ms = parse_env(&key, value)?,
                "rule_timeout_ms" => self.rule_timeout_ms = parse_env(&key, value)?,
                "enrichment_ttl_secs" => self.enrichment.ttl_secs = parse_env(&key, value)?,
                "enrichment_timeout_ms" => self.enrichment.timeout_ms = parse_env(&key, value)?,
                other => {
                    if let Some(category) = other.strip_prefix("signal_weights_") {
                        let weight = parse_env(&key, value)?;
                        self.signal_weights.insert(category.to_string(), weight);
                    }
                }
            }
        }
        self.validate()
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.factor_requirements.validate()?;

        let known: Vec<&str> = [
            SignalCategory::Location,
            SignalCategory::Device,
            SignalCategory::Behavior,
            SignalCategory::Time,
            SignalCategory::Network,
            SignalCategory::Resource,
            SignalCategory::History,
            SignalCategory::ThreatIntel,
        ]
        .iter()
        .map(SignalCategory::as_str)
        .collect();

        for (category, weight) in &self.signal_weights {
            if !known.contains(&category.as_str()) {
                return Err(RiskError::config(format!(
                    "unknown signal category '{category}' in signal_weights"
                )));
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(RiskError::config(format!(
                    "signal weight for '{category}' must be finite and non-negative"
                )));
            }
        }

        if self.processor_timeout_ms == 0 || self.rule_timeout_ms == 0 {
            return Err(RiskError::config("timeouts must be greater than zero"));
        }
        if self.enrichment.timeout_ms == 0 {
            return Err(RiskError::config("enrichment.timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Configured weight for a category, if any
    pub fn weight_for(&self, category: SignalCategory) -> Option<f64> {
        self.signal_weights.get(category.as_str()).copied()
    }

    /// Required factors at `level`
    pub fn required_factors(&self, level: RiskLevel) -> Vec<String> {
        let mut factors: Vec<String> = Vec::new();
        for factor in self.factor_requirements.for_level(level) {
            if !factors.contains(factor) {
                factors.push(factor.clone());
            }
        }
        factors
    }

    /// Budget for one signal processor
    pub fn processor_timeout(&self) -> Duration {
        Duration::from_millis(self.processor_timeout_ms)
    }

    /// Budget for one validation rule
    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| RiskError::config(format!("cannot parse {key}='{value}'")))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared, hot-reloadable configuration
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<RiskConfig>>>,
    source: Option<PathBuf>,
}

impl ConfigHandle {
    /// Wrap an already validated configuration
    pub fn new(config: RiskConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
            source: None,
        }
    }

    /// Load from a file and remember the path for [`ConfigHandle::reload`]
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut config = RiskConfig::load_from_file(&path)?;
        config.merge_with_env()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
            source: Some(path),
        })
    }

    /// Snapshot of the active configuration
    pub fn current(&self) -> Arc<RiskConfig> {
        Arc::clone(&self.inner.read())
    }

    /// Validate and swap in a new configuration
    pub fn replace(&self, config: RiskConfig) -> Result<()> {
        config.validate()?;
        *self.inner.write() = Arc::new(config);
        info!("risk configuration replaced");
        Ok(())
    }

    /// Re-read the source file; keeps the active config if the file is invalid
    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.source else {
            return Err(RiskError::config("configuration was not loaded from a file"));
        };
        let loaded = RiskConfig::load_from_file(path).and_then(|mut config| {
            config.merge_with_env()?;
            Ok(config)
        });
        match loaded {
            Ok(config) => {
                *self.inner.write() = Arc::new(config);
                info!(path = %path.display(), "risk configuration reloaded");
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "rejected configuration reload");
                Err(err)
            }
        }
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(RiskConfig::default().validate().is_ok());
    }

    #[test]
    fn classify_checks_from_the_top() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0.0), RiskLevel::Low);
        assert_eq!(t.classify(49.99), RiskLevel::Low);
        assert_eq!(t.classify(50.0), RiskLevel::Medium);
        assert_eq!(t.classify(57.5), RiskLevel::Medium);
        assert_eq!(t.classify(75.0), RiskLevel::High);
        assert_eq!(t.classify(89.9), RiskLevel::High);
        assert_eq!(t.classify(90.0), RiskLevel::Critical);
        assert_eq!(t.classify(100.0), RiskLevel::Critical);
    }

    #[test]
    fn rejects_descending_thresholds() {
        let mut config = RiskConfig::default();
        config.thresholds.high = 40.0;
        assert_matches!(config.validate(), Err(RiskError::Config { .. }));
    }

    #[test]
    fn rejects_empty_low_factors() {
        let mut config = RiskConfig::default();
        config.factor_requirements.low.clear();
        assert_matches!(config.validate(), Err(RiskError::Config { .. }));
    }

    #[test]
    fn rejects_weaker_factors_at_higher_level() {
        let mut config = RiskConfig::default();
        config.factor_requirements.critical = vec!["password".into()];
        assert_matches!(config.validate(), Err(RiskError::Config { .. }));
    }

    #[test]
    fn default_factor_assurance_is_non_decreasing() {
        let f = FactorRequirements::default();
        for pair in RiskLevel::ALL.windows(2) {
            assert!(assurance(f.for_level(pair[0])) <= assurance(f.for_level(pair[1])));
        }
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RiskConfig::from_toml_str(
            r#"
            [thresholds]
            high = 80.0

            [signal_weights]
            network = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.high, 80.0);
        assert_eq!(config.thresholds.critical, 90.0);
        assert_eq!(config.weight_for(SignalCategory::Network), Some(0.3));
        assert_eq!(config.factor_requirements, FactorRequirements::default());
    }

    #[test]
    fn rejects_unknown_signal_category() {
        let result = RiskConfig::from_toml_str("[signal_weights]\nweather = 0.1\n");
        assert_matches!(result, Err(RiskError::Config { .. }));
    }

    #[test]
    fn env_overrides_apply_and_validate() {
        let mut config = RiskConfig::default();
        config
            .merge_env_from(vec![
                ("RISKGATE_THRESHOLDS_HIGH".to_string(), "80".to_string()),
                ("RISKGATE_FACTORS_MEDIUM".to_string(), "password, sms".to_string()),
                ("RISKGATE_SIGNAL_WEIGHTS_DEVICE".to_string(), "0.5".to_string()),
                ("UNRELATED".to_string(), "1".to_string()),
            ])
            .unwrap();
        assert_eq!(config.thresholds.high, 80.0);
        assert_eq!(config.factor_requirements.medium, vec!["password", "sms"]);
        assert_eq!(config.weight_for(SignalCategory::Device), Some(0.5));

        let bad = config.merge_env_from(vec![(
            "RISKGATE_THRESHOLDS_CRITICAL".to_string(),
            "abc".to_string(),
        )]);
        assert_matches!(bad, Err(RiskError::Config { .. }));
    }

    #[test]
    fn required_factors_are_deduplicated_in_order() {
        let mut config = RiskConfig::default();
        config.factor_requirements.medium =
            vec!["password".into(), "totp".into(), "password".into()];
        assert_eq!(config.required_factors(RiskLevel::Medium), vec!["password", "totp"]);
    }

    #[test]
    fn handle_replace_rejects_invalid_config() {
        let handle = ConfigHandle::default();
        let mut bad = RiskConfig::default();
        bad.thresholds.medium = 95.0;
        assert!(handle.replace(bad).is_err());
        assert_eq!(handle.current().thresholds.medium, 50.0);
    }

    #[test]
    fn handle_reload_picks_up_file_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\nmedium = 40.0").unwrap();
        let handle = ConfigHandle::from_file(file.path()).unwrap();
        let before = handle.current();
        assert_eq!(before.thresholds.medium, 40.0);

        std::fs::write(file.path(), "[thresholds]\nmedium = 45.0\n").unwrap();
        handle.reload().unwrap();
        assert_eq!(handle.current().thresholds.medium, 45.0);
        // Snapshots taken before the reload are unaffected
        assert_eq!(before.thresholds.medium, 40.0);

        std::fs::write(file.path(), "[thresholds]\nmedium = 99.0\n").unwrap();
        assert!(handle.reload().is_err());
        assert_eq!(handle.current().thresholds.medium, 45.0);
    }
}
