//! Authentication context
//!
//! The context is the read-only input shared by every signal processor and
//! validation rule of one evaluation. Identification and jurisdiction are
//! typed; everything else lives in a free-form attribute map whose keys are
//! documented by the processors that read them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, RiskError};
use crate::jurisdiction::{Framework, Industry, Region};

/// Input of one authentication or transaction attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Subject being authenticated (user, account, customer)
    pub subject_id: String,
    /// Session the attempt belongs to
    pub session_id: String,
    /// Regulatory region of the attempt
    #[serde(default = "default_region")]
    pub region: Region,
    /// Industry of the relying party
    #[serde(default = "default_industry")]
    pub industry: Industry,
    /// Frameworks the relying party is bound by
    #[serde(default)]
    pub frameworks: Vec<Framework>,
    /// Free-form signal inputs
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

fn default_region() -> Region {
    Region::Global
}

fn default_industry() -> Industry {
    Industry::General
}

impl AuthContext {
    /// Create a context with no attributes
    pub fn new(subject_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            session_id: session_id.into(),
            region: Region::Global,
            industry: Industry::General,
            frameworks: Vec::new(),
            attributes: Map::new(),
        }
    }

    /// Set the region
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Set the industry
    pub fn with_industry(mut self, industry: Industry) -> Self {
        self.industry = industry;
        self
    }

    /// Add a framework
    pub fn with_framework(mut self, framework: Framework) -> Self {
        if !self.frameworks.contains(&framework) {
            self.frameworks.push(framework);
        }
        self
    }

    /// Set an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Raw attribute lookup
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// String attribute; `Err` if present with another type
    pub fn attr_str(&self, key: &str) -> Result<Option<&str>> {
        match self.attribute(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(type_mismatch(key, "string", other)),
        }
    }

    /// Numeric attribute; `Err` if present with another type or non-finite
    pub fn attr_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.attribute(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| RiskError::signal(format!("attribute '{key}' is not finite"))),
            Some(other) => Err(type_mismatch(key, "number", other)),
        }
    }

    /// Unsigned integer attribute; `Err` if present with another type
    pub fn attr_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.attribute(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
                RiskError::signal(format!("attribute '{key}' is not an unsigned integer"))
            }),
            Some(other) => Err(type_mismatch(key, "unsigned integer", other)),
        }
    }

    /// Boolean attribute; `Err` if present with another type
    pub fn attr_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.attribute(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(type_mismatch(key, "boolean", other)),
        }
    }

    /// List-of-strings attribute; `Err` if any element is not a string
    pub fn attr_str_list(&self, key: &str) -> Result<Option<Vec<&str>>> {
        match self.attribute(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| type_mismatch(key, "list of strings", item))
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(type_mismatch(key, "list of strings", other)),
        }
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> RiskError {
    let kind = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    RiskError::signal(format!("attribute '{key}' expected {expected}, found {kind}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_accessors_distinguish_missing_from_malformed() {
        let ctx = AuthContext::new("user-1", "sess-1")
            .with_attribute("failed_attempts", 3)
            .with_attribute("country", "DE")
            .with_attribute("is_tor", "yes");

        assert_eq!(ctx.attr_u64("failed_attempts").ok(), Some(Some(3)));
        assert_eq!(ctx.attr_str("country").ok(), Some(Some("DE")));
        assert_eq!(ctx.attr_f64("missing").ok(), Some(None));
        assert!(ctx.attr_bool("is_tor").is_err());
    }

    #[test]
    fn null_attributes_read_as_missing() {
        let ctx = AuthContext::new("u", "s").with_attribute("device_id", Value::Null);
        assert_eq!(ctx.attr_str("device_id").ok(), Some(None));
    }

    #[test]
    fn deserializes_with_defaults() {
        let ctx: AuthContext = serde_json::from_value(json!({
            "subject_id": "u",
            "session_id": "s",
            "attributes": {"known_countries": ["DE", "FR"]}
        }))
        .unwrap();
        assert_eq!(ctx.region, Region::Global);
        assert_eq!(ctx.industry, Industry::General);
        assert_eq!(
            ctx.attr_str_list("known_countries").ok().flatten(),
            Some(vec!["DE", "FR"])
        );
    }

    #[test]
    fn frameworks_are_deduplicated() {
        let ctx = AuthContext::new("u", "s")
            .with_framework(Framework::Gdpr)
            .with_framework(Framework::Gdpr);
        assert_eq!(ctx.frameworks, vec![Framework::Gdpr]);
    }
}
