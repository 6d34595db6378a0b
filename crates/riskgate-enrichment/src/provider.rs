//! Provider seam and request/response types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riskgate_core::{CrossRiskLevel, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One lookup against an external data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    /// Subject the data is about
    pub subject_id: String,
    /// Kind of data requested (for example `credit_report`)
    pub data_type: String,
    /// Provider to ask
    pub provider: String,
    /// Per-request parameters; a non-empty map bypasses the cache
    #[serde(default)]
    pub context_params: Option<Map<String, Value>>,
}

impl EnrichmentRequest {
    /// Request without contextual parameters
    pub fn new(
        subject_id: impl Into<String>,
        data_type: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            data_type: data_type.into(),
            provider: provider.into(),
            context_params: None,
        }
    }

    /// Add a contextual parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context_params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether the answer depends on per-request parameters
    pub fn bypasses_cache(&self) -> bool {
        self.context_params
            .as_ref()
            .is_some_and(|params| !params.is_empty())
    }
}

/// Provider answer plus the risk level it reports, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    /// Provider that answered
    pub provider: String,
    /// Kind of data returned
    pub data_type: String,
    /// Raw provider payload
    pub payload: Value,
    /// Parsed from the payload's `risk_level` field
    pub risk_level: Option<CrossRiskLevel>,
    /// When the answer was produced, from the provider or the cache
    pub received_at: DateTime<Utc>,
}

impl EnrichmentResponse {
    /// Wrap a payload, parsing its `risk_level`
    ///
    /// An absent or unrecognised `risk_level` leaves the level unset.
    pub fn from_payload(request: &EnrichmentRequest, payload: Value, received_at: DateTime<Utc>) -> Self {
        let risk_level = payload
            .get("risk_level")
            .and_then(Value::as_str)
            .and_then(|level| level.parse().ok());
        Self {
            provider: request.provider.clone(),
            data_type: request.data_type.clone(),
            payload,
            risk_level,
            received_at,
        }
    }
}

/// External source of risk data
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Provider name used in requests
    fn name(&self) -> &str;

    /// Fetch the payload for `request`
    async fn fetch(&self, request: &EnrichmentRequest) -> Result<Value>;
}
