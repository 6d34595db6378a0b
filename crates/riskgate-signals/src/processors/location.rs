//! Geolocation signal
//!
//! Context keys:
//!
//! | key | type | meaning |
//! |---|---|---|
//! | `country` | string | ISO country code of the request |
//! | `known_countries` | list of strings | countries previously seen for the subject |
//! | `latitude`, `longitude` | number | request position |
//! | `last_latitude`, `last_longitude` | number | position of the previous login |
//! | `seconds_since_last_login` | number | elapsed time since the previous login |

use async_trait::async_trait;
use riskgate_core::{AuthContext, Result, RiskSignal, SignalCategory};

use crate::processor::SignalProcessor;

/// Travel speed above which two logins are considered impossible
pub const IMPOSSIBLE_TRAVEL_KMH: f64 = 900.0;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Scores country reputation, novelty and travel plausibility
#[derive(Debug, Clone)]
pub struct LocationProcessor {
    high_risk_countries: Vec<String>,
}

impl Default for LocationProcessor {
    fn default() -> Self {
        Self::new(["KP", "IR", "SY", "CU", "RU", "BY"].map(String::from).to_vec())
    }
}

impl LocationProcessor {
    /// Processor with an explicit high-risk country list
    pub fn new(high_risk_countries: Vec<String>) -> Self {
        Self {
            high_risk_countries: high_risk_countries
                .into_iter()
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        }
    }
}

#[async_trait]
impl SignalProcessor for LocationProcessor {
    fn name(&self) -> &str {
        "location"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Location
    }

    fn default_weight(&self) -> f64 {
        0.25
    }

    async fn process(&self, context: &AuthContext) -> Result<RiskSignal> {
        let Some(country) = context.attr_str("country")? else {
            return Ok(RiskSignal::new(
                self.name(),
                self.category(),
                0.5,
                self.default_weight(),
                0.3,
            )
            .with_metadata("reason", "no location data"));
        };
        let country = country.to_ascii_uppercase();

        let mut value: f64 = 0.1;
        let mut confidence: f64 = 0.6;

        let high_risk = self.high_risk_countries.contains(&country);
        if high_risk {
            value += 0.5;
        }

        let mut new_country = false;
        if let Some(known) = context.attr_str_list("known_countries")? {
            confidence += 0.15;
            new_country =
                !known.is_empty() && !known.iter().any(|k| k.eq_ignore_ascii_case(&country));
            if new_country {
                value += 0.3;
            }
        }

        let mut speed_kmh = None;
        if let Some(travel) = travel_speed_kmh(context)? {
            confidence += 0.2;
            speed_kmh = Some(travel);
            if travel > IMPOSSIBLE_TRAVEL_KMH {
                value += 0.4;
            }
        }

        let mut signal = RiskSignal::new(
            self.name(),
            self.category(),
            value,
            self.default_weight(),
            confidence.min(0.95),
        )
        .with_metadata("country", country)
        .with_metadata("high_risk_country", high_risk)
        .with_metadata("new_country", new_country);
        if let Some(speed) = speed_kmh {
            signal = signal.with_metadata("travel_speed_kmh", speed.round());
        }
        Ok(signal)
    }
}

/// Speed implied by the previous and current login positions
fn travel_speed_kmh(context: &AuthContext) -> Result<Option<f64>> {
    let (Some(lat), Some(lon), Some(last_lat), Some(last_lon), Some(elapsed)) = (
        context.attr_f64("latitude")?,
        context.attr_f64("longitude")?,
        context.attr_f64("last_latitude")?,
        context.attr_f64("last_longitude")?,
        context.attr_f64("seconds_since_last_login")?,
    ) else {
        return Ok(None);
    };

    let distance = haversine_km(last_lat, last_lon, lat, lon);
    let hours = (elapsed / 3_600.0).max(1.0 / 60.0);
    Ok(Some(distance / hours))
}

/// Great-circle distance in kilometres
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_matches_known_distance() {
        // Paris to London is roughly 344 km
        let d = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 344.0).abs() < 5.0, "got {d}");
    }

    #[tokio::test]
    async fn missing_country_is_neutral_and_low_confidence() {
        let signal = LocationProcessor::default()
            .process(&AuthContext::new("u", "s"))
            .await
            .unwrap();
        assert_eq!(signal.value, 0.5);
        assert_eq!(signal.confidence, 0.3);
    }

    #[tokio::test]
    async fn impossible_travel_raises_risk() {
        let ctx = AuthContext::new("u", "s")
            .with_attribute("country", "US")
            .with_attribute("latitude", 40.71)
            .with_attribute("longitude", -74.0)
            .with_attribute("last_latitude", 48.85)
            .with_attribute("last_longitude", 2.35)
            .with_attribute("seconds_since_last_login", 1_800);
        let signal = LocationProcessor::default().process(&ctx).await.unwrap();
        assert!((signal.value - 0.5).abs() < 1e-9);
        assert!(signal.metadata.contains_key("travel_speed_kmh"));
    }

    #[tokio::test]
    async fn new_high_risk_country_saturates() {
        let ctx = AuthContext::new("u", "s")
            .with_attribute("country", "kp")
            .with_attribute("known_countries", serde_json::json!(["DE"]));
        let signal = LocationProcessor::default().process(&ctx).await.unwrap();
        assert!((signal.value - 0.9).abs() < 1e-9);
        assert_eq!(signal.metadata["new_country"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn malformed_coordinates_fail() {
        let ctx = AuthContext::new("u", "s")
            .with_attribute("country", "DE")
            .with_attribute("latitude", "north");
        assert!(LocationProcessor::default().process(&ctx).await.is_err());
    }
}
