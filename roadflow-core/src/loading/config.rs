use serde::{Deserialize, Serialize};

use crate::{DEGREES_TO_METERS, Error};

/// Tunables of the matching and diffusion core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Matches farther than this from their segment midpoint are dropped
    pub match_distance_tolerance_m: f64,
    /// Bearings differing by more than `180 - tolerance` are opposite
    pub direction_opposition_tolerance_deg: f64,
    /// Target length of the pieces long segments are split into
    pub split_target_m: f64,
    /// Decimal digits compared when deciding whether diffusion changed an edge
    pub diffusion_precision_digits: u32,
    /// Round cap for diffusion, derived from the network size when unset
    pub diffusion_max_rounds: Option<usize>,
    /// Name of the feature property carrying the traffic ratio
    pub traffic_property: String,
    pub degrees_to_meters: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_distance_tolerance_m: 10.0,
            direction_opposition_tolerance_deg: 45.0,
            split_target_m: 15.0,
            diffusion_precision_digits: 3,
            diffusion_max_rounds: None,
            traffic_property: "traffic_level".to_string(),
            degrees_to_meters: DEGREES_TO_METERS,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.match_distance_tolerance_m.is_finite() && self.match_distance_tolerance_m >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "match_distance_tolerance_m must be a non-negative number, got {}",
                self.match_distance_tolerance_m
            )));
        }
        if !(0.0..180.0).contains(&self.direction_opposition_tolerance_deg) {
            return Err(Error::InvalidConfig(format!(
                "direction_opposition_tolerance_deg must be in [0, 180), got {}",
                self.direction_opposition_tolerance_deg
            )));
        }
        if !(self.split_target_m.is_finite() && self.split_target_m > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "split_target_m must be positive, got {}",
                self.split_target_m
            )));
        }
        if self.diffusion_precision_digits > 12 {
            return Err(Error::InvalidConfig(format!(
                "diffusion_precision_digits must be at most 12, got {}",
                self.diffusion_precision_digits
            )));
        }
        if self.diffusion_max_rounds == Some(0) {
            return Err(Error::InvalidConfig(
                "diffusion_max_rounds must be at least 1".to_string(),
            ));
        }
        if self.traffic_property.is_empty() {
            return Err(Error::InvalidConfig(
                "traffic_property must not be empty".to_string(),
            ));
        }
        if !(self.degrees_to_meters.is_finite() && self.degrees_to_meters > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "degrees_to_meters must be positive, got {}",
                self.degrees_to_meters
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.match_distance_tolerance_m, 10.0);
        assert_eq!(config.direction_opposition_tolerance_deg, 45.0);
        assert_eq!(config.split_target_m, 15.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "split_target_m": 20.0, "diffusion_precision_digits": 6 }"#)
                .unwrap();
        assert_eq!(config.split_target_m, 20.0);
        assert_eq!(config.diffusion_precision_digits, 6);
        assert_eq!(config.match_distance_tolerance_m, 10.0);
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            EngineConfig {
                split_target_m: 0.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                direction_opposition_tolerance_deg: 180.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                diffusion_max_rounds: Some(0),
                ..EngineConfig::default()
            },
            EngineConfig {
                match_distance_tolerance_m: f64::NAN,
                ..EngineConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }
}
