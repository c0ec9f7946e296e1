use crate::error::RecommendError;
use crate::models::{AudioFeatures, TARGET_TEMPO_RANGE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for candidate sourcing and the fallback chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub count: usize,              // Tracks returned when the caller does not ask for a number
    pub max_count: usize,          // Largest count a caller may ask for
    pub min_library_size: usize,   // Saved tracks needed before library mode is attempted
    pub library_scan_max: usize,   // Saved tracks read before sampling
    pub library_sample_cap: usize, // Tracks sampled from the library for scoring
    pub search_cap: usize,         // Results requested from one catalog search
    pub feature_batch_size: usize, // Ids per audio-features call
    pub track_batch_size: usize,   // Ids per track-details call
    pub time_budget_secs: u64,     // Wall-clock budget for the whole fallback chain
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            count: 10,
            max_count: 50,
            min_library_size: 5,
            library_scan_max: 300,
            library_sample_cap: 100,
            search_cap: 50,
            feature_batch_size: 100,
            track_batch_size: 50,
            time_budget_secs: 20,
        }
    }
}

impl RecommendConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn load_from_file(path: &str) -> Result<RecommendConfig, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: RecommendConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        let positive = [
            ("count", self.count),
            ("max_count", self.max_count),
            ("search_cap", self.search_cap),
            ("library_sample_cap", self.library_sample_cap),
            ("feature_batch_size", self.feature_batch_size),
            ("track_batch_size", self.track_batch_size),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(RecommendError::Configuration(format!(
                "{name} must be greater than zero"
            )));
        }
        if self.search_cap > 50 || self.track_batch_size > 50 || self.feature_batch_size > 100 {
            return Err(RecommendError::Configuration(
                "batch sizes exceed the API limits (search 50, tracks 50, features 100)"
                    .to_string(),
            ));
        }
        self.check_count(self.count)
    }

    /// Reject counts outside 1..=max_count
    pub fn check_count(&self, count: usize) -> Result<(), RecommendError> {
        if count == 0 || count > self.max_count {
            return Err(RecommendError::InvalidInput(format!(
                "count must be between 1 and {}, got {count}",
                self.max_count
            )));
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    /// How many results a catalog search asks for: extra headroom for feature filtering
    pub fn search_limit(&self, count: usize) -> usize {
        (count * 3).min(self.search_cap)
    }
}

/// Caller-supplied adjustments to a preset's target features
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOverrides {
    pub valence: Option<f32>,
    pub energy: Option<f32>,
    pub danceability: Option<f32>,
    pub tempo: Option<f32>,
}

impl FeatureOverrides {
    pub fn is_empty(&self) -> bool {
        *self == FeatureOverrides::default()
    }

    /// Apply the overrides on top of a target, rejecting out-of-range values
    pub fn apply(&self, target: AudioFeatures) -> Result<AudioFeatures, RecommendError> {
        let adjusted = AudioFeatures {
            valence: self.valence.unwrap_or(target.valence),
            energy: self.energy.unwrap_or(target.energy),
            danceability: self.danceability.unwrap_or(target.danceability),
            tempo: self.tempo.unwrap_or(target.tempo),
        };
        adjusted.validate(&TARGET_TEMPO_RANGE)?;
        Ok(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;

    #[test]
    fn test_default_config_is_valid() {
        let config = RecommendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.time_budget(), Duration::from_secs(20));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RecommendConfig =
            serde_json::from_str(r#"{"count": 5, "time_budget_secs": 3}"#).unwrap();
        assert_eq!(config.count, 5);
        assert_eq!(config.min_library_size, 5);
        assert_eq!(config.search_cap, 50);
        assert_eq!(config.time_budget(), Duration::from_secs(3));
    }

    #[test]
    fn test_config_rejects_api_limit_violations() {
        let config = RecommendConfig {
            feature_batch_size: 150,
            ..RecommendConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RecommendError::Configuration(_))
        ));

        let config = RecommendConfig {
            track_batch_size: 0,
            ..RecommendConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_count_bounds() {
        let config = RecommendConfig::default();
        assert!(config.check_count(1).is_ok());
        assert!(config.check_count(50).is_ok());
        assert!(matches!(
            config.check_count(0),
            Err(RecommendError::InvalidInput(_))
        ));
        assert!(config.check_count(51).is_err());
    }

    #[test]
    fn test_search_limit_over_fetches_within_cap() {
        let config = RecommendConfig::default();
        assert_eq!(config.search_limit(10), 30);
        assert_eq!(config.search_limit(20), 50);
    }

    #[test]
    fn test_overrides_replace_only_given_features() {
        let overrides = FeatureOverrides {
            energy: Some(0.95),
            tempo: Some(150.0),
            ..FeatureOverrides::default()
        };
        let target = overrides.apply(Mood::Happy.preset().target).unwrap();

        assert_eq!(target.valence, 0.8);
        assert_eq!(target.energy, 0.95);
        assert_eq!(target.danceability, 0.7);
        assert_eq!(target.tempo, 150.0);
        assert!(!overrides.is_empty());
        assert!(FeatureOverrides::default().is_empty());
    }

    #[test]
    fn test_overrides_out_of_range_are_rejected() {
        let too_fast = FeatureOverrides {
            tempo: Some(240.0),
            ..FeatureOverrides::default()
        };
        let too_positive = FeatureOverrides {
            valence: Some(1.5),
            ..FeatureOverrides::default()
        };
        let target = Mood::Chill.preset().target;

        assert!(matches!(
            too_fast.apply(target),
            Err(RecommendError::InvalidInput(_))
        ));
        assert!(matches!(
            too_positive.apply(target),
            Err(RecommendError::InvalidInput(_))
        ));
    }
}
