//! Rating system configuration

use crate::error::{EngineError, Result};
use crate::types::{Rating, MINIMUM_RATING};
use serde::{Deserialize, Serialize};

/// K-factors by experience tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KFactors {
    pub beginner: f64,
    pub intermediate: f64,
    pub expert: f64,
}

impl Default for KFactors {
    fn default() -> Self {
        Self {
            beginner: 30.0,
            intermediate: 20.0,
            expert: 10.0,
        }
    }
}

/// Elo parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RatingConfig {
    pub k_factors: KFactors,
    /// Fraction of the dominance score added to a winner's rating
    pub ds_impact: f64,
    /// Logistic divider of the expected score
    pub rating_divider: f64,
    /// Players with at most this many matches use the beginner K
    pub beginner_match_limit: u32,
    /// Experienced players at or above this rating use the expert K
    pub expert_rating_threshold: Rating,
    pub minimum_rating: Rating,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factors: KFactors::default(),
            ds_impact: 0.1,
            rating_divider: 400.0,
            beginner_match_limit: 30,
            expert_rating_threshold: 1700,
            minimum_rating: MINIMUM_RATING,
        }
    }
}

impl RatingConfig {
    pub fn validate(&self) -> Result<()> {
        let k = &self.k_factors;
        if k.beginner <= 0.0 || k.intermediate <= 0.0 || k.expert <= 0.0 {
            return Err(EngineError::ConfigurationError {
                message: "K-factors must be positive".to_string(),
            }
            .into());
        }

        if self.rating_divider <= 0.0 {
            return Err(EngineError::ConfigurationError {
                message: "Rating divider must be positive".to_string(),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.ds_impact) {
            return Err(EngineError::ConfigurationError {
                message: format!("DS impact {} must lie within [0, 1]", self.ds_impact),
            }
            .into());
        }

        if self.minimum_rating < MINIMUM_RATING {
            return Err(EngineError::ConfigurationError {
                message: format!("Minimum rating cannot go below {}", MINIMUM_RATING),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rating_config() {
        let config = RatingConfig::default();
        assert_eq!(config.k_factors.beginner, 30.0);
        assert_eq!(config.k_factors.expert, 10.0);
        assert_eq!(config.rating_divider, 400.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rating_config_validation() {
        let mut config = RatingConfig::default();
        config.k_factors.expert = 0.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.rating_divider = -400.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.ds_impact = 2.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.minimum_rating = 500;
        assert!(config.validate().is_err());
    }
}
