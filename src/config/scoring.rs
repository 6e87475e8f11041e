//! Match scoring configuration (PR points, dominance score, forfeits)

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Points de Rencontre awarded per outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchPoints {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
    pub forfeit_win: u32,
    pub forfeit_loss: u32,
}

impl Default for MatchPoints {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 2,
            loss: 1,
            forfeit_win: 3,
            forfeit_loss: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub points: MatchPoints,
    /// Share of total points won by the margin at which DS saturates to 100
    pub dominance_threshold: f64,
    /// Score credited to the opponent of a forfeiting player
    pub forfeit_win_score: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points: MatchPoints::default(),
            dominance_threshold: 0.8,
            forfeit_win_score: 10,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.dominance_threshold > 0.0 && self.dominance_threshold <= 1.0) {
            return Err(EngineError::ConfigurationError {
                message: format!(
                    "Dominance threshold {} must lie within (0, 1]",
                    self.dominance_threshold
                ),
            }
            .into());
        }

        if self.forfeit_win_score == 0 {
            return Err(EngineError::ConfigurationError {
                message: "Forfeit win score must be greater than 0".to_string(),
            }
            .into());
        }

        let p = &self.points;
        if p.win < p.draw || p.draw < p.loss {
            return Err(EngineError::ConfigurationError {
                message: "Match points must satisfy win >= draw >= loss".to_string(),
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
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.points.win, 3);
        assert_eq!(config.points.draw, 2);
        assert_eq!(config.points.loss, 1);
        assert_eq!(config.points.forfeit_loss, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scoring_config_validation() {
        let mut config = ScoringConfig::default();
        config.dominance_threshold = 0.0;
        assert!(config.validate().is_err());

        config = ScoringConfig::default();
        config.points.loss = 5;
        assert!(config.validate().is_err());

        config = ScoringConfig::default();
        config.forfeit_win_score = 0;
        assert!(config.validate().is_err());
    }
}
