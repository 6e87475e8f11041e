//! Elo rating system implementation
//!
//! Classic two-player Elo with an experience/rating dependent K-factor and a
//! margin bonus for the winner proportional to the dominance score.

use crate::config::RatingConfig;
use crate::rating::calculator::{round_half_up, RatedOutcome, RatingCalculator};
use crate::types::{PlayerMatchInfo, Rating, DEFAULT_RATING};
use skillratings::Outcomes;

/// Elo rating calculator
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    config: RatingConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo calculator, rejecting invalid parameters
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    /// Unrounded Elo change before the margin bonus
    fn base_change(&self, player: &PlayerMatchInfo, rated: &RatedOutcome) -> f64 {
        let k = self.k_factor(player.rating_before, player.matches_played);
        let expected = self.expected_score(player.rating_before, rated.opponent_rating);
        k * (actual_score(rated.outcome) - expected)
    }

    /// Margin bonus, only ever granted to the winner
    fn ds_bonus(&self, rated: &RatedOutcome) -> i32 {
        if rated.outcome == Outcomes::WIN {
            round_half_up(self.config.ds_impact * f64::from(rated.ds))
        } else {
            0
        }
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn new_rating(&self, player: &PlayerMatchInfo, rated: &RatedOutcome) -> Rating {
        let base = round_half_up(self.base_change(player, rated));
        let bonus = self.ds_bonus(rated);

        (player.rating_before + base + bonus).max(self.config.minimum_rating)
    }

    fn expected_score(&self, player_rating: Rating, opponent_rating: Rating) -> f64 {
        let exponent = f64::from(opponent_rating - player_rating) / self.config.rating_divider;
        1.0 / (1.0 + 10f64.powf(exponent))
    }

    fn k_factor(&self, rating: Rating, matches_played: u32) -> f64 {
        let k = &self.config.k_factors;
        if matches_played <= self.config.beginner_match_limit {
            k.beginner
        } else if rating >= self.config.expert_rating_threshold {
            k.expert
        } else {
            k.intermediate
        }
    }

    fn initial_rating(&self) -> Rating {
        DEFAULT_RATING.max(self.config.minimum_rating)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "elo",
            "k_factors": {
                "beginner": self.config.k_factors.beginner,
                "intermediate": self.config.k_factors.intermediate,
                "expert": self.config.k_factors.expert,
            },
            "ds_impact": self.config.ds_impact,
            "rating_divider": self.config.rating_divider,
            "minimum_rating": self.config.minimum_rating,
        })
    }
}

/// 1.0 / 0.5 / 0.0 for a win, draw or loss
fn actual_score(outcome: Outcomes) -> f64 {
    match outcome {
        Outcomes::WIN => 1.0,
        Outcomes::DRAW => 0.5,
        Outcomes::LOSS => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillratings::elo::{expected_score, EloRating};

    fn snapshot(rating: Rating, matches_played: u32) -> PlayerMatchInfo {
        PlayerMatchInfo {
            id: "p".to_string(),
            rating_before: rating,
            rating_after: rating,
            category_before: "ONYX".to_string(),
            category_after: "ONYX".to_string(),
            matches_played,
        }
    }

    fn rated(outcome: Outcomes, opponent_rating: Rating, ds: u8) -> RatedOutcome {
        RatedOutcome {
            outcome,
            opponent_rating,
            ds,
        }
    }

    #[test]
    fn test_new_players_equal_ratings() {
        let calc = EloRatingCalculator::default();
        let winner = calc.new_rating(&snapshot(1200, 0), &rated(Outcomes::WIN, 1200, 50));
        let loser = calc.new_rating(&snapshot(1200, 0), &rated(Outcomes::LOSS, 1200, 50));

        // K=30, expected 0.5: +15 base plus round(0.1 * 50) for the winner
        assert_eq!(winner, 1220);
        assert_eq!(loser, 1185);
    }

    #[test]
    fn test_draw_gets_no_bonus() {
        let calc = EloRatingCalculator::default();
        let rating = calc.new_rating(&snapshot(1300, 5), &rated(Outcomes::DRAW, 1300, 100));
        assert_eq!(rating, 1300);
    }

    #[test]
    fn test_k_factor_selection() {
        let calc = EloRatingCalculator::default();
        assert_eq!(calc.k_factor(1800, 0), 30.0);
        assert_eq!(calc.k_factor(1800, 30), 30.0);
        assert_eq!(calc.k_factor(1800, 31), 10.0);
        assert_eq!(calc.k_factor(1700, 31), 10.0);
        assert_eq!(calc.k_factor(1699, 31), 20.0);
    }

    #[test]
    fn test_expected_scores_are_complementary() {
        let calc = EloRatingCalculator::default();
        let a = calc.expected_score(1500, 1300);
        let b = calc.expected_score(1300, 1500);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!(a > 0.5);
    }

    #[test]
    fn test_expected_score_matches_skillratings() {
        let calc = EloRatingCalculator::default();
        let (expected_one, expected_two) = expected_score(
            &EloRating { rating: 1620.0 },
            &EloRating { rating: 1410.0 },
        );

        assert!((calc.expected_score(1620, 1410) - expected_one).abs() < 1e-9);
        assert!((calc.expected_score(1410, 1620) - expected_two).abs() < 1e-9);
    }

    #[test]
    fn test_rating_floor() {
        let calc = EloRatingCalculator::default();
        let rating = calc.new_rating(&snapshot(1005, 0), &rated(Outcomes::LOSS, 1005, 0));
        assert_eq!(rating, 1000);

        let rating = calc.new_rating(&snapshot(1000, 50), &rated(Outcomes::LOSS, 1600, 0));
        assert_eq!(rating, 1000);
    }

    #[test]
    fn test_underdog_win_gains_more() {
        let calc = EloRatingCalculator::default();
        let underdog = calc.new_rating(&snapshot(1300, 40), &rated(Outcomes::WIN, 1600, 0));
        let favourite = calc.new_rating(&snapshot(1600, 40), &rated(Outcomes::WIN, 1300, 0));
        assert!(underdog - 1300 > favourite - 1600);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RatingConfig::default();
        config.rating_divider = 0.0;
        assert!(EloRatingCalculator::new(config).is_err());
    }
}
