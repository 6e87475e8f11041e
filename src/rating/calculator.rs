//! Rating calculator trait
//!
//! This module defines the interface the match processor uses to turn a
//! resolved outcome into a new rating for one participant.

use crate::types::{PlayerMatchInfo, Rating};
use skillratings::Outcomes;

/// Inputs describing one side of a resolved match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatedOutcome {
    /// Outcome from the rated player's perspective
    pub outcome: Outcomes,
    /// Opponent rating before the match
    pub opponent_rating: Rating,
    /// Dominance score of the match, 0..=100
    pub ds: u8,
}

/// Trait for calculating rating changes after matches
pub trait RatingCalculator: Send + Sync {
    /// Compute the post-match rating of `player`
    ///
    /// # Arguments
    /// * `player` - Pre-match snapshot (rating and lifetime matches played)
    /// * `rated` - Outcome, opponent rating and dominance score
    ///
    /// # Returns
    /// The new rating, never below the configured floor
    fn new_rating(&self, player: &PlayerMatchInfo, rated: &RatedOutcome) -> Rating;

    /// Probability-like expectation of `player_rating` scoring against `opponent_rating`
    fn expected_score(&self, player_rating: Rating, opponent_rating: Rating) -> f64;

    /// K-factor for a player with the given rating and experience
    fn k_factor(&self, rating: Rating, matches_played: u32) -> f64;

    /// Rating given to newly registered players
    fn initial_rating(&self) -> Rating;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Round half up, matching how club sheets have always rounded rating moves
pub(crate) fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(14.5), 15);
        assert_eq!(round_half_up(14.49), 14);
        assert_eq!(round_half_up(-14.5), -14);
        assert_eq!(round_half_up(-14.51), -15);
        assert_eq!(round_half_up(0.0), 0);
    }
}
