//! Rating system using the Elo algorithm
//!
//! This module provides the rating calculator interface and the Elo
//! implementation used to update player ratings after each match.

pub mod calculator;
pub mod elo;

// Re-export commonly used types
pub use calculator::{RatedOutcome, RatingCalculator};
pub use elo::EloRatingCalculator;
