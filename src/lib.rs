//! Club Tournament - rating, ranking and Swiss pairing engine
//!
//! This crate turns reported match scores into Elo rating and category
//! changes, aggregates results into deterministic standings and generates
//! Swiss-style rounds that avoid recent rematches.

pub mod category;
pub mod config;
pub mod error;
pub mod matches;
pub mod metrics;
pub mod pairing;
pub mod ranking;
pub mod rating;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{EngineError, Result};
pub use types::*;

// Re-export key components
pub use category::CategoryTable;
pub use matches::{MatchProcessor, ProcessedMatch};
pub use pairing::{PairingGenerator, PairingOptions, PairingWarning, RoundPairing};
pub use ranking::RankingAggregator;
pub use rating::{EloRatingCalculator, RatingCalculator};
pub use service::TournamentService;
pub use store::{InMemoryTournamentStore, TournamentStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
