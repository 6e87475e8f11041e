//! Standings and event statistics
//!
//! This module aggregates terminal matches into densely ranked standings and
//! summarizes events.

pub mod aggregator;
pub mod statistics;

// Re-export commonly used types
pub use aggregator::RankingAggregator;
pub use statistics::{EventStatistics, PlayerEventSummary};
