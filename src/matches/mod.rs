//! Match result processing
//!
//! This module validates reported scores, derives PR/DS/PDI, computes rating
//! and category changes for both participants and keeps player statistics.

pub mod processor;
pub mod scoring;
pub mod statistics;

// Re-export commonly used types
pub use processor::{ForfeitRole, MatchProcessor, PlayerDelta, ProcessedMatch};
pub use statistics::{apply_delta, head_to_head, revert_match, HeadToHead};
