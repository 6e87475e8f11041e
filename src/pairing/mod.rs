//! Swiss pairing
//!
//! This module generates the next round's matches from standings and an
//! immutable pair history snapshot, avoiding recent rematches and assigning
//! byes for odd player counts.

pub mod generator;
pub mod history;

// Re-export commonly used types
pub use generator::{PairingGenerator, PairingOptions, PairingWarning, RoundPairing};
pub use history::PairHistoryIndex;
