//! Tournament record storage
//!
//! This module defines the interface for persisting players and matches, with
//! an in-memory implementation used by tests and the CLI.

pub mod memory;

pub use memory::InMemoryTournamentStore;

use crate::types::{Match, MatchId, Player};
use async_trait::async_trait;

/// Trait for tournament storage operations
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Get a player by id
    async fn get_player(&self, player_id: &str) -> crate::error::Result<Option<Player>>;

    /// Store or replace a player
    async fn save_player(&self, player: Player) -> crate::error::Result<()>;

    /// All stored players, ordered by id
    async fn list_players(&self) -> crate::error::Result<Vec<Player>>;

    /// Get a match by id
    async fn get_match(&self, match_id: &MatchId) -> crate::error::Result<Option<Match>>;

    /// Store or replace a match
    async fn save_match(&self, m: Match) -> crate::error::Result<()>;

    /// Every match of an event, ordered by round then creation time
    async fn event_matches(&self, event_id: &str) -> crate::error::Result<Vec<Match>>;
}
