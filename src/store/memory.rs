//! In-memory tournament store

use crate::error::EngineError;
use crate::store::TournamentStore;
use crate::types::{Match, MatchId, Player, PlayerId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory storage for players and matches
#[derive(Debug, Default)]
pub struct InMemoryTournamentStore {
    players: RwLock<BTreeMap<PlayerId, Player>>,
    matches: RwLock<HashMap<MatchId, Match>>,
}

impl InMemoryTournamentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(what: &str) -> EngineError {
    EngineError::InternalError {
        message: format!("Failed to acquire {} lock", what),
    }
}

#[async_trait]
impl TournamentStore for InMemoryTournamentStore {
    async fn get_player(&self, player_id: &str) -> crate::error::Result<Option<Player>> {
        let players = self
            .players
            .read()
            .map_err(|_| lock_error("players read"))?;
        Ok(players.get(player_id).cloned())
    }

    async fn save_player(&self, player: Player) -> crate::error::Result<()> {
        let mut players = self
            .players
            .write()
            .map_err(|_| lock_error("players write"))?;
        players.insert(player.id.clone(), player);
        Ok(())
    }

    async fn list_players(&self) -> crate::error::Result<Vec<Player>> {
        let players = self
            .players
            .read()
            .map_err(|_| lock_error("players read"))?;
        Ok(players.values().cloned().collect())
    }

    async fn get_match(&self, match_id: &MatchId) -> crate::error::Result<Option<Match>> {
        let matches = self
            .matches
            .read()
            .map_err(|_| lock_error("matches read"))?;
        Ok(matches.get(match_id).cloned())
    }

    async fn save_match(&self, m: Match) -> crate::error::Result<()> {
        let mut matches = self
            .matches
            .write()
            .map_err(|_| lock_error("matches write"))?;
        matches.insert(m.id, m);
        Ok(())
    }

    async fn event_matches(&self, event_id: &str) -> crate::error::Result<Vec<Match>> {
        let matches = self
            .matches
            .read()
            .map_err(|_| lock_error("matches read"))?;

        let mut event: Vec<Match> = matches
            .values()
            .filter(|m| m.event_id == event_id)
            .cloned()
            .collect();
        event.sort_by(|a, b| {
            a.round()
                .cmp(&b.round())
                .then_with(|| a.metadata.created_at.cmp(&b.metadata.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryTable;
    use crate::types::PlayerMatchInfo;
    use crate::utils::{generate_match_id, parse_timestamp};

    #[tokio::test]
    async fn test_store_round_trip() {
        let table = CategoryTable::default();
        let at = parse_timestamp("2024-03-01T19:00:00Z").unwrap();
        let alice = Player::new("alice", "Alice", 1200, &table, at);
        let bob = Player::new("bob", "Bob", 1250, &table, at);

        let store = InMemoryTournamentStore::new();
        store.save_player(bob.clone()).await.unwrap();
        store.save_player(alice.clone()).await.unwrap();

        let listed = store.list_players().await.unwrap();
        assert_eq!(listed[0].id, "alice");
        assert_eq!(store.get_player("bob").await.unwrap(), Some(bob.clone()));
        assert!(store.get_player("carol").await.unwrap().is_none());

        let later = Match::new_pending(
            generate_match_id("cup", 2, "alice", "bob"),
            "cup".to_string(),
            PlayerMatchInfo::from_player(&alice),
            PlayerMatchInfo::from_player(&bob),
            2,
            false,
            at,
        );
        let earlier = Match::new_pending(
            generate_match_id("cup", 1, "alice", "bob"),
            "cup".to_string(),
            PlayerMatchInfo::from_player(&alice),
            PlayerMatchInfo::from_player(&bob),
            1,
            false,
            at,
        );
        store.save_match(later.clone()).await.unwrap();
        store.save_match(earlier.clone()).await.unwrap();

        let matches = store.event_matches("cup").await.unwrap();
        assert_eq!(matches, vec![earlier, later.clone()]);
        assert!(store.event_matches("league").await.unwrap().is_empty());
        assert_eq!(store.get_match(&later.id).await.unwrap(), Some(later));
    }
}
