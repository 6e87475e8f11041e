//! Test fixtures shared by the integration and property tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use club_tournament::category::CategoryTable;
use club_tournament::config::AppConfig;
use club_tournament::metrics::MetricsCollector;
use club_tournament::service::TournamentService;
use club_tournament::store::InMemoryTournamentStore;
use club_tournament::types::{Match, Player, PlayerMatchInfo, Rating};
use club_tournament::utils::{generate_match_id, parse_timestamp};
use std::sync::Arc;

pub const EVENT_ID: &str = "spring-open";

/// Parse a fixed RFC 3339 timestamp
pub fn ts(value: &str) -> DateTime<Utc> {
    parse_timestamp(value).unwrap()
}

/// Fixed timestamp used wherever the exact time does not matter
pub fn club_night() -> DateTime<Utc> {
    ts("2024-03-01T19:00:00Z")
}

/// Build a roster from `(id, rating)` pairs with default categories
pub fn roster(specs: &[(&str, Rating)]) -> Vec<Player> {
    let table = CategoryTable::default();
    specs
        .iter()
        .map(|(id, rating)| Player::new(*id, format!("Player {}", id), *rating, &table, club_night()))
        .collect()
}

/// Roster of `count` players named `p00`, `p01`, ... with spread ratings
pub fn numbered_roster(count: usize) -> Vec<Player> {
    let table = CategoryTable::default();
    (0..count)
        .map(|i| {
            let id = format!("p{:02}", i);
            let rating = 1000 + ((i * 37) % 1100) as Rating;
            Player::new(id.clone(), id, rating, &table, club_night())
        })
        .collect()
}

/// Pending match between two roster players
pub fn pending_match(p1: &Player, p2: &Player, round: u32) -> Match {
    Match::new_pending(
        generate_match_id(EVENT_ID, round, &p1.id, &p2.id),
        EVENT_ID.to_string(),
        PlayerMatchInfo::from_player(p1),
        PlayerMatchInfo::from_player(p2),
        round,
        false,
        club_night(),
    )
}

/// Service over a fresh in-memory store with `players` registered
pub async fn service_with(players: Vec<Player>) -> Arc<TournamentService> {
    let service = TournamentService::new(
        &AppConfig::default(),
        Arc::new(InMemoryTournamentStore::new()),
        Arc::new(MetricsCollector::new().unwrap()),
    )
    .unwrap();

    for player in players {
        service.register_player(player).await.unwrap();
    }

    Arc::new(service)
}
