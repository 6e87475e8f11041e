//! Event-level statistics

use crate::category::CategoryTable;
use crate::types::{Match, MatchStatus, Player, PlayerId, Rating, Side, BYE_PLAYER_ID};
use serde::{Deserialize, Serialize};
use skillratings::Outcomes;
use std::collections::{BTreeMap, BTreeSet};

/// Per-player summary within one event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEventSummary {
    pub matches: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub forfeits: u32,
    pub rating_change: Rating,
}

/// Summary of an event's matches and participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatistics {
    pub total_matches: usize,
    pub completed_matches: usize,
    pub forfeit_matches: usize,
    pub pending_matches: usize,
    pub active_players: usize,
    pub average_rating: f64,
    /// Mean DS over played (non-bye) matches
    #[serde(rename = "averageDS")]
    pub average_ds: f64,
    /// Matches whose two players shared a category at the time
    pub matches_per_category: BTreeMap<String, usize>,
    /// Current category of every active player
    pub category_distribution: BTreeMap<String, usize>,
    pub player_stats: BTreeMap<PlayerId, PlayerEventSummary>,
}

impl EventStatistics {
    /// Compute statistics for `matches` of a single event
    pub fn compute(matches: &[Match], players: &[Player], categories: &CategoryTable) -> Self {
        let mut participants: BTreeSet<&str> = BTreeSet::new();
        let mut matches_per_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut player_stats: BTreeMap<PlayerId, PlayerEventSummary> = BTreeMap::new();
        let mut ds_total = 0u64;
        let mut ds_count = 0u64;

        for m in matches {
            for side in [Side::Player1, Side::Player2] {
                let id = m.participant(side).id.as_str();
                if id != BYE_PLAYER_ID {
                    participants.insert(id);
                }
            }

            let Some(result) = m.result.as_ref().filter(|_| m.status.has_result()) else {
                continue;
            };

            if m.is_bye() {
                continue;
            }

            ds_total += u64::from(result.ds);
            ds_count += 1;

            if m.player1.category_before == m.player2.category_before {
                *matches_per_category
                    .entry(m.player1.category_before.clone())
                    .or_default() += 1;
            }

            for side in [Side::Player1, Side::Player2] {
                let participant = m.participant(side);
                let summary = player_stats.entry(participant.id.clone()).or_default();
                summary.matches += 1;
                match result.outcome_for(side) {
                    Outcomes::WIN => summary.wins += 1,
                    Outcomes::DRAW => summary.draws += 1,
                    Outcomes::LOSS => summary.losses += 1,
                }
                if result
                    .forfeit
                    .as_ref()
                    .is_some_and(|info| info.forfeited_by == participant.id)
                {
                    summary.forfeits += 1;
                }
                summary.rating_change += participant.rating_change();
            }
        }

        let active: Vec<&Player> = players
            .iter()
            .filter(|p| p.active && participants.contains(p.id.as_str()))
            .collect();

        let average_rating = if active.is_empty() {
            0.0
        } else {
            active
                .iter()
                .map(|p| f64::from(p.current_rating))
                .sum::<f64>()
                / active.len() as f64
        };

        let mut category_distribution: BTreeMap<String, usize> = categories
            .tiers()
            .iter()
            .map(|tier| (tier.name.clone(), 0))
            .collect();
        for player in &active {
            *category_distribution
                .entry(player.category.clone())
                .or_default() += 1;
        }

        Self {
            total_matches: matches.len(),
            completed_matches: count_status(matches, MatchStatus::Completed),
            forfeit_matches: count_status(matches, MatchStatus::Forfeit),
            pending_matches: count_status(matches, MatchStatus::Pending),
            active_players: active.len(),
            average_rating,
            average_ds: if ds_count == 0 {
                0.0
            } else {
                ds_total as f64 / ds_count as f64
            },
            matches_per_category,
            category_distribution,
            player_stats,
        }
    }
}

fn count_status(matches: &[Match], status: MatchStatus) -> usize {
    matches.iter().filter(|m| m.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::matches::MatchProcessor;
    use crate::types::{PlayerMatchInfo, ScoreSubmission};
    use crate::utils::{generate_match_id, parse_timestamp};

    #[test]
    fn test_event_statistics() {
        let table = CategoryTable::default();
        let processor = MatchProcessor::from_config(&AppConfig::default()).unwrap();
        let at = parse_timestamp("2024-03-01T19:00:00Z").unwrap();
        let players = vec![
            Player::new("a", "A", 1200, &table, at),
            Player::new("b", "B", 1300, &table, at),
            Player::new("c", "C", 1800, &table, at),
            Player::new("d", "D", 1500, &table, at),
        ];

        let pending = |p1: &Player, p2: &Player| {
            Match::new_pending(
                generate_match_id("cup", 1, &p1.id, &p2.id),
                "cup".to_string(),
                PlayerMatchInfo::from_player(p1),
                PlayerMatchInfo::from_player(p2),
                1,
                false,
                at,
            )
        };

        let first = processor
            .process(
                &pending(&players[0], &players[1]),
                &ScoreSubmission::new(3, 1, at),
                &[],
            )
            .unwrap()
            .updated_match;
        let second = processor
            .process_forfeit(&pending(&players[2], &players[3]), "d", "ill", at, &[])
            .unwrap()
            .updated_match;

        let stats = EventStatistics::compute(&[first, second], &players, &table);
        assert_eq!(stats.total_matches, 2);
        assert_eq!(stats.completed_matches, 1);
        assert_eq!(stats.forfeit_matches, 1);
        assert_eq!(stats.active_players, 4);
        assert_eq!(stats.average_rating, 1450.0);
        assert_eq!(stats.average_ds, 75.0);
        assert_eq!(stats.matches_per_category.get("ONYX"), Some(&1));
        assert_eq!(stats.category_distribution.get("DIAMANT"), Some(&0));
        assert_eq!(stats.category_distribution.get("ONYX"), Some(&2));
        assert_eq!(stats.player_stats["d"].forfeits, 1);
        assert_eq!(stats.player_stats["a"].wins, 1);
        assert_eq!(stats.player_stats["a"].rating_change, 24);
    }
}
