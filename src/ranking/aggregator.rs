//! Standings aggregation
//!
//! Folds terminal matches into per-player tallies and orders them with a
//! fully deterministic tie-break chain, so ranks are always distinct.

use crate::config::ScoringConfig;
use crate::types::{
    Match, Player, PlayerDetails, PlayerId, RankingEntry, Rating, Side, BYE_PLAYER_ID,
};
use skillratings::Outcomes;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Tally {
    points: u32,
    matches: u32,
    wins: u32,
    losses: u32,
    draws: u32,
    /// (round, created_at, match id) of the first and last counted match
    first: Option<(ChronoKey, Rating)>,
    last: Option<(ChronoKey, Rating)>,
}

type ChronoKey = (u32, chrono::DateTime<chrono::Utc>, uuid::Uuid);

impl Tally {
    fn record(&mut self, key: ChronoKey, before: Rating, after: Rating) {
        if self.first.as_ref().map_or(true, |(first, _)| key < *first) {
            self.first = Some((key, before));
        }
        if self.last.as_ref().map_or(true, |(last, _)| key > *last) {
            self.last = Some((key, after));
        }
    }

    fn rating_change(&self) -> Rating {
        match (&self.first, &self.last) {
            (Some((_, before)), Some((_, after))) => after - before,
            _ => 0,
        }
    }
}

/// Builds ranked standings from match records
#[derive(Debug, Clone, Default)]
pub struct RankingAggregator {
    scoring: ScoringConfig,
}

impl RankingAggregator {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }

    /// Standings over every match in `matches`
    ///
    /// Only completed and forfeit matches count. Players missing from
    /// `players` are skipped; roster players without matches are omitted.
    pub fn aggregate(&self, matches: &[Match], players: &[Player]) -> Vec<RankingEntry> {
        let roster: HashMap<&str, &Player> =
            players.iter().map(|p| (p.id.as_str(), p)).collect();
        let mut tallies: HashMap<PlayerId, Tally> = HashMap::new();

        for m in matches {
            let Some(result) = m.result.as_ref().filter(|_| m.status.has_result()) else {
                continue;
            };
            let key = (m.round(), m.metadata.created_at, m.id);

            for side in [Side::Player1, Side::Player2] {
                let participant = m.participant(side);
                if participant.id == BYE_PLAYER_ID {
                    continue;
                }
                if !roster.contains_key(participant.id.as_str()) {
                    warn!(
                        "Skipping player {} from match {}: not in roster",
                        participant.id, m.id
                    );
                    continue;
                }

                let tally = tallies.entry(participant.id.clone()).or_default();
                tally.matches += 1;

                if m.is_bye() {
                    // Byes are neutral: a draw worth the draw PR
                    tally.draws += 1;
                    tally.points += self.scoring.points.draw;
                } else {
                    match result.outcome_for(side) {
                        Outcomes::WIN => tally.wins += 1,
                        Outcomes::DRAW => tally.draws += 1,
                        Outcomes::LOSS => tally.losses += 1,
                    }
                    tally.points += result.pr_for(side);
                }

                tally.record(key, participant.rating_before, participant.rating_after);
            }
        }

        let mut rows: Vec<(&Player, Tally)> = tallies
            .into_iter()
            .filter_map(|(id, tally)| roster.get(id.as_str()).map(|p| (*p, tally)))
            .collect();
        rows.sort_by(|(pa, a), (pb, b)| compare_rows(pa, a, pb, b));

        let entries: Vec<RankingEntry> = rows
            .into_iter()
            .enumerate()
            .map(|(index, (player, tally))| RankingEntry {
                player_id: player.id.clone(),
                rank: index as u32 + 1,
                points: tally.points,
                matches: tally.matches,
                wins: tally.wins,
                losses: tally.losses,
                draws: tally.draws,
                rating: player.current_rating,
                rating_change: tally.rating_change(),
                category: player.category.clone(),
                player_details: PlayerDetails {
                    name: player.name.clone(),
                    current_rating: player.current_rating,
                    category: player.category.clone(),
                },
            })
            .collect();

        debug!(
            "Aggregated {} standings from {} matches",
            entries.len(),
            matches.len()
        );

        entries
    }

    /// Standings restricted to one round
    pub fn aggregate_round(
        &self,
        matches: &[Match],
        players: &[Player],
        round: u32,
    ) -> Vec<RankingEntry> {
        let in_round: Vec<Match> = matches
            .iter()
            .filter(|m| m.round() == round)
            .cloned()
            .collect();
        self.aggregate(&in_round, players)
    }

    /// Standings over rounds `1..=round`, used to seed the next round
    pub fn aggregate_through(
        &self,
        matches: &[Match],
        players: &[Player],
        round: u32,
    ) -> Vec<RankingEntry> {
        let played: Vec<Match> = matches
            .iter()
            .filter(|m| m.round() <= round)
            .cloned()
            .collect();
        self.aggregate(&played, players)
    }
}

/// Points desc, wins desc, matches desc, current rating desc, player id asc
fn compare_rows(pa: &Player, a: &Tally, pb: &Player, b: &Tally) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| b.matches.cmp(&a.matches))
        .then_with(|| pb.current_rating.cmp(&pa.current_rating))
        .then_with(|| pa.id.cmp(&pb.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryTable;
    use crate::types::{MatchResult, MatchStatus, PlayerMatchInfo};
    use crate::utils::{generate_match_id, parse_timestamp};

    fn roster(specs: &[(&str, Rating)]) -> Vec<Player> {
        let table = CategoryTable::default();
        let at = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        specs
            .iter()
            .map(|(id, rating)| Player::new(*id, id.to_uppercase(), *rating, &table, at))
            .collect()
    }

    fn info(id: &str, before: Rating, after: Rating) -> PlayerMatchInfo {
        PlayerMatchInfo {
            id: id.to_string(),
            rating_before: before,
            rating_after: after,
            category_before: "ONYX".to_string(),
            category_after: "ONYX".to_string(),
            matches_played: 0,
        }
    }

    fn played(round: u32, p1: PlayerMatchInfo, p2: PlayerMatchInfo, score: [u32; 2]) -> Match {
        let config = ScoringConfig::default();
        let mut m = Match::new_pending(
            generate_match_id("cup", round, &p1.id, &p2.id),
            "cup".to_string(),
            p1,
            p2,
            round,
            false,
            parse_timestamp("2024-03-01T19:00:00Z").unwrap()
                + chrono::Duration::days(i64::from(round)),
        );
        m.status = MatchStatus::Completed;
        m.result = Some(MatchResult {
            score,
            pr: crate::matches::scoring::match_points(score, &config),
            pdi: [0, 0],
            ds: crate::matches::scoring::dominance_score(score, &config),
            forfeit: None,
        });
        m
    }

    #[test]
    fn test_points_and_ordering() {
        let players = roster(&[("a", 1200), ("b", 1300), ("c", 1250), ("d", 1100)]);
        let matches = vec![
            played(1, info("a", 1200, 1215), info("b", 1300, 1290), [3, 0]),
            played(1, info("c", 1250, 1250), info("d", 1100, 1100), [2, 2]),
        ];

        let standings = RankingAggregator::default().aggregate(&matches, &players);
        let order: Vec<&str> = standings.iter().map(|e| e.player_id.as_str()).collect();

        // a: 3 pts; c and d: 2 pts (c higher rated); b: 1 pt
        assert_eq!(order, vec!["a", "c", "d", "b"]);
        assert_eq!(
            standings.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(standings[0].wins, 1);
        assert_eq!(standings[0].rating_change, 15);
        assert_eq!(standings[3].losses, 1);
        assert_eq!(standings[0].player_details.name, "A");
    }

    #[test]
    fn test_full_tie_broken_by_id() {
        let players = roster(&[("zoe", 1200), ("amy", 1200)]);
        let matches = vec![played(
            1,
            info("zoe", 1200, 1200),
            info("amy", 1200, 1200),
            [1, 1],
        )];

        let standings = RankingAggregator::default().aggregate(&matches, &players);
        assert_eq!(standings[0].player_id, "amy");
        assert_eq!(standings[1].player_id, "zoe");
        assert_eq!(standings[1].rank, 2);
    }

    #[test]
    fn test_non_terminal_and_unknown_players_skipped() {
        let players = roster(&[("a", 1200), ("b", 1200)]);
        let mut pending = played(2, info("a", 1200, 1200), info("b", 1200, 1200), [3, 0]);
        pending.status = MatchStatus::Disputed;
        pending.result = None;

        let matches = vec![
            played(1, info("a", 1200, 1220), info("ghost", 1200, 1185), [3, 1]),
            pending,
        ];

        let standings = RankingAggregator::default().aggregate(&matches, &players);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].player_id, "a");
        assert_eq!(standings[0].matches, 1);
    }

    #[test]
    fn test_bye_counts_as_neutral() {
        let players = roster(&[("a", 1200)]);
        let mut bye = Match::new_pending(
            generate_match_id("cup", 1, "a", BYE_PLAYER_ID),
            "cup".to_string(),
            info("a", 1200, 1200),
            PlayerMatchInfo::bye(),
            1,
            false,
            parse_timestamp("2024-03-01T19:00:00Z").unwrap(),
        );
        bye.status = MatchStatus::Completed;
        bye.result = Some(MatchResult {
            score: [0, 0],
            pr: [2, 0],
            pdi: [0, 0],
            ds: 0,
            forfeit: None,
        });

        let standings = RankingAggregator::default().aggregate(&[bye], &players);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].draws, 1);
        assert_eq!(standings[0].points, 2);
    }

    #[test]
    fn test_rating_change_uses_chronology() {
        let players = roster(&[("a", 1240), ("b", 1200), ("c", 1200)]);
        // Supplied out of order on purpose
        let matches = vec![
            played(2, info("a", 1220, 1240), info("c", 1200, 1180), [3, 1]),
            played(1, info("a", 1200, 1220), info("b", 1200, 1185), [3, 1]),
        ];

        let aggregator = RankingAggregator::default();
        let standings = aggregator.aggregate(&matches, &players);
        assert_eq!(standings[0].player_id, "a");
        assert_eq!(standings[0].rating_change, 40);

        let round_two = aggregator.aggregate_round(&matches, &players, 2);
        assert_eq!(round_two.len(), 2);
        assert_eq!(round_two[0].rating_change, 20);

        let through_one = aggregator.aggregate_through(&matches, &players, 1);
        assert_eq!(through_one.len(), 2);
    }
}
