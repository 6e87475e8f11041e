//! Per-match scoring: PR, DS and PDI
//!
//! PR is a fixed number of points per outcome, DS is the winning margin as a
//! share of all points scored, and PDI replays earlier direct meetings within
//! the same event.

use crate::config::ScoringConfig;
use crate::types::{outcome_from_scores, Match, Side};
use skillratings::Outcomes;

/// PR credited to each seat for a played (non-forfeit) score
pub fn match_points(score: [u32; 2], config: &ScoringConfig) -> [u32; 2] {
    let points = &config.points;
    let credit = |side: Side| match outcome_from_scores(
        score[side.index()],
        score[side.opponent().index()],
    ) {
        Outcomes::WIN => points.win,
        Outcomes::DRAW => points.draw,
        Outcomes::LOSS => points.loss,
    };

    [credit(Side::Player1), credit(Side::Player2)]
}

/// PR credited to each seat when `forfeited_by` concedes
pub fn forfeit_points(forfeited_by: Side, config: &ScoringConfig) -> [u32; 2] {
    let mut pr = [config.points.forfeit_win; 2];
    pr[forfeited_by.index()] = config.points.forfeit_loss;
    pr
}

/// Dominance score in `[0, 100]`
///
/// Draws (including 0-0) score 0. A margin of at least `dominance_threshold`
/// of all points scored saturates at 100.
pub fn dominance_score(score: [u32; 2], config: &ScoringConfig) -> u8 {
    let (high, low) = if score[0] >= score[1] {
        (score[0], score[1])
    } else {
        (score[1], score[0])
    };

    let total = u64::from(high) + u64::from(low);
    if high == low || total == 0 {
        return 0;
    }

    let ratio = f64::from(high - low) / total as f64;
    if ratio >= config.dominance_threshold {
        100
    } else {
        (ratio * 100.0).floor().clamp(0.0, 100.0) as u8
    }
}

/// PDI of each seat of `current`, replayed from earlier meetings
///
/// Only completed or forfeit matches between the same two players in the same
/// event count. The current match itself is never counted.
pub fn direct_meeting_points(current: &Match, history: &[Match]) -> [u32; 2] {
    let first = current.player1.id.as_str();
    let second = current.player2.id.as_str();

    history
        .iter()
        .filter(|m| m.id != current.id)
        .filter(|m| m.event_id == current.event_id)
        .filter(|m| m.status.has_result() && m.is_between(first, second))
        .filter_map(|m| m.result.as_ref().map(|result| (m, result)))
        .fold([0u32, 0u32], |mut acc, (m, result)| {
            let own_side = if m.player1.id == first {
                Side::Player1
            } else {
                Side::Player2
            };
            acc[0] += result.pr_for(own_side);
            acc[1] += result.pr_for(own_side.opponent());
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchResult, MatchStatus, PlayerMatchInfo};
    use crate::utils::{generate_match_id, parse_timestamp};

    fn info(id: &str) -> PlayerMatchInfo {
        PlayerMatchInfo {
            id: id.to_string(),
            rating_before: 1200,
            rating_after: 1200,
            category_before: "ONYX".to_string(),
            category_after: "ONYX".to_string(),
            matches_played: 0,
        }
    }

    fn played(event: &str, round: u32, p1: &str, p2: &str, score: [u32; 2]) -> Match {
        let config = ScoringConfig::default();
        let mut m = Match::new_pending(
            generate_match_id(event, round, p1, p2),
            event.to_string(),
            info(p1),
            info(p2),
            round,
            false,
            parse_timestamp("2024-03-01T19:00:00Z").unwrap(),
        );
        m.status = MatchStatus::Completed;
        m.result = Some(MatchResult {
            score,
            pr: match_points(score, &config),
            pdi: [0, 0],
            ds: dominance_score(score, &config),
            forfeit: None,
        });
        m
    }

    #[test]
    fn test_match_points() {
        let config = ScoringConfig::default();
        assert_eq!(match_points([3, 1], &config), [3, 1]);
        assert_eq!(match_points([0, 7], &config), [1, 3]);
        assert_eq!(match_points([2, 2], &config), [2, 2]);
        assert_eq!(forfeit_points(Side::Player2, &config), [3, 0]);
    }

    #[test]
    fn test_dominance_score() {
        let config = ScoringConfig::default();
        assert_eq!(dominance_score([3, 1], &config), 50);
        assert_eq!(dominance_score([1, 3], &config), 50);
        assert_eq!(dominance_score([5, 0], &config), 100);
        assert_eq!(dominance_score([9, 1], &config), 100);
        assert_eq!(dominance_score([10, 2], &config), 66);
        assert_eq!(dominance_score([4, 4], &config), 0);
        assert_eq!(dominance_score([0, 0], &config), 0);
        assert_eq!(dominance_score([u32::MAX, 0], &config), 100);
    }

    #[test]
    fn test_direct_meeting_points_same_event_only() {
        let current = Match::new_pending(
            generate_match_id("cup", 3, "a", "b"),
            "cup".to_string(),
            info("a"),
            info("b"),
            3,
            false,
            parse_timestamp("2024-03-03T19:00:00Z").unwrap(),
        );

        let history = vec![
            played("cup", 1, "a", "b", [3, 1]),
            // Seats reversed: b won this one
            played("cup", 2, "b", "a", [5, 2]),
            played("cup", 2, "a", "c", [5, 0]),
            played("league", 1, "a", "b", [9, 0]),
        ];

        assert_eq!(direct_meeting_points(&current, &history), [4, 4]);
    }
}
