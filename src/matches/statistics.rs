//! Player statistics bookkeeping
//!
//! Folds a processed match into a player's record (or rolls the latest one
//! back for a correction) and summarizes the direct meetings between two
//! players.

use crate::category::CategoryTable;
use crate::error::{EngineError, Result};
use crate::matches::processor::{ForfeitRole, PlayerDelta};
use crate::types::{
    outcome_from_scores, CategoryChange, CategoryChangeReason, Match, MatchId, Player, PlayerId,
    PlayerMatch, Side, BYE_PLAYER_ID,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::Outcomes;
use tracing::debug;

/// Apply one participant's delta to their player record
///
/// Updates rating, category (closing the open category period on change),
/// totals and the match history.
pub fn apply_delta(player: &mut Player, delta: &PlayerDelta, categories: &CategoryTable) -> Result<()> {
    if player.id != delta.player_id {
        return Err(EngineError::InvalidPlayer {
            player_id: player.id.clone(),
            reason: format!("delta belongs to player {}", delta.player_id),
        }
        .into());
    }
    if player
        .matches
        .iter()
        .any(|recorded| recorded.match_id == delta.summary.match_id)
    {
        return Err(EngineError::InvalidPlayer {
            player_id: player.id.clone(),
            reason: format!("match {} is already recorded", delta.summary.match_id),
        }
        .into());
    }

    let at = delta.summary.date;
    let stats = &mut player.statistics;

    stats.total_matches += 1;
    match delta.outcome() {
        Outcomes::WIN => stats.wins += 1,
        Outcomes::DRAW => stats.draws += 1,
        Outcomes::LOSS => stats.losses += 1,
    }
    match delta.forfeit {
        Some(ForfeitRole::Given) => stats.forfeits.given += 1,
        Some(ForfeitRole::Received) => stats.forfeits.received += 1,
        None => {}
    }
    stats.total_pr += delta.summary.result.pr;

    let n = f64::from(stats.total_matches);
    stats.average_ds = (stats.average_ds * (n - 1.0) + f64::from(delta.summary.result.ds)) / n;

    let rating = delta.rating.after;
    stats.best_rating = stats.best_rating.max(rating);
    stats.worst_rating = stats.worst_rating.min(rating);

    let category = categories.category_for(rating).name.clone();
    if category != player.category {
        if let Some(open) = stats
            .category_history
            .iter_mut()
            .rev()
            .find(|change| change.to.is_none())
        {
            open.to = Some(at);
        }
        stats.category_history.push(CategoryChange {
            category: category.clone(),
            from: at,
            to: None,
            reason: CategoryChangeReason::RatingChange,
        });

        debug!(
            "Player {} category {} -> {} ({:?})",
            player.id,
            player.category,
            category,
            categories.transition(&player.category, &category)
        );
    }

    player.current_rating = rating;
    player.category = category;
    player.matches.push(delta.summary.clone());

    Ok(())
}

/// Roll back the player's most recent match
///
/// Only the latest history entry can be reverted: rating, category and
/// totals return to their state before that match. Returns the removed
/// entry.
pub fn revert_match(
    player: &mut Player,
    match_id: &MatchId,
    categories: &CategoryTable,
) -> Result<PlayerMatch> {
    if player.matches.last().map(|last| &last.match_id) != Some(match_id) {
        return Err(EngineError::InvalidPlayer {
            player_id: player.id.clone(),
            reason: format!("match {} is not the most recent match", match_id),
        }
        .into());
    }
    let Some(summary) = player.matches.pop() else {
        return Err(EngineError::InternalError {
            message: format!("history of player {} is empty", player.id),
        }
        .into());
    };

    let stats = &mut player.statistics;
    let [own, opponent] = summary.result.score;

    stats.total_matches = stats.total_matches.saturating_sub(1);
    match outcome_from_scores(own, opponent) {
        Outcomes::WIN => stats.wins = stats.wins.saturating_sub(1),
        Outcomes::DRAW => stats.draws = stats.draws.saturating_sub(1),
        Outcomes::LOSS => stats.losses = stats.losses.saturating_sub(1),
    }
    if summary.forfeit {
        if own < opponent {
            stats.forfeits.given = stats.forfeits.given.saturating_sub(1);
        } else {
            stats.forfeits.received = stats.forfeits.received.saturating_sub(1);
        }
    }
    stats.total_pr = stats.total_pr.saturating_sub(summary.result.pr);

    let remaining = f64::from(stats.total_matches);
    stats.average_ds = if stats.total_matches == 0 {
        0.0
    } else {
        (stats.average_ds * (remaining + 1.0) - f64::from(summary.result.ds)) / remaining
    };

    let rating = summary.rating_change.before;
    let initial = player
        .matches
        .first()
        .map_or(rating, |first| first.rating_change.before);
    let ratings = || {
        player
            .matches
            .iter()
            .map(|m| m.rating_change.after)
            .chain(std::iter::once(initial))
    };
    let best = ratings().max().unwrap_or(rating);
    let worst = ratings().min().unwrap_or(rating);
    let stats = &mut player.statistics;
    stats.best_rating = best;
    stats.worst_rating = worst;

    let category = categories.category_for(rating).name.clone();
    if category != player.category {
        // Drop the period this match opened and reopen the one it closed
        if stats
            .category_history
            .last()
            .is_some_and(|change| change.to.is_none() && change.category == player.category)
        {
            stats.category_history.pop();
        }
        if let Some(previous) = stats.category_history.last_mut() {
            previous.to = None;
        }
    }

    debug!(
        "Reverted match {} for player {}: rating {} -> {}",
        match_id, player.id, player.current_rating, rating
    );

    player.current_rating = rating;
    player.category = category;

    Ok(summary)
}

/// Summary of all direct meetings between two players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHead {
    pub players: [PlayerId; 2],
    pub matches: u32,
    /// Wins of `players[0]` and `players[1]`
    pub wins: [u32; 2],
    pub draws: u32,
    /// PR accumulated by each player over the meetings
    pub points: [u32; 2],
    #[serde(default)]
    pub last_met: Option<DateTime<Utc>>,
}

/// Head-to-head record of `a` against `b` over `matches`
///
/// Only completed or forfeit matches with a result are counted.
pub fn head_to_head(matches: &[Match], a: &str, b: &str) -> HeadToHead {
    let mut summary = HeadToHead {
        players: [a.to_string(), b.to_string()],
        matches: 0,
        wins: [0, 0],
        draws: 0,
        points: [0, 0],
        last_met: None,
    };

    if a == BYE_PLAYER_ID || b == BYE_PLAYER_ID {
        return summary;
    }

    for m in matches.iter().filter(|m| m.is_between(a, b)) {
        let Some(result) = m.result.as_ref().filter(|_| m.status.has_result()) else {
            continue;
        };
        let side_a = if m.player1.id == a {
            Side::Player1
        } else {
            Side::Player2
        };

        summary.matches += 1;
        match result.outcome_for(side_a) {
            Outcomes::WIN => summary.wins[0] += 1,
            Outcomes::LOSS => summary.wins[1] += 1,
            Outcomes::DRAW => summary.draws += 1,
        }
        summary.points[0] += result.pr_for(side_a);
        summary.points[1] += result.pr_for(side_a.opponent());

        let at = m.metadata.updated_at;
        if summary.last_met.map_or(true, |last| at > last) {
            summary.last_met = Some(at);
        }
    }

    summary
}
