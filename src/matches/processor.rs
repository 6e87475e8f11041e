//! Match result processing
//!
//! Turns a reported score (or a forfeit) on a pending match into a terminal
//! match record plus one rating/category delta per participant. Nothing is
//! persisted here; callers store the returned records.

use crate::category::{CategoryTable, CategoryTransition};
use crate::config::{AppConfig, ScoringConfig};
use crate::error::{EngineError, Result};
use crate::matches::scoring::{
    direct_meeting_points, dominance_score, forfeit_points, match_points,
};
use crate::rating::{EloRatingCalculator, RatedOutcome, RatingCalculator};
use crate::types::{
    ForfeitInfo, Match, MatchResult, MatchStatus, OpponentSnapshot, PlayerId, PlayerMatch,
    PlayerMatchResult, RatingMovement, ScoreSubmission, Side,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::Outcomes;
use std::sync::Arc;
use tracing::{debug, info};

/// Role a player had in a forfeit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForfeitRole {
    /// The player conceded
    Given,
    /// The opponent conceded
    Received,
}

/// Everything that changed for one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDelta {
    pub player_id: PlayerId,
    pub rating: RatingMovement,
    pub category_before: String,
    pub category_after: String,
    pub transition: CategoryTransition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forfeit: Option<ForfeitRole>,
    /// Entry to append to the player's match history
    pub summary: PlayerMatch,
}

impl PlayerDelta {
    pub fn is_promotion(&self) -> bool {
        self.transition == CategoryTransition::Promotion
    }

    /// Outcome from this player's perspective
    pub fn outcome(&self) -> Outcomes {
        let [own, opponent] = self.summary.result.score;
        crate::types::outcome_from_scores(own, opponent)
    }
}

/// Output of processing one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMatch {
    pub updated_match: Match,
    pub player1_delta: PlayerDelta,
    pub player2_delta: PlayerDelta,
}

impl ProcessedMatch {
    pub fn deltas(&self) -> [&PlayerDelta; 2] {
        [&self.player1_delta, &self.player2_delta]
    }
}

/// Resolves match results into ratings and categories
pub struct MatchProcessor {
    calculator: Arc<dyn RatingCalculator>,
    categories: CategoryTable,
    scoring: ScoringConfig,
}

impl MatchProcessor {
    /// Create a new match processor
    pub fn new(
        calculator: Arc<dyn RatingCalculator>,
        categories: CategoryTable,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            calculator,
            categories,
            scoring,
        }
    }

    /// Build an Elo-backed processor from application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let calculator = EloRatingCalculator::new(config.rating.clone())?;
        config.scoring.validate()?;

        Ok(Self::new(
            Arc::new(calculator),
            config.categories.clone(),
            config.scoring.clone(),
        ))
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Apply a reported score to a pending match
    ///
    /// `history` holds earlier matches used to replay direct meetings (PDI).
    /// On error the input match is left untouched.
    pub fn process(
        &self,
        current: &Match,
        submission: &ScoreSubmission,
        history: &[Match],
    ) -> Result<ProcessedMatch> {
        ensure_processable(current)?;
        let score = [
            validate_score(submission.player1_score, "player1")?,
            validate_score(submission.player2_score, "player2")?,
        ];

        let result = MatchResult {
            score,
            pr: match_points(score, &self.scoring),
            pdi: direct_meeting_points(current, history),
            ds: dominance_score(score, &self.scoring),
            forfeit: None,
        };

        debug!(
            "Scored match {}: {:?} (PR {:?}, DS {})",
            current.id, score, result.pr, result.ds
        );

        Ok(self.resolve(
            current,
            result,
            MatchStatus::Completed,
            submission.submitted_at,
        ))
    }

    /// Record a forfeit by `forfeiting_player_id`
    ///
    /// The forfeiting side scores 0 and its opponent the configured forfeit
    /// win score; DS is 100.
    pub fn process_forfeit(
        &self,
        current: &Match,
        forfeiting_player_id: &str,
        reason: &str,
        at: DateTime<Utc>,
        history: &[Match],
    ) -> Result<ProcessedMatch> {
        ensure_processable(current)?;
        let forfeited_by =
            current
                .side_of(forfeiting_player_id)
                .ok_or_else(|| EngineError::PlayerNotInMatch {
                    match_id: current.id.to_string(),
                    player_id: forfeiting_player_id.to_string(),
                })?;

        let mut score = [self.scoring.forfeit_win_score; 2];
        score[forfeited_by.index()] = 0;

        let result = MatchResult {
            score,
            pr: forfeit_points(forfeited_by, &self.scoring),
            pdi: direct_meeting_points(current, history),
            ds: 100,
            forfeit: Some(ForfeitInfo {
                forfeited_by: forfeiting_player_id.to_string(),
                reason: reason.to_string(),
            }),
        };

        info!(
            "Player {} forfeited match {}: {}",
            forfeiting_player_id, current.id, reason
        );

        Ok(self.resolve(current, result, MatchStatus::Forfeit, at))
    }

    /// Reset a terminal match to pending so a corrected score can be processed
    ///
    /// Snapshots are restored to their pre-match values. Player records are
    /// rolled back separately with `revert_match`.
    pub fn reopen_for_correction(&self, current: &Match, at: DateTime<Utc>) -> Result<Match> {
        if !current.status.is_terminal() {
            return Err(EngineError::InvalidMatch {
                match_id: current.id.to_string(),
                reason: "match is already pending".to_string(),
            }
            .into());
        }
        if current.is_bye() {
            return Err(EngineError::InvalidMatch {
                match_id: current.id.to_string(),
                reason: "bye matches cannot be corrected".to_string(),
            }
            .into());
        }

        let mut reopened = current.clone();
        for side in [Side::Player1, Side::Player2] {
            let participant = reopened.participant_mut(side);
            participant.rating_after = participant.rating_before;
            participant.category_after = participant.category_before.clone();
        }
        reopened.status = MatchStatus::Pending;
        reopened.result = None;
        reopened.metadata.updated_at = at;

        info!(
            "Reopened match {} (was {}) for correction",
            current.id, current.status
        );

        Ok(reopened)
    }

    fn resolve(
        &self,
        current: &Match,
        result: MatchResult,
        status: MatchStatus,
        at: DateTime<Utc>,
    ) -> ProcessedMatch {
        let mut updated = current.clone();
        let player1_delta = self.player_delta(current, &result, status, Side::Player1, at);
        let player2_delta = self.player_delta(current, &result, status, Side::Player2, at);

        for (side, delta) in [
            (Side::Player1, &player1_delta),
            (Side::Player2, &player2_delta),
        ] {
            let participant = updated.participant_mut(side);
            participant.rating_after = delta.rating.after;
            participant.category_after = delta.category_after.clone();
        }
        updated.status = status;
        updated.result = Some(result);
        updated.metadata.updated_at = at;

        info!(
            "Processed match {} ({}): {} {} -> {}, {} {} -> {}",
            updated.id,
            status,
            player1_delta.player_id,
            player1_delta.rating.before,
            player1_delta.rating.after,
            player2_delta.player_id,
            player2_delta.rating.before,
            player2_delta.rating.after
        );

        for delta in [&player1_delta, &player2_delta] {
            if delta.transition != CategoryTransition::Unchanged {
                info!(
                    "Player {} moved from {} to {} ({:?})",
                    delta.player_id, delta.category_before, delta.category_after, delta.transition
                );
            }
        }

        ProcessedMatch {
            updated_match: updated,
            player1_delta,
            player2_delta,
        }
    }

    fn player_delta(
        &self,
        current: &Match,
        result: &MatchResult,
        status: MatchStatus,
        side: Side,
        at: DateTime<Utc>,
    ) -> PlayerDelta {
        let own = current.participant(side);
        let opponent = current.participant(side.opponent());

        let after = self.calculator.new_rating(
            own,
            &RatedOutcome {
                outcome: result.outcome_for(side),
                opponent_rating: opponent.rating_before,
                ds: result.ds,
            },
        );
        let category_after = self.categories.category_for(after).name.clone();
        let transition = self
            .categories
            .transition(&own.category_before, &category_after);
        let rating = RatingMovement {
            before: own.rating_before,
            after,
            change: after - own.rating_before,
        };

        let forfeit = result.forfeit.as_ref().map(|info| {
            if info.forfeited_by == own.id {
                ForfeitRole::Given
            } else {
                ForfeitRole::Received
            }
        });

        let (own_score, opponent_score) = result.score_for(side);
        let summary = PlayerMatch {
            date: at,
            event_id: current.event_id.clone(),
            match_id: current.id,
            opponent: OpponentSnapshot {
                id: opponent.id.clone(),
                rating_at_time: opponent.rating_before,
                category_at_time: opponent.category_before.clone(),
            },
            result: PlayerMatchResult {
                score: [own_score, opponent_score],
                pr: result.pr_for(side),
                pdi: result.pdi_for(side),
                ds: result.ds,
            },
            rating_change: rating,
            category_at_time: own.category_before.clone(),
            forfeit: status == MatchStatus::Forfeit,
        };

        debug!(
            "Player {} {:?} vs {} ({}): {:+}",
            own.id,
            result.outcome_for(side),
            opponent.id,
            opponent.rating_before,
            rating.change
        );

        PlayerDelta {
            player_id: own.id.clone(),
            rating,
            category_before: own.category_before.clone(),
            category_after,
            transition,
            forfeit,
            summary,
        }
    }
}

fn ensure_processable(current: &Match) -> Result<()> {
    if current.status.is_terminal() {
        return Err(EngineError::MatchNotPending {
            match_id: current.id.to_string(),
            status: current.status.to_string(),
        }
        .into());
    }
    if current.is_bye() {
        return Err(EngineError::InvalidMatch {
            match_id: current.id.to_string(),
            reason: "bye matches are resolved at pairing time".to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate_score(value: Option<i64>, seat: &str) -> Result<u32> {
    let value = value.ok_or_else(|| EngineError::InvalidScore {
        reason: format!("{} score is missing", seat),
    })?;

    if value < 0 {
        return Err(EngineError::InvalidScore {
            reason: format!("{} score {} is negative", seat, value),
        }
        .into());
    }

    u32::try_from(value).map_err(|_| {
        EngineError::InvalidScore {
            reason: format!("{} score {} is out of range", seat, value),
        }
        .into()
    })
}
