//! Common types used throughout the tournament engine

use crate::category::CategoryTable;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::Outcomes;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Unique identifier for events (a tournament or a club night)
pub type EventId = String;

/// Integer rating value
pub type Rating = i32;

/// Sentinel opponent id used for bye matches
pub const BYE_PLAYER_ID: &str = "BYE";

/// No rating ever drops below this value
pub const MINIMUM_RATING: Rating = 1000;

/// Rating given to newly registered players
pub const DEFAULT_RATING: Rating = 1000;

/// Lifecycle status of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Completed,
    Forfeit,
    Disputed,
    Cancelled,
    Invalidated,
}

impl MatchStatus {
    /// Statuses that carry a result and count toward standings
    pub fn has_result(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Forfeit)
    }

    /// Anything but `Pending`
    pub fn is_terminal(self) -> bool {
        self != MatchStatus::Pending
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Forfeit => write!(f, "forfeit"),
            MatchStatus::Disputed => write!(f, "disputed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
            MatchStatus::Invalidated => write!(f, "invalidated"),
        }
    }
}

/// One of the two seats of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    /// Index into the `[player1, player2]` arrays of a result
    pub fn index(self) -> usize {
        match self {
            Side::Player1 => 0,
            Side::Player2 => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }
}

/// Snapshot of a participant taken when the match was created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchInfo {
    pub id: PlayerId,
    pub rating_before: Rating,
    pub rating_after: Rating,
    pub category_before: String,
    pub category_after: String,
    /// Lifetime matches played before this one (drives K-factor selection)
    #[serde(default)]
    pub matches_played: u32,
}

impl PlayerMatchInfo {
    /// Snapshot a player as they stand right now
    pub fn from_player(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            rating_before: player.current_rating,
            rating_after: player.current_rating,
            category_before: player.category.clone(),
            category_after: player.category.clone(),
            matches_played: player.statistics.total_matches,
        }
    }

    /// Placeholder participant for bye matches
    pub fn bye() -> Self {
        Self {
            id: BYE_PLAYER_ID.to_string(),
            rating_before: 0,
            rating_after: 0,
            category_before: BYE_PLAYER_ID.to_string(),
            category_after: BYE_PLAYER_ID.to_string(),
            matches_played: 0,
        }
    }

    pub fn rating_change(&self) -> Rating {
        self.rating_after - self.rating_before
    }
}

/// Forfeit details attached to a forfeit result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForfeitInfo {
    pub forfeited_by: PlayerId,
    pub reason: String,
}

/// Resolved outcome of a match
///
/// `score`, `pr` and `pdi` are indexed by seat: `[player1, player2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub score: [u32; 2],
    /// Points de Rencontre credited to each seat
    pub pr: [u32; 2],
    /// Points de Départage Interne accumulated by each seat over prior meetings
    pub pdi: [u32; 2],
    /// Dominance score, 0..=100
    pub ds: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forfeit: Option<ForfeitInfo>,
}

impl MatchResult {
    /// (own score, opponent score) from one seat's perspective
    pub fn score_for(&self, side: Side) -> (u32, u32) {
        (
            self.score[side.index()],
            self.score[side.opponent().index()],
        )
    }

    pub fn outcome_for(&self, side: Side) -> Outcomes {
        let (own, opponent) = self.score_for(side);
        outcome_from_scores(own, opponent)
    }

    pub fn pr_for(&self, side: Side) -> u32 {
        self.pr[side.index()]
    }

    pub fn pdi_for(&self, side: Side) -> u32 {
        self.pdi[side.index()]
    }
}

/// Classify a pair of raw scores from the first score's perspective
pub fn outcome_from_scores(own: u32, opponent: u32) -> Outcomes {
    match own.cmp(&opponent) {
        std::cmp::Ordering::Greater => Outcomes::WIN,
        std::cmp::Ordering::Equal => Outcomes::DRAW,
        std::cmp::Ordering::Less => Outcomes::LOSS,
    }
}

/// Round bookkeeping carried by every match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub round: u32,
    pub is_random: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single match between two players (or a player and the bye sentinel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub event_id: EventId,
    pub player1: PlayerMatchInfo,
    pub player2: PlayerMatchInfo,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
    pub metadata: MatchMetadata,
}

impl Match {
    /// Create a pending match snapshotting both players
    pub fn new_pending(
        id: MatchId,
        event_id: EventId,
        player1: PlayerMatchInfo,
        player2: PlayerMatchInfo,
        round: u32,
        is_random: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_id,
            player1,
            player2,
            status: MatchStatus::Pending,
            result: None,
            metadata: MatchMetadata {
                round,
                is_random,
                created_at,
                updated_at: created_at,
            },
        }
    }

    pub fn participant(&self, side: Side) -> &PlayerMatchInfo {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    pub fn participant_mut(&mut self, side: Side) -> &mut PlayerMatchInfo {
        match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        }
    }

    /// Which seat a player occupies, if any
    pub fn side_of(&self, player_id: &str) -> Option<Side> {
        if self.player1.id == player_id {
            Some(Side::Player1)
        } else if self.player2.id == player_id {
            Some(Side::Player2)
        } else {
            None
        }
    }

    /// True when the match is between exactly these two players, in any seat order
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.player1.id == a && self.player2.id == b)
            || (self.player1.id == b && self.player2.id == a)
    }

    pub fn is_bye(&self) -> bool {
        self.player1.id == BYE_PLAYER_ID || self.player2.id == BYE_PLAYER_ID
    }

    pub fn round(&self) -> u32 {
        self.metadata.round
    }

    /// Check the status/result invariant
    pub fn validate(&self) -> Result<()> {
        let has_result = self.result.is_some();
        if self.status.has_result() != has_result {
            return Err(EngineError::InvalidMatch {
                match_id: self.id.to_string(),
                reason: format!(
                    "status {} {} a result",
                    self.status,
                    if has_result {
                        "must not carry"
                    } else {
                        "requires"
                    }
                ),
            }
            .into());
        }

        if self.player1.id == self.player2.id {
            return Err(EngineError::InvalidMatch {
                match_id: self.id.to_string(),
                reason: "a player cannot be paired with themselves".to_string(),
            }
            .into());
        }

        if let Some(result) = &self.result {
            if result.ds > 100 {
                return Err(EngineError::InvalidMatch {
                    match_id: self.id.to_string(),
                    reason: format!("dominance score {} exceeds 100", result.ds),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Why a player's category changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryChangeReason {
    RatingChange,
    AdminChange,
    SeasonReset,
}

/// One period a player spent in a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChange {
    pub category: String,
    pub from: DateTime<Utc>,
    /// None while this is the current category
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    pub reason: CategoryChangeReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForfeitCounts {
    /// Forfeits conceded by this player
    pub given: u32,
    /// Forfeits received from opponents
    pub received: u32,
}

/// Accumulated statistics for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatistics {
    pub total_matches: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    #[serde(default)]
    pub forfeits: ForfeitCounts,
    #[serde(rename = "totalPR")]
    pub total_pr: u32,
    #[serde(rename = "averageDS")]
    pub average_ds: f64,
    pub best_rating: Rating,
    pub worst_rating: Rating,
    #[serde(default)]
    pub category_history: Vec<CategoryChange>,
}

impl PlayerStatistics {
    pub fn new(initial_rating: Rating) -> Self {
        Self {
            total_matches: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            forfeits: ForfeitCounts::default(),
            total_pr: 0,
            average_ds: 0.0,
            best_rating: initial_rating,
            worst_rating: initial_rating,
            category_history: Vec::new(),
        }
    }
}

/// Opponent as they stood when the match was played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentSnapshot {
    pub id: PlayerId,
    pub rating_at_time: Rating,
    pub category_at_time: String,
}

/// Result of a match seen from one player's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchResult {
    /// `[own, opponent]`
    pub score: [u32; 2],
    pub pr: u32,
    pub pdi: u32,
    pub ds: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingMovement {
    pub before: Rating,
    pub after: Rating,
    pub change: Rating,
}

/// Per-match summary kept in a player's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatch {
    pub date: DateTime<Utc>,
    pub event_id: EventId,
    pub match_id: MatchId,
    pub opponent: OpponentSnapshot,
    pub result: PlayerMatchResult,
    pub rating_change: RatingMovement,
    pub category_at_time: String,
    #[serde(default)]
    pub forfeit: bool,
}

/// A registered club player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub current_rating: Rating,
    pub category: String,
    pub join_date: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub matches: Vec<PlayerMatch>,
    pub statistics: PlayerStatistics,
}

impl Player {
    /// Register a new player, deriving the category from the rating
    pub fn new(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        rating: Rating,
        categories: &CategoryTable,
        join_date: DateTime<Utc>,
    ) -> Self {
        let rating = rating.max(MINIMUM_RATING);
        let category = categories.category_for(rating).name.clone();
        let mut statistics = PlayerStatistics::new(rating);
        statistics.category_history.push(CategoryChange {
            category: category.clone(),
            from: join_date,
            to: None,
            reason: CategoryChangeReason::RatingChange,
        });

        Self {
            id: id.into(),
            name: name.into(),
            current_rating: rating,
            category,
            join_date,
            active: true,
            matches: Vec::new(),
            statistics,
        }
    }

    /// Check the rating floor and the rating/category invariant
    pub fn validate(&self, categories: &CategoryTable) -> Result<()> {
        if self.id.is_empty() || self.id == BYE_PLAYER_ID {
            return Err(EngineError::InvalidPlayer {
                player_id: self.id.clone(),
                reason: "reserved or empty identifier".to_string(),
            }
            .into());
        }

        if self.current_rating < MINIMUM_RATING {
            return Err(EngineError::InvalidPlayer {
                player_id: self.id.clone(),
                reason: format!(
                    "rating {} is below the floor of {}",
                    self.current_rating, MINIMUM_RATING
                ),
            }
            .into());
        }

        if !categories.is_eligible(self.current_rating, &self.category) {
            let expected = &categories.category_for(self.current_rating).name;
            return Err(EngineError::InvalidPlayer {
                player_id: self.id.clone(),
                reason: format!(
                    "category {} does not match rating {} (expected {})",
                    self.category, self.current_rating, expected
                ),
            }
            .into());
        }

        Ok(())
    }
}

/// Every round in which two players have met
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairHistory {
    /// Sorted so that `(a, b)` and `(b, a)` share one record
    pub players: [PlayerId; 2],
    pub rounds: BTreeSet<u32>,
    #[serde(default)]
    pub last_met: Option<DateTime<Utc>>,
}

impl PairHistory {
    pub fn new(a: impl Into<PlayerId>, b: impl Into<PlayerId>) -> Self {
        Self {
            players: pair_key(a.into(), b.into()),
            rounds: BTreeSet::new(),
            last_met: None,
        }
    }

    /// Record a meeting in `round`
    pub fn record(&mut self, round: u32, at: DateTime<Utc>) {
        self.rounds.insert(round);
        self.last_met = Some(match self.last_met {
            Some(previous) if previous > at => previous,
            _ => at,
        });
    }

    /// Whether the pair met in one of the `window` rounds preceding `round`
    pub fn met_within(&self, round: u32, window: u32) -> bool {
        self.rounds
            .iter()
            .any(|&met| met < round && round - met <= window)
    }

    /// Most recent round before `round` in which the pair met
    pub fn last_round_before(&self, round: u32) -> Option<u32> {
        self.rounds.range(..round).next_back().copied()
    }
}

/// Order two player ids into the canonical pair key
pub fn pair_key(a: PlayerId, b: PlayerId) -> [PlayerId; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// Presentation details denormalized into ranking entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetails {
    pub name: String,
    pub current_rating: Rating,
    pub category: String,
}

/// One line of a standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub player_id: PlayerId,
    pub rank: u32,
    pub points: u32,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub rating: Rating,
    pub rating_change: Rating,
    pub category: String,
    pub player_details: PlayerDetails,
}

/// Raw score report as received from the outside world
///
/// Scores stay loosely typed here; `MatchProcessor` validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub player1_score: Option<i64>,
    pub player2_score: Option<i64>,
    pub submitted_at: DateTime<Utc>,
}

impl ScoreSubmission {
    pub fn new(player1_score: i64, player2_score: i64, submitted_at: DateTime<Utc>) -> Self {
        Self {
            player1_score: Some(player1_score),
            player2_score: Some(player2_score),
            submitted_at,
        }
    }
}
