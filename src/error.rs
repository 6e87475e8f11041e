//! Error types for the tournament engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the engine. Callers that need to branch on a specific failure
//! recover it with `err.downcast_ref::<EngineError>()`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific engine scenarios
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid score: {reason}")]
    InvalidScore { reason: String },

    #[error("Match {match_id} is not pending (status: {status})")]
    MatchNotPending { match_id: String, status: String },

    #[error("Player {player_id} does not take part in match {match_id}")]
    PlayerNotInMatch { match_id: String, player_id: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Invalid player record {player_id}: {reason}")]
    InvalidPlayer { player_id: String, reason: String },

    #[error("Invalid match record {match_id}: {reason}")]
    InvalidMatch { match_id: String, reason: String },

    #[error("Round {round} of event {event_id} still has {unfinished} unfinished matches")]
    RoundNotFinalized {
        event_id: String,
        round: u32,
        unfinished: usize,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal engine error: {message}")]
    InternalError { message: String },
}

/// Extract the engine error carried by an `anyhow::Error`, if any
pub fn engine_error(err: &anyhow::Error) -> Option<&EngineError> {
    err.downcast_ref::<EngineError>()
}
