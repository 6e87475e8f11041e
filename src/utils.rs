//! Utility functions for the tournament engine

use crate::error::{EngineError, Result};
use crate::types::MatchId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Namespace for deterministic match identifiers
const MATCH_NAMESPACE: Uuid = Uuid::from_u128(0x6c1b_7e0a_43d2_4f5e_9a8b_2f1d_c0de_7a11);

/// Derive a stable match id from the event, round and seat order
///
/// The same inputs always produce the same id, so regenerating a round
/// yields identical records.
pub fn generate_match_id(event_id: &str, round: u32, player1: &str, player2: &str) -> MatchId {
    let name = format!("{}/{}/{}/{}", event_id, round, player1, player2);
    Uuid::new_v5(&MATCH_NAMESPACE, name.as_bytes())
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an RFC 3339 timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            EngineError::InternalError {
                message: format!("Invalid timestamp {}: {}", value, e),
            }
            .into()
        })
}
