//! Tournament service
//!
//! Async coordination layer over the engine: loads records from a
//! `TournamentStore`, runs the pure engine components and persists the
//! results. Concurrent submissions for one match are serialized, and a round
//! is only generated once the previous one is fully resolved.

use crate::config::AppConfig;
use crate::error::{engine_error, EngineError, Result};
use crate::matches::{
    apply_delta, head_to_head, revert_match, HeadToHead, MatchProcessor, ProcessedMatch,
};
use crate::metrics::MetricsCollector;
use crate::pairing::{PairingGenerator, PairingOptions, RoundPairing};
use crate::ranking::{EventStatistics, RankingAggregator};
use crate::store::TournamentStore;
use crate::types::{
    Match, MatchId, MatchStatus, PairHistory, Player, RankingEntry, ScoreSubmission,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Coordinates result submission, standings and round generation
pub struct TournamentService {
    store: Arc<dyn TournamentStore>,
    processor: MatchProcessor,
    aggregator: RankingAggregator,
    generator: PairingGenerator,
    metrics: Arc<MetricsCollector>,
    /// One lock per match id
    match_locks: Mutex<HashMap<MatchId, Arc<Mutex<()>>>>,
    /// Serializes writes to player records and round creation
    write_lock: Mutex<()>,
}

impl TournamentService {
    /// Create a new tournament service
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn TournamentStore>,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        Ok(Self {
            store,
            processor: MatchProcessor::from_config(config)?,
            aggregator: RankingAggregator::new(config.scoring.clone()),
            generator: PairingGenerator::new(config.pairing.clone(), config.scoring.clone()),
            metrics,
            match_locks: Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        })
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Register a player after checking the rating/category invariant
    pub async fn register_player(&self, player: Player) -> Result<()> {
        player.validate(self.processor.categories())?;
        info!("Registering player {} ({})", player.id, player.current_rating);
        self.store.save_player(player).await
    }

    /// Submit a score for a pending match
    pub async fn submit_score(
        &self,
        match_id: MatchId,
        submission: ScoreSubmission,
    ) -> Result<ProcessedMatch> {
        let lock = self.lock_for(match_id).await;
        let _guard = lock.lock().await;
        let timer = self.metrics.start_timer();

        let current = self.load_match(&match_id).await?;
        let history = self.store.event_matches(&current.event_id).await?;

        let processed = self
            .processor
            .process(&current, &submission, &history)
            .map_err(|err| {
                self.record_rejection(&err);
                err
            })?;
        self.persist(&processed, false).await?;

        self.metrics.record_processed(&processed);
        self.metrics.record_operation("submit_score", timer.stop());
        Ok(processed)
    }

    /// Record a forfeit on a pending match
    pub async fn submit_forfeit(
        &self,
        match_id: MatchId,
        forfeiting_player_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<ProcessedMatch> {
        let lock = self.lock_for(match_id).await;
        let _guard = lock.lock().await;
        let timer = self.metrics.start_timer();

        let current = self.load_match(&match_id).await?;
        let history = self.store.event_matches(&current.event_id).await?;

        let processed = self
            .processor
            .process_forfeit(&current, forfeiting_player_id, reason, at, &history)
            .map_err(|err| {
                self.record_rejection(&err);
                err
            })?;
        self.persist(&processed, false).await?;

        self.metrics.record_processed(&processed);
        self.metrics.record_operation("submit_forfeit", timer.stop());
        Ok(processed)
    }

    /// Replace the result of a completed or forfeit match
    ///
    /// The match is reopened and processed again from its original
    /// snapshots. Both players must not have played since, so that their
    /// records can be rolled back before the corrected result is applied.
    pub async fn correct_result(
        &self,
        match_id: MatchId,
        submission: ScoreSubmission,
    ) -> Result<ProcessedMatch> {
        let lock = self.lock_for(match_id).await;
        let _guard = lock.lock().await;
        let timer = self.metrics.start_timer();

        let current = self.load_match(&match_id).await?;
        let history = self.store.event_matches(&current.event_id).await?;

        let processed = self
            .processor
            .reopen_for_correction(&current, submission.submitted_at)
            .and_then(|reopened| self.processor.process(&reopened, &submission, &history))
            .map_err(|err| {
                self.record_rejection(&err);
                err
            })?;
        info!(
            "Correcting match {}: {:?} -> {:?}",
            match_id,
            current.result.as_ref().map(|r| r.score),
            processed.updated_match.result.as_ref().map(|r| r.score)
        );
        self.persist(&processed, true).await?;

        self.metrics.record_processed(&processed);
        self.metrics.record_operation("correct_result", timer.stop());
        Ok(processed)
    }

    /// Standings of an event, over one round or the whole event
    pub async fn standings(&self, event_id: &str, round: Option<u32>) -> Result<Vec<RankingEntry>> {
        let matches = self.store.event_matches(event_id).await?;
        let players = self.store.list_players().await?;

        Ok(match round {
            Some(round) => self.aggregator.aggregate_round(&matches, &players, round),
            None => self.aggregator.aggregate(&matches, &players),
        })
    }

    /// Event-level statistics
    pub async fn event_statistics(&self, event_id: &str) -> Result<EventStatistics> {
        let matches = self.store.event_matches(event_id).await?;
        let players = self.store.list_players().await?;
        Ok(EventStatistics::compute(
            &matches,
            &players,
            self.processor.categories(),
        ))
    }

    /// Direct meetings between two players within an event
    pub async fn head_to_head(&self, event_id: &str, a: &str, b: &str) -> Result<HeadToHead> {
        let matches = self.store.event_matches(event_id).await?;
        Ok(head_to_head(&matches, a, b))
    }

    /// Generate and store the next round of an event
    ///
    /// Fails with `RoundNotFinalized` while the latest round still has pending
    /// or disputed matches.
    pub async fn generate_next_round(
        &self,
        event_id: &str,
        scheduled_at: DateTime<Utc>,
        random_seed: Option<u64>,
    ) -> Result<RoundPairing> {
        let _guard = self.write_lock.lock().await;
        let timer = self.metrics.start_timer();

        let matches = self.store.event_matches(event_id).await?;
        let players = self.store.list_players().await?;
        let current_round = matches.iter().map(Match::round).max().unwrap_or(0);

        let unfinished = matches
            .iter()
            .filter(|m| m.round() == current_round)
            .filter(|m| matches!(m.status, MatchStatus::Pending | MatchStatus::Disputed))
            .count();
        if unfinished > 0 {
            warn!(
                "Refusing to pair event {}: round {} has {} unfinished matches",
                event_id, current_round, unfinished
            );
            return Err(EngineError::RoundNotFinalized {
                event_id: event_id.to_string(),
                round: current_round,
                unfinished,
            }
            .into());
        }

        let next_round = current_round + 1;
        let options = if current_round == 0 {
            PairingOptions {
                random_seed,
                ..PairingOptions::first_round(event_id, scheduled_at)
            }
        } else {
            let standings = self
                .aggregator
                .aggregate_through(&matches, &players, current_round);
            PairingOptions::next_round(event_id, standings, scheduled_at)
        };

        let history = PairHistory::from_matches(&matches);
        let pairing = self
            .generator
            .generate_round(&players, &history, next_round, &options);

        for m in &pairing.matches {
            self.store.save_match(m.clone()).await?;
        }

        info!(
            "Generated round {} for event {}: {} matches, {} warnings",
            next_round,
            event_id,
            pairing.matches.len(),
            pairing.warnings.len()
        );

        self.metrics.record_round(&pairing);
        self.metrics.record_operation("generate_round", timer.stop());
        Ok(pairing)
    }

    async fn lock_for(&self, match_id: MatchId) -> Arc<Mutex<()>> {
        let mut locks = self.match_locks.lock().await;
        locks
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_match(&self, match_id: &MatchId) -> Result<Match> {
        match self.store.get_match(match_id).await? {
            Some(m) => Ok(m),
            None => {
                self.metrics.record_rejected("match_not_found");
                Err(EngineError::MatchNotFound {
                    match_id: match_id.to_string(),
                }
                .into())
            }
        }
    }

    /// Store the updated match and both updated players
    ///
    /// With `replaces_result` the players' previous entry for this match is
    /// rolled back first. Nothing is written unless every player updates.
    async fn persist(&self, processed: &ProcessedMatch, replaces_result: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut updated_players = Vec::with_capacity(2);
        for delta in processed.deltas() {
            let mut player = self
                .store
                .get_player(&delta.player_id)
                .await?
                .ok_or_else(|| EngineError::PlayerNotFound {
                    player_id: delta.player_id.clone(),
                })?;
            if replaces_result {
                revert_match(
                    &mut player,
                    &processed.updated_match.id,
                    self.processor.categories(),
                )?;
            }
            apply_delta(&mut player, delta, self.processor.categories())?;
            updated_players.push(player);
        }

        self.store.save_match(processed.updated_match.clone()).await?;
        for player in updated_players {
            debug!(
                "Saving player {}: rating {} ({})",
                player.id, player.current_rating, player.category
            );
            self.store.save_player(player).await?;
        }

        Ok(())
    }

    fn record_rejection(&self, err: &anyhow::Error) {
        let reason = match engine_error(err) {
            Some(EngineError::InvalidScore { .. }) => "invalid_score",
            Some(EngineError::MatchNotPending { .. }) => "match_not_pending",
            Some(EngineError::PlayerNotInMatch { .. }) => "player_not_in_match",
            Some(EngineError::InvalidMatch { .. }) => "invalid_match",
            _ => "other",
        };
        debug!("Rejected submission: {}", err);
        self.metrics.record_rejected(reason);
    }
}
