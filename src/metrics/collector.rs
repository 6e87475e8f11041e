//! Metrics collection using Prometheus
//!
//! This module provides metrics for the tournament engine: processed and
//! rejected results, rating movement, category transitions, generated rounds
//! and pairing warnings.

use crate::category::CategoryTransition;
use crate::matches::ProcessedMatch;
use crate::pairing::{PairingWarning, RoundPairing};
use crate::types::MatchStatus;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the tournament engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Match processing metrics
    match_metrics: MatchMetrics,

    /// Pairing metrics
    pairing_metrics: PairingMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Match processing metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Matches resolved, by resulting status
    pub matches_processed_total: IntCounterVec,

    /// Submissions rejected, by reason
    pub submissions_rejected_total: IntCounterVec,

    /// Absolute rating change per participant
    pub rating_change_points: Histogram,

    /// Category transitions, by direction
    pub category_transitions_total: IntCounterVec,
}

/// Pairing metrics
#[derive(Clone)]
pub struct PairingMetrics {
    /// Rounds generated
    pub rounds_generated_total: IntCounter,

    /// Matches created by pairing (byes included)
    pub matches_generated_total: IntCounter,

    /// Pairing warnings, by kind
    pub pairing_warnings_total: IntCounterVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Engine operation durations
    pub operation_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let match_metrics = MatchMetrics::new(&registry)?;
        let pairing_metrics = PairingMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            match_metrics,
            pairing_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    pub fn pairing(&self) -> &PairingMetrics {
        &self.pairing_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a resolved match and both participants' movement
    pub fn record_processed(&self, processed: &ProcessedMatch) {
        let status = match processed.updated_match.status {
            MatchStatus::Forfeit => "forfeit",
            _ => "completed",
        };
        self.match_metrics
            .matches_processed_total
            .with_label_values(&[status])
            .inc();

        for delta in processed.deltas() {
            self.match_metrics
                .rating_change_points
                .observe(f64::from(delta.rating.change.abs()));

            let direction = match delta.transition {
                CategoryTransition::Promotion => "promotion",
                CategoryTransition::Demotion => "demotion",
                CategoryTransition::Unchanged => continue,
            };
            self.match_metrics
                .category_transitions_total
                .with_label_values(&[direction])
                .inc();
        }
    }

    /// Record a rejected submission
    pub fn record_rejected(&self, reason: &str) {
        self.match_metrics
            .submissions_rejected_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a generated round and its warnings
    pub fn record_round(&self, pairing: &RoundPairing) {
        self.pairing_metrics.rounds_generated_total.inc();
        self.pairing_metrics
            .matches_generated_total
            .inc_by(pairing.matches.len() as u64);

        for warning in &pairing.warnings {
            let kind = match warning {
                PairingWarning::MissingPriorStandings { .. } => "missing_prior_standings",
                PairingWarning::RematchUnavoidable { .. } => "rematch_unavoidable",
                PairingWarning::ByeAssigned { .. } => "bye_assigned",
            };
            self.pairing_metrics
                .pairing_warnings_total
                .with_label_values(&[kind])
                .inc();
        }
    }

    /// Record engine operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_processed_total = IntCounterVec::new(
            Opts::new(
                "club_tournament_matches_processed_total",
                "Total matches resolved",
            ),
            &["status"],
        )?;
        registry.register(Box::new(matches_processed_total.clone()))?;

        let submissions_rejected_total = IntCounterVec::new(
            Opts::new(
                "club_tournament_submissions_rejected_total",
                "Total rejected score or forfeit submissions",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(submissions_rejected_total.clone()))?;

        let rating_change_points = Histogram::with_opts(
            HistogramOpts::new(
                "club_tournament_rating_change_points",
                "Absolute rating change per participant",
            )
            .buckets(vec![0.0, 5.0, 10.0, 15.0, 20.0, 30.0, 40.0, 60.0]),
        )?;
        registry.register(Box::new(rating_change_points.clone()))?;

        let category_transitions_total = IntCounterVec::new(
            Opts::new(
                "club_tournament_category_transitions_total",
                "Total category promotions and demotions",
            ),
            &["direction"],
        )?;
        registry.register(Box::new(category_transitions_total.clone()))?;

        Ok(Self {
            matches_processed_total,
            submissions_rejected_total,
            rating_change_points,
            category_transitions_total,
        })
    }
}

impl PairingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rounds_generated_total = IntCounter::new(
            "club_tournament_rounds_generated_total",
            "Total rounds generated",
        )?;
        registry.register(Box::new(rounds_generated_total.clone()))?;

        let matches_generated_total = IntCounter::new(
            "club_tournament_matches_generated_total",
            "Total matches created by pairing",
        )?;
        registry.register(Box::new(matches_generated_total.clone()))?;

        let pairing_warnings_total = IntCounterVec::new(
            Opts::new(
                "club_tournament_pairing_warnings_total",
                "Total pairing warnings",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(pairing_warnings_total.clone()))?;

        Ok(Self {
            rounds_generated_total,
            matches_generated_total,
            pairing_warnings_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "club_tournament_operation_duration_seconds",
                "Time spent in engine operations",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self { operation_duration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::{PairingGenerator, PairingOptions};
    use crate::category::CategoryTable;
    use crate::types::Player;
    use crate::utils::parse_timestamp;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_rejected("invalid_score");
        assert_eq!(
            collector
                .matches()
                .submissions_rejected_total
                .with_label_values(&["invalid_score"])
                .get(),
            1
        );
    }

    #[test]
    fn test_record_round() {
        let collector = MetricsCollector::new().unwrap();
        let table = CategoryTable::default();
        let at = parse_timestamp("2024-03-01T19:00:00Z").unwrap();
        let players: Vec<Player> = ["a", "b", "c"]
            .iter()
            .map(|id| Player::new(*id, *id, 1200, &table, at))
            .collect();

        let pairing = PairingGenerator::default().generate_round(
            &players,
            &[],
            1,
            &PairingOptions::first_round("cup", at),
        );
        collector.record_round(&pairing);

        assert_eq!(collector.pairing().rounds_generated_total.get(), 1);
        assert_eq!(collector.pairing().matches_generated_total.get(), 2);
        assert_eq!(
            collector
                .pairing()
                .pairing_warnings_total
                .with_label_values(&["bye_assigned"])
                .get(),
            1
        );

        let text = collector.render().unwrap();
        assert!(text.contains("club_tournament_rounds_generated_total 1"));
    }
}
